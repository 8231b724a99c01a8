//! The handle integrators hold for one transport network.

use std::ops::RangeInclusive;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::contract::{BusGetter, StopDeleter, StopGetter, StopSetter};
use crate::entity::{Bus, Stop, StopId};
use crate::error::BusesError;
use crate::registry::{Adapter, Registry};
use crate::resolve::{self, StopScan};

/// One transport network ("the bus service of Vigo") and the adapters that serve it.
///
/// Services share nothing: two instances in one process never see each other's adapters.
/// Register adapters while setting the service up; each operation works on a snapshot of
/// the registry taken when it starts, so a registration racing an in-flight lookup only
/// affects later calls.
pub struct Service {
    config: ServiceConfig,
    registry: RwLock<Registry>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(ServiceConfig::named(name))
    }

    pub fn from_config(config: ServiceConfig) -> Self {
        info!(service = %config.name, "Creating service");
        Self {
            config,
            registry: RwLock::new(Registry::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Register an adapter. Returns `false` if that exact adapter was already registered
    /// for the same capability.
    pub fn register(&self, adapter: Adapter) -> bool {
        let entity = adapter.entity();
        let capability = adapter.capability();
        let added = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(adapter);
        if added {
            debug!(service = %self.config.name, %entity, %capability, "Adapter registered");
        } else {
            debug!(service = %self.config.name, %entity, %capability, "Adapter already registered, ignored");
        }
        added
    }

    pub fn register_stop_getter(&self, getter: Arc<dyn StopGetter>) -> bool {
        self.register(Adapter::StopGetter(getter))
    }

    pub fn register_stop_setter(&self, setter: Arc<dyn StopSetter>) -> bool {
        self.register(Adapter::StopSetter(setter))
    }

    pub fn register_stop_deleter(&self, deleter: Arc<dyn StopDeleter>) -> bool {
        self.register(Adapter::StopDeleter(deleter))
    }

    pub fn register_bus_getter(&self, getter: Arc<dyn BusGetter>) -> bool {
        self.register(Adapter::BusGetter(getter))
    }

    /// A copy of the current registry.
    pub fn registry(&self) -> Registry {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[tracing::instrument(skip(self, stopid), fields(service = %self.config.name, stopid = tracing::field::Empty))]
    pub async fn get_stop(&self, stopid: impl Into<StopId>) -> Result<Stop, BusesError> {
        let stopid = stopid.into();
        tracing::Span::current().record("stopid", stopid.get());
        resolve::resolve_stop(&self.registry(), stopid).await
    }

    #[tracing::instrument(skip(self, stopid), fields(service = %self.config.name, stopid = tracing::field::Empty))]
    pub async fn get_buses(&self, stopid: impl Into<StopId>) -> Result<Vec<Bus>, BusesError> {
        let stopid = stopid.into();
        tracing::Span::current().record("stopid", stopid.get());
        resolve::resolve_buses(&self.registry(), stopid).await
    }

    #[tracing::instrument(skip(self, stop), fields(service = %self.config.name, stopid = stop.stopid().get()))]
    pub async fn save_stop(&self, stop: &Stop) -> Result<(), BusesError> {
        resolve::apply_setter(&self.registry(), stop, self.config.stop_writes).await
    }

    #[tracing::instrument(skip(self, stopid), fields(service = %self.config.name, stopid = tracing::field::Empty))]
    pub async fn delete_stop(&self, stopid: impl Into<StopId>) -> Result<bool, BusesError> {
        let stopid = stopid.into();
        tracing::Span::current().record("stopid", stopid.get());
        resolve::apply_deleter(&self.registry(), stopid).await
    }

    /// Look up every stop id in `range` with the configured concurrency.
    #[tracing::instrument(skip(self), fields(service = %self.config.name))]
    pub async fn find_all_stops(&self, range: RangeInclusive<u64>) -> Result<StopScan, BusesError> {
        resolve::scan_stops(
            &self.registry(),
            range.map(StopId::new),
            self.config.scan_concurrency,
        )
        .await
    }
}
