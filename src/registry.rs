//! Ordered adapter lists, one per (entity, capability) pair.
//!
//! Registration order is fallback priority: the first adapter registered is tried first.
//! Registering the same adapter allocation (the same `Arc`) twice is a no-op.

use std::fmt;
use std::sync::Arc;

use crate::contract::{BusGetter, StopDeleter, StopGetter, StopSetter};
use crate::error::{Capability, EntityKind};

/// Ordered, duplicate-free collection of adapters of one kind.
pub struct AdapterList<A: ?Sized> {
    entries: Vec<Arc<A>>,
}

impl<A: ?Sized> AdapterList<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append `adapter`. Returns `false` (and changes nothing) if this exact
    /// adapter is already registered.
    pub fn register(&mut self, adapter: Arc<A>) -> bool {
        if self.contains(&adapter) {
            return false;
        }
        self.entries.push(adapter);
        true
    }

    pub fn contains(&self, adapter: &Arc<A>) -> bool {
        self.entries.iter().any(|e| Arc::ptr_eq(e, adapter))
    }

    pub fn list(&self) -> &[Arc<A>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<A>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: ?Sized> Default for AdapterList<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> Clone for AdapterList<A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<A: ?Sized> fmt::Debug for AdapterList<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterList")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// An adapter tagged with the capability it is registered for.
#[derive(Clone)]
pub enum Adapter {
    StopGetter(Arc<dyn StopGetter>),
    StopSetter(Arc<dyn StopSetter>),
    StopDeleter(Arc<dyn StopDeleter>),
    BusGetter(Arc<dyn BusGetter>),
}

impl Adapter {
    pub fn entity(&self) -> EntityKind {
        match self {
            Adapter::StopGetter(_) | Adapter::StopSetter(_) | Adapter::StopDeleter(_) => {
                EntityKind::Stop
            }
            Adapter::BusGetter(_) => EntityKind::Bus,
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Adapter::StopGetter(_) | Adapter::BusGetter(_) => Capability::Get,
            Adapter::StopSetter(_) => Capability::Set,
            Adapter::StopDeleter(_) => Capability::Delete,
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Adapter({} {})", self.entity(), self.capability())
    }
}

/// All adapter lists of one service.
///
/// Cloning is cheap (it clones `Arc`s) and is how a service hands a stable
/// snapshot to the resolution engine.
#[derive(Clone, Default, Debug)]
pub struct Registry {
    stop_getters: AdapterList<dyn StopGetter>,
    stop_setters: AdapterList<dyn StopSetter>,
    stop_deleters: AdapterList<dyn StopDeleter>,
    bus_getters: AdapterList<dyn BusGetter>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the capability its variant names.
    pub fn register(&mut self, adapter: Adapter) -> bool {
        match adapter {
            Adapter::StopGetter(a) => self.stop_getters.register(a),
            Adapter::StopSetter(a) => self.stop_setters.register(a),
            Adapter::StopDeleter(a) => self.stop_deleters.register(a),
            Adapter::BusGetter(a) => self.bus_getters.register(a),
        }
    }

    /// Ordered view of the adapters registered for `(entity, capability)`.
    /// Pairs no adapter kind exists for (bus setters, bus deleters) are always empty.
    pub fn list(&self, entity: EntityKind, capability: Capability) -> Vec<Adapter> {
        match (entity, capability) {
            (EntityKind::Stop, Capability::Get) => self
                .stop_getters
                .iter()
                .cloned()
                .map(Adapter::StopGetter)
                .collect(),
            (EntityKind::Stop, Capability::Set) => self
                .stop_setters
                .iter()
                .cloned()
                .map(Adapter::StopSetter)
                .collect(),
            (EntityKind::Stop, Capability::Delete) => self
                .stop_deleters
                .iter()
                .cloned()
                .map(Adapter::StopDeleter)
                .collect(),
            (EntityKind::Bus, Capability::Get) => self
                .bus_getters
                .iter()
                .cloned()
                .map(Adapter::BusGetter)
                .collect(),
            (EntityKind::Bus, Capability::Set | Capability::Delete) => Vec::new(),
        }
    }

    pub fn stop_getters(&self) -> &AdapterList<dyn StopGetter> {
        &self.stop_getters
    }

    pub fn stop_setters(&self) -> &AdapterList<dyn StopSetter> {
        &self.stop_setters
    }

    pub fn stop_deleters(&self) -> &AdapterList<dyn StopDeleter> {
        &self.stop_deleters
    }

    pub fn bus_getters(&self) -> &AdapterList<dyn BusGetter> {
        &self.bus_getters
    }
}
