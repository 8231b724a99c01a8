use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_SCAN_CONCURRENCY: usize = 10;

/// Settings for one transport network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub stop_writes: WritePolicy,
    /// How many stop lookups a range scan keeps in flight.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

impl ServiceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stop_writes: WritePolicy::default(),
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            service = %self.name,
            stop_writes = ?self.stop_writes,
            scan_concurrency = self.scan_concurrency,
            "Loaded ServiceConfig"
        );
    }
}

fn default_scan_concurrency() -> usize {
    DEFAULT_SCAN_CONCURRENCY
}

/// How [`crate::Service::save_stop`] walks the stop setters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Call every setter; any failure is reported after all were tried.
    #[default]
    Everywhere,
    /// Call setters in order and stop at the first that succeeds.
    FirstSuccess,
}

/// A set of independent services, typically loaded with [`crate::load_config::load_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusesConfig {
    pub services: Vec<ServiceConfig>,
}

impl BusesConfig {
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn trace_loaded(&self) {
        info!(services_count = self.services.len(), "Loaded BusesConfig");
        for service in &self.services {
            service.trace_loaded();
        }
        debug!(?self, "Config loaded (full debug)");
    }
}
