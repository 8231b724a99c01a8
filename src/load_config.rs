//! `load_config`: reads the YAML file describing the transport networks a process serves.
//!
//! Accepted schema:
//!
//! ```yaml
//! services:
//!   - name: vigo-bus
//!     stop_writes: first_success   # or `everywhere` (default)
//!     scan_concurrency: 8          # default 10
//!   - name: hamburg-bus
//! ```
//!
//! The environment variable `BUSES_SCAN_CONCURRENCY`, when set, overrides
//! `scan_concurrency` for every service in the file.
//!
//! All errors use `anyhow::Error` so the caller gets the file path and the failing key.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Result};
use tracing::{error, info};

use crate::config::BusesConfig;

pub const SCAN_CONCURRENCY_ENV: &str = "BUSES_SCAN_CONCURRENCY";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BusesConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: BusesConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(var) = std::env::var(SCAN_CONCURRENCY_ENV) {
        let concurrency = match var.parse::<usize>() {
            Ok(n) => n,
            Err(e) => {
                error!(error = ?e, var = ?var, "{} must be a valid integer", SCAN_CONCURRENCY_ENV);
                bail!("{SCAN_CONCURRENCY_ENV} must be a valid integer: {e}");
            }
        };
        info!(concurrency, "Scan concurrency overridden from environment");
        for service in &mut config.services {
            service.scan_concurrency = concurrency;
        }
    }

    validate(&config)?;
    config.trace_loaded();
    Ok(config)
}

fn validate(config: &BusesConfig) -> Result<()> {
    let mut names = HashSet::new();
    for service in &config.services {
        if service.name.trim().is_empty() {
            error!("Service with empty name in config");
            bail!("Every service needs a non-empty name");
        }
        if !names.insert(service.name.as_str()) {
            error!(service = %service.name, "Duplicate service name in config");
            bail!("Duplicate service name: {}", service.name);
        }
        if service.scan_concurrency == 0 {
            error!(service = %service.name, "scan_concurrency must be at least 1");
            bail!(
                "Service {}: scan_concurrency must be at least 1",
                service.name
            );
        }
    }
    Ok(())
}
