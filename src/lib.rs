#![doc = "buses: pluggable resolution of transit stops and the buses arriving at them."]

//! A [`Service`] models one concrete transport network ("the bus service of Vigo").
//! Integrators register data-source adapters on it (stop getters, setters and deleters,
//! bus getters) and the service resolves stops and incoming buses by walking those
//! adapters in registration order.
//!
//! # Usage
//! - Implement the traits in [`contract`] for each data source.
//! - Register them on a [`Service`], then call [`Service::get_stop`],
//!   [`Service::get_buses`], [`Service::save_stop`] or [`Service::delete_stop`].
//! - Fallback rules and error semantics live in [`resolve`]; the error taxonomy in [`error`].

pub mod config;
pub mod contract;
pub mod entity;
pub mod error;
pub mod load_config;
pub mod registry;
pub mod resolve;
pub mod service;

pub use config::{BusesConfig, ServiceConfig, WritePolicy};
pub use contract::{BusGetter, StopDeleter, StopGetter, StopSetter};
pub use entity::{Bus, Extra, Stop, StopId};
pub use error::{
    AdapterFailure, BusLookupError, BusesError, Capability, EntityKind, ErrorClass,
    StopLookupError, Unavailable, ValidationError,
};
pub use registry::{Adapter, AdapterList, Registry};
pub use resolve::StopScan;
pub use service::Service;
