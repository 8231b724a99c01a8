//! # contract: capability interfaces for stop and bus data sources
//!
//! Each trait here is one capability a data source can offer to a [`crate::Service`]:
//! reading stops, saving stops, deleting stops, or reading the buses arriving at a stop.
//! A single source (say, a database) usually implements several of them and is registered
//! once per capability.
//!
//! ## Interface & Extensibility
//! - All methods are async; block or await inside the implementation as needed. The engine
//!   imposes no timeout, so a slow source should bound its own latency and report
//!   [`Unavailable`] when it gives up.
//! - Errors are typed per capability. A getter distinguishes "not here" from "does not
//!   exist anywhere"; writers can only report that they are unavailable.
//! - Implementations must be `Send + Sync`: one adapter may serve concurrent resolutions.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so consumers get `MockStopGetter`,
//!   `MockStopSetter`, `MockStopDeleter` and `MockBusGetter` for tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::entity::{Bus, Stop, StopId};
use crate::error::{BusLookupError, StopLookupError, Unavailable};

/// Reads a stop from a source.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StopGetter: Send + Sync {
    /// Return the stop, or say why this source cannot.
    ///
    /// Use [`StopLookupError::NotFound`] when the stop may still exist in another source
    /// (a cache miss) and [`StopLookupError::NotExist`] only when this source is
    /// authoritative about it.
    async fn get_stop(&self, stopid: StopId) -> Result<Stop, StopLookupError>;
}

/// Writes a stop to a source (a cache, a database, a file...).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StopSetter: Send + Sync {
    async fn save_stop(&self, stop: &Stop) -> Result<(), Unavailable>;
}

/// Removes a previously saved stop from a source.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StopDeleter: Send + Sync {
    /// `true` if the stop was deleted, `false` if this source did not have it.
    async fn delete_stop(&self, stopid: StopId) -> Result<bool, Unavailable>;
}

/// Reads the buses arriving at a stop. Results need not be sorted.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BusGetter: Send + Sync {
    async fn get_buses(&self, stopid: StopId) -> Result<Vec<Bus>, BusLookupError>;
}
