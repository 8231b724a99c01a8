//! Error taxonomy shared by adapters and the resolution engine.
//!
//! Adapters speak the small per-capability enums ([`StopLookupError`], [`BusLookupError`],
//! [`Unavailable`]), so a setter cannot claim a stop "does not exist" and a bus getter cannot
//! end a stop lookup. The engine translates them into the single [`BusesError`] that callers
//! of a [`crate::Service`] receive.

use std::fmt;

use serde::Serialize;

use crate::entity::StopId;

/// Which entity an error or adapter refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Stop,
    Bus,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Stop => f.write_str("stop"),
            EntityKind::Bus => f.write_str("bus"),
        }
    }
}

/// What an adapter does with an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    Get,
    Set,
    Delete,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Get => f.write_str("getter"),
            Capability::Set => f.write_str("setter"),
            Capability::Delete => f.write_str("deleter"),
        }
    }
}

/// An entity value broke its invariants. Never retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{entity} field `{field}` is required and must not be empty")]
    MissingField {
        entity: EntityKind,
        field: &'static str,
        /// Set when the entity is a stop.
        stopid: Option<StopId>,
    },

    #[error("stop {stopid} has only one of lat/lon set")]
    PartialLocation { stopid: StopId },

    #[error("{entity} field `{field}` must be a finite number, got {value}")]
    NotFinite {
        entity: EntityKind,
        field: &'static str,
        value: f64,
    },

    #[error("stop {stopid} coordinate `{field}` out of range: {value}")]
    CoordinateOutOfRange {
        stopid: StopId,
        field: &'static str,
        value: f64,
    },

    #[error("getter returned stop {returned} when asked for stop {requested}")]
    StopIdMismatch { requested: StopId, returned: StopId },
}

/// The adapter itself is broken or unreachable, independent of the data asked for.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct Unavailable {
    pub reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outcomes a stop getter may signal besides returning a [`crate::Stop`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StopLookupError {
    /// Not in this source; it may exist in another one.
    #[error("stop not found in this source")]
    NotFound,

    /// The source authoritatively knows the stop does not exist.
    #[error("stop does not exist")]
    NotExist,

    #[error("stop getter unavailable: {0}")]
    Unavailable(#[from] Unavailable),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Outcomes a bus getter may signal besides returning a list of buses.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BusLookupError {
    /// This source has no data for the stop.
    #[error("stop not found in this bus source")]
    StopNotFound,

    #[error("bus getter unavailable: {0}")]
    Unavailable(#[from] Unavailable),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// One adapter that failed during a multi-adapter operation.
///
/// `position` is the adapter's index in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterFailure {
    pub position: usize,
    pub reason: String,
}

impl AdapterFailure {
    pub(crate) fn new(position: usize, unavailable: Unavailable) -> Self {
        Self {
            position,
            reason: unavailable.reason,
        }
    }
}

impl fmt::Display for AdapterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.position, self.reason)
    }
}

struct FailureList<'a>(&'a [AdapterFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Broad categories callers usually branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorClass {
    /// No source had the stop; it may still exist.
    Absence,
    /// A source confirmed the stop does not exist.
    AuthoritativeAbsence,
    /// One or more adapters were broken or unreachable.
    Infrastructure,
    /// An entity value failed validation.
    DataQuality,
    /// The service is missing adapters for the requested operation.
    Configuration,
}

/// The error every [`crate::Service`] operation returns.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BusesError {
    /// Every stop getter was tried and none had the stop. Getters that were unavailable
    /// along the way are listed in `unavailable`.
    #[error("stop {stopid} not found in any stop getter")]
    StopNotFound {
        stopid: StopId,
        unavailable: Vec<AdapterFailure>,
    },

    #[error("stop {stopid} does not exist")]
    StopNotExist { stopid: StopId },

    #[error("stop {stopid} could not be saved on setters [{}] ({saved} saved)", FailureList(.failures))]
    StopSetterUnavailable {
        stopid: StopId,
        saved: usize,
        failures: Vec<AdapterFailure>,
    },

    #[error("stop {stopid} could not be deleted on deleters [{}] (deleted elsewhere: {deleted})", FailureList(.failures))]
    StopDeleterUnavailable {
        stopid: StopId,
        deleted: bool,
        failures: Vec<AdapterFailure>,
    },

    #[error("buses for stop {stopid} could not be retrieved from any bus getter [{}]", FailureList(.failures))]
    BusGetterUnavailable {
        stopid: StopId,
        failures: Vec<AdapterFailure>,
    },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("no {entity} {capability}s registered on this service")]
    MissingAdapters {
        entity: EntityKind,
        capability: Capability,
    },
}

impl BusesError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BusesError::StopNotFound { .. } => ErrorClass::Absence,
            BusesError::StopNotExist { .. } => ErrorClass::AuthoritativeAbsence,
            BusesError::StopSetterUnavailable { .. }
            | BusesError::StopDeleterUnavailable { .. }
            | BusesError::BusGetterUnavailable { .. } => ErrorClass::Infrastructure,
            BusesError::Validation(_) => ErrorClass::DataQuality,
            BusesError::MissingAdapters { .. } => ErrorClass::Configuration,
        }
    }

    /// The stop the failed operation was about, when there is one.
    pub fn stopid(&self) -> Option<StopId> {
        match self {
            BusesError::StopNotFound { stopid, .. }
            | BusesError::StopNotExist { stopid }
            | BusesError::StopSetterUnavailable { stopid, .. }
            | BusesError::StopDeleterUnavailable { stopid, .. }
            | BusesError::BusGetterUnavailable { stopid, .. } => Some(*stopid),
            BusesError::Validation(ValidationError::PartialLocation { stopid })
            | BusesError::Validation(ValidationError::CoordinateOutOfRange { stopid, .. }) => {
                Some(*stopid)
            }
            BusesError::Validation(ValidationError::MissingField { stopid, .. }) => *stopid,
            BusesError::Validation(ValidationError::StopIdMismatch { requested, .. }) => {
                Some(*requested)
            }
            BusesError::Validation(_) | BusesError::MissingAdapters { .. } => None,
        }
    }
}
