//! Resolution engine: walks a [`Registry`] and applies the fallback rules.
//!
//! Every operation here works on a registry snapshot and performs no I/O of its own;
//! all waiting happens inside the adapters.
//!
//! # Stops
//! Getters are tried in registration order. A stop ends the walk; so does a getter that
//! authoritatively says the stop does not exist, or one that hands back invalid data.
//! "Not found here" and "unavailable" move on to the next getter. If every getter is used
//! up that way the result is [`BusesError::StopNotFound`]: no source having the stop does
//! not prove it does not exist.
//!
//! # Buses
//! The stop is resolved first. Then **every** bus getter is asked and their results are
//! concatenated, since separate sources commonly cover separate lines. A getter that
//! does not know the stop contributes nothing. Only when all getters are unavailable is
//! the call an error. The combined list is sorted by arrival time, unknown times last,
//! keeping source order among equal times.
//!
//! # Writes
//! Setters and deleters are not alternatives but independent stores, so each one is
//! called. Failures are collected and reported together once every adapter has been
//! tried; the adapters that succeeded keep their writes.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::config::WritePolicy;
use crate::entity::{by_arrival, Bus, Stop, StopId};
use crate::error::{
    AdapterFailure, BusLookupError, BusesError, Capability, EntityKind, StopLookupError,
    ValidationError,
};
use crate::contract::StopSetter;
use crate::registry::{AdapterList, Registry};

/// What one adapter call means for the walk.
enum Step<T> {
    Success(T),
    TryNext,
    Terminal(BusesError),
}

fn missing(entity: EntityKind, capability: Capability) -> BusesError {
    error!(%entity, %capability, "No adapters registered for operation");
    BusesError::MissingAdapters { entity, capability }
}

/// Find `stopid` using the stop getters.
pub async fn resolve_stop(registry: &Registry, stopid: StopId) -> Result<Stop, BusesError> {
    let getters = registry.stop_getters();
    if getters.is_empty() {
        return Err(missing(EntityKind::Stop, Capability::Get));
    }

    let mut unavailable = Vec::new();

    for (position, getter) in getters.iter().enumerate() {
        let step = match getter.get_stop(stopid).await {
            Ok(stop) if stop.stopid() != stopid => {
                error!(%stopid, returned = %stop.stopid(), position, "Stop getter returned a different stop");
                Step::Terminal(
                    ValidationError::StopIdMismatch {
                        requested: stopid,
                        returned: stop.stopid(),
                    }
                    .into(),
                )
            }
            Ok(stop) => Step::Success(stop),
            Err(StopLookupError::NotFound) => {
                debug!(%stopid, position, "Stop not found by getter, trying next");
                Step::TryNext
            }
            Err(StopLookupError::Unavailable(e)) => {
                warn!(%stopid, position, error = %e, "Stop getter unavailable, trying next");
                unavailable.push(AdapterFailure::new(position, e));
                Step::TryNext
            }
            Err(StopLookupError::NotExist) => {
                info!(%stopid, position, "Stop getter reported stop does not exist");
                Step::Terminal(BusesError::StopNotExist { stopid })
            }
            Err(StopLookupError::Invalid(e)) => {
                error!(%stopid, position, error = %e, "Stop getter produced invalid data");
                Step::Terminal(e.into())
            }
        };

        match step {
            Step::Success(stop) => {
                info!(%stopid, name = %stop.name(), position, "Stop resolved");
                return Ok(stop);
            }
            Step::TryNext => continue,
            Step::Terminal(e) => return Err(e),
        }
    }

    info!(%stopid, unavailable = unavailable.len(), "Stop not found in any getter");
    Err(BusesError::StopNotFound {
        stopid,
        unavailable,
    })
}

/// Collect the buses arriving at `stopid` from every bus getter, sorted by arrival.
pub async fn resolve_buses(registry: &Registry, stopid: StopId) -> Result<Vec<Bus>, BusesError> {
    let getters = registry.bus_getters();
    if getters.is_empty() {
        return Err(missing(EntityKind::Bus, Capability::Get));
    }

    resolve_stop(registry, stopid).await?;

    let mut buses = Vec::new();
    let mut failures = Vec::new();

    for (position, getter) in getters.iter().enumerate() {
        let step = match getter.get_buses(stopid).await {
            Ok(found) => Step::Success(found),
            Err(BusLookupError::StopNotFound) => {
                debug!(%stopid, position, "Bus getter has no data for stop");
                Step::TryNext
            }
            Err(BusLookupError::Unavailable(e)) => {
                warn!(%stopid, position, error = %e, "Bus getter unavailable");
                failures.push(AdapterFailure::new(position, e));
                Step::TryNext
            }
            Err(BusLookupError::Invalid(e)) => {
                error!(%stopid, position, error = %e, "Bus getter produced invalid data");
                Step::Terminal(e.into())
            }
        };

        match step {
            Step::Success(found) => {
                debug!(%stopid, position, count = found.len(), "Bus getter returned buses");
                buses.extend(found);
            }
            Step::TryNext => continue,
            Step::Terminal(e) => return Err(e),
        }
    }

    if failures.len() == getters.len() {
        warn!(%stopid, "No bus getter could be reached");
        return Err(BusesError::BusGetterUnavailable { stopid, failures });
    }
    if !failures.is_empty() {
        warn!(%stopid, failed = failures.len(), "Returning buses from the reachable getters only");
    }

    sort_by_arrival(&mut buses);
    info!(%stopid, count = buses.len(), "Buses resolved");
    Ok(buses)
}

/// Stable sort: ascending `time`, buses with unknown time last in their original order.
pub fn sort_by_arrival(buses: &mut [Bus]) {
    buses.sort_by(by_arrival);
}

/// Save `stop` on the stop setters according to `policy`.
pub async fn apply_setter(
    registry: &Registry,
    stop: &Stop,
    policy: WritePolicy,
) -> Result<(), BusesError> {
    let setters = registry.stop_setters();
    if setters.is_empty() {
        return Err(missing(EntityKind::Stop, Capability::Set));
    }
    let stopid = stop.stopid();

    let (saved, failures) = match policy {
        WritePolicy::Everywhere => {
            let results = join_all(setters.iter().map(|setter| setter.save_stop(stop))).await;
            let mut saved = 0;
            let mut failures = Vec::new();
            for (position, result) in results.into_iter().enumerate() {
                match result {
                    Ok(()) => saved += 1,
                    Err(e) => {
                        warn!(%stopid, position, error = %e, "Stop setter unavailable");
                        failures.push(AdapterFailure::new(position, e));
                    }
                }
            }
            (saved, failures)
        }
        WritePolicy::FirstSuccess => first_success(setters, stop).await,
    };

    if failures.is_empty() {
        info!(%stopid, saved, "Stop saved");
        Ok(())
    } else {
        warn!(%stopid, saved, failed = failures.len(), "Stop not saved everywhere");
        Err(BusesError::StopSetterUnavailable {
            stopid,
            saved,
            failures,
        })
    }
}

/// Try setters in order until one saves. A save makes earlier failures irrelevant.
async fn first_success(
    setters: &AdapterList<dyn StopSetter>,
    stop: &Stop,
) -> (usize, Vec<AdapterFailure>) {
    let stopid = stop.stopid();
    let mut failures = Vec::new();
    for (position, setter) in setters.iter().enumerate() {
        match setter.save_stop(stop).await {
            Ok(()) => {
                debug!(%stopid, position, skipped = failures.len(), "Stop saved by setter");
                return (1, Vec::new());
            }
            Err(e) => {
                warn!(%stopid, position, error = %e, "Stop setter unavailable, trying next");
                failures.push(AdapterFailure::new(position, e));
            }
        }
    }
    (0, failures)
}

/// Delete `stopid` from every stop deleter. `true` if any of them deleted it.
pub async fn apply_deleter(registry: &Registry, stopid: StopId) -> Result<bool, BusesError> {
    let deleters = registry.stop_deleters();
    if deleters.is_empty() {
        return Err(missing(EntityKind::Stop, Capability::Delete));
    }

    let results = join_all(deleters.iter().map(|deleter| deleter.delete_stop(stopid))).await;

    let mut deleted = false;
    let mut failures = Vec::new();
    for (position, result) in results.into_iter().enumerate() {
        match result {
            Ok(true) => {
                debug!(%stopid, position, "Stop deleted by deleter");
                deleted = true;
            }
            Ok(false) => debug!(%stopid, position, "Stop not present in deleter"),
            Err(e) => {
                warn!(%stopid, position, error = %e, "Stop deleter unavailable");
                failures.push(AdapterFailure::new(position, e));
            }
        }
    }

    if failures.is_empty() {
        info!(%stopid, deleted, "Stop delete finished");
        Ok(deleted)
    } else {
        Err(BusesError::StopDeleterUnavailable {
            stopid,
            deleted,
            failures,
        })
    }
}

/// A not-found answer reached while some getters were down.
fn inconclusive(error: &BusesError) -> bool {
    matches!(error, BusesError::StopNotFound { unavailable, .. } if !unavailable.is_empty())
}

/// Result of probing a range of stop ids. Every list is ordered by stop id.
#[derive(Debug, Default)]
pub struct StopScan {
    pub found: Vec<Stop>,
    /// Ids every getter answered for without having them, or that a getter said do not exist.
    pub missing: Vec<StopId>,
    /// Ids whose lookup failed for another reason: invalid data, or getters unavailable.
    pub failed: Vec<(StopId, BusesError)>,
}

/// Resolve every id in `stopids`, keeping up to `concurrency` lookups in flight.
pub async fn scan_stops<I>(
    registry: &Registry,
    stopids: I,
    concurrency: usize,
) -> Result<StopScan, BusesError>
where
    I: IntoIterator<Item = StopId>,
{
    if registry.stop_getters().is_empty() {
        return Err(missing(EntityKind::Stop, Capability::Get));
    }

    let mut outcomes: Vec<(StopId, Result<Stop, BusesError>)> = stream::iter(stopids)
        .map(|stopid| async move { (stopid, resolve_stop(registry, stopid).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    outcomes.sort_by_key(|(stopid, _)| *stopid);

    let mut scan = StopScan::default();
    for (stopid, outcome) in outcomes {
        match outcome {
            Ok(stop) => scan.found.push(stop),
            Err(e) if inconclusive(&e) => scan.failed.push((stopid, e)),
            Err(BusesError::StopNotFound { .. } | BusesError::StopNotExist { .. }) => {
                scan.missing.push(stopid)
            }
            Err(e) => scan.failed.push((stopid, e)),
        }
    }

    info!(
        found = scan.found.len(),
        missing = scan.missing.len(),
        failed = scan.failed.len(),
        "Stop scan finished"
    );
    Ok(scan)
}
