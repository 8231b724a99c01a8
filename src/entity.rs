//! Validated value types for stops and buses.
//!
//! Fields are private: a [`Stop`] or [`Bus`] only comes into existence through a
//! constructor (or serde, which runs the same checks), and there are no setters.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, ValidationError};

/// Adapter-specific metadata. The core never looks inside it.
pub type Extra = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(u64);

impl StopId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for StopId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A fixed location where buses arrive, identified by its stop id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStop")]
pub struct Stop {
    stopid: StopId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    other: Extra,
}

#[derive(Deserialize)]
struct RawStop {
    stopid: StopId,
    name: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    other: Extra,
}

impl TryFrom<RawStop> for Stop {
    type Error = ValidationError;

    fn try_from(raw: RawStop) -> Result<Self, Self::Error> {
        Stop::from_parts(raw.stopid, raw.name, raw.lat, raw.lon, raw.other)
    }
}

impl Stop {
    /// A stop without a location.
    pub fn new(stopid: impl Into<StopId>, name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::from_parts(stopid, name, None, None, Extra::new())
    }

    /// A stop with both coordinates set.
    pub fn located(
        stopid: impl Into<StopId>,
        name: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(stopid, name, Some(lat), Some(lon), Extra::new())
    }

    /// Full constructor. The name is trimmed; `lat` and `lon` must be given together.
    pub fn from_parts(
        stopid: impl Into<StopId>,
        name: impl Into<String>,
        lat: Option<f64>,
        lon: Option<f64>,
        other: Extra,
    ) -> Result<Self, ValidationError> {
        let stopid = stopid.into();
        let name = required(EntityKind::Stop, "name", name.into(), Some(stopid))?;

        let (lat, lon) = match (lat, lon) {
            (None, None) => (None, None),
            (Some(lat), Some(lon)) => (
                Some(coordinate(stopid, "lat", lat, 90.0)?),
                Some(coordinate(stopid, "lon", lon, 180.0)?),
            ),
            _ => return Err(ValidationError::PartialLocation { stopid }),
        };

        Ok(Self {
            stopid,
            name,
            lat,
            lon,
            other,
        })
    }

    pub fn stopid(&self) -> StopId {
        self.stopid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lat(&self) -> Option<f64> {
        self.lat
    }

    pub fn lon(&self) -> Option<f64> {
        self.lon
    }

    pub fn other(&self) -> &Extra {
        &self.other
    }

    pub fn has_location(&self) -> bool {
        self.location().is_some()
    }

    /// `(lat, lon)` when the stop has a location.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }

    /// Great-circle distance to another stop in metres.
    pub fn distance_to(&self, other: &Stop) -> Option<f64> {
        let (lat1, lon1) = self.location()?;
        let (lat2, lon2) = other.location()?;
        Some(Point::new(lon1, lat1).haversine_distance(&Point::new(lon2, lat2)))
    }
}

/// A vehicle of some line/route arriving at a stop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBus")]
pub struct Bus {
    line: String,
    route: String,
    /// Minutes until arrival; `None` is unknown, not "already here".
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    other: Extra,
}

#[derive(Deserialize)]
struct RawBus {
    line: String,
    route: String,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    other: Extra,
}

impl TryFrom<RawBus> for Bus {
    type Error = ValidationError;

    fn try_from(raw: RawBus) -> Result<Self, Self::Error> {
        Bus::from_parts(raw.line, raw.route, raw.time, raw.distance, raw.other)
    }
}

impl Bus {
    pub fn new(
        line: impl Into<String>,
        route: impl Into<String>,
        time: Option<f64>,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(line, route, time, None, Extra::new())
    }

    /// Full constructor. Line and route are trimmed.
    pub fn from_parts(
        line: impl Into<String>,
        route: impl Into<String>,
        time: Option<f64>,
        distance: Option<f64>,
        other: Extra,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            line: required(EntityKind::Bus, "line", line.into(), None)?,
            route: required(EntityKind::Bus, "route", route.into(), None)?,
            time: time.map(|t| finite(EntityKind::Bus, "time", t)).transpose()?,
            distance: distance
                .map(|d| finite(EntityKind::Bus, "distance", d))
                .transpose()?,
            other,
        })
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn other(&self) -> &Extra {
        &self.other
    }
}

/// Ascending by time, unknown times last. Times are finite, so `-0.0` and `0.0` compare equal.
pub(crate) fn by_arrival(a: &Bus, b: &Bus) -> Ordering {
    match (a.time, b.time) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn required(
    entity: EntityKind,
    field: &'static str,
    value: String,
    stopid: Option<StopId>,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField {
            entity,
            field,
            stopid,
        });
    }
    Ok(trimmed.to_owned())
}

fn finite(entity: EntityKind, field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite {
            entity,
            field,
            value,
        })
    }
}

fn coordinate(stopid: StopId, field: &'static str, value: f64, limit: f64) -> Result<f64, ValidationError> {
    let value = finite(EntityKind::Stop, field, value)?;
    if value.abs() > limit {
        return Err(ValidationError::CoordinateOutOfRange {
            stopid,
            field,
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_trims_name() {
        let stop = Stop::new(42u64, "  Main St ").unwrap();
        assert_eq!(stop.name(), "Main St");
        assert_eq!(stop.stopid(), StopId::new(42));
        assert!(!stop.has_location());
    }

    #[test]
    fn stop_requires_name() {
        assert_eq!(
            Stop::new(1u64, "   "),
            Err(ValidationError::MissingField {
                entity: EntityKind::Stop,
                field: "name",
                stopid: Some(StopId::new(1)),
            })
        );
    }

    #[test]
    fn stop_with_only_lat_is_invalid() {
        let err = Stop::from_parts(5u64, "Plaza", Some(42.23), None, Extra::new()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::PartialLocation {
                stopid: StopId::new(5)
            }
        );

        let err = Stop::from_parts(5u64, "Plaza", None, Some(-8.72), Extra::new()).unwrap_err();
        assert!(matches!(err, ValidationError::PartialLocation { .. }));
    }

    #[test]
    fn stop_rejects_out_of_range_coordinates() {
        let err = Stop::located(5u64, "Plaza", 91.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CoordinateOutOfRange { field: "lat", .. }
        ));
        let err = Stop::located(5u64, "Plaza", 0.0, f64::NAN).unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite { field: "lon", .. }));
    }

    #[test]
    fn equality_is_structural() {
        let a = Stop::located(9u64, "Porta do Sol", 42.2378, -8.7225).unwrap();
        let b = Stop::located(9u64, "Porta do Sol", 42.2378, -8.7225).unwrap();
        let c = Stop::located(9u64, "Porta do Sol", 42.2378, -8.7226).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn distance_between_stops() {
        let a = Stop::located(1u64, "A", 42.2322022750622, -8.70379224637247).unwrap();
        let b = Stop::located(2u64, "B", 42.2334129399705, -8.72904515586103).unwrap();
        let metres = a.distance_to(&b).unwrap();
        assert!((2000.0..2200.0).contains(&metres), "got {metres}");

        let nowhere = Stop::new(3u64, "C").unwrap();
        assert_eq!(a.distance_to(&nowhere), None);
    }

    #[test]
    fn deserialising_runs_validation() {
        let ok: Stop = serde_json::from_str(r#"{"stopid": 42, "name": "Main St"}"#).unwrap();
        assert_eq!(ok, Stop::new(42u64, "Main St").unwrap());

        let bad = serde_json::from_str::<Stop>(r#"{"stopid": 42, "name": "Main St", "lat": 1.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn serialising_hides_absent_fields() {
        let bus = Bus::new("C1", "Plaza America", None).unwrap();
        let json = serde_json::to_value(&bus).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"line": "C1", "route": "Plaza America"})
        );
    }

    #[test]
    fn bus_requires_line_and_route() {
        assert!(matches!(
            Bus::new("", "Route", None),
            Err(ValidationError::MissingField { field: "line", .. })
        ));
        assert!(matches!(
            Bus::new("A", " ", Some(3.0)),
            Err(ValidationError::MissingField { field: "route", .. })
        ));
        assert!(matches!(
            Bus::new("A", "Route", Some(f64::INFINITY)),
            Err(ValidationError::NotFinite { field: "time", .. })
        ));
    }

    #[test]
    fn arrival_order_puts_unknown_last() {
        let known = Bus::new("B", "r", Some(3.0)).unwrap();
        let unknown = Bus::new("A", "r", None).unwrap();
        assert_eq!(by_arrival(&known, &unknown), Ordering::Less);
        assert_eq!(by_arrival(&unknown, &unknown), Ordering::Equal);
    }

    #[test]
    fn signed_zero_times_are_equal() {
        let zero = Bus::new("A", "r", Some(0.0)).unwrap();
        let negative_zero = Bus::new("B", "r", Some(-0.0)).unwrap();
        assert_eq!(by_arrival(&zero, &negative_zero), Ordering::Equal);
        assert_eq!(by_arrival(&negative_zero, &zero), Ordering::Equal);
    }
}
