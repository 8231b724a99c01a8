use std::sync::Arc;

use buses::contract::{MockBusGetter, MockStopGetter};
use buses::{
    AdapterFailure, Bus, BusLookupError, BusesError, Capability, EntityKind, Service, Stop,
    StopId, StopLookupError, Unavailable, ValidationError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn bus(line: &str, time: Option<f64>) -> Bus {
    Bus::new(line, format!("Route {line}"), time).unwrap()
}

fn lines(buses: &[Bus]) -> Vec<&str> {
    buses.iter().map(Bus::line).collect()
}

/// A service whose only stop getter knows every stop.
fn service_with_known_stops() -> Service {
    let service = Service::new("vigo-bus");
    let mut getter = MockStopGetter::new();
    getter
        .expect_get_stop()
        .returning(|stopid| Ok(Stop::new(stopid, "Gran Via")?));
    service.register_stop_getter(Arc::new(getter));
    service
}

fn bus_getter(result: Result<Vec<Bus>, BusLookupError>) -> MockBusGetter {
    let mut getter = MockBusGetter::new();
    getter
        .expect_get_buses()
        .times(1)
        .returning(move |_| result.clone());
    getter
}

#[tokio::test]
async fn test_buses_sorted_with_unknown_time_last() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![
        bus("A", None),
        bus("B", Some(3.0)),
    ]))));

    let buses = service.get_buses(42u64).await.unwrap();
    assert_eq!(buses, vec![bus("B", Some(3.0)), bus("A", None)]);
}

#[tokio::test]
async fn test_sort_is_stable_for_equal_and_unknown_times() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![
        bus("U1", None),
        bus("Z0", Some(0.0)),
        bus("T5a", Some(5.0)),
        bus("U2", None),
        bus("Z-0", Some(-0.0)),
        bus("T1", Some(1.0)),
        bus("T5b", Some(5.0)),
        bus("T2.5", Some(2.5)),
        bus("U3", None),
    ]))));

    let buses = service.get_buses(1u64).await.unwrap();
    assert_eq!(
        lines(&buses),
        vec!["Z0", "Z-0", "T1", "T2.5", "T5a", "T5b", "U1", "U2", "U3"]
    );
}

#[tokio::test]
async fn test_results_of_all_getters_are_concatenated() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![
        bus("C1", Some(12.0)),
        bus("L4", Some(2.0)),
    ]))));
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![bus("N1", Some(7.0))]))));

    let buses = service.get_buses(5800u64).await.unwrap();
    assert_eq!(lines(&buses), vec!["L4", "N1", "C1"]);
}

#[tokio::test]
async fn test_no_buses_is_an_empty_list() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![]))));
    service.register_bus_getter(Arc::new(bus_getter(Err(BusLookupError::StopNotFound))));

    let buses = service.get_buses(8u64).await.unwrap();
    assert!(buses.is_empty());
}

#[tokio::test]
async fn test_partial_outage_returns_reachable_buses() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Err(
        Unavailable::new("503").into(),
    ))));
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![bus("C3", Some(4.0))]))));

    let buses = service.get_buses(8u64).await.unwrap();
    assert_eq!(lines(&buses), vec!["C3"]);
}

#[tokio::test]
async fn test_all_bus_getters_unavailable() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Err(
        Unavailable::new("503").into(),
    ))));
    service.register_bus_getter(Arc::new(bus_getter(Err(
        Unavailable::new("timeout").into(),
    ))));

    let err = service.get_buses(8u64).await.unwrap_err();
    assert_eq!(
        err,
        BusesError::BusGetterUnavailable {
            stopid: StopId::new(8),
            failures: vec![
                AdapterFailure {
                    position: 0,
                    reason: "503".to_string()
                },
                AdapterFailure {
                    position: 1,
                    reason: "timeout".to_string()
                },
            ],
        }
    );
}

#[tokio::test]
async fn test_invalid_bus_data_ends_the_lookup() {
    init_tracing();
    let service = service_with_known_stops();
    service.register_bus_getter(Arc::new(bus_getter(Ok(vec![bus("C1", Some(2.0))]))));
    service.register_bus_getter(Arc::new(bus_getter(Err(
        ValidationError::NotFinite {
            entity: EntityKind::Bus,
            field: "time",
            value: f64::NAN,
        }
        .into(),
    ))));
    let mut later = MockBusGetter::new();
    later.expect_get_buses().never();
    service.register_bus_getter(Arc::new(later));

    let result = service.get_buses(42u64).await;
    assert!(
        matches!(
            result,
            Err(BusesError::Validation(ValidationError::NotFinite { field: "time", .. }))
        ),
        "got {result:?}"
    );
}

#[tokio::test]
async fn test_buses_for_missing_stop_never_reach_bus_getters() {
    init_tracing();
    let service = Service::new("vigo-bus");
    let mut stops = MockStopGetter::new();
    stops
        .expect_get_stop()
        .times(1)
        .returning(|_| Err(StopLookupError::NotExist));
    service.register_stop_getter(Arc::new(stops));

    let mut buses = MockBusGetter::new();
    buses.expect_get_buses().never();
    service.register_bus_getter(Arc::new(buses));

    let err = service.get_buses(404u64).await.unwrap_err();
    assert_eq!(
        err,
        BusesError::StopNotExist {
            stopid: StopId::new(404)
        }
    );
}

#[tokio::test]
async fn test_stop_not_found_propagates_as_is() {
    init_tracing();
    let service = Service::new("vigo-bus");
    let mut stops = MockStopGetter::new();
    stops
        .expect_get_stop()
        .returning(|_| Err(StopLookupError::NotFound));
    service.register_stop_getter(Arc::new(stops));

    let mut buses = MockBusGetter::new();
    buses.expect_get_buses().never();
    service.register_bus_getter(Arc::new(buses));

    let err = service.get_buses(404u64).await.unwrap_err();
    assert!(matches!(err, BusesError::StopNotFound { .. }));
}

#[tokio::test]
async fn test_no_bus_getters_is_a_configuration_error() {
    init_tracing();
    let service = service_with_known_stops();

    let err = service.get_buses(1u64).await.unwrap_err();
    assert_eq!(
        err,
        BusesError::MissingAdapters {
            entity: EntityKind::Bus,
            capability: Capability::Get,
        }
    );
}
