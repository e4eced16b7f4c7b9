// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use crate::config::{DispatchPolicy, RouterConfig};
use crate::core::cursor::ByteCursor;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::protocol::{EventHandler, EventRouter, Priority};

#[derive(Debug, Default, PartialEq)]
struct JaneDoe {
    name: String,
}

impl Packet for JaneDoe {
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.write_string(&self.name)
    }

    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.name = cursor.read_string()?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct LisaEmber {
    age: i16,
}

impl Packet for LisaEmber {
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.write_short(self.age);
        Ok(())
    }

    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.age = cursor.read_short()?;
        Ok(())
    }
}

type Log = Arc<Mutex<Vec<&'static str>>>;

fn recorder<P: Packet>(log: &Log, priority: Priority, label: &'static str) -> EventHandler {
    let log = log.clone();
    EventHandler::on::<P, _>(priority, move |_| {
        log.lock().unwrap().push(label);
        Ok(())
    })
    .with_id(label)
}

fn global_recorder(log: &Log, priority: Priority, label: &'static str) -> EventHandler {
    let log = log.clone();
    EventHandler::any(priority, move |_| {
        log.lock().unwrap().push(label);
        Ok(())
    })
    .with_id(label)
}

fn failing<P: Packet>(log: &Log, priority: Priority, label: &'static str) -> EventHandler {
    let log = log.clone();
    EventHandler::on::<P, _>(priority, move |_| {
        log.lock().unwrap().push(label);
        Err(ProtocolError::Handler {
            id: label.to_string(),
            reason: "boom".to_string(),
        })
    })
    .with_id(label)
}

#[test]
fn test_dispatch_order_global_then_tiers() {
    let log = Log::default();
    let mut router = EventRouter::new();

    // registered out of order on purpose
    router.register(recorder::<JaneDoe>(&log, Priority::Low, "C")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::High, "A")).unwrap();
    router.register(global_recorder(&log, Priority::Low, "G")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::Medium, "B")).unwrap();

    router.dispatch(&JaneDoe::default()).unwrap();
    assert_eq!(*log.lock().unwrap(), ["G", "A", "B", "C"]);
}

#[test]
fn test_global_tiers_run_in_priority_order() {
    let log = Log::default();
    let mut router = EventRouter::new();
    router.register(global_recorder(&log, Priority::Low, "g-low")).unwrap();
    router.register(global_recorder(&log, Priority::High, "g-high")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::High, "A")).unwrap();

    router.dispatch(&JaneDoe::default()).unwrap();
    assert_eq!(*log.lock().unwrap(), ["g-high", "g-low", "A"]);
}

#[test]
fn test_dispatch_isolation() {
    let log = Log::default();
    let mut router = EventRouter::new();
    router.register(global_recorder(&log, Priority::Medium, "G")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::High, "A")).unwrap();

    router.dispatch(&LisaEmber { age: 3 }).unwrap();
    assert_eq!(*log.lock().unwrap(), ["G"]);
    assert!(!router.has_handlers_for::<LisaEmber>());
}

#[test]
fn test_empty_router_dispatch_is_noop() {
    EventRouter::new().dispatch(&LisaEmber::default()).unwrap();
}

#[test]
fn test_identifier_collision_has_no_effect() {
    let log = Log::default();
    let mut router = EventRouter::new();
    router.register(recorder::<JaneDoe>(&log, Priority::Low, "dup")).unwrap();

    let err = router
        .register(recorder::<JaneDoe>(&log, Priority::High, "dup"))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::IdentifierCollision(id) if id == "dup"));
    assert_eq!(router.handler_count(), 1);

    router.dispatch(&JaneDoe::default()).unwrap();
    assert_eq!(*log.lock().unwrap(), ["dup"]);
}

#[test]
fn test_same_identifier_in_different_lists() {
    let log = Log::default();
    let mut router = EventRouter::new();
    router.register(recorder::<JaneDoe>(&log, Priority::Low, "shared")).unwrap();
    router.register(recorder::<LisaEmber>(&log, Priority::Low, "shared")).unwrap();
    router.register(global_recorder(&log, Priority::Low, "shared")).unwrap();
    assert_eq!(router.handler_count(), 3);
}

#[test]
fn test_handlers_receive_typed_packet() {
    let seen = Arc::new(Mutex::new(String::new()));
    let mut router = EventRouter::new();
    let sink = seen.clone();
    router
        .register(EventHandler::on::<JaneDoe, _>(Priority::High, move |packet| {
            sink.lock().unwrap().push_str(&packet.name);
            Ok(())
        }))
        .unwrap();

    router
        .dispatch(&JaneDoe {
            name: "Jane Doe".into(),
        })
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), "Jane Doe");
}

#[test]
fn test_fail_fast_keeps_earlier_effects() {
    let log = Log::default();
    let mut router = EventRouter::new();
    router.register(global_recorder(&log, Priority::High, "G")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::High, "A")).unwrap();
    router.register(failing::<JaneDoe>(&log, Priority::Medium, "B")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::Low, "C")).unwrap();

    let err = router.dispatch(&JaneDoe::default()).unwrap_err();
    assert!(matches!(err, ProtocolError::Handler { ref id, .. } if id == "B"));
    assert_eq!(*log.lock().unwrap(), ["G", "A", "B"]);
}

#[test]
fn test_run_all_returns_first_error() {
    let log = Log::default();
    let mut router = EventRouter::with_config(RouterConfig {
        dispatch_policy: DispatchPolicy::RunAll,
    });
    router.register(failing::<JaneDoe>(&log, Priority::High, "A")).unwrap();
    router.register(failing::<JaneDoe>(&log, Priority::Medium, "B")).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::Low, "C")).unwrap();

    let err = router.dispatch(&JaneDoe::default()).unwrap_err();
    assert!(matches!(err, ProtocolError::Handler { ref id, .. } if id == "A"));
    assert_eq!(*log.lock().unwrap(), ["A", "B", "C"]);
}

#[test]
fn test_failing_global_handler_stops_fail_fast_dispatch() {
    let log = Log::default();
    let mut router = EventRouter::new();
    let failing_global = {
        let log = log.clone();
        EventHandler::any(Priority::Low, move |_| {
            log.lock().unwrap().push("G");
            Err(ProtocolError::Custom("global".into()))
        })
    };
    router.register(failing_global).unwrap();
    router.register(recorder::<JaneDoe>(&log, Priority::High, "A")).unwrap();

    assert!(router.dispatch(&JaneDoe::default()).is_err());
    assert_eq!(*log.lock().unwrap(), ["G"]);
}
