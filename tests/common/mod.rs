//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use household_sim::devices::ClimateKind;
use household_sim::signals::{FetchFuture, SignalError, SignalKind, SignalSource};
use household_sim::sim::engine::Engine;
use household_sim::sim::types::SimConfig;

/// Default engine: standard household, 200 ms ticks, 25 °C inside,
/// 30 °C outside, tariff 6.
pub fn default_engine() -> Engine {
    Engine::new(SimConfig::default())
}

/// Switches a room's thermostat on and walks it to `setpoint`.
pub fn set_thermostat(engine: &mut Engine, room: &str, kind: ClimateKind, setpoint: i32) {
    engine
        .adjust_thermostat(room, kind, 0)
        .expect("room should have this thermostat");
    let current = engine
        .room(room)
        .ok()
        .and_then(|r| r.thermostat(kind).flatten())
        .expect("thermostat should be on");
    engine
        .adjust_thermostat(room, kind, setpoint - current)
        .expect("adjust should succeed");
}

/// Source that always returns the same value and counts its fetches.
pub struct FixedSource {
    pub kind: SignalKind,
    pub value: f64,
    pub fetches: Arc<AtomicUsize>,
}

impl FixedSource {
    pub fn new(kind: SignalKind, value: f64) -> Self {
        Self {
            kind,
            value,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SignalSource for FixedSource {
    fn kind(&self) -> SignalKind {
        self.kind
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn fetch(&self) -> FetchFuture<'_> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(Ok(self.value)))
    }
}

/// Source whose every fetch fails with an HTTP 503.
pub struct FailingSource(pub SignalKind);

impl SignalSource for FailingSource {
    fn kind(&self) -> SignalKind {
        self.0
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(future::ready(Err(SignalError::Status(503))))
    }
}
