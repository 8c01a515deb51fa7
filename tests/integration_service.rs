//! Integration tests for the live simulation service.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use household_sim::devices::ClimateKind;
use household_sim::error::SimError;
use household_sim::service::{MAX_HISTORY, Service, ServiceError};
use household_sim::signals::{ScheduledSource, SignalKind};
use household_sim::sim::commands::Command;

#[tokio::test(start_paused = true)]
async fn ticker_drives_thermal_ticks() {
    let service = Service::spawn(common::default_engine(), Vec::new());
    let handle = service.handle();

    handle
        .command(Command::AdjustThermostat {
            room: "Hall".into(),
            kind: ClimateKind::Heater,
            delta: 0,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1_050)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.ticks, 5);
    assert!(snap.indoor_c < 25.0);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn commands_return_snapshot_and_errors() {
    let service = Service::spawn_manual(common::default_engine(), Vec::new());
    let handle = service.handle();

    let snap = handle
        .command(Command::ToggleWaterHeater {
            room: "Bathroom".into(),
        })
        .await
        .unwrap();
    assert_eq!(snap.load.total_w, 1500);

    let err = handle
        .command(Command::ToggleTv {
            room: "Bathroom".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Sim(SimError::InvalidSlot { .. })));

    let err = handle.room("Cellar").await.unwrap_err();
    assert_eq!(err, ServiceError::Sim(SimError::NotFound("Cellar".into())));

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn load_watch_sees_changes() {
    let service = Service::spawn_manual(common::default_engine(), Vec::new());
    let handle = service.handle();
    let mut load = handle.subscribe_load();
    assert_eq!(load.borrow().total_w, 0);

    handle
        .command(Command::ToggleLight {
            room: "Kitchen".into(),
            index: None,
        })
        .await
        .unwrap();
    load.changed().await.unwrap();
    assert_eq!(load.borrow_and_update().total_w, 15);

    handle.ingest(SignalKind::Tariff, Ok(10.0)).await.unwrap();
    load.changed().await.unwrap();
    assert_eq!(load.borrow().tariff_per_kwh, 10.0);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sources_feed_the_engine_periodically() {
    let tariff = common::FixedSource::new(SignalKind::Tariff, 8.25);
    let fetches = tariff.fetches.clone();
    let sources = vec![
        ScheduledSource::new(tariff, Duration::from_secs(60)),
        ScheduledSource::new(
            common::FailingSource(SignalKind::OutdoorTemp),
            Duration::from_secs(600),
        ),
    ];
    let service = Service::spawn_manual(common::default_engine(), sources);
    let handle = service.handle();

    // first poll happens at start-up
    tokio::time::sleep(Duration::from_millis(10)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.load.tariff_per_kwh, 8.25);
    assert_eq!(snap.outdoor_c, 30.0);

    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(handle.snapshot().await.unwrap().outdoor_c, 30.0);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn telemetry_keeps_rolling_window() {
    let service = Service::spawn_manual(common::default_engine(), Vec::new());
    let handle = service.handle();

    handle.advance(200 * (MAX_HISTORY as u64 + 50)).await.unwrap();
    let rows = handle.telemetry().await.unwrap();
    assert_eq!(rows.len(), MAX_HISTORY);
    assert_eq!(rows[0].tick, 50);
    assert_eq!(rows[MAX_HISTORY - 1].tick, MAX_HISTORY as u64 + 49);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn handle_reports_stopped_after_shutdown() {
    let service = Service::spawn(common::default_engine(), Vec::new());
    let handle = service.handle();
    service.shutdown().await;

    assert_eq!(handle.snapshot().await.unwrap_err(), ServiceError::Stopped);
}
