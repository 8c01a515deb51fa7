//! Household device simulator.
//!
//! A room/device state store, a command processor, a thermal model, and a
//! load aggregator driven by an explicit virtual clock, plus best-effort
//! tariff and weather signals and an optional live service with a REST API.

pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod runner;
pub mod service;
pub mod signals;
/// State store, commands, thermal model, load aggregation, and engine.
pub mod sim;
pub mod telemetry;

#[cfg(feature = "api")]
pub mod api;
