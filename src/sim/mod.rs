/// Virtual clock and fixed-period schedules.
pub mod clock;
pub mod commands;
pub mod engine;
pub mod load;
pub mod report;
/// Room/device state store.
pub mod store;
pub mod thermal;
pub mod types;
