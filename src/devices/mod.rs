//! Household devices: the catalog of kinds and ratings, and room layouts.

/// Device kinds and power ratings.
pub mod catalog;
pub mod room;

pub use catalog::DeviceKind;
pub use room::{ClimateKind, Room, Slot, ToggleKind};
