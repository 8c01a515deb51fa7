//! Core simulation types: configuration, live state, and per-tick records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::devices::room::Room;

use super::load::LoadSummary;
use super::thermal::{RelaxationOrder, ThermalModel};

/// Thermal tick period in logical milliseconds.
pub const DEFAULT_TICK_MS: u64 = 200;
/// Tariff used until an external feed supplies one (currency/kWh).
pub const DEFAULT_TARIFF_PER_KWH: f64 = 6.0;
/// Indoor temperature at start-up (°C).
pub const DEFAULT_INDOOR_C: f64 = 25.0;
/// Outdoor temperature until a weather feed supplies one (°C).
pub const DEFAULT_OUTDOOR_C: f64 = 30.0;

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use household_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(200);
/// assert_eq!(cfg.tick_hours(), 200.0 / 3_600_000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimConfig {
    /// Thermal tick period in logical milliseconds.
    pub tick_ms: u64,
    /// Indoor temperature at start-up (°C).
    pub initial_indoor_c: f64,
    /// Outdoor temperature before any weather signal (°C).
    pub initial_outdoor_c: f64,
    /// Tariff before any tariff signal (currency/kWh).
    pub fallback_tariff_per_kwh: f64,
    /// Order of climate device application within a tick.
    pub relaxation_order: RelaxationOrder,
    /// Indoor/outdoor coupling per tick; `0.0` disables it.
    pub outdoor_coupling: f64,
}

impl SimConfig {
    /// Creates a configuration with the given tick period and defaults
    /// for everything else.
    ///
    /// # Panics
    ///
    /// Panics if `tick_ms` is zero.
    pub fn new(tick_ms: u64) -> Self {
        assert!(tick_ms > 0, "tick_ms must be > 0");
        Self {
            tick_ms,
            initial_indoor_c: DEFAULT_INDOOR_C,
            initial_outdoor_c: DEFAULT_OUTDOOR_C,
            fallback_tariff_per_kwh: DEFAULT_TARIFF_PER_KWH,
            relaxation_order: RelaxationOrder::default(),
            outdoor_coupling: 0.0,
        }
    }

    /// Duration of one tick in hours.
    pub fn tick_hours(&self) -> f64 {
        self.tick_ms as f64 / 3_600_000.0
    }

    /// Thermal model described by this configuration.
    pub fn thermal_model(&self) -> ThermalModel {
        ThermalModel::new(self.relaxation_order, self.outdoor_coupling)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_MS)
    }
}

/// Process-wide simulation values derived from, or fed into, the rooms.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    /// Indoor temperature (°C), always within 15..=35.
    pub indoor_c: f64,
    /// Outdoor temperature (°C).
    pub outdoor_c: f64,
    /// Total draw (W), recomputed after every room change.
    pub total_w: u32,
    /// Current tariff (currency/kWh).
    pub tariff_per_kwh: f64,
    /// Wall-clock time of the last update, for display only.
    pub timestamp: DateTime<Utc>,
}

/// Record of one thermal tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    /// Tick index, starting at 0.
    pub tick: u64,
    /// Logical time of the tick (ms).
    pub elapsed_ms: u64,
    /// Indoor temperature after the tick (°C).
    pub indoor_c: f64,
    /// Outdoor temperature during the tick (°C).
    pub outdoor_c: f64,
    /// Total draw (W).
    pub total_w: u32,
    /// Total draw (kW).
    pub kw: f64,
    /// Tariff (currency/kWh).
    pub tariff_per_kwh: f64,
    /// Running cost (currency/hour).
    pub cost_per_hour: f64,
    /// Number of AC and heater units with a setpoint.
    pub active_climate: usize,
    /// Sum of all fan speeds.
    pub fan_speed_total: u32,
}

impl fmt::Display for TickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick={:>5} ({:>7} ms) | indoor={:>5.2} °C  outdoor={:>5.2} °C | \
             load={:>5} W ({:.2} kW)  cost={:.2}/h @ {:.2}/kWh | climate={} fans={}",
            self.tick,
            self.elapsed_ms,
            self.indoor_c,
            self.outdoor_c,
            self.total_w,
            self.kw,
            self.cost_per_hour,
            self.tariff_per_kwh,
            self.active_climate,
            self.fan_speed_total,
        )
    }
}

/// Everything the presentation layer reads at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Rooms in layout order.
    pub rooms: Vec<Room>,
    /// Indoor temperature (°C).
    pub indoor_c: f64,
    /// Outdoor temperature (°C).
    pub outdoor_c: f64,
    /// Load and cost.
    #[serde(flatten)]
    pub load: LoadSummary,
    /// Nominal water heater setpoint while it is on (°C).
    pub water_heater_setpoint_c: Option<i32>,
    /// Thermal ticks executed so far.
    pub ticks: u64,
    /// Logical time (ms).
    pub elapsed_ms: u64,
    /// Wall-clock time of the last update.
    pub timestamp: DateTime<Utc>,
}
