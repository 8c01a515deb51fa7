//! Indoor temperature update rule.
//!
//! Not a heat-transfer model: each active thermostat pulls the indoor
//! temperature a fixed fraction of the way toward its setpoint, and each
//! fan speed step shaves a fixed amount off, once per tick.

use serde::{Deserialize, Serialize};

use crate::devices::room::{ClimateKind, Room};

/// Lowest indoor temperature the model allows (°C).
pub const MIN_INDOOR_C: f64 = 15.0;
/// Highest indoor temperature the model allows (°C).
pub const MAX_INDOOR_C: f64 = 35.0;
/// Fraction of the gap to a setpoint closed per tick.
pub const RELAXATION_RATE: f64 = 0.02;
/// Cooling per fan speed step per tick (°C).
pub const FAN_COOLING_C: f64 = 0.05;

/// Order in which rooms' climate devices are applied within one tick.
///
/// Relaxations compound sequentially, so the order matters slightly when
/// several thermostats are active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationOrder {
    /// Room by room in layout order; within a room AC, then heater, then fans.
    #[default]
    PerRoom,
    /// Every room's AC, then every room's heater, then every room's fans.
    ByKind,
}

/// Parameters of the thermal update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalModel {
    /// Device application order within a tick.
    pub order: RelaxationOrder,
    /// Fraction of the indoor/outdoor gap closed per tick; `0.0` disables it.
    pub outdoor_coupling: f64,
}

impl Default for ThermalModel {
    fn default() -> Self {
        Self {
            order: RelaxationOrder::PerRoom,
            outdoor_coupling: 0.0,
        }
    }
}

impl ThermalModel {
    /// Creates a model with the given order and outdoor coupling.
    pub fn new(order: RelaxationOrder, outdoor_coupling: f64) -> Self {
        Self {
            order,
            outdoor_coupling,
        }
    }

    /// Advances the indoor temperature by one tick.
    ///
    /// # Arguments
    ///
    /// * `indoor_c` - Indoor temperature before the tick
    /// * `outdoor_c` - Current outdoor temperature (used only with coupling)
    /// * `rooms` - Rooms in layout order
    ///
    /// # Returns
    ///
    /// The new indoor temperature, clamped to
    /// [`MIN_INDOOR_C`]..=[`MAX_INDOOR_C`].
    pub fn step(&self, indoor_c: f64, outdoor_c: f64, rooms: &[Room]) -> f64 {
        let mut t = indoor_c;
        match self.order {
            RelaxationOrder::PerRoom => {
                for room in rooms {
                    t = relax(t, room, ClimateKind::Ac);
                    t = relax(t, room, ClimateKind::Heater);
                    t = cool(t, room);
                }
            }
            RelaxationOrder::ByKind => {
                t = rooms.iter().fold(t, |t, r| relax(t, r, ClimateKind::Ac));
                t = rooms.iter().fold(t, |t, r| relax(t, r, ClimateKind::Heater));
                t = rooms.iter().fold(t, cool);
            }
        }
        t += self.outdoor_coupling * (outdoor_c - t);
        t.clamp(MIN_INDOOR_C, MAX_INDOOR_C)
    }
}

fn relax(t: f64, room: &Room, kind: ClimateKind) -> f64 {
    match room.thermostat(kind).flatten() {
        Some(setpoint) => t + (f64::from(setpoint) - t) * RELAXATION_RATE,
        None => t,
    }
}

fn cool(t: f64, room: &Room) -> f64 {
    t - FAN_COOLING_C * f64::from(room.fan_speed_total())
}
