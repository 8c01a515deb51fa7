//! Load aggregation and running cost.

use serde::Serialize;

use crate::devices::catalog::DeviceKind;
use crate::devices::room::{Room, Slot};

/// Power draw of a single slot in watts.
///
/// Climate devices draw their full rating whenever a setpoint is present;
/// the setpoint value itself does not change the draw.
pub fn slot_load_w(slot: &Slot) -> u32 {
    match slot {
        Slot::LightArray { .. } | Slot::LightSingle { .. } => {
            slot.lights_on() as u32 * DeviceKind::Light.rating_w()
        }
        Slot::FanArray { .. } | Slot::FanSingle { .. } => {
            slot.fan_speed_total() * DeviceKind::FanUnit.rating_w()
        }
        Slot::Thermostat { kind, setpoint } => {
            if setpoint.is_some() {
                kind.device().rating_w()
            } else {
                0
            }
        }
        Slot::Toggle { kind, on } => {
            if *on {
                kind.device().rating_w()
            } else {
                0
            }
        }
    }
}

/// Power draw of every slot in `room`, in watts.
pub fn room_load_w(room: &Room) -> u32 {
    room.slots().iter().map(slot_load_w).sum()
}

/// Total household draw in watts.
pub fn total_load_w<'a>(rooms: impl IntoIterator<Item = &'a Room>) -> u32 {
    rooms.into_iter().map(room_load_w).sum()
}

/// Running cost per hour at `tariff_per_kwh` for a draw of `total_w`.
///
/// # Examples
///
/// ```
/// use household_sim::sim::load::cost_per_hour;
///
/// assert!((cost_per_hour(1500, 6.0) - 9.0).abs() < 1e-9);
/// ```
pub fn cost_per_hour(total_w: u32, tariff_per_kwh: f64) -> f64 {
    f64::from(total_w) / 1000.0 * tariff_per_kwh
}

/// Aggregated load and derived cost at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadSummary {
    /// Total draw (W).
    pub total_w: u32,
    /// Total draw (kW).
    pub kw: f64,
    /// Tariff used for the cost (currency/kWh).
    pub tariff_per_kwh: f64,
    /// Running cost (currency/hour).
    pub cost_per_hour: f64,
}

impl LoadSummary {
    /// Builds a summary from an already aggregated draw.
    pub fn from_watts(total_w: u32, tariff_per_kwh: f64) -> Self {
        Self {
            total_w,
            kw: f64::from(total_w) / 1000.0,
            tariff_per_kwh,
            cost_per_hour: cost_per_hour(total_w, tariff_per_kwh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::room::{ClimateKind, ToggleKind, household_layout};

    #[test]
    fn all_off_is_zero() {
        assert_eq!(total_load_w(&household_layout()), 0);
    }

    #[test]
    fn climate_draw_ignores_setpoint() {
        let cold = Slot::Thermostat {
            kind: ClimateKind::Ac,
            setpoint: Some(18),
        };
        let warm = Slot::Thermostat {
            kind: ClimateKind::Ac,
            setpoint: Some(30),
        };
        assert_eq!(slot_load_w(&cold), 1500);
        assert_eq!(slot_load_w(&warm), 1500);
        assert_eq!(slot_load_w(&Slot::thermostat(ClimateKind::Heater)), 0);
    }

    #[test]
    fn mixed_room_sums_every_slot() {
        let room = Room::new(
            "Mixed",
            vec![
                Slot::LightArray {
                    on: vec![true, true],
                },
                Slot::FanSingle { speed: 2 },
                Slot::Thermostat {
                    kind: ClimateKind::Heater,
                    setpoint: Some(22),
                },
                Slot::Toggle {
                    kind: ToggleKind::Tv,
                    on: true,
                },
                Slot::Toggle {
                    kind: ToggleKind::WaterHeater,
                    on: true,
                },
            ],
        );
        // 2*15 + 2*40 + 2000 + 100 + 1500
        assert_eq!(room_load_w(&room), 3710);
    }

    #[test]
    fn summary_derives_kw_and_cost() {
        let s = LoadSummary::from_watts(1500, 6.0);
        assert!((s.kw - 1.5).abs() < 1e-12);
        assert!((s.cost_per_hour - 9.0).abs() < 1e-12);
        assert_eq!(format!("{:.2}", s.cost_per_hour), "9.00");
    }
}
