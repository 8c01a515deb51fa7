//! Command processor: validated device mutations.
//!
//! Each operation takes the current [`Room`], returns the updated copy,
//! and leaves the write-back to [`execute`], so a failed command never
//! touches the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::devices::room::{ClimateKind, MAX_FAN_SPEED, Room, Slot, ToggleKind};
use crate::error::SimError;

use super::store::RoomStore;

/// A device-control request addressed to one room.
///
/// Serialized with an `action` tag so the same shape works in scenario
/// scripts and API request bodies:
///
/// ```
/// use household_sim::sim::commands::Command;
///
/// let cmd: Command =
///     serde_json::from_str(r#"{"action":"toggle_light","room":"Hall","index":1}"#).unwrap();
/// assert_eq!(cmd.room(), "Hall");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Flip a light; `index` addresses a light row, `None` the lone light.
    ToggleLight {
        room: String,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Step a fan by `delta`; `delta == 0` switches it off.
    ChangeFanSpeed {
        room: String,
        #[serde(default)]
        index: Option<usize>,
        delta: i32,
    },
    /// Nudge a thermostat, or switch it on at its default if off.
    AdjustThermostat {
        room: String,
        kind: ClimateKind,
        delta: i32,
    },
    /// Clear a thermostat's setpoint.
    TurnOffThermostat { room: String, kind: ClimateKind },
    /// Flip the television.
    ToggleTv { room: String },
    /// Flip the water heater.
    ToggleWaterHeater { room: String },
}

impl Command {
    /// Name of the room this command targets.
    pub fn room(&self) -> &str {
        match self {
            Command::ToggleLight { room, .. }
            | Command::ChangeFanSpeed { room, .. }
            | Command::AdjustThermostat { room, .. }
            | Command::TurnOffThermostat { room, .. }
            | Command::ToggleTv { room }
            | Command::ToggleWaterHeater { room } => room,
        }
    }

    /// Computes the updated room without writing it anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidSlot`] if `room` lacks the addressed slot.
    pub fn apply_to(&self, room: &Room) -> Result<Room, SimError> {
        match self {
            Command::ToggleLight { index, .. } => toggle_light(room, *index),
            Command::ChangeFanSpeed { index, delta, .. } => change_fan_speed(room, *index, *delta),
            Command::AdjustThermostat { kind, delta, .. } => adjust_thermostat(room, *kind, *delta),
            Command::TurnOffThermostat { kind, .. } => turn_off_thermostat(room, *kind),
            Command::ToggleTv { .. } => toggle_appliance(room, ToggleKind::Tv),
            Command::ToggleWaterHeater { .. } => toggle_appliance(room, ToggleKind::WaterHeater),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ToggleLight { room, index: Some(i) } => write!(f, "toggle {room} light #{i}"),
            Command::ToggleLight { room, index: None } => write!(f, "toggle {room} light"),
            Command::ChangeFanSpeed {
                room,
                index,
                delta,
            } => match index {
                Some(i) => write!(f, "fan {room} #{i} {delta:+}"),
                None => write!(f, "fan {room} {delta:+}"),
            },
            Command::AdjustThermostat { room, kind, delta } => {
                write!(f, "{} {room} {delta:+}", kind.device())
            }
            Command::TurnOffThermostat { room, kind } => write!(f, "{} {room} off", kind.device()),
            Command::ToggleTv { room } => write!(f, "toggle {room} tv"),
            Command::ToggleWaterHeater { room } => write!(f, "toggle {room} water heater"),
        }
    }
}

/// A command scheduled for a headless run, applied just before tick
/// `at_tick`.
///
/// In a scenario file:
///
/// ```toml
/// [[script]]
/// at_tick = 10
/// command = { action = "adjust_thermostat", room = "Hall", kind = "ac", delta = -2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedCommand {
    /// Index of the tick this command precedes (0 = before the first).
    pub at_tick: u64,
    /// The command to apply.
    pub command: Command,
}

/// Reads, updates, and writes back the room targeted by `command`.
///
/// # Errors
///
/// Returns [`SimError::NotFound`] for an unknown room and
/// [`SimError::InvalidSlot`] for a missing slot; the store is unchanged.
pub fn execute(store: &mut RoomStore, command: &Command) -> Result<(), SimError> {
    let name = command.room();
    let updated = command.apply_to(store.room(name)?)?;
    store.set(name, updated)
}

/// Flips light `index` of the room's light row, or its lone light when
/// `index` is `None`.
///
/// # Errors
///
/// Returns [`SimError::InvalidSlot`] if the addressed light does not exist.
pub fn toggle_light(room: &Room, index: Option<usize>) -> Result<Room, SimError> {
    let mut next = room.clone();
    let flipped = next.slots_mut().iter_mut().find_map(|slot| match (slot, index) {
        (Slot::LightArray { on }, Some(i)) => on.get_mut(i).map(|b| *b = !*b),
        (Slot::LightSingle { on }, None) => {
            *on = !*on;
            Some(())
        }
        _ => None,
    });
    match flipped {
        Some(()) => Ok(next),
        None => Err(SimError::invalid_slot(room.name(), light_label(index))),
    }
}

/// Changes a fan's speed by `delta`, clamped to `0..=3`; `delta == 0`
/// switches the fan off.
///
/// # Errors
///
/// Returns [`SimError::InvalidSlot`] if the addressed fan does not exist.
pub fn change_fan_speed(room: &Room, index: Option<usize>, delta: i32) -> Result<Room, SimError> {
    let step = |speed: &mut u8| {
        *speed = if delta == 0 {
            0
        } else {
            i32::from(*speed).saturating_add(delta).clamp(0, i32::from(MAX_FAN_SPEED)) as u8
        };
    };

    let mut next = room.clone();
    let changed = next.slots_mut().iter_mut().find_map(|slot| match (slot, index) {
        (Slot::FanArray { speeds }, Some(i)) => speeds.get_mut(i).map(|s| step(s)),
        (Slot::FanSingle { speed }, None) => {
            step(speed);
            Some(())
        }
        _ => None,
    });
    match changed {
        Some(()) => Ok(next),
        None => Err(SimError::invalid_slot(room.name(), fan_label(index))),
    }
}

/// Adjusts a thermostat by `delta` within its kind's bounds.
///
/// A thermostat that is off ignores `delta` and comes on at its default
/// setpoint (26 °C for an AC, 22 °C for a heater).
///
/// # Errors
///
/// Returns [`SimError::InvalidSlot`] if the room has no such thermostat.
pub fn adjust_thermostat(room: &Room, kind: ClimateKind, delta: i32) -> Result<Room, SimError> {
    update_thermostat(room, kind, |current| match current {
        None => Some(kind.default_setpoint()),
        Some(c) => Some(kind.clamp_setpoint(c.saturating_add(delta))),
    })
}

/// Switches a thermostat off. Idempotent.
///
/// # Errors
///
/// Returns [`SimError::InvalidSlot`] if the room has no such thermostat.
pub fn turn_off_thermostat(room: &Room, kind: ClimateKind) -> Result<Room, SimError> {
    update_thermostat(room, kind, |_| None)
}

/// Flips a TV or water heater.
///
/// # Errors
///
/// Returns [`SimError::InvalidSlot`] if the room has no such appliance.
pub fn toggle_appliance(room: &Room, kind: ToggleKind) -> Result<Room, SimError> {
    let mut next = room.clone();
    let flipped = next.slots_mut().iter_mut().find_map(|slot| match slot {
        Slot::Toggle { kind: k, on } if *k == kind => {
            *on = !*on;
            Some(())
        }
        _ => None,
    });
    match flipped {
        Some(()) => Ok(next),
        None => Err(SimError::invalid_slot(room.name(), kind.device().label())),
    }
}

fn update_thermostat(
    room: &Room,
    kind: ClimateKind,
    f: impl FnOnce(Option<i32>) -> Option<i32>,
) -> Result<Room, SimError> {
    let mut next = room.clone();
    let slot = next.slots_mut().iter_mut().find_map(|slot| match slot {
        Slot::Thermostat { kind: k, setpoint } if *k == kind => Some(setpoint),
        _ => None,
    });
    match slot {
        Some(setpoint) => {
            *setpoint = f(*setpoint);
            Ok(next)
        }
        None => Err(SimError::invalid_slot(room.name(), kind.device().label())),
    }
}

fn light_label(index: Option<usize>) -> String {
    match index {
        Some(i) => format!("light #{i}"),
        None => "single light".to_string(),
    }
}

fn fan_label(index: Option<usize>) -> String {
    match index {
        Some(i) => format!("fan #{i}"),
        None => "single fan".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(store: &RoomStore, name: &str) -> Room {
        store.get(name).unwrap()
    }

    #[test]
    fn toggle_light_by_index() {
        let store = RoomStore::household();
        let hall = toggle_light(&room(&store, "Hall"), Some(1)).unwrap();
        assert_eq!(
            hall.slots()[0],
            Slot::LightArray {
                on: vec![false, true]
            }
        );
    }

    #[test]
    fn toggle_single_light() {
        let store = RoomStore::household();
        let kitchen = toggle_light(&room(&store, "Kitchen"), None).unwrap();
        assert_eq!(kitchen.lights_on(), 1);
    }

    #[test]
    fn toggle_light_wrong_addressing_is_invalid_slot() {
        let store = RoomStore::household();
        assert!(matches!(
            toggle_light(&room(&store, "Kitchen"), Some(0)),
            Err(SimError::InvalidSlot { .. })
        ));
        assert!(matches!(
            toggle_light(&room(&store, "Hall"), None),
            Err(SimError::InvalidSlot { .. })
        ));
        assert!(matches!(
            toggle_light(&room(&store, "Hall"), Some(2)),
            Err(SimError::InvalidSlot { .. })
        ));
    }

    #[test]
    fn fan_speed_clamps_and_zero_delta_stops() {
        let store = RoomStore::household();
        let mut bedroom = room(&store, "Bedroom");
        for _ in 0..5 {
            bedroom = change_fan_speed(&bedroom, None, 1).unwrap();
        }
        assert_eq!(bedroom.fan_speed_total(), 3);

        let slower = change_fan_speed(&bedroom, None, -10).unwrap();
        assert_eq!(slower.fan_speed_total(), 0);

        let off = change_fan_speed(&bedroom, None, 0).unwrap();
        assert_eq!(off.fan_speed_total(), 0);
    }

    #[test]
    fn fan_array_by_index() {
        let store = RoomStore::household();
        let hall = change_fan_speed(&room(&store, "Hall"), Some(0), 2).unwrap();
        assert_eq!(hall.slots()[1], Slot::FanArray { speeds: vec![2, 0] });
        assert!(change_fan_speed(&room(&store, "Toilet"), None, 1).is_err());
    }

    #[test]
    fn first_adjust_lands_on_default_regardless_of_delta() {
        let store = RoomStore::household();
        let hall = room(&store, "Hall");
        for delta in [-5, 0, 1, 9] {
            let ac = adjust_thermostat(&hall, ClimateKind::Ac, delta).unwrap();
            assert_eq!(ac.thermostat(ClimateKind::Ac), Some(Some(26)));
            let heater = adjust_thermostat(&hall, ClimateKind::Heater, delta).unwrap();
            assert_eq!(heater.thermostat(ClimateKind::Heater), Some(Some(22)));
        }
    }

    #[test]
    fn adjust_clamps_within_bounds() {
        let store = RoomStore::household();
        let mut hall = adjust_thermostat(&room(&store, "Hall"), ClimateKind::Ac, 1).unwrap();
        hall = adjust_thermostat(&hall, ClimateKind::Ac, -20).unwrap();
        assert_eq!(hall.thermostat(ClimateKind::Ac), Some(Some(18)));
        hall = adjust_thermostat(&hall, ClimateKind::Ac, 50).unwrap();
        assert_eq!(hall.thermostat(ClimateKind::Ac), Some(Some(30)));
    }

    #[test]
    fn turn_off_is_idempotent() {
        let store = RoomStore::household();
        let on = adjust_thermostat(&room(&store, "Bedroom"), ClimateKind::Heater, 1).unwrap();
        let off = turn_off_thermostat(&on, ClimateKind::Heater).unwrap();
        let again = turn_off_thermostat(&off, ClimateKind::Heater).unwrap();
        assert_eq!(off.thermostat(ClimateKind::Heater), Some(None));
        assert_eq!(again, off);
    }

    #[test]
    fn thermostat_missing_is_invalid_slot() {
        let store = RoomStore::household();
        let err = adjust_thermostat(&room(&store, "Kitchen"), ClimateKind::Ac, 1).unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidSlot {
                room: "Kitchen".into(),
                slot: "ac".into()
            }
        );
    }

    #[test]
    fn appliances_toggle_only_where_present() {
        let store = RoomStore::household();
        let hall = toggle_appliance(&room(&store, "Hall"), ToggleKind::Tv).unwrap();
        assert_eq!(hall.appliance(ToggleKind::Tv), Some(true));
        assert!(toggle_appliance(&room(&store, "Hall"), ToggleKind::WaterHeater).is_err());
        let bath = toggle_appliance(&room(&store, "Bathroom"), ToggleKind::WaterHeater).unwrap();
        assert_eq!(bath.appliance(ToggleKind::WaterHeater), Some(true));
    }

    #[test]
    fn execute_writes_back_and_leaves_store_on_error() {
        let mut store = RoomStore::household();
        execute(
            &mut store,
            &Command::ToggleTv {
                room: "Hall".into(),
            },
        )
        .unwrap();
        assert_eq!(store.room("Hall").unwrap().appliance(ToggleKind::Tv), Some(true));
        assert_eq!(store.revision(), 1);

        let err = execute(
            &mut store,
            &Command::ToggleTv {
                room: "Garage".into(),
            },
        );
        assert_eq!(err, Err(SimError::NotFound("Garage".into())));
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn command_deserializes_from_tagged_json() {
        let cmd: Command = serde_json::from_str(
            r#"{"action":"adjust_thermostat","room":"Bedroom","kind":"heater","delta":-1}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::AdjustThermostat {
                room: "Bedroom".into(),
                kind: ClimateKind::Heater,
                delta: -1
            }
        );
        let fan: Command =
            serde_json::from_str(r#"{"action":"change_fan_speed","room":"Kitchen","delta":1}"#)
                .unwrap();
        assert_eq!(
            fan,
            Command::ChangeFanSpeed {
                room: "Kitchen".into(),
                index: None,
                delta: 1
            }
        );
    }
}
