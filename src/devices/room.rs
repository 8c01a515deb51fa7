//! Rooms and the device slots they contain.

use serde::{Deserialize, Serialize};

use super::catalog::DeviceKind;

/// Highest speed step a fan supports.
pub const MAX_FAN_SPEED: u8 = 3;

/// Fixed setpoint reported for a water heater that is switched on (°C).
pub const WATER_HEATER_NOMINAL_C: i32 = 60;

/// Climate device kinds that carry a temperature setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateKind {
    /// Air conditioner.
    Ac,
    /// Space heater.
    Heater,
}

impl ClimateKind {
    /// Inclusive setpoint bounds `(min, max)` in °C.
    pub const fn bounds(self) -> (i32, i32) {
        match self {
            ClimateKind::Ac => (18, 30),
            ClimateKind::Heater => (20, 35),
        }
    }

    /// Setpoint assumed when the device is first switched on (°C).
    pub const fn default_setpoint(self) -> i32 {
        match self {
            ClimateKind::Ac => 26,
            ClimateKind::Heater => 22,
        }
    }

    /// Clamps a requested setpoint into this kind's bounds.
    pub fn clamp_setpoint(self, value: i32) -> i32 {
        let (min, max) = self.bounds();
        value.clamp(min, max)
    }

    /// Catalog entry for this device.
    pub const fn device(self) -> DeviceKind {
        match self {
            ClimateKind::Ac => DeviceKind::Ac,
            ClimateKind::Heater => DeviceKind::Heater,
        }
    }
}

/// On/off appliances without any further setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleKind {
    /// Television.
    Tv,
    /// Water heater.
    WaterHeater,
}

impl ToggleKind {
    /// Catalog entry for this device.
    pub const fn device(self) -> DeviceKind {
        match self {
            ToggleKind::Tv => DeviceKind::Tv,
            ToggleKind::WaterHeater => DeviceKind::WaterHeater,
        }
    }
}

/// One controllable sub-unit of a room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum Slot {
    /// A fixed-length row of lights.
    LightArray { on: Vec<bool> },
    /// A lone light.
    LightSingle { on: bool },
    /// A fixed-length row of fans, each with a speed in `0..=3`.
    FanArray { speeds: Vec<u8> },
    /// A lone fan with a speed in `0..=3`.
    FanSingle { speed: u8 },
    /// An AC or heater; `None` means the device is off.
    Thermostat {
        kind: ClimateKind,
        setpoint: Option<i32>,
    },
    /// A TV or water heater.
    Toggle { kind: ToggleKind, on: bool },
}

/// The value-free shape of a [`Slot`], used to check that a room
/// replacement keeps the room's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    LightArray(usize),
    LightSingle,
    FanArray(usize),
    FanSingle,
    Thermostat(ClimateKind),
    Toggle(ToggleKind),
}

impl Slot {
    /// Creates a row of `n` lights, all off.
    pub fn light_array(n: usize) -> Self {
        Slot::LightArray { on: vec![false; n] }
    }

    /// Creates a row of `n` fans, all stopped.
    pub fn fan_array(n: usize) -> Self {
        Slot::FanArray { speeds: vec![0; n] }
    }

    /// Creates a thermostat slot with no setpoint.
    pub fn thermostat(kind: ClimateKind) -> Self {
        Slot::Thermostat {
            kind,
            setpoint: None,
        }
    }

    /// Creates an appliance slot that is switched off.
    pub fn toggle(kind: ToggleKind) -> Self {
        Slot::Toggle { kind, on: false }
    }

    /// Returns the value-free shape of this slot.
    pub fn shape(&self) -> SlotShape {
        match self {
            Slot::LightArray { on } => SlotShape::LightArray(on.len()),
            Slot::LightSingle { .. } => SlotShape::LightSingle,
            Slot::FanArray { speeds } => SlotShape::FanArray(speeds.len()),
            Slot::FanSingle { .. } => SlotShape::FanSingle,
            Slot::Thermostat { kind, .. } => SlotShape::Thermostat(*kind),
            Slot::Toggle { kind, .. } => SlotShape::Toggle(*kind),
        }
    }

    /// Number of lights switched on in this slot.
    pub fn lights_on(&self) -> usize {
        match self {
            Slot::LightArray { on } => on.iter().filter(|&&b| b).count(),
            Slot::LightSingle { on: true } => 1,
            _ => 0,
        }
    }

    /// Sum of fan speeds in this slot.
    pub fn fan_speed_total(&self) -> u32 {
        match self {
            Slot::FanArray { speeds } => speeds.iter().map(|&s| u32::from(s)).sum(),
            Slot::FanSingle { speed } => u32::from(*speed),
            _ => 0,
        }
    }

    /// Returns `true` when every value lies in its allowed range: fan
    /// speeds in `0..=3` and setpoints within the thermostat kind's bounds.
    pub fn is_valid(&self) -> bool {
        match self {
            Slot::FanArray { speeds } => speeds.iter().all(|&s| s <= MAX_FAN_SPEED),
            Slot::FanSingle { speed } => *speed <= MAX_FAN_SPEED,
            Slot::Thermostat {
                kind,
                setpoint: Some(c),
            } => {
                let (min, max) = kind.bounds();
                (min..=max).contains(c)
            }
            _ => true,
        }
    }
}

/// A named room with a fixed set of device slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    name: String,
    slots: Vec<Slot>,
}

impl Room {
    /// Creates a room from its name and slot list.
    pub fn new(name: impl Into<String>, slots: Vec<Slot>) -> Self {
        Self {
            name: name.into(),
            slots,
        }
    }

    /// Room name, unique within the household.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only view of the device slots.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Mutable view of the device slots. The slot count cannot change
    /// through a slice; the store rejects variant changes on write-back.
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// Returns the value-free layout of this room.
    pub fn shape(&self) -> Vec<SlotShape> {
        self.slots.iter().map(Slot::shape).collect()
    }

    /// Returns `true` when `other` has exactly the same slot layout.
    pub fn same_shape(&self, other: &Room) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(a, b)| a.shape() == b.shape())
    }

    /// Setpoint of the given climate device.
    ///
    /// Returns `None` if the room has no such thermostat, `Some(None)` if it
    /// is off, and `Some(Some(c))` when running at `c` °C.
    pub fn thermostat(&self, kind: ClimateKind) -> Option<Option<i32>> {
        self.slots.iter().find_map(|slot| match slot {
            Slot::Thermostat { kind: k, setpoint } if *k == kind => Some(*setpoint),
            _ => None,
        })
    }

    /// State of the given appliance, or `None` if the room has none.
    pub fn appliance(&self, kind: ToggleKind) -> Option<bool> {
        self.slots.iter().find_map(|slot| match slot {
            Slot::Toggle { kind: k, on } if *k == kind => Some(*on),
            _ => None,
        })
    }

    /// Water heater setpoint, present only while it is switched on.
    pub fn water_heater_setpoint(&self) -> Option<i32> {
        match self.appliance(ToggleKind::WaterHeater) {
            Some(true) => Some(WATER_HEATER_NOMINAL_C),
            _ => None,
        }
    }

    /// Number of lights switched on across all light slots.
    pub fn lights_on(&self) -> usize {
        self.slots.iter().map(Slot::lights_on).sum()
    }

    /// Sum of fan speeds across all fan slots.
    pub fn fan_speed_total(&self) -> u32 {
        self.slots.iter().map(Slot::fan_speed_total).sum()
    }

    /// Index of the first slot holding an out-of-range value.
    pub fn first_invalid_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.is_valid())
    }
}

/// Names of the household rooms in iteration order.
pub const ROOM_NAMES: [&str; 5] = ["Hall", "Bedroom", "Kitchen", "Bathroom", "Toilet"];

/// Builds the fixed household layout with every device off.
pub fn household_layout() -> Vec<Room> {
    vec![
        Room::new(
            "Hall",
            vec![
                Slot::light_array(2),
                Slot::fan_array(2),
                Slot::thermostat(ClimateKind::Ac),
                Slot::thermostat(ClimateKind::Heater),
                Slot::toggle(ToggleKind::Tv),
            ],
        ),
        Room::new(
            "Bedroom",
            vec![
                Slot::LightSingle { on: false },
                Slot::FanSingle { speed: 0 },
                Slot::thermostat(ClimateKind::Ac),
                Slot::thermostat(ClimateKind::Heater),
            ],
        ),
        Room::new(
            "Kitchen",
            vec![Slot::LightSingle { on: false }, Slot::FanSingle { speed: 0 }],
        ),
        Room::new(
            "Bathroom",
            vec![
                Slot::LightSingle { on: false },
                Slot::toggle(ToggleKind::WaterHeater),
            ],
        ),
        Room::new("Toilet", vec![Slot::LightSingle { on: false }]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_rooms_follow_name_order() {
        let names: Vec<String> = household_layout()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, ROOM_NAMES);
    }

    #[test]
    fn hall_shape() {
        let hall = &household_layout()[0];
        assert_eq!(
            hall.shape(),
            vec![
                SlotShape::LightArray(2),
                SlotShape::FanArray(2),
                SlotShape::Thermostat(ClimateKind::Ac),
                SlotShape::Thermostat(ClimateKind::Heater),
                SlotShape::Toggle(ToggleKind::Tv),
            ]
        );
    }

    #[test]
    fn thermostat_lookup_distinguishes_missing_and_off() {
        let rooms = household_layout();
        assert_eq!(rooms[1].thermostat(ClimateKind::Ac), Some(None));
        assert_eq!(rooms[2].thermostat(ClimateKind::Ac), None);
    }

    #[test]
    fn shape_ignores_values() {
        let a = Room::new("X", vec![Slot::FanSingle { speed: 0 }]);
        let b = Room::new("X", vec![Slot::FanSingle { speed: 3 }]);
        let c = Room::new("X", vec![Slot::LightSingle { on: false }]);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn water_heater_reports_nominal_setpoint_only_when_on() {
        let mut bath = household_layout().remove(3);
        assert_eq!(bath.water_heater_setpoint(), None);
        if let Slot::Toggle { on, .. } = &mut bath.slots_mut()[1] {
            *on = true;
        }
        assert_eq!(bath.water_heater_setpoint(), Some(WATER_HEATER_NOMINAL_C));
    }

    #[test]
    fn aggregates_lights_and_fans() {
        let room = Room::new(
            "X",
            vec![
                Slot::LightArray {
                    on: vec![true, false, true],
                },
                Slot::FanArray {
                    speeds: vec![1, 3],
                },
            ],
        );
        assert_eq!(room.lights_on(), 2);
        assert_eq!(room.fan_speed_total(), 4);
    }

    #[test]
    fn slot_values_checked_against_ranges() {
        assert!(Slot::FanSingle { speed: 3 }.is_valid());
        assert!(!Slot::FanSingle { speed: 4 }.is_valid());
        assert!(!Slot::FanArray { speeds: vec![0, 9] }.is_valid());
        assert!(Slot::thermostat(ClimateKind::Ac).is_valid());
        let cold_ac = Slot::Thermostat {
            kind: ClimateKind::Ac,
            setpoint: Some(5),
        };
        assert!(!cold_ac.is_valid());
        let hot_heater = Slot::Thermostat {
            kind: ClimateKind::Heater,
            setpoint: Some(35),
        };
        assert!(hot_heater.is_valid());

        let bedroom = Room::new(
            "Bedroom",
            vec![Slot::LightSingle { on: true }, Slot::FanSingle { speed: 9 }],
        );
        assert_eq!(bedroom.first_invalid_slot(), Some(1));
        assert_eq!(household_layout()[0].first_invalid_slot(), None);
    }

    #[test]
    fn setpoint_clamps_to_kind_bounds() {
        assert_eq!(ClimateKind::Ac.clamp_setpoint(10), 18);
        assert_eq!(ClimateKind::Heater.clamp_setpoint(40), 35);
        assert_eq!(ClimateKind::Heater.clamp_setpoint(25), 25);
    }
}
