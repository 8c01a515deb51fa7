//! Static power ratings for every device kind in the household.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every kind of device the household can contain.
///
/// The set is closed: adding a device means adding a variant here and a
/// rating in [`DeviceKind::rating_w`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// A single light bulb.
    Light,
    /// One speed step of a ceiling fan.
    FanUnit,
    /// Air conditioner, rated while a setpoint is present.
    Ac,
    /// Space heater, rated while a setpoint is present.
    Heater,
    /// Television.
    Tv,
    /// Water heater.
    WaterHeater,
}

impl DeviceKind {
    /// Returns the rated power draw in watts.
    ///
    /// For [`DeviceKind::Light`] this is per bulb and for
    /// [`DeviceKind::FanUnit`] per speed step. Climate devices draw their
    /// full rating whenever they are on, regardless of setpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use household_sim::devices::catalog::DeviceKind;
    ///
    /// assert_eq!(DeviceKind::Heater.rating_w(), 2000);
    /// assert_eq!(DeviceKind::FanUnit.rating_w() * 3, 120);
    /// ```
    pub const fn rating_w(self) -> u32 {
        match self {
            DeviceKind::Light => 15,
            DeviceKind::FanUnit => 40,
            DeviceKind::Ac => 1500,
            DeviceKind::Heater => 2000,
            DeviceKind::Tv => 100,
            DeviceKind::WaterHeater => 1500,
        }
    }

    /// Returns a human-readable device name.
    pub const fn label(self) -> &'static str {
        match self {
            DeviceKind::Light => "light",
            DeviceKind::FanUnit => "fan",
            DeviceKind::Ac => "ac",
            DeviceKind::Heater => "heater",
            DeviceKind::Tv => "tv",
            DeviceKind::WaterHeater => "water heater",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_match_catalog() {
        let kinds = [
            DeviceKind::Light,
            DeviceKind::FanUnit,
            DeviceKind::Ac,
            DeviceKind::Heater,
            DeviceKind::Tv,
            DeviceKind::WaterHeater,
        ];
        let ratings: Vec<u32> = kinds.iter().map(|k| k.rating_w()).collect();
        assert_eq!(ratings, vec![15, 40, 1500, 2000, 100, 1500]);
    }

    #[test]
    fn serde_names_are_snake_case() {
        let json = serde_json::to_string(&DeviceKind::WaterHeater).unwrap();
        assert_eq!(json, "\"water_heater\"");
        let kind: DeviceKind = serde_json::from_str("\"fan_unit\"").unwrap();
        assert_eq!(kind, DeviceKind::FanUnit);
    }
}
