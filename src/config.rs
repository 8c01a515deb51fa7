//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::devices::room::{ClimateKind, ROOM_NAMES};
use crate::signals::ScheduledSource;
use crate::signals::drift::DriftingWeather;
use crate::sim::commands::{Command, ScriptedCommand};
use crate::sim::thermal::{MAX_INDOOR_C, MIN_INDOOR_C, RelaxationOrder};
use crate::sim::types::{
    DEFAULT_INDOOR_C, DEFAULT_OUTDOOR_C, DEFAULT_TARIFF_PER_KWH, DEFAULT_TICK_MS, SimConfig,
};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the `idle` preset. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or pick a preset with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Timing, initial temperatures, and thermal settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Tariff fallback and feed settings.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Outdoor temperature source settings.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Commands applied during a headless run.
    #[serde(default)]
    pub script: Vec<ScriptedCommand>,
}

/// Timing, initial temperatures, and thermal settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Thermal tick period (ms, must be > 0).
    pub tick_ms: u64,
    /// Number of ticks in a headless run (must be > 0).
    pub ticks: u64,
    /// Indoor temperature at start-up (°C, within 15..=35).
    pub initial_indoor_c: f64,
    /// Outdoor temperature before any weather reading (°C).
    pub initial_outdoor_c: f64,
    /// Order of climate device application within a tick.
    pub relaxation_order: RelaxationOrder,
    /// Indoor/outdoor coupling per tick (0.0–1.0).
    pub outdoor_coupling: f64,
    /// Seed for the drifting weather source.
    pub seed: u64,
    /// Desired indoor temperature for the run report's comfort gap (°C).
    pub comfort_target_c: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            ticks: 300,
            initial_indoor_c: DEFAULT_INDOOR_C,
            initial_outdoor_c: DEFAULT_OUTDOOR_C,
            relaxation_order: RelaxationOrder::default(),
            outdoor_coupling: 0.0,
            seed: 42,
            comfort_target_c: DEFAULT_COMFORT_TARGET_C,
        }
    }
}

/// Where tariff readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffSource {
    /// Keep the fallback tariff.
    #[default]
    Fixed,
    /// Poll a carbon-intensity feed (feature `feeds`).
    Http,
}

/// Tariff fallback and feed settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    pub source: TariffSource,
    /// Tariff until the first successful reading (currency/kWh, >= 0).
    pub fallback_per_kwh: f64,
    /// Multiplier from carbon intensity to tariff (> 0).
    pub intensity_factor: f64,
    /// Seconds between feed polls (> 0).
    pub refresh_secs: u64,
    /// Carbon-intensity endpoint; the built-in default when absent.
    pub url: Option<String>,
    /// Grid zone code.
    pub zone: String,
    /// Value of the `auth-token` header.
    pub auth_token: Option<String>,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            source: TariffSource::Fixed,
            fallback_per_kwh: DEFAULT_TARIFF_PER_KWH,
            intensity_factor: 0.01,
            refresh_secs: 60,
            url: None,
            zone: "IN".to_string(),
            auth_token: None,
        }
    }
}

/// Where outdoor temperature readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSource {
    /// Keep `simulation.initial_outdoor_c`.
    #[default]
    Fixed,
    /// Seeded random walk around the initial outdoor temperature.
    Drift,
    /// Poll a weather timeline service (feature `feeds`).
    Http,
}

/// Outdoor temperature source settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    pub source: WeatherSource,
    /// Seconds between polls (> 0).
    pub refresh_secs: u64,
    /// Largest step of the drifting source per poll (°C, >= 0).
    pub drift_c: f64,
    /// Timeline endpoint; the built-in default when absent.
    pub url: Option<String>,
    /// Location understood by the timeline service.
    pub location: String,
    pub api_key: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            source: WeatherSource::Fixed,
            refresh_secs: 600,
            drift_c: 0.2,
            url: None,
            location: "Mumbai,IN".to_string(),
            api_key: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.tick_ms"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Indoor temperature the occupants want unless a scenario says otherwise (°C).
pub const DEFAULT_COMFORT_TARGET_C: f64 = 24.0;

/// Longest headless run accepted (ticks), about 23 days at 200 ms.
pub const MAX_TICKS: u64 = 10_000_000;

fn at(at_tick: u64, command: Command) -> ScriptedCommand {
    ScriptedCommand { at_tick, command }
}

fn light(room: &str, index: Option<usize>) -> Command {
    Command::ToggleLight {
        room: room.into(),
        index,
    }
}

fn fan(room: &str, index: Option<usize>, delta: i32) -> Command {
    Command::ChangeFanSpeed {
        room: room.into(),
        index,
        delta,
    }
}

fn thermostat(room: &str, kind: ClimateKind, delta: i32) -> Command {
    Command::AdjustThermostat {
        room: room.into(),
        kind,
        delta,
    }
}

fn tv(room: &str) -> Command {
    Command::ToggleTv { room: room.into() }
}

fn water_heater(room: &str) -> Command {
    Command::ToggleWaterHeater { room: room.into() }
}

fn thermostat_off(room: &str, kind: ClimateKind) -> Command {
    Command::TurnOffThermostat {
        room: room.into(),
        kind,
    }
}

impl ScenarioConfig {
    /// Returns the idle preset: everything off, fixed signals.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Returns the summer-evening preset: hot outside, lights and cooling
    /// come on through the evening.
    pub fn summer_evening() -> Self {
        Self {
            simulation: SimulationConfig {
                ticks: 900,
                initial_indoor_c: 31.0,
                initial_outdoor_c: 34.0,
                outdoor_coupling: 0.002,
                ..SimulationConfig::default()
            },
            weather: WeatherConfig {
                source: WeatherSource::Drift,
                refresh_secs: 60,
                drift_c: 0.3,
                ..WeatherConfig::default()
            },
            script: vec![
                at(0, light("Hall", Some(0))),
                at(0, fan("Hall", Some(0), 2)),
                at(50, thermostat("Hall", ClimateKind::Ac, 0)),
                at(51, thermostat("Hall", ClimateKind::Ac, -3)),
                at(100, tv("Hall")),
                at(300, light("Kitchen", None)),
                at(400, light("Kitchen", None)),
                at(500, light("Bedroom", None)),
                at(500, thermostat("Bedroom", ClimateKind::Ac, 0)),
                at(600, tv("Hall")),
                at(600, thermostat_off("Hall", ClimateKind::Ac)),
                at(600, fan("Hall", Some(0), 0)),
            ],
            ..Self::default()
        }
    }

    /// Returns the winter-night preset: cold outside, heaters and the
    /// water heater carry the load.
    pub fn winter_night() -> Self {
        Self {
            simulation: SimulationConfig {
                ticks: 900,
                initial_indoor_c: 16.0,
                initial_outdoor_c: 8.0,
                outdoor_coupling: 0.002,
                ..SimulationConfig::default()
            },
            tariff: TariffConfig {
                fallback_per_kwh: 7.5,
                ..TariffConfig::default()
            },
            script: vec![
                at(0, light("Bedroom", None)),
                at(0, thermostat("Bedroom", ClimateKind::Heater, 0)),
                at(10, thermostat("Bedroom", ClimateKind::Heater, 2)),
                at(20, water_heater("Bathroom")),
                at(200, water_heater("Bathroom")),
                at(300, thermostat("Hall", ClimateKind::Heater, 0)),
                at(700, thermostat_off("Hall", ClimateKind::Heater)),
                at(800, light("Bedroom", None)),
            ],
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["idle", "summer_evening", "winter_night"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "idle" => Ok(Self::idle()),
            "summer_evening" => Ok(Self::summer_evening()),
            "winter_night" => Ok(Self::winter_night()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Engine configuration described by this scenario.
    ///
    /// Call [`ScenarioConfig::validate`] first; a zero `tick_ms` panics.
    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulation;
        SimConfig {
            initial_indoor_c: s.initial_indoor_c,
            initial_outdoor_c: s.initial_outdoor_c,
            fallback_tariff_per_kwh: self.tariff.fallback_per_kwh,
            relaxation_order: s.relaxation_order,
            outdoor_coupling: s.outdoor_coupling,
            ..SimConfig::new(s.tick_ms)
        }
    }

    /// Builds the external signal sources this scenario asks for.
    ///
    /// Fixed sources produce nothing. HTTP sources are only built with the
    /// `feeds` feature; [`ScenarioConfig::validate`] rejects them otherwise.
    pub fn signal_sources(&self) -> Vec<ScheduledSource> {
        let mut sources = Vec::new();

        #[cfg(feature = "feeds")]
        if self.tariff.source == TariffSource::Http {
            use crate::signals::http::{CARBON_INTENSITY_URL, CarbonIntensityFeed};
            let t = &self.tariff;
            sources.push(ScheduledSource::new(
                CarbonIntensityFeed::new(
                    t.url.as_deref().unwrap_or(CARBON_INTENSITY_URL),
                    t.zone.clone(),
                    t.auth_token.clone(),
                    t.intensity_factor,
                ),
                Duration::from_secs(t.refresh_secs),
            ));
        }

        let w = &self.weather;
        let every = Duration::from_secs(w.refresh_secs);
        match w.source {
            WeatherSource::Fixed => {}
            WeatherSource::Drift => sources.push(ScheduledSource::new(
                DriftingWeather::new(
                    self.simulation.initial_outdoor_c,
                    w.drift_c,
                    self.simulation.seed,
                ),
                every,
            )),
            #[cfg(feature = "feeds")]
            WeatherSource::Http => {
                use crate::signals::http::{TimelineWeather, WEATHER_TIMELINE_URL};
                sources.push(ScheduledSource::new(
                    TimelineWeather::new(
                        w.url.as_deref().unwrap_or(WEATHER_TIMELINE_URL),
                        w.location.clone(),
                        w.api_key.clone(),
                    ),
                    every,
                ));
            }
            #[cfg(not(feature = "feeds"))]
            WeatherSource::Http => {}
        }

        sources
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.tick_ms == 0 {
            errors.push(ConfigError::new("simulation.tick_ms", "must be > 0"));
        }
        if s.ticks == 0 || s.ticks > MAX_TICKS {
            errors.push(ConfigError::new(
                "simulation.ticks",
                format!("must be in [1, {MAX_TICKS}]"),
            ));
        }
        if !(MIN_INDOOR_C..=MAX_INDOOR_C).contains(&s.initial_indoor_c) {
            errors.push(ConfigError::new(
                "simulation.initial_indoor_c",
                format!("must be in [{MIN_INDOOR_C}, {MAX_INDOOR_C}]"),
            ));
        }
        if !(MIN_INDOOR_C..=MAX_INDOOR_C).contains(&s.comfort_target_c) {
            errors.push(ConfigError::new(
                "simulation.comfort_target_c",
                format!("must be in [{MIN_INDOOR_C}, {MAX_INDOOR_C}]"),
            ));
        }
        if !s.initial_outdoor_c.is_finite() {
            errors.push(ConfigError::new("simulation.initial_outdoor_c", "must be finite"));
        }
        if !(0.0..=1.0).contains(&s.outdoor_coupling) {
            errors.push(ConfigError::new(
                "simulation.outdoor_coupling",
                "must be in [0.0, 1.0]",
            ));
        }

        let t = &self.tariff;
        if !(t.fallback_per_kwh.is_finite() && t.fallback_per_kwh >= 0.0) {
            errors.push(ConfigError::new("tariff.fallback_per_kwh", "must be >= 0"));
        }
        if !(t.intensity_factor.is_finite() && t.intensity_factor > 0.0) {
            errors.push(ConfigError::new("tariff.intensity_factor", "must be > 0"));
        }
        if t.refresh_secs == 0 {
            errors.push(ConfigError::new("tariff.refresh_secs", "must be > 0"));
        }
        if t.source == TariffSource::Http && !cfg!(feature = "feeds") {
            errors.push(ConfigError::new(
                "tariff.source",
                "\"http\" requires the `feeds` feature",
            ));
        }

        let w = &self.weather;
        if w.refresh_secs == 0 {
            errors.push(ConfigError::new("weather.refresh_secs", "must be > 0"));
        }
        if !(w.drift_c.is_finite() && w.drift_c >= 0.0) {
            errors.push(ConfigError::new("weather.drift_c", "must be >= 0"));
        }
        if w.source == WeatherSource::Http && !cfg!(feature = "feeds") {
            errors.push(ConfigError::new(
                "weather.source",
                "\"http\" requires the `feeds` feature",
            ));
        }

        for (i, entry) in self.script.iter().enumerate() {
            let room = entry.command.room();
            if !ROOM_NAMES.contains(&room) {
                errors.push(ConfigError::new(
                    format!("script[{i}].command.room"),
                    format!("unknown room \"{room}\""),
                ));
            }
            if s.ticks > 0 && entry.at_tick >= s.ticks {
                errors.push(ConfigError::new(
                    format!("script[{i}].at_tick"),
                    "must be < simulation.ticks",
                ));
            }
        }

        errors
    }
}
