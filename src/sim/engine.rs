//! Simulation engine that owns the room store, live state, and virtual clock.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::devices::room::{ClimateKind, Room, Slot};
use crate::error::SimError;
use crate::signals::{SignalError, SignalKind};

use super::clock::{Clock, Interval};
use super::commands::{Command, ScriptedCommand, execute};
use super::load::{LoadSummary, total_load_w};
use super::store::RoomStore;
use super::thermal::ThermalModel;
use super::types::{SimConfig, SimulationState, Snapshot, TickResult};

type LoadObserver = Box<dyn FnMut(&LoadSummary) + Send>;

/// Upper bound on the result buffer reserved up front by a scripted run.
const PREALLOC_TICKS: u64 = 4096;

/// The single writer of simulation state.
///
/// Commands and signals mutate it directly; thermal ticks run either one at
/// a time with [`Engine::tick`] or as many as a span of virtual time covers
/// with [`Engine::advance`]. Total load is recomputed after every room
/// change, so [`Engine::load`] never reads stale values.
pub struct Engine {
    config: SimConfig,
    store: RoomStore,
    state: SimulationState,
    model: ThermalModel,
    clock: Clock,
    interval: Interval,
    ticks: u64,
    observer: Option<LoadObserver>,
}

impl Engine {
    /// Creates an engine over the standard household with every device off.
    pub fn new(config: SimConfig) -> Self {
        Self::with_store(config, RoomStore::household())
    }

    /// Creates an engine over a custom room store.
    ///
    /// # Arguments
    ///
    /// * `config` - Tick period, initial temperatures, and thermal settings
    /// * `store` - Rooms to simulate; their current settings are kept
    pub fn with_store(config: SimConfig, store: RoomStore) -> Self {
        let state = SimulationState {
            indoor_c: config.initial_indoor_c,
            outdoor_c: config.initial_outdoor_c,
            total_w: total_load_w(store.iter()),
            tariff_per_kwh: config.fallback_tariff_per_kwh,
            timestamp: Utc::now(),
        };
        Self {
            model: config.thermal_model(),
            interval: Interval::new(config.tick_ms),
            clock: Clock::new(),
            ticks: 0,
            observer: None,
            config,
            store,
            state,
        }
    }

    /// Registers a callback invoked with the new load summary whenever the
    /// total draw or the tariff changes. Replaces any previous callback.
    pub fn on_load_change(&mut self, observer: impl FnMut(&LoadSummary) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Rooms in layout order.
    pub fn rooms(&self) -> &[Room] {
        self.store.rooms()
    }

    /// Returns a copy of the named room.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] for an unknown room.
    pub fn room(&self, name: &str) -> Result<Room, SimError> {
        self.store.get(name)
    }

    /// Replaces a room wholesale and recomputes the load.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] for an unknown room and
    /// [`SimError::InvalidSlot`] if the slot layout differs.
    pub fn set_room(&mut self, name: &str, room: Room) -> Result<(), SimError> {
        self.store.set(name, room)?;
        self.refresh_load();
        Ok(())
    }

    /// Applies a device-control command.
    ///
    /// # Errors
    ///
    /// Returns the command's [`SimError`]; state is unchanged on error.
    pub fn apply(&mut self, command: &Command) -> Result<(), SimError> {
        execute(&mut self.store, command)?;
        debug!(%command, "command applied");
        self.refresh_load();
        Ok(())
    }

    /// Flips a light. See [`crate::sim::commands::toggle_light`].
    pub fn toggle_light(&mut self, room: &str, index: Option<usize>) -> Result<(), SimError> {
        self.apply(&Command::ToggleLight {
            room: room.to_string(),
            index,
        })
    }

    /// Steps a fan. See [`crate::sim::commands::change_fan_speed`].
    pub fn change_fan_speed(
        &mut self,
        room: &str,
        index: Option<usize>,
        delta: i32,
    ) -> Result<(), SimError> {
        self.apply(&Command::ChangeFanSpeed {
            room: room.to_string(),
            index,
            delta,
        })
    }

    /// Nudges a thermostat. See [`crate::sim::commands::adjust_thermostat`].
    pub fn adjust_thermostat(
        &mut self,
        room: &str,
        kind: ClimateKind,
        delta: i32,
    ) -> Result<(), SimError> {
        self.apply(&Command::AdjustThermostat {
            room: room.to_string(),
            kind,
            delta,
        })
    }

    /// Clears a thermostat setpoint.
    pub fn turn_off_thermostat(&mut self, room: &str, kind: ClimateKind) -> Result<(), SimError> {
        self.apply(&Command::TurnOffThermostat {
            room: room.to_string(),
            kind,
        })
    }

    pub fn toggle_tv(&mut self, room: &str) -> Result<(), SimError> {
        self.apply(&Command::ToggleTv {
            room: room.to_string(),
        })
    }

    pub fn toggle_water_heater(&mut self, room: &str) -> Result<(), SimError> {
        self.apply(&Command::ToggleWaterHeater {
            room: room.to_string(),
        })
    }

    /// Current load and cost at the current tariff.
    pub fn load(&self) -> LoadSummary {
        LoadSummary::from_watts(self.state.total_w, self.state.tariff_per_kwh)
    }

    /// Overwrites the tariff (currency/kWh).
    pub fn set_tariff(&mut self, tariff_per_kwh: f64) {
        if self.state.tariff_per_kwh != tariff_per_kwh {
            self.state.tariff_per_kwh = tariff_per_kwh;
            self.state.timestamp = Utc::now();
            self.notify();
        }
    }

    /// Overwrites the outdoor temperature (°C).
    pub fn set_outdoor(&mut self, outdoor_c: f64) {
        self.state.outdoor_c = outdoor_c;
        self.state.timestamp = Utc::now();
    }

    /// Feeds the outcome of an external fetch into the state.
    ///
    /// A failed fetch or a non-finite value is logged and the prior value
    /// is kept. Returns whether the value was taken.
    pub fn ingest(&mut self, kind: SignalKind, reading: Result<f64, SignalError>) -> bool {
        match reading {
            Ok(value) if value.is_finite() => {
                match kind {
                    SignalKind::Tariff => self.set_tariff(value),
                    SignalKind::OutdoorTemp => self.set_outdoor(value),
                }
                info!(%kind, value, "signal updated");
                true
            }
            Ok(value) => {
                warn!(%kind, value, "ignoring non-finite signal value");
                false
            }
            Err(err) => {
                warn!(%kind, error = %err, "signal fetch failed, keeping previous value");
                false
            }
        }
    }

    /// Runs the next scheduled thermal tick, moving the clock to its time.
    pub fn tick(&mut self) -> TickResult {
        let due = self.interval.fire_next();
        let behind = due.saturating_sub(self.clock.now_ms());
        self.clock.advance(behind);
        self.run_tick(due)
    }

    /// Moves the virtual clock forward by `ms` and runs every tick whose
    /// boundary is crossed. Leftover time carries into the next call.
    pub fn advance(&mut self, ms: u64) -> Vec<TickResult> {
        let now = self.clock.advance(ms);
        let mut results = Vec::new();
        while let Some(at) = self.interval.poll(now) {
            results.push(self.run_tick(at));
        }
        results
    }

    /// Runs `ticks` thermal ticks headlessly, applying each scripted
    /// command just before the tick whose index (counted from the start of
    /// this run) equals its `at_tick`. Rejected commands are logged and
    /// skipped.
    pub fn run_script(&mut self, ticks: u64, script: &[ScriptedCommand]) -> Vec<TickResult> {
        self.run_script_with(ticks, script, |_, _| {})
    }

    /// Like [`Engine::run_script`], calling `before_tick` with the engine
    /// and the tick index ahead of that tick's scripted commands.
    pub fn run_script_with(
        &mut self,
        ticks: u64,
        script: &[ScriptedCommand],
        mut before_tick: impl FnMut(&mut Engine, u64),
    ) -> Vec<TickResult> {
        let reserve = usize::try_from(ticks.min(PREALLOC_TICKS)).unwrap_or(0);
        let mut results = Vec::with_capacity(reserve);
        for i in 0..ticks {
            before_tick(self, i);
            for entry in script.iter().filter(|s| s.at_tick == i) {
                if let Err(err) = self.apply(&entry.command) {
                    warn!(
                        tick = i,
                        command = %entry.command,
                        error = %err,
                        "scripted command rejected"
                    );
                }
            }
            results.push(self.tick());
        }
        let skipped = script.iter().filter(|s| s.at_tick >= ticks).count();
        if skipped > 0 {
            warn!(
                skipped,
                ticks,
                "script entries scheduled after the last tick were not applied"
            );
        }
        results
    }

    /// Thermal ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Virtual time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Copy of everything a display needs.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rooms: self.store.rooms().to_vec(),
            indoor_c: self.state.indoor_c,
            outdoor_c: self.state.outdoor_c,
            load: self.load(),
            water_heater_setpoint_c: self.store.iter().find_map(Room::water_heater_setpoint),
            ticks: self.ticks,
            elapsed_ms: self.clock.now_ms(),
            timestamp: self.state.timestamp,
        }
    }

    fn run_tick(&mut self, at_ms: u64) -> TickResult {
        self.state.indoor_c =
            self.model
                .step(self.state.indoor_c, self.state.outdoor_c, self.store.rooms());
        self.state.timestamp = Utc::now();
        let tick = self.ticks;
        self.ticks += 1;

        let load = self.load();
        let rooms = self.store.rooms();
        let result = TickResult {
            tick,
            elapsed_ms: at_ms,
            indoor_c: self.state.indoor_c,
            outdoor_c: self.state.outdoor_c,
            total_w: load.total_w,
            kw: load.kw,
            tariff_per_kwh: load.tariff_per_kwh,
            cost_per_hour: load.cost_per_hour,
            active_climate: active_climate(rooms),
            fan_speed_total: rooms.iter().map(Room::fan_speed_total).sum(),
        };
        debug!(tick, indoor_c = result.indoor_c, total_w = result.total_w, "tick");
        result
    }

    fn refresh_load(&mut self) {
        let total_w = total_load_w(self.store.iter());
        self.state.timestamp = Utc::now();
        if total_w != self.state.total_w {
            self.state.total_w = total_w;
            self.notify();
        }
    }

    fn notify(&mut self) {
        let load = self.load();
        if let Some(observer) = self.observer.as_mut() {
            observer(&load);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

fn active_climate(rooms: &[Room]) -> usize {
    rooms
        .iter()
        .flat_map(Room::slots)
        .filter(|s| {
            matches!(
                s,
                Slot::Thermostat {
                    setpoint: Some(_),
                    ..
                }
            )
        })
        .count()
}
