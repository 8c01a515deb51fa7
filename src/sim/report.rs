//! Post-hoc run summary computed from tick results.

use std::fmt;

use serde::Serialize;

use super::types::TickResult;

/// Aggregate figures for a complete headless run.
///
/// Computed from the `TickResult` sequence so the report always agrees
/// with the exported trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Number of ticks summarized.
    pub ticks: usize,
    /// Energy drawn over the run (kWh).
    pub energy_kwh: f64,
    /// Cost of that energy at the tariff in force each tick.
    pub total_cost: f64,
    /// Highest total draw (W).
    pub peak_w: u32,
    /// Mean total draw (W).
    pub mean_w: f64,
    /// Lowest indoor temperature reached (°C).
    pub min_indoor_c: f64,
    /// Highest indoor temperature reached (°C).
    pub max_indoor_c: f64,
    /// Indoor temperature after the last tick (°C).
    pub final_indoor_c: f64,
    /// Ticks during which at least one AC or heater was on.
    pub climate_active_ticks: usize,
    /// Indoor temperature the occupants want (°C).
    pub comfort_target_c: f64,
    /// Mean absolute distance of the indoor temperature from the target
    /// over all ticks (°C); lower is more comfortable.
    pub mean_comfort_gap_c: f64,
}

impl RunReport {
    /// Summarizes `results`.
    ///
    /// # Arguments
    ///
    /// * `results` - Tick results in order
    /// * `tick_hours` - Duration of one tick in hours
    /// * `comfort_target_c` - Desired indoor temperature for the comfort gap
    pub fn from_results(results: &[TickResult], tick_hours: f64, comfort_target_c: f64) -> Self {
        let Some(last) = results.last() else {
            return Self {
                ticks: 0,
                energy_kwh: 0.0,
                total_cost: 0.0,
                peak_w: 0,
                mean_w: 0.0,
                min_indoor_c: 0.0,
                max_indoor_c: 0.0,
                final_indoor_c: 0.0,
                climate_active_ticks: 0,
                comfort_target_c,
                mean_comfort_gap_c: 0.0,
            };
        };

        let mut energy_kwh = 0.0;
        let mut total_cost = 0.0;
        let mut peak_w = 0;
        let mut watt_sum = 0.0;
        let mut min_indoor = f64::INFINITY;
        let mut max_indoor = f64::NEG_INFINITY;
        let mut climate_active_ticks = 0;
        let mut gap_sum = 0.0;

        for r in results {
            let kwh = r.kw * tick_hours;
            energy_kwh += kwh;
            total_cost += kwh * r.tariff_per_kwh;
            peak_w = peak_w.max(r.total_w);
            watt_sum += f64::from(r.total_w);
            min_indoor = min_indoor.min(r.indoor_c);
            max_indoor = max_indoor.max(r.indoor_c);
            gap_sum += (r.indoor_c - comfort_target_c).abs();
            if r.active_climate > 0 {
                climate_active_ticks += 1;
            }
        }

        Self {
            ticks: results.len(),
            energy_kwh,
            total_cost,
            peak_w,
            mean_w: watt_sum / results.len() as f64,
            min_indoor_c: min_indoor,
            max_indoor_c: max_indoor,
            final_indoor_c: last.indoor_c,
            climate_active_ticks,
            comfort_target_c,
            mean_comfort_gap_c: gap_sum / results.len() as f64,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Report ---")?;
        writeln!(f, "Ticks:                 {}", self.ticks)?;
        writeln!(f, "Energy:                {:.4} kWh", self.energy_kwh)?;
        writeln!(f, "Cost:                  {:.4}", self.total_cost)?;
        writeln!(f, "Peak load:             {} W", self.peak_w)?;
        writeln!(f, "Mean load:             {:.1} W", self.mean_w)?;
        writeln!(
            f,
            "Indoor range:          {:.2}..{:.2} °C (final {:.2} °C)",
            self.min_indoor_c, self.max_indoor_c, self.final_indoor_c
        )?;
        writeln!(f, "Climate active ticks:  {}", self.climate_active_ticks)?;
        write!(
            f,
            "Comfort gap:           {:.2} °C (target {:.1} °C)",
            self.mean_comfort_gap_c, self.comfort_target_c
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(total_w: u32, tariff: f64, indoor_c: f64, active_climate: usize) -> TickResult {
        TickResult {
            tick: 0,
            elapsed_ms: 0,
            indoor_c,
            outdoor_c: 30.0,
            total_w,
            kw: f64::from(total_w) / 1000.0,
            tariff_per_kwh: tariff,
            cost_per_hour: f64::from(total_w) / 1000.0 * tariff,
            active_climate,
            fan_speed_total: 0,
        }
    }

    #[test]
    fn energy_and_cost_integrate_over_ticks() {
        // 1.5 kW for two half-hour ticks at 6, then 8
        let results = vec![
            make_result(1500, 6.0, 25.0, 1),
            make_result(1500, 8.0, 24.0, 1),
        ];
        let report = RunReport::from_results(&results, 0.5, 24.0);
        assert!((report.energy_kwh - 1.5).abs() < 1e-12);
        assert!((report.total_cost - (0.75 * 6.0 + 0.75 * 8.0)).abs() < 1e-12);
    }

    #[test]
    fn peak_mean_and_temperatures() {
        let results = vec![
            make_result(0, 6.0, 25.0, 0),
            make_result(2000, 6.0, 23.5, 1),
            make_result(100, 6.0, 24.0, 0),
        ];
        let report = RunReport::from_results(&results, 1.0, 24.0);
        assert_eq!(report.peak_w, 2000);
        assert!((report.mean_w - 700.0).abs() < 1e-9);
        assert_eq!(report.min_indoor_c, 23.5);
        assert_eq!(report.max_indoor_c, 25.0);
        assert_eq!(report.final_indoor_c, 24.0);
        assert_eq!(report.climate_active_ticks, 1);
    }

    #[test]
    fn comfort_gap_averages_distance_from_target() {
        // 1.0 above, 0.5 below, exactly on target
        let results = vec![
            make_result(0, 6.0, 25.0, 0),
            make_result(0, 6.0, 23.5, 0),
            make_result(0, 6.0, 24.0, 0),
        ];
        let report = RunReport::from_results(&results, 1.0, 24.0);
        assert!((report.mean_comfort_gap_c - 0.5).abs() < 1e-12);
        assert!(format!("{report}").contains("Comfort gap:           0.50 °C (target 24.0 °C)"));
    }

    #[test]
    fn empty_results() {
        let report = RunReport::from_results(&[], 1.0, 24.0);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.energy_kwh, 0.0);
        assert_eq!(report.mean_comfort_gap_c, 0.0);
        assert!(format!("{report}").contains("Run Report"));
    }
}
