//! CSV export for tick results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::TickResult;

/// Column header for the tick trajectory export.
const HEADER: &str = "tick,elapsed_ms,indoor_c,outdoor_c,total_w,kw,\
                      tariff_per_kwh,cost_per_hour,active_climate,fan_speed_total";

/// Exports tick results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[TickResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes tick results as CSV to any writer, one row per tick after the
/// header. Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[TickResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.tick.to_string(),
            r.elapsed_ms.to_string(),
            format!("{:.4}", r.indoor_c),
            format!("{:.2}", r.outdoor_c),
            r.total_w.to_string(),
            format!("{:.3}", r.kw),
            format!("{:.2}", r.tariff_per_kwh),
            format!("{:.2}", r.cost_per_hour),
            r.active_climate.to_string(),
            r.fan_speed_total.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
