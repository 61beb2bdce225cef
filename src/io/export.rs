//! CSV export for derived consumption series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::consumption::ConsumptionPoint;

/// Column header for consumption series export.
const HEADER: &str = "date,value,cost,meter_id,facility_id,type,daily_consumption";

/// Exports a consumption series to a CSV file at the given path.
///
/// Writes a header row followed by one data row per point. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(points: &[ConsumptionPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(points, buf)
}

/// Writes a consumption series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(points: &[ConsumptionPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for p in points {
        wtr.write_record(&[
            p.date.to_string(),
            format!("{:.2}", p.value),
            format!("{:.2}", p.cost),
            p.meter_id.to_string(),
            p.facility_id.to_string(),
            p.utility.to_string(),
            format!("{:.2}", p.daily_consumption),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
