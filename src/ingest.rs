//! Bulk CSV reading import.
//!
//! Expected columns: `meter_id`, `date`, `value` (required) and `cost`
//! (optional, defaults to 0). Any malformed row fails the whole upload
//! with the originating row and column named; nothing is committed on
//! failure (all-or-nothing per batch).

use std::io::Read;

use thiserror::Error;
use time::Date;
use tracing::info;

use crate::model::{DATE_FORMAT, Reading};
use crate::store::ReadingStore;

/// Rejection of a bulk import batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required column \"{0}\" (required: meter_id, date, value)")]
    MissingColumn(&'static str),
    #[error("row {line}, column \"{column}\": {message}")]
    Row {
        /// 1-based data row number (header excluded).
        line: usize,
        column: &'static str,
        message: String,
    },
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

/// Parses and validates a CSV batch against the store's meter catalog.
///
/// Returns the full batch or the first error; no partial result is ever
/// produced. Unknown meter references are reported with their row number
/// so the uploader can fix the file.
pub fn parse_readings_csv<R: Read>(
    store: &ReadingStore,
    reader: R,
) -> Result<Vec<Reading>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let col = |name: &'static str| -> Result<usize, IngestError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(IngestError::MissingColumn(name))
    };
    let meter_idx = col("meter_id")?;
    let date_idx = col("date")?;
    let value_idx = col("value")?;
    let cost_idx = headers.iter().position(|h| h == "cost");

    let mut batch = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let line = i + 1;
        let record = record?;
        let field = |idx: usize, column: &'static str| -> Result<&str, IngestError> {
            record.get(idx).ok_or(IngestError::Row {
                line,
                column,
                message: "field missing".to_string(),
            })
        };

        let meter_id = field(meter_idx, "meter_id")?.parse().map_err(|_| {
            IngestError::Row {
                line,
                column: "meter_id",
                message: format!("\"{}\" is not a valid meter id", &record[meter_idx]),
            }
        })?;
        if store.meter(meter_id).is_none() {
            return Err(IngestError::Row {
                line,
                column: "meter_id",
                message: format!("meter {meter_id} does not exist"),
            });
        }

        let date = Date::parse(field(date_idx, "date")?, DATE_FORMAT).map_err(|e| {
            IngestError::Row {
                line,
                column: "date",
                message: format!("\"{}\" is not a valid date: {e}", &record[date_idx]),
            }
        })?;

        let value: f64 = field(value_idx, "value")?.parse().map_err(|_| {
            IngestError::Row {
                line,
                column: "value",
                message: format!("\"{}\" is not numeric", &record[value_idx]),
            }
        })?;

        let cost = match cost_idx {
            Some(idx) => {
                let raw = field(idx, "cost")?;
                if raw.is_empty() {
                    0.0
                } else {
                    raw.parse().map_err(|_| IngestError::Row {
                        line,
                        column: "cost",
                        message: format!("\"{raw}\" is not numeric"),
                    })?
                }
            }
            None => 0.0,
        };

        batch.push(Reading {
            meter_id,
            date,
            value,
            cost,
        });
    }

    Ok(batch)
}

/// Parses a CSV batch and appends it to the store atomically.
///
/// Returns the number of readings added.
pub fn import_csv<R: Read>(store: &mut ReadingStore, reader: R) -> Result<usize, IngestError> {
    let batch = parse_readings_csv(store, reader)?;
    let count = store.append_readings(batch)?;
    info!(count, "imported readings batch");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UtilityType;
    use time::macros::date;

    fn store_with_meter() -> ReadingStore {
        let mut store = ReadingStore::new();
        let f = store.add_facility("F", "", 100);
        store.add_meter(f, UtilityType::Electricity).unwrap(); // meter 1
        store
    }

    #[test]
    fn imports_well_formed_batch() {
        let mut store = store_with_meter();
        let csv = "meter_id,date,value,cost\n\
                   1,2024-01-01,1000,5.0\n\
                   1,2024-01-02,1050,5.5\n";
        let count = import_csv(&mut store, csv.as_bytes()).unwrap();
        assert_eq!(count, 2);
        let rows = store.readings_for(1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date!(2024 - 01 - 01));
        assert_eq!(rows[1].value, 1050.0);
    }

    #[test]
    fn cost_column_is_optional_and_defaults_to_zero() {
        let mut store = store_with_meter();
        let csv = "meter_id,date,value\n1,2024-01-01,1000\n";
        import_csv(&mut store, csv.as_bytes()).unwrap();
        assert_eq!(store.readings_for(1).unwrap()[0].cost, 0.0);
    }

    #[test]
    fn empty_cost_field_defaults_to_zero() {
        let mut store = store_with_meter();
        let csv = "meter_id,date,value,cost\n1,2024-01-01,1000,\n";
        import_csv(&mut store, csv.as_bytes()).unwrap();
        assert_eq!(store.readings_for(1).unwrap()[0].cost, 0.0);
    }

    #[test]
    fn missing_required_column_rejects_batch() {
        let store = store_with_meter();
        let csv = "meter_id,date,cost\n1,2024-01-01,5.0\n";
        let err = parse_readings_csv(&store, csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn non_numeric_value_names_row_and_column() {
        let store = store_with_meter();
        let csv = "meter_id,date,value\n\
                   1,2024-01-01,1000\n\
                   1,2024-01-02,abc\n";
        let err = parse_readings_csv(&store, csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "got: {msg}");
        assert!(msg.contains("value"), "got: {msg}");
    }

    #[test]
    fn unparseable_date_rejects_batch() {
        let store = store_with_meter();
        let csv = "meter_id,date,value\n1,01/02/2024,1000\n";
        let err = parse_readings_csv(&store, csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn unknown_meter_fails_whole_batch_atomically() {
        let mut store = store_with_meter();
        let csv = "meter_id,date,value\n\
                   1,2024-01-01,1000\n\
                   99,2024-01-02,2000\n";
        let before = store.reading_count();
        let err = import_csv(&mut store, csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("meter 99"));
        assert_eq!(store.reading_count(), before, "nothing committed");
    }
}
