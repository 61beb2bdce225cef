//! Core domain types: facilities, meters, and cumulative readings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Identifier of a facility (a physical site such as a mosque).
pub type FacilityId = u32;

/// Identifier of a utility meter.
pub type MeterId = u32;

/// Calendar-date format used across CSV import/export and query parameters.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Kind of utility a meter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UtilityType {
    Electricity,
    Water,
}

impl UtilityType {
    /// All supported utility types, in display order.
    pub const ALL: &[UtilityType] = &[UtilityType::Electricity, UtilityType::Water];
}

impl fmt::Display for UtilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilityType::Electricity => write!(f, "Electricity"),
            UtilityType::Water => write!(f, "Water"),
        }
    }
}

impl FromStr for UtilityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electricity" => Ok(UtilityType::Electricity),
            "water" => Ok(UtilityType::Water),
            other => Err(format!(
                "unknown utility type \"{other}\", expected \"Electricity\" or \"Water\""
            )),
        }
    }
}

/// A physical site owning one or more meters.
#[derive(Debug, Clone, Serialize)]
pub struct Facility {
    /// Unique facility identifier.
    pub id: FacilityId,
    /// Display name.
    pub name: String,
    /// Free-form location description.
    pub location: String,
    /// Nominal occupancy, used only as a synthetic load seed.
    pub capacity: u32,
}

/// A utility measuring point attached to exactly one facility.
#[derive(Debug, Clone, Serialize)]
pub struct Meter {
    /// Unique meter identifier.
    pub id: MeterId,
    /// Owning facility.
    pub facility_id: FacilityId,
    /// Utility this meter measures.
    pub utility: UtilityType,
}

/// One cumulative meter observation.
///
/// `value` is the meter's total accumulated measurement at `date`, not a
/// period delta; consumption is derived by differencing consecutive
/// readings of the same meter. Readings are append-only and are removed
/// only when the owning meter is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Meter this observation belongs to.
    pub meter_id: MeterId,
    /// Observation date.
    pub date: Date,
    /// Cumulative meter value, non-decreasing in well-formed data.
    pub value: f64,
    /// Monetary cost attributed to this reading; 0 when unpriced at entry.
    pub cost: f64,
}
