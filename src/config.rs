//! TOML-based demo-data configuration and preset definitions.
//!
//! Controls the synthetic history generator in [`crate::seed`]: how many
//! days to generate, the RNG seed, the facility roster, and utility
//! pricing. All fields default to the standard demo scenario.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use time::Date;
use time::macros::date;

/// Top-level demo configuration parsed from TOML.
///
/// Load from TOML with [`DemoConfig::from_toml_file`] or use
/// [`DemoConfig::demo`] for the built-in default roster.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    /// History generation parameters.
    #[serde(default)]
    pub seeding: SeedingConfig,
    /// Utility pricing parameters.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Facility roster; each facility gets one meter per utility type.
    #[serde(default = "demo_facilities", rename = "facility")]
    pub facilities: Vec<FacilityConfig>,
}

/// History generation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedingConfig {
    /// Number of daily readings to generate per meter (must be > 0).
    pub days_history: usize,
    /// Master random seed.
    pub seed: u64,
    /// First reading date.
    pub start_date: Date,
    /// Cumulative meter value before the first generated day.
    pub start_value: f64,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            days_history: 730,
            seed: 42,
            start_date: date!(2023 - 01 - 01),
            start_value: 10_000.0,
        }
    }
}

/// Utility pricing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Electricity rate per unit below the tier threshold.
    pub electricity_rate: f64,
    /// Daily usage above which the tiered electricity rate applies.
    pub electricity_tier_threshold: f64,
    /// Electricity rate per unit above the tier threshold.
    pub electricity_tier_rate: f64,
    /// Water rate per unit.
    pub water_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            electricity_rate: 0.18,
            electricity_tier_threshold: 6_000.0,
            electricity_tier_rate: 0.30,
            water_rate: 6.0,
        }
    }
}

/// One facility in the demo roster.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilityConfig {
    /// Display name.
    pub name: String,
    /// Free-form location description.
    #[serde(default)]
    pub location: String,
    /// Nominal occupancy; scales the synthetic base load (must be > 0).
    pub capacity: u32,
}

fn demo_facilities() -> Vec<FacilityConfig> {
    [
        ("Masjid Al-Nour", "Downtown", 1000),
        ("Masjid Al-Falah", "North", 500),
        ("Masjid Al-Rahman", "East", 1200),
        ("Masjid Al-Tawa", "West", 300),
        ("Masjid Al-Ikhlas", "Suburbs", 800),
    ]
    .into_iter()
    .map(|(name, location, capacity)| FacilityConfig {
        name: name.to_string(),
        location: location.to_string(),
        capacity,
    })
    .collect()
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"seeding.days_history"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl DemoConfig {
    /// Returns the standard demo scenario: five facilities, two years of
    /// history each.
    pub fn demo() -> Self {
        Self {
            seeding: SeedingConfig::default(),
            pricing: PricingConfig::default(),
            facilities: demo_facilities(),
        }
    }

    /// Returns the compact preset: two facilities, 90 days of history,
    /// for quick runs.
    pub fn compact() -> Self {
        Self {
            seeding: SeedingConfig {
                days_history: 90,
                ..SeedingConfig::default()
            },
            pricing: PricingConfig::default(),
            facilities: demo_facilities().into_iter().take(2).collect(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "compact"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "compact" => Ok(Self::compact()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.seeding.days_history == 0 {
            errors.push(ConfigError {
                field: "seeding.days_history".into(),
                message: "must be > 0".into(),
            });
        }
        if self.seeding.start_value < 0.0 {
            errors.push(ConfigError {
                field: "seeding.start_value".into(),
                message: "must be >= 0".into(),
            });
        }

        let p = &self.pricing;
        for (field, rate) in [
            ("pricing.electricity_rate", p.electricity_rate),
            ("pricing.electricity_tier_rate", p.electricity_tier_rate),
            ("pricing.water_rate", p.water_rate),
        ] {
            if rate < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if p.electricity_tier_threshold <= 0.0 {
            errors.push(ConfigError {
                field: "pricing.electricity_tier_threshold".into(),
                message: "must be > 0".into(),
            });
        }

        if self.facilities.is_empty() {
            errors.push(ConfigError {
                field: "facility".into(),
                message: "at least one facility is required".into(),
            });
        }
        for (i, f) in self.facilities.iter().enumerate() {
            if f.name.trim().is_empty() {
                errors.push(ConfigError {
                    field: format!("facility[{i}].name"),
                    message: "must not be empty".into(),
                });
            }
            if f.capacity == 0 {
                errors.push(ConfigError {
                    field: format!("facility[{i}].capacity"),
                    message: "must be > 0".into(),
                });
            }
        }

        errors
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::demo()
    }
}
