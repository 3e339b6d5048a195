//! Cost and ranking constants for the analytics pipeline.
//!
//! Every field is optional in the TOML file:
//! ```toml
//! minimum_wage = 1412.0
//! working_days_per_month = 22
//! hours_per_day = 8
//! top_n_large = 10
//! top_n_small = 5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// What-if reduction rates for the savings projections.
pub const SAVINGS_RATES: [f64; 3] = [0.10, 0.20, 0.30];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Legal monthly minimum wage, in currency units.
    pub minimum_wage: f64,

    /// Average working days in a month.
    pub working_days_per_month: u32,

    /// Length of one working day in hours.
    pub hours_per_day: u32,

    /// Row limit for the unit, department and pathology series.
    pub top_n_large: usize,

    /// Row limit for the cost-by-sector series and gender pathology lists.
    pub top_n_small: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            minimum_wage: 1412.0,
            working_days_per_month: 22,
            hours_per_day: 8,
            top_n_large: 10,
            top_n_small: 5,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AnalyticsConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AnalyticsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Wage for one hour of work: `minimum_wage / (hours_per_day * working_days_per_month)`.
    pub fn hourly_rate(&self) -> f64 {
        self.minimum_wage / (self.hours_per_day as f64 * self.working_days_per_month as f64)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.minimum_wage.is_finite() || self.minimum_wage <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "minimum_wage must be positive, got {}",
                self.minimum_wage
            )));
        }

        if self.working_days_per_month == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "working_days_per_month must be at least 1".to_string(),
            ));
        }

        if self.hours_per_day == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "hours_per_day must be at least 1".to_string(),
            ));
        }

        if self.top_n_large == 0 || self.top_n_small == 0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "top-N limits must be at least 1, got {} and {}",
                self.top_n_large, self.top_n_small
            )));
        }

        Ok(())
    }
}
