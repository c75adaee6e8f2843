//! Dashboard configuration: TOML file, then environment, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use pulse_stats::thresholds::{
    CONFIDENCE_BAND_MULTIPLIER, DEFAULT_FORECAST_HORIZON, DEFAULT_TOP_N, MAX_FORECAST_HORIZON, MAX_TOP_N,
};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::order_loader::DateOrder;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: Option<PathBuf>,
    pub date_order: DateOrder,
    pub top_n: usize,
    pub forecast_horizon: usize,
    pub band_multiplier: f64,
    pub cache_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            date_order: DateOrder::default(),
            top_n: DEFAULT_TOP_N,
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            band_multiplier: CONFIDENCE_BAND_MULTIPLIER,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(contents: &str) -> Result<Self, LoadError> {
        let config: DashboardConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Apply `PULSE_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), LoadError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unset keys leave the value alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PULSE_DATA") {
            self.data_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("PULSE_TOP_N") {
            self.top_n = parse_usize("PULSE_TOP_N", &raw)?;
        }
        if let Some(raw) = lookup("PULSE_HORIZON") {
            self.forecast_horizon = parse_usize("PULSE_HORIZON", &raw)?;
        }
        if let Some(raw) = lookup("PULSE_DATE_ORDER") {
            self.date_order = match raw.trim().to_ascii_lowercase().as_str() {
                "day_first" | "dmy" => DateOrder::DayFirst,
                "month_first" | "mdy" => DateOrder::MonthFirst,
                other => {
                    return Err(LoadError::Config(format!(
                        "PULSE_DATE_ORDER must be day_first or month_first, got '{other}'"
                    )))
                }
            };
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if !(1..=MAX_TOP_N).contains(&self.top_n) {
            return Err(LoadError::Config(format!(
                "top_n must be in 1..={MAX_TOP_N}, got {}",
                self.top_n
            )));
        }
        if !(1..=MAX_FORECAST_HORIZON).contains(&self.forecast_horizon) {
            return Err(LoadError::Config(format!(
                "forecast_horizon must be in 1..={MAX_FORECAST_HORIZON}, got {}",
                self.forecast_horizon
            )));
        }
        if !self.band_multiplier.is_finite() || self.band_multiplier < 0.0 {
            return Err(LoadError::Config(format!(
                "band_multiplier must be a non-negative number, got {}",
                self.band_multiplier
            )));
        }
        if self.cache_capacity == 0 {
            return Err(LoadError::Config("cache_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize, LoadError> {
    raw.trim()
        .parse()
        .map_err(|e| LoadError::Config(format!("invalid {key} '{raw}': {e}")))
}
