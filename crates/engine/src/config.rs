use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::DimensionFilter;
use crate::error::CubeError;
use crate::period::YearRange;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A named set of series to compute over one dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub name: String,
    /// Dataset file, relative to the config file's directory.
    pub dataset: String,
    pub time_dimension: String,
    pub from_year: i32,
    pub to_year: i32,
    pub series: BTreeMap<String, SeriesConfig>,
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    #[serde(default)]
    pub filter: DimensionFilter,
    #[serde(default)]
    pub group_by: GroupBy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Year,
    PeriodLabel,
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Year => write!(f, "year"),
            Self::PeriodLabel => write!(f, "period_label"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl QueryConfig {
    pub fn from_toml(input: &str) -> Result<Self, CubeError> {
        let config: QueryConfig =
            toml::from_str(input).map_err(|e| CubeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CubeError> {
        if self.time_dimension.trim().is_empty() {
            return Err(CubeError::ConfigValidation(
                "time_dimension must not be empty".into(),
            ));
        }

        if self.from_year > self.to_year {
            return Err(CubeError::ConfigValidation(format!(
                "from_year ({}) is after to_year ({})",
                self.from_year, self.to_year
            )));
        }

        if self.series.is_empty() {
            return Err(CubeError::ConfigValidation(
                "at least one series is required".into(),
            ));
        }

        Ok(())
    }

    pub fn range(&self) -> YearRange {
        YearRange::new(self.from_year, self.to_year)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
