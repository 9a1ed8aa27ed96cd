//! `cubestat-engine`: JSON-stat cube decoding and row aggregation.
//!
//! Pure engine crate: receives parsed datasets, returns decoded rows and
//! reduced series. No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod period;
pub mod query;

pub use aggregate::{
    collect_distinct_years, filter_by_dimension, latest_value, sum_by_period_label, sum_by_year,
    DimensionFilter, LabelValue, YearValue,
};
pub use config::QueryConfig;
pub use decode::decode;
pub use error::CubeError;
pub use model::{dimension_code, dimension_label, Dataset, Dimension, Row};
pub use period::{parse_year, YearRange};
pub use query::{run, QueryResult};
