use serde::Serialize;

use crate::aggregate::{
    align_to_years, latest_value, sum_by_period_label, sum_by_year, union_years, DimensionFilter,
    LabelValue, YearValue,
};
use crate::config::{GroupBy, QueryConfig};
use crate::decode::decode;
use crate::model::{Dataset, LABEL_SUFFIX};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub meta: QueryMeta,
    /// Reference axis: ascending union of years across the yearly series.
    pub years: Vec<i32>,
    pub series: Vec<SeriesResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMeta {
    pub config_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_label: Option<String>,
    pub engine_version: String,
    pub run_at: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesResult {
    pub name: String,
    pub group_by: GroupBy,
    pub points: SeriesPoints,
    /// Yearly series only: values zero-filled against `QueryResult::years`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoints {
    Years(Vec<YearValue>),
    Labels(Vec<LabelValue>),
}

impl SeriesPoints {
    pub fn len(&self) -> usize {
        match self {
            Self::Years(points) => points.len(),
            Self::Labels(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Decode `dataset` once and compute every series in `config`.
///
/// References to dimensions or codes the dataset does not have are logged
/// and produce empty series.
pub fn run(config: &QueryConfig, dataset: &Dataset) -> QueryResult {
    let rows = decode(dataset);
    let range = config.range();

    if !dataset.has_dimension(&config.time_dimension) {
        log::warn!(
            "query '{}': time dimension '{}' not in dataset (dimensions: {})",
            config.name,
            config.time_dimension,
            dataset.id.join(", "),
        );
    }

    let mut series: Vec<SeriesResult> = Vec::with_capacity(config.series.len());
    for (name, series_config) in &config.series {
        check_filter(dataset, name, &series_config.filter);

        let points = match series_config.group_by {
            GroupBy::Year => SeriesPoints::Years(sum_by_year(
                &rows,
                &config.time_dimension,
                &series_config.filter,
                range,
            )),
            GroupBy::PeriodLabel => SeriesPoints::Labels(sum_by_period_label(
                &rows,
                &config.time_dimension,
                &series_config.filter,
                range,
            )),
        };
        log::debug!("series '{name}' by {}: {} point(s)", series_config.group_by, points.len());

        series.push(SeriesResult {
            name: name.clone(),
            group_by: series_config.group_by,
            points,
            aligned: None,
            latest: None,
        });
    }

    let yearly: Vec<&[YearValue]> = series
        .iter()
        .filter_map(|s| match &s.points {
            SeriesPoints::Years(points) => Some(points.as_slice()),
            SeriesPoints::Labels(_) => None,
        })
        .collect();
    let years = union_years(&yearly);

    for s in &mut series {
        if let SeriesPoints::Years(points) = &s.points {
            s.aligned = Some(align_to_years(points, &years));
            s.latest = Some(latest_value(points));
        }
    }

    QueryResult {
        meta: QueryMeta {
            config_name: config.name.clone(),
            dataset_label: dataset.label.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            row_count: rows.len(),
        },
        years,
        series,
    }
}

fn check_filter(dataset: &Dataset, series: &str, filter: &DimensionFilter) {
    for (field, code) in filter.iter() {
        if let Some(dimension) = dataset.dimension.get(field) {
            if !dimension.category.ordered_codes().iter().any(|c| c == code) {
                log::warn!("series '{series}': code '{code}' not found in dimension '{field}'");
            }
            continue;
        }
        let is_label_field = field
            .strip_suffix(LABEL_SUFFIX)
            .is_some_and(|dim| dataset.has_dimension(dim));
        if !is_label_field {
            log::warn!("series '{series}': filter field '{field}' is not a dataset dimension");
        }
    }
}
