//! `cubestat decode | years | sum | categories`: one-shot operations on a dataset.

use std::path::PathBuf;

use clap::ValueEnum;
use cubestat_engine::aggregate::distinct_categories;
use cubestat_engine::{
    collect_distinct_years, decode, latest_value, sum_by_period_label, sum_by_year, YearRange,
};

use crate::util::{emit_json, parse_filters, read_dataset};
use crate::CliError;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SeriesBy {
    /// One total per year, ascending
    Year,
    /// One total per period label (month, quarter), first-seen order
    PeriodLabel,
}

pub fn cmd_decode(dataset: PathBuf, output: Option<PathBuf>, compact: bool) -> Result<(), CliError> {
    let ds = read_dataset(&dataset)?;
    let rows = decode(&ds);
    eprintln!("decoded {} row(s) from {} cell(s)", rows.len(), ds.value.len());
    emit_json(&rows, compact, output.as_deref())
}

pub fn cmd_years(dataset: PathBuf, time: String) -> Result<(), CliError> {
    let ds = read_dataset(&dataset)?;
    require_dimension(&ds, &time)?;
    let years = collect_distinct_years(&decode(&ds), &time);
    emit_json(&years, true, None)
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_sum(
    dataset: PathBuf,
    time: String,
    filters: Vec<String>,
    from: Option<i32>,
    to: Option<i32>,
    by: SeriesBy,
    latest: bool,
    compact: bool,
) -> Result<(), CliError> {
    let filter = parse_filters(&filters)?;
    let range = YearRange::new(from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX));
    if range.from > range.to {
        return Err(CliError::args(format!("--from {} is after --to {}", range.from, range.to)));
    }

    let ds = read_dataset(&dataset)?;
    require_dimension(&ds, &time)?;
    let rows = decode(&ds);

    match by {
        SeriesBy::Year => {
            let series = sum_by_year(&rows, &time, &filter, range);
            if latest {
                println!("{}", latest_value(&series));
                return Ok(());
            }
            emit_json(&series, compact, None)
        }
        SeriesBy::PeriodLabel => {
            if latest {
                return Err(CliError::args("--latest requires --by year"));
            }
            emit_json(&sum_by_period_label(&rows, &time, &filter, range), compact, None)
        }
    }
}

pub fn cmd_categories(dataset: PathBuf, dimension: String) -> Result<(), CliError> {
    let ds = read_dataset(&dataset)?;
    require_dimension(&ds, &dimension)?;
    emit_json(&distinct_categories(&decode(&ds), &dimension), false, None)
}

/// Unknown dimensions are a usage error here; the engine alone returns empty.
fn require_dimension(ds: &cubestat_engine::Dataset, dimension: &str) -> Result<(), CliError> {
    if ds.has_dimension(dimension) {
        return Ok(());
    }
    Err(CliError::args(format!("dataset has no dimension '{dimension}'"))
        .with_hint(format!("available: {}", ds.id.join(", "))))
}
