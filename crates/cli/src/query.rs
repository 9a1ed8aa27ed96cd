//! `cubestat query`: config-driven series over one dataset.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use cubestat_engine::QueryConfig;

use crate::exit_codes::{EXIT_IO, EXIT_QUERY_EMPTY_SERIES};
use crate::util::{emit_json, read_dataset};
use crate::CliError;

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Run every series in a TOML query file
    #[command(after_help = "\
Examples:
  cubestat query run output.query.toml
  cubestat query run output.query.toml --json
  cubestat query run output.query.toml --output result.json
  cubestat query run output.query.toml --strict")]
    Run {
        /// Path to the .query.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Fail if any series comes out empty
        #[arg(long)]
        strict: bool,
    },

    /// Validate a query config without running
    #[command(after_help = "\
Examples:
  cubestat query validate output.query.toml")]
    Validate {
        /// Path to the .query.toml config file
        config: PathBuf,
    },
}

pub fn cmd_query(cmd: QueryCommands) -> Result<(), CliError> {
    match cmd {
        QueryCommands::Run { config, json, output, strict } => cmd_query_run(config, json, output, strict),
        QueryCommands::Validate { config } => cmd_query_validate(config),
    }
}

fn load_config(config_path: &Path) -> Result<QueryConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_IO, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    QueryConfig::from_toml(&config_str).map_err(CliError::cube)
}

fn cmd_query_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve dataset path relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let dataset = read_dataset(&base_dir.join(&config.dataset))?;

    let result = cubestat_engine::run(&config, &dataset);

    if let Some(ref path) = output_file {
        emit_json(&result, false, Some(path.as_path()))?;
    }
    if json_output {
        emit_json(&result, false, None)?;
    }

    // Human summary to stderr
    let span = match (result.years.first(), result.years.last()) {
        (Some(first), Some(last)) => format!("{first}-{last}"),
        _ => "no years".to_string(),
    };
    eprintln!(
        "query '{}': {} series over {} row(s), {}",
        result.meta.config_name,
        result.series.len(),
        result.meta.row_count,
        span,
    );
    for s in &result.series {
        match s.latest {
            Some(latest) => eprintln!("  {}: {} point(s), latest {}", s.name, s.points.len(), latest),
            None => eprintln!("  {}: {} point(s)", s.name, s.points.len()),
        }
    }

    let empty: Vec<&str> = result
        .series
        .iter()
        .filter(|s| s.points.is_empty())
        .map(|s| s.name.as_str())
        .collect();
    if strict && !empty.is_empty() {
        return Err(CliError::new(EXIT_QUERY_EMPTY_SERIES, format!("empty series: {}", empty.join(", ")))
            .with_hint("check filter codes and the year range against `cubestat categories`"));
    }

    Ok(())
}

fn cmd_query_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: query '{}' with {} series over {} ({}-{})",
        config.name,
        config.series.len(),
        config.time_dimension,
        config.from_year,
        config.to_year,
    );
    Ok(())
}
