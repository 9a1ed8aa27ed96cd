// cubestat CLI - decode JSON-stat cubes and reduce them to series

mod cube;
mod exit_codes;
mod query;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cubestat_engine::CubeError;
use tracing_subscriber::EnvFilter;

use cube::SeriesBy;
use exit_codes::{cube_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use query::QueryCommands;

#[derive(Parser)]
#[command(name = "cubestat")]
#[command(about = "Decode JSON-stat statistical cubes into rows and time series")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log engine diagnostics at debug level (overridden by CUBESTAT_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a dataset into one flat JSON record per observation
    #[command(after_help = "\
Examples:
  cubestat decode AEA01.json
  cubestat decode AEA01.json --compact -o rows.json
  curl -s $CSO_URL | cubestat decode -")]
    Decode {
        /// JSON-stat dataset file (or - for stdin)
        dataset: PathBuf,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the distinct years of a time dimension
    #[command(after_help = "\
Examples:
  cubestat years AEA01.json --time 'TLIST(A1)'")]
    Years {
        /// JSON-stat dataset file (or - for stdin)
        dataset: PathBuf,

        /// Time dimension id
        #[arg(long, short = 't')]
        time: String,
    },

    /// Sum matching observations into a yearly or per-period series
    #[command(after_help = "\
Examples:
  cubestat sum AEA01.json -t 'TLIST(A1)' --filter STATISTIC=AEA01C02 --filter C02196V02652=-
  cubestat sum AEA01.json -t 'TLIST(A1)' --filter STATISTIC=AEA01C55 --from 2020 --to 2023 --latest
  cubestat sum AHM05.json -t 'TLIST(M1)' --filter STATISTIC=AHM05C01 --by period-label")]
    Sum {
        /// JSON-stat dataset file (or - for stdin)
        dataset: PathBuf,

        /// Time dimension id
        #[arg(long, short = 't')]
        time: String,

        /// Required code, as FIELD=CODE. Repeatable; all must match.
        #[arg(long, short = 'f', value_name = "FIELD=CODE")]
        filter: Vec<String>,

        /// First year (inclusive)
        #[arg(long)]
        from: Option<i32>,

        /// Last year (inclusive)
        #[arg(long)]
        to: Option<i32>,

        /// Grouping key
        #[arg(long, value_enum, default_value = "year")]
        by: SeriesBy,

        /// Print only the value of the latest year (0 if none)
        #[arg(long)]
        latest: bool,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the distinct categories of a dimension, sorted by label
    #[command(after_help = "\
Examples:
  cubestat categories ACA03.json --dimension C02196V04140")]
    Categories {
        /// JSON-stat dataset file (or - for stdin)
        dataset: PathBuf,

        /// Dimension id
        #[arg(long, short = 'd')]
        dimension: String,
    },

    /// Config-driven series over one dataset
    #[command(subcommand)]
    Query(QueryCommands),
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Create error from engine error with proper exit code.
    pub fn cube(err: CubeError) -> Self {
        let hint = match &err {
            CubeError::NotADataset(_) => {
                Some("fetch a single dataset (JSON-stat 2.0, class \"dataset\")".to_string())
            }
            CubeError::DatasetParse(_) => Some("expected a JSON-stat 2.0 dataset".to_string()),
            _ => None,
        };
        Self { code: cube_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  cubestat-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// stderr logging. `CUBESTAT_LOG` takes an `EnvFilter` directive
/// (e.g. `cubestat_engine=trace`); otherwise `warn`, or `debug` with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CUBESTAT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    // Fails only if a logger is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decode { dataset, output, compact } => cube::cmd_decode(dataset, output, compact),
        Commands::Years { dataset, time } => cube::cmd_years(dataset, time),
        Commands::Sum { dataset, time, filter, from, to, by, latest, compact } => {
            cube::cmd_sum(dataset, time, filter, from, to, by, latest, compact)
        }
        Commands::Categories { dataset, dimension } => cube::cmd_categories(dataset, dimension),
        Commands::Query(cmd) => query::cmd_query(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
