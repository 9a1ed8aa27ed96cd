use std::io::{self, Read};
use std::path::Path;

use cubestat_engine::{Dataset, DimensionFilter};
use serde::Serialize;

use crate::CliError;

/// Read and parse a JSON-stat dataset from `path`, or stdin when `path` is `-`.
pub(crate) fn read_dataset(path: &Path) -> Result<Dataset, CliError> {
    let input = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::io(format!("cannot read stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?
    };

    let dataset = Dataset::from_json(&input).map_err(CliError::cube)?;
    log::debug!(
        "loaded {}: {} dimension(s), {} cell(s)",
        path.display(),
        dataset.id.len(),
        dataset.value.len(),
    );
    Ok(dataset)
}

/// Parse repeated `FIELD=CODE` arguments. Splits at the first `=`, so codes
/// may themselves contain `=`.
pub(crate) fn parse_filters(args: &[String]) -> Result<DimensionFilter, CliError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((field, code)) if !field.is_empty() => Ok((field.to_string(), code.to_string())),
            _ => Err(CliError::args(format!("invalid filter '{arg}'"))
                .with_hint("expected FIELD=CODE, e.g. --filter STATISTIC=AEA01C02")),
        })
        .collect()
}

/// Serialize `value` as JSON to `output`, or stdout when `output` is `None`.
pub(crate) fn emit_json<T: Serialize>(value: &T, compact: bool, output: Option<&Path>) -> Result<(), CliError> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
