//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | input            | Reading and parsing datasets             |
//! | 10-19   | query            | Query config and results                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use cubestat_engine::CubeError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-9)
// =============================================================================

/// Cannot read an input file or write an output file.
pub const EXIT_IO: u8 = 3;

/// Dataset is not valid JSON-stat (bad JSON, not a dataset, bad sparse index).
pub const EXIT_DATASET_PARSE: u8 = 4;

// =============================================================================
// Query (10-19)
// =============================================================================

/// Query config failed to parse or validate.
pub const EXIT_QUERY_INVALID_CONFIG: u8 = 10;

/// `--strict` run produced at least one empty series.
pub const EXIT_QUERY_EMPTY_SERIES: u8 = 11;

/// Map an engine error to its exit code.
pub fn cube_exit_code(err: &CubeError) -> u8 {
    match err {
        CubeError::DatasetParse(_) | CubeError::NotADataset(_) => EXIT_DATASET_PARSE,
        CubeError::ConfigParse(_) | CubeError::ConfigValidation(_) => EXIT_QUERY_INVALID_CONFIG,
        CubeError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_DATASET_PARSE,
            EXIT_QUERY_INVALID_CONFIG,
            EXIT_QUERY_EMPTY_SERIES,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_by_domain() {
        assert_eq!(cube_exit_code(&CubeError::NotADataset("collection".into())), EXIT_DATASET_PARSE);
        assert_eq!(cube_exit_code(&CubeError::ConfigValidation("x".into())), EXIT_QUERY_INVALID_CONFIG);
        assert_eq!(cube_exit_code(&CubeError::Io("x".into())), EXIT_IO);
    }
}
