use thiserror::Error;

/// Failures at the parse/load boundary. Decoding and aggregation never fail.
#[derive(Error, Debug)]
pub enum CubeError {
    /// JSON parse / deserialization error for a dataset document.
    #[error("dataset parse error: {0}")]
    DatasetParse(String),

    /// The document is JSON-stat but not a dataset (collection, bare dimension).
    #[error("not a JSON-stat dataset (class \"{0}\")")]
    NotADataset(String),

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty time dimension, inverted year range, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CubeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
