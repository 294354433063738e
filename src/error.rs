/// Error types for orgmark
use std::io;

/// Errors surfaced to callers.
///
/// Parsing and rendering never fail; only the edges that touch the outside
/// world (reading input, loading configuration, dumping the tree) do.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading input or writing output failed, or the input was not UTF-8.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A render configuration file could not be parsed.
    #[error("invalid render configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The document tree could not be serialized.
    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
