use thiserror::Error;

/// Main error type for dynastygen
#[derive(Error, Debug)]
pub enum DynastyError {
    /// Malformed external identifier supplied by a caller
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Knowledge source failure (network, decode, no matching record).
    /// Absorbed by the resolver; never terminates a run.
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse errors (fixtures, character files)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Diagram rendering errors
    #[error("Render error: {0}")]
    Render(String),
}

/// Convenient Result type using DynastyError
pub type Result<T> = std::result::Result<T, DynastyError>;
