use thiserror::Error;

/// Errors raised while loading or preprocessing a corpus. Declined answers
/// and empty-query outcomes are ordinary return values, never errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
