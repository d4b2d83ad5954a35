use std::path::PathBuf;

/// Errors produced by the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Tensor or dataset shapes that do not line up.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Malformed IDX image or label buffer.
    #[error("invalid IDX data: {0}")]
    Idx(String),

    /// Inputs a metric cannot be computed on.
    #[error("metric error: {0}")]
    Metric(String),

    /// Invalid run, fit, or model configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An event file failed framing or checksum validation.
    #[error("corrupt event file {}: {reason}", path.display())]
    CorruptEvent { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Error::Shape(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn metric(msg: impl Into<String>) -> Self {
        Error::Metric(msg.into())
    }
}
