/// Crate-level error type for the glimpse phase reconstruction and
/// quality scoring library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A required dimension is zero or invalid.
    #[error("invalid size for `{name}`: {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    /// Input array has incorrect shape for the operation.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Audio data is empty when a non-empty signal was required.
    #[error("audio data is empty")]
    EmptyAudio,

    /// Audio data contains non-finite values (NaN or Inf).
    #[error("audio data contains non-finite values")]
    NonFiniteAudio,

    /// A quality comparison could not be computed for this pair.
    ///
    /// Unlike the other variants this one is routinely recoverable: the
    /// batch layer records it per item and keeps going.
    #[error("scoring failed: {0}")]
    Scoring(String),

    /// Audio I/O errors.
    #[error(transparent)]
    Audio(#[from] crate::io::AudioError),

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Manifest or report CSV errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Convenience Result type for glimpse operations.
pub type Result<T> = std::result::Result<T, Error>;
