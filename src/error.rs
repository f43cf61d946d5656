use thiserror::Error;

/// Everything that can go wrong between the detector, the operator and the
/// timing engine.
///
/// Parse failures of manual green-time fields are not errors: they fall back to
/// a default and are reported through
/// [`NormalizationReport`](crate::timing_engine::manual_override::NormalizationReport).
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Manual active-lane selection does not contain exactly `k` distinct, in-range lanes.
    #[error("invalid lane selection: {0}")]
    InvalidSelection(String),

    /// Manual submission carries the wrong number of green-time fields.
    #[error("expected {expected} green-time values, got {actual}")]
    LaneCountMismatch { expected: usize, actual: usize },

    /// Startup parameters that cannot describe a working intersection.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The detector produced no usable counts for this tick.
    #[error("detection adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}
