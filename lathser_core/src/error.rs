/*!
Common error types for the laser job pipeline.

Every failure aborts the current unit of work (one trace, one simplify,
one encode) and is surfaced to the caller unchanged.
*/

use thiserror::Error;

/// Common result type used throughout the core library
pub type Result<T> = std::result::Result<T, LaserError>;

/// Error type for tracing, simplification and job encoding
#[derive(Error, Debug)]
pub enum LaserError {
    /// Zero-length vector normalization, zero-size bounding box, empty cut
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The silhouette has no foreground/background transition
    #[error("No boundary found in {width}x{height} raster")]
    NoBoundaryFound { width: usize, height: usize },

    /// I/O failure while writing the job to its sink
    #[error("Failed to write job: {0}")]
    SinkWriteFailed(#[from] std::io::Error),

    /// Out-of-range speed/power/frequency or other device limit
    #[error("Invalid device parameter: {0}")]
    InvalidDeviceParameter(String),

    /// Negative or NaN simplification tolerance
    #[error("Invalid simplification tolerance: {0}")]
    InvalidTolerance(f64),

    /// Serialization errors from the JSON polyline export
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LaserError {
    /// Create a new degenerate geometry error
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    /// Create a new invalid device parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidDeviceParameter(msg.into())
    }
}
