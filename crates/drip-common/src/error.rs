//! Error types for the drought index portal.

use thiserror::Error;

/// Result type alias using DripError.
pub type DripResult<T> = Result<T, DripError>;

/// Primary error type for drought analysis operations.
#[derive(Debug, Error)]
pub enum DripError {
    // === Lookup Errors ===
    #[error("coordinate ({lon}, {lat}) is outside grid extent {extent}")]
    OutOfBounds { lon: f64, lat: f64, extent: String },

    #[error("no data at {0}")]
    NoData(String),

    #[error("unknown drought index family for '{0}'")]
    UnknownIndexFamily(String),

    // === Input Errors ===
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("invalid array stack: {0}")]
    InvalidStack(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Infrastructure Errors ===
    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Export failed: {0}")]
    ExportError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl DripError {
    /// Create an OutOfBounds error.
    pub fn out_of_bounds(lon: f64, lat: f64, extent: impl Into<String>) -> Self {
        Self::OutOfBounds {
            lon,
            lat,
            extent: extent.into(),
        }
    }

    /// Create a NoData error.
    pub fn no_data(what: impl Into<String>) -> Self {
        Self::NoData(what.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used by callers to pick a user message.
    pub fn error_code(&self) -> &'static str {
        match self {
            DripError::OutOfBounds { .. } => "OutOfBounds",
            DripError::NoData(_) => "NoData",
            DripError::UnknownIndexFamily(_) => "UnknownIndexFamily",
            DripError::ShapeMismatch { .. } => "ShapeMismatch",
            DripError::InvalidStack(_) => "InvalidStack",
            DripError::InvalidParameter { .. } => "InvalidParameterValue",
            DripError::InvalidBbox(_) => "InvalidBBox",
            DripError::InvalidTime(_) => "InvalidTime",
            DripError::CacheError(_) => "CacheError",
            DripError::ExportError(_) => "ExportError",
            DripError::ConfigError(_) => "ConfigError",
        }
    }

    /// Whether the error was caused by the caller's input rather than the
    /// engine or its environment.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            DripError::CacheError(_) | DripError::ExportError(_) | DripError::ConfigError(_)
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for DripError {
    fn from(err: std::io::Error) -> Self {
        DripError::ExportError(err.to_string())
    }
}

impl From<serde_json::Error> for DripError {
    fn from(err: serde_json::Error) -> Self {
        DripError::ExportError(format!("JSON error: {}", err))
    }
}

impl From<csv::Error> for DripError {
    fn from(err: csv::Error) -> Self {
        DripError::ExportError(format!("CSV error: {}", err))
    }
}
