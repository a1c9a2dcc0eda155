//! Error types for kernel setup and processing.

use thiserror::Error;

/// Error type for parameter derivation and span processing.
///
/// Kernels never fail while processing pixels; these errors come from
/// validating settings, wiring inputs and loading presets.
#[derive(Error, Debug)]
pub enum OpsError {
    /// A setting is outside its accepted range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Setting name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Fewer input sources than the effect needs.
    #[error("{effect} needs {expected} input(s), got {got}")]
    MissingInput {
        /// Effect name
        effect: &'static str,
        /// Number of inputs required
        expected: usize,
        /// Number of inputs supplied
        got: usize,
    },

    /// Inputs disagree on size or layout.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// No effect registered under this name.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// Preset or settings could not be parsed.
    #[error("settings parse error: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// Preset file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame or layout error from pixfx-core.
    #[error(transparent)]
    Core(#[from] pixfx_core::Error),
}

impl OpsError {
    /// Creates an [`OpsError::InvalidParameter`] error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for kernel operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Checks that `value` is finite and inside `[lo, hi]`.
pub(crate) fn ensure_range(name: &'static str, value: f32, lo: f32, hi: f32) -> OpsResult<f32> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(value)
    } else {
        Err(OpsError::invalid(name, format!("{value} not in [{lo}, {hi}]")))
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> OpsResult<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(OpsError::invalid(name, format!("{value} must be > 0")))
    }
}
