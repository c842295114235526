//! Error types for parameter estimation.

use thiserror::Error;

/// Errors raised by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid input shape, missing room dimensions, or out-of-range settings.
    /// Never recovered from: no substitute values are guessed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A computation has no safe floor to fall back on (silent input, no
    /// surviving peak candidates, decay region missing from the decay curve).
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// The exponential decay fit did not converge for a filter-bank band.
    #[error("exponential decay fit did not converge for band {band} ({center_hz} Hz)")]
    FitFailure {
        /// One-based band number.
        band: usize,
        /// Band center frequency in Hz.
        center_hz: f64,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration(reason.into())
    }

    /// Create a numeric degeneracy error.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Error::NumericDegeneracy(reason.into())
    }
}

/// Convenience result type for the analysis pipeline.
pub type Result<T> = std::result::Result<T, Error>;
