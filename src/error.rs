//! Error types for the combo-advisor library.

use thiserror::Error;

/// Result type alias for advisor and landscape operations.
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Errors that can occur while building landscapes or running an advisor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisorError {
    /// A combination had the wrong length or a value other than -1/+1.
    #[error("invalid combination: {message}")]
    InvalidCombination { message: String },

    /// A block index was out of range or the two blocks were not distinct.
    #[error("invalid block selection: {message}")]
    InvalidBlock { message: String },

    /// Mismatch in the dimensions of input data.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// An operation over the combination space was given no combinations.
    #[error("no combinations available")]
    NoCombinations,

    /// Numerical computation error.
    #[error("numerical error: {message}")]
    NumericalError { message: String },

    /// The landscape cannot be scaled because its minimum unscaled reward is not negative.
    #[error("degenerate landscape: minimum unscaled reward is {min_unscaled}")]
    DegenerateLandscape { min_unscaled: f64 },

    /// Random landscape synthesis hit its attempt cap.
    #[error("landscape synthesis failed after {attempts} attempts")]
    SynthesisExhausted { attempts: usize },

    /// A combination matched zero or several enumerated suggestions of one granularity.
    #[error("{matches} {granularity}-level suggestions match combination {combination}, expected 1")]
    SuggestionMismatch {
        granularity: &'static str,
        combination: String,
        matches: usize,
    },
}
