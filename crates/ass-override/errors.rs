//! Error types for the ass-override crate
//!
//! Malformed subtitle content never surfaces here: unknown tags, bad numbers
//! and unbalanced parentheses are recovered locally and reported through
//! [`crate::diagnostics`]. `OverrideError` is reserved for contract
//! violations by the caller, such as asking for margin index 7 or reading an
//! integer out of a parameter that holds a nested block.

use thiserror::Error;

use crate::prototype::ParamType;

/// Main error type for ass-override operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    /// Margin accessor called with an index outside `0..4`
    #[error("Invalid margin index: {index} (a dialogue line has 4 margins)")]
    InvalidMarginIndex {
        /// Requested index
        index: usize,
    },

    /// Typed getter called on a parameter that was not supplied
    #[error("Parameter was omitted and has no value")]
    OmittedParameter,

    /// Typed getter called on a parameter of an incompatible type
    #[error("Parameter type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Type the caller asked for
        expected: ParamType,
        /// Type actually stored
        found: ParamType,
    },

    /// Tag parameter index out of range
    #[error("Parameter index {index} out of range for tag '{tag}' ({len} parameters)")]
    ParameterOutOfRange {
        /// Tag name
        tag: String,
        /// Requested index
        index: usize,
        /// Number of parameters on the tag
        len: usize,
    },
}

impl OverrideError {
    /// Check if error is recoverable
    ///
    /// All variants describe a bad request that the caller can retry with
    /// corrected arguments; none leaves the parsed state inconsistent.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidMarginIndex { .. }
            | Self::OmittedParameter
            | Self::TypeMismatch { .. }
            | Self::ParameterOutOfRange { .. } => true,
        }
    }
}

/// Result type for ass-override operations
pub type Result<T> = core::result::Result<T, OverrideError>;
