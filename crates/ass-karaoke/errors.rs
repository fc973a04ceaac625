//! Error types for karaoke model edits
//!
//! Only caller mistakes are errors: an out-of-range syllable index, a
//! boundary moved outside its neighbours, a split inside a UTF-8 sequence.
//! Refusals that are part of normal editing (merging or moving the first
//! syllable) are reported as `Ok(false)` instead.

use thiserror::Error;

/// Main error type for karaoke operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KaraokeError {
    /// Syllable index past the end of the syllable list
    #[error("Syllable index {index} out of range ({len} syllables)")]
    SyllableOutOfRange {
        /// Requested index
        index: usize,
        /// Number of syllables
        len: usize,
    },

    /// Boundary time outside the window allowed by the neighbouring syllables
    #[error("Time {time}ms outside allowed range {min}..={max}ms")]
    TimeOutOfRange {
        /// Requested time
        time: i32,
        /// Earliest allowed time
        min: i32,
        /// Latest allowed time
        max: i32,
    },

    /// Split offset falls inside a multi-byte character
    #[error("Split offset {offset} is not on a character boundary")]
    NotCharBoundary {
        /// Requested byte offset
        offset: usize,
    },

    /// Line end before line start
    #[error("Line end {end}ms precedes start {start}ms")]
    InvalidLineTimes {
        /// Requested start
        start: i32,
        /// Requested end
        end: i32,
    },

    /// Tag name is not one of `\k`, `\K`, `\kf`, `\ko`
    #[error("Unknown karaoke tag: {tag}")]
    UnknownTag {
        /// Offending tag text
        tag: String,
    },

    /// Event channel is full
    #[error("Handler limit reached: {limit}")]
    HandlerLimit {
        /// Configured maximum
        limit: usize,
    },
}

impl KaraokeError {
    /// Check if error is recoverable
    ///
    /// Every variant leaves the model untouched, so the edit can be retried
    /// with corrected arguments. A full event channel stays full until a
    /// handler is removed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::HandlerLimit { .. })
    }
}

/// Result type for karaoke operations
pub type Result<T> = core::result::Result<T, KaraokeError>;
