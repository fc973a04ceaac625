//! Dialogue line with lazily parsed blocks
//!
//! [`DialogueLine`] owns the raw text of one subtitle event and, on demand,
//! the [`Block`] list parsed from it. Only one of the two is authoritative at
//! a time: after [`DialogueLine::parse_blocks`] callers edit the blocks and
//! then either write them back with [`DialogueLine::update_text_from_blocks`]
//! or drop them with [`DialogueLine::clear_blocks`].
//!
//! # Example
//!
//! ```rust
//! use ass_override::{Block, DialogueLine};
//!
//! let mut line = DialogueLine::new(0, 2000, "{\\b1}Hello");
//! for block in line.parse_blocks() {
//!     if let Block::Plain(text) = block {
//!         text.push_str(", world");
//!     }
//! }
//! line.update_text_from_blocks();
//! assert_eq!(line.text(), "{\\b1}Hello, world");
//! ```

use crate::{
    block::{parse_blocks, serialize_blocks, stripped_text, Block},
    errors::{OverrideError, Result},
};

/// Lowest margin value accepted by renderers
pub const MARGIN_MIN: i32 = -9999;
/// Highest margin value accepted by renderers
pub const MARGIN_MAX: i32 = 99999;

/// A single dialogue event
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DialogueLine {
    /// Start time in milliseconds
    pub start: i32,
    /// End time in milliseconds
    pub end: i32,
    /// Style name
    pub style: String,
    /// Actor (speaker) name
    pub actor: String,
    /// Effect field
    pub effect: String,
    /// Left, right, vertical and bottom margins
    margins: [i32; 4],
    /// Raw text with override blocks
    text: String,
    /// Blocks parsed from `text`, if currently materialized
    #[cfg_attr(feature = "serde", serde(skip))]
    blocks: Option<Vec<Block>>,
}

impl DialogueLine {
    /// Create a line with default style fields
    pub fn new(start: i32, end: i32, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            ..Self::default()
        }
    }

    /// Raw text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the raw text, discarding any parsed blocks
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.blocks = None;
    }

    /// Margin by index (0 = left, 1 = right, 2 = vertical, 3 = bottom)
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::InvalidMarginIndex`] for an index above 3.
    pub fn margin(&self, index: usize) -> Result<i32> {
        self.margins
            .get(index)
            .copied()
            .ok_or(OverrideError::InvalidMarginIndex { index })
    }

    /// Set a margin, clamping to the range renderers accept
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::InvalidMarginIndex`] for an index above 3.
    pub fn set_margin(&mut self, index: usize, value: i32) -> Result<()> {
        let slot = self
            .margins
            .get_mut(index)
            .ok_or(OverrideError::InvalidMarginIndex { index })?;
        *slot = value.clamp(MARGIN_MIN, MARGIN_MAX);
        Ok(())
    }

    /// All four margins
    #[must_use]
    pub const fn margins(&self) -> [i32; 4] {
        self.margins
    }

    /// Parse the text into blocks, reusing a previous parse
    pub fn parse_blocks(&mut self) -> &mut [Block] {
        let text = &self.text;
        self.blocks.get_or_insert_with(|| parse_blocks(text))
    }

    /// Parsed blocks, if materialized
    #[must_use]
    pub fn blocks(&self) -> Option<&[Block]> {
        self.blocks.as_deref()
    }

    /// Drop parsed blocks; the text becomes authoritative again
    pub fn clear_blocks(&mut self) {
        self.blocks = None;
    }

    /// Serialize parsed blocks back into the text and drop them
    ///
    /// Does nothing when no blocks are materialized.
    pub fn update_text_from_blocks(&mut self) {
        if let Some(blocks) = self.blocks.take() {
            self.text = serialize_blocks(&blocks);
        }
    }

    /// Text with override blocks and comments removed
    #[must_use]
    pub fn stripped_text(&self) -> String {
        match &self.blocks {
            Some(blocks) => stripped_text(blocks),
            None => stripped_text(&parse_blocks(&self.text)),
        }
    }

    /// Replace the text with its stripped form
    pub fn strip_tags_in_place(&mut self) {
        let stripped = self.stripped_text();
        self.set_text(stripped);
    }

    /// Duration in milliseconds (negative if end precedes start)
    #[must_use]
    pub const fn duration(&self) -> i32 {
        self.end - self.start
    }

    /// Whether the `[start, end)` intervals of two lines overlap
    #[must_use]
    pub const fn collides_with(&self, other: &Self) -> bool {
        if self.start < other.start {
            other.start < self.end
        } else {
            self.start < other.end
        }
    }
}
