//! Options for loading a line into the karaoke model

/// How [`KaraokeModel::load_with`](crate::KaraokeModel::load_with) treats a line
///
/// # Example
///
/// ```rust
/// use ass_karaoke::LoadOptions;
///
/// let options = LoadOptions::new().normalize(true).auto_split(true);
/// assert!(options.normalize);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadOptions {
    /// Split an untimed line after every space
    ///
    /// Each split hands the new syllable a share of the duration by
    /// character count, so a line loaded with `normalize` spreads its length
    /// over the words; without it the line has no duration to share.
    pub auto_split: bool,
    /// Stretch or trim syllables so they cover exactly the line duration
    pub normalize: bool,
}

impl LoadOptions {
    /// Options with both flags off
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auto_split: false,
            normalize: false,
        }
    }

    /// Set auto-splitting
    #[must_use]
    pub const fn auto_split(mut self, enabled: bool) -> Self {
        self.auto_split = enabled;
        self
    }

    /// Set normalization
    #[must_use]
    pub const fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }
}
