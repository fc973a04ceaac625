//! Karaoke syllables and their timing tags

use core::{fmt, str::FromStr};
use std::collections::BTreeMap;

use crate::errors::KaraokeError;

/// Karaoke highlighting style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KaraokeTag {
    /// `\k`: instant highlight
    #[default]
    K,
    /// `\kf` (or `\K`): left-to-right fill
    Kf,
    /// `\ko`: outline highlight
    Ko,
}

impl KaraokeTag {
    /// Tag name with backslash
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::K => "\\k",
            Self::Kf => "\\kf",
            Self::Ko => "\\ko",
        }
    }
}

impl fmt::Display for KaraokeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KaraokeTag {
    type Err = KaraokeError;

    /// Accepts the tag with or without its backslash; `\K` maps to `\kf`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('\\').unwrap_or(s) {
            "k" => Ok(Self::K),
            "K" | "kf" => Ok(Self::Kf),
            "ko" => Ok(Self::Ko),
            _ => Err(KaraokeError::UnknownTag { tag: s.to_string() }),
        }
    }
}

/// One timed unit of a karaoke line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Syllable {
    /// Start time in milliseconds from time zero (not from the line start)
    pub start_time: i32,
    /// Duration in milliseconds
    pub duration: i32,
    /// Visible text with all override blocks removed
    pub text: String,
    /// Highlighting style
    pub tag_type: KaraokeTag,
    /// Non-karaoke overrides and drawings keyed by byte offset into `text`
    pub inline_overrides: BTreeMap<usize, String>,
}

impl Syllable {
    /// End time in milliseconds, saturating at `i32::MAX`
    #[must_use]
    pub const fn end_time(&self) -> i32 {
        self.start_time.saturating_add(self.duration)
    }

    /// Text with overrides re-inserted, optionally preceded by the timing tag
    ///
    /// The timing tag duration is written in centiseconds, rounded to the
    /// nearest one.
    #[must_use]
    pub fn get_text(&self, include_k_tag: bool) -> String {
        let mut out = String::with_capacity(self.text.len() + 16);
        if include_k_tag {
            let centis = self.duration.saturating_add(5) / 10;
            out.push_str(&format!("{{{}{centis}}}", self.tag_type));
        }

        let mut idx = 0;
        for (&offset, ovr) in &self.inline_overrides {
            let offset = offset.clamp(idx, self.text.len());
            out.push_str(self.text.get(idx..offset).unwrap_or_default());
            out.push_str(ovr);
            idx = offset;
        }
        out.push_str(self.text.get(idx..).unwrap_or_default());
        out
    }
}
