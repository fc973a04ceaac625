//! Colour values carried by `\c`, `\1c`..`\4c` text parameters
//!
//! ASS writes colours as `&HBBGGRR&` (blue first). Hand-written scripts
//! drop the trailing `&`, lowercase the `h`, or use eight digits with a
//! leading alpha byte, so parsing is lenient while formatting always emits
//! the canonical six-digit form.
//!
//! # Example
//!
//! ```rust
//! use ass_override::Color;
//!
//! let red = Color::parse("&H0000FF&").unwrap();
//! assert_eq!((red.r, red.g, red.b), (255, 0, 0));
//! assert_eq!(red.to_ass(), "&H0000FF&");
//! ```

use core::fmt;

/// RGB colour with an optional ASS alpha byte (0 = opaque)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// ASS alpha, inverted: 0 is opaque, 255 transparent
    pub a: u8,
}

impl Color {
    /// Create an opaque colour
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0 }
    }

    /// Parse an ASS colour string
    ///
    /// Accepts `&HBBGGRR&`, `&HAABBGGRR&`, the same without the trailing
    /// `&`, a `0x` prefix, or bare hex digits. Returns `None` for anything
    /// else.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix("&H")
            .or_else(|| trimmed.strip_prefix("&h"))
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        let hex = body.strip_suffix('&').unwrap_or(body);

        if hex.is_empty() || hex.len() > 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        let [r, g, b, a] = value.to_le_bytes();

        Some(Self { r, g, b, a })
    }

    /// Canonical `&HBBGGRR&` form
    #[must_use]
    pub fn to_ass(&self) -> String {
        format!("&H{:02X}{:02X}{:02X}&", self.b, self.g, self.r)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ass())
    }
}
