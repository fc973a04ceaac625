//! Override tag tokenizer
//!
//! Splits the interior of one `{...}` block into tag invocations and each
//! invocation into argument tokens, then decodes the tokens against the
//! matching [`TagPrototype`](crate::prototype::TagPrototype).
//!
//! # Tokenization rules
//!
//! - A new tag starts at every `\` outside parentheses, so
//!   `\t(0,500,\fad(1,2))` stays a single `\t` invocation.
//! - Arguments are either the whole remainder after the tag name (`\b1`,
//!   `\fnArial`) or a parenthesized, comma separated list. Commas nested
//!   inside inner parentheses do not split.
//! - Anything after the closing `)` is kept as one extra token.
//! - The token count picks the overload (`\clip` with 4 arguments is the
//!   rectangle form) and decides which optional slots are filled.
//!
//! # Example
//!
//! ```rust
//! use ass_override::OverrideTag;
//!
//! let tag = OverrideTag::parse("\\move(1,2,3,4)");
//! assert!(tag.is_valid());
//! assert_eq!(tag.params().len(), 6);
//! assert!(tag.params()[4].is_omitted());
//! assert_eq!(tag.to_string(), "\\move(1,2,3,4)");
//! ```

use core::fmt;

use crate::{
    diagnostics::{DiagnosticKind, DiagnosticSink},
    errors::{OverrideError, Result},
    parameter::OverrideParameter,
    prototype::PrototypeTable,
};

/// A single override tag invocation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverrideTag {
    /// Canonical name, or the verbatim text of an unknown tag
    name: String,
    /// One entry per prototype slot, omitted ones included
    params: Vec<OverrideParameter>,
    /// Whether the name matched a prototype
    valid: bool,
}

impl OverrideTag {
    /// Parse one tag invocation such as `\pos(10,20)`
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, &mut DiagnosticSink::default())
    }

    /// Build a tag from already decoded parameters
    ///
    /// The tag is valid when `name` is a known prototype name.
    pub fn new(name: impl Into<String>, params: Vec<OverrideParameter>) -> Self {
        let name = name.into();
        let valid = PrototypeTable::global().contains(&name);
        Self {
            name,
            params,
            valid,
        }
    }

    pub(crate) fn parse_with(text: &str, sink: &mut DiagnosticSink) -> Self {
        let table = PrototypeTable::global();
        let Some(matched) = table.match_prefix(text) else {
            tracing::debug!(tag = text, "unknown override tag");
            sink.push(DiagnosticKind::UnknownTag, text);
            return Self {
                name: text.to_string(),
                params: Vec::new(),
                valid: false,
            };
        };

        let tokens = tokenize_params(&text[matched.name.len()..], sink);
        let proto = table.select(matched.name, tokens.len()).unwrap_or(matched);

        let count = tokens.len();
        let mut tokens = tokens.into_iter();
        let params = proto
            .params
            .iter()
            .map(|slot| {
                let token = if slot.present_for(count) {
                    tokens.next()
                } else {
                    None
                };
                match token {
                    Some(token) => OverrideParameter::decode(&token, slot, sink),
                    None => OverrideParameter::omitted(slot),
                }
            })
            .collect();

        Self {
            name: proto.name.to_string(),
            params,
            valid: true,
        }
    }

    /// Tag name including the backslash
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All parameter slots in prototype order
    #[must_use]
    pub fn params(&self) -> &[OverrideParameter] {
        &self.params
    }

    /// Mutable parameter slots
    pub fn params_mut(&mut self) -> &mut [OverrideParameter] {
        &mut self.params
    }

    /// Parameter slot by index
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&OverrideParameter> {
        self.params.get(index)
    }

    /// Mutable parameter slot by index
    pub fn param_mut(&mut self, index: usize) -> Option<&mut OverrideParameter> {
        self.params.get_mut(index)
    }

    /// Parameter slot by index, naming the tag when the index is bad
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::ParameterOutOfRange`] if the tag has no slot
    /// at `index`.
    pub fn try_param(&self, index: usize) -> Result<&OverrideParameter> {
        self.params
            .get(index)
            .ok_or_else(|| OverrideError::ParameterOutOfRange {
                tag: self.name.clone(),
                index,
                len: self.params.len(),
            })
    }

    /// Whether the name matched a known prototype
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether this is one of the karaoke timing tags
    #[must_use]
    pub fn is_karaoke(&self) -> bool {
        self.valid && matches!(self.name.as_str(), "\\k" | "\\K" | "\\kf" | "\\ko")
    }
}

impl fmt::Display for OverrideTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;

        // A lone empty argument needs `()` to stay distinguishable from none
        let parentheses = self.params.len() > 1
            || self
                .params
                .first()
                .is_some_and(|p| !p.is_omitted() && p.encode().is_empty());
        if parentheses {
            f.write_str("(")?;
        }
        let mut first = true;
        for param in self.params.iter().filter(|p| !p.is_omitted()) {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(&param.encode())?;
            first = false;
        }
        if parentheses {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Split an override block interior into tag strings
///
/// Splits before every `\` at parenthesis depth 0. Text ahead of the first
/// backslash becomes its own (invalid) tag so that it survives
/// serialization.
///
/// Depth counts every nested parenthesis, so `\t(\clip(1,2,3,4)\fscx50)`
/// stays one tag. VSFilter-era parsers only track the outermost pair and
/// would split that example after `\clip(...)`.
pub(crate) fn split_tags(interior: &str) -> Vec<&str> {
    let mut tags = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, byte) in interior.bytes().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'\\' if depth == 0 && i > start => {
                tags.push(&interior[start..i]);
                start = i;
            }
            _ => {}
        }
    }

    if start < interior.len() {
        tags.push(&interior[start..]);
    }
    tags
}

/// Split the text following a tag name into argument tokens
pub(crate) fn tokenize_params(text: &str, sink: &mut DiagnosticSink) -> Vec<String> {
    if !text.starts_with('(') {
        let arg = text.trim();
        return if arg.is_empty() {
            Vec::new()
        } else {
            vec![arg.to_string()]
        };
    }

    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::with_capacity(6);
    let mut depth = 1usize;
    let mut i = 0;

    while i < len && depth > 0 {
        i += 1;
        let start = i;
        while i < len {
            match bytes[i] {
                b',' if depth == 1 => break,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        tokens.push(text[start..i].trim().to_string());
    }

    if depth > 0 {
        tracing::warn!(arguments = text, "unmatched parenthesis in override tag");
        sink.push(DiagnosticKind::UnbalancedParentheses, text);
    } else if i + 1 < len {
        let rest = &text[i + 1..];
        tracing::debug!(rest, "trailing text after override tag arguments");
        sink.push(DiagnosticKind::TrailingGarbage, rest);
        tokens.push(rest.to_string());
    }
    tokens
}
