//! Block splitting for dialogue line text
//!
//! A dialogue line's text is a sequence of plain text spans and `{...}`
//! override blocks. [`parse_blocks`] turns it into a [`Block`] list and
//! [`serialize_blocks`] reverses the operation.
//!
//! # Splitting rules
//!
//! - Empty text yields a single empty [`Block::Plain`].
//! - A `{` without a later `}` is literal text up to the end of the line.
//! - A non-empty `{...}` without any backslash is a comment and is kept as
//!   a plain block, braces included.
//! - `\p<n>` with `n != 0` turns the following text spans into
//!   [`Block::Drawing`] blocks until a `\p0`.
//!
//! # Example
//!
//! ```rust
//! use ass_override::{parse_blocks, serialize_blocks, strip_tags, Block};
//!
//! let text = "Yes, I {\\i1}am{\\i0} here.";
//! let blocks = parse_blocks(text);
//! assert_eq!(blocks.len(), 5);
//! assert!(matches!(&blocks[0], Block::Plain(s) if s == "Yes, I "));
//! assert_eq!(serialize_blocks(&blocks), text);
//! assert_eq!(strip_tags(text), "Yes, I am here.");
//! ```

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    diagnostics::{DiagnosticKind, DiagnosticSink, TagDiagnostic},
    parameter::OverrideParameter,
    tag::{split_tags, OverrideTag},
};

/// One span of a dialogue line
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Block {
    /// Literal text, or a `{comment}` kept with its braces
    Plain(String),
    /// Vector drawing commands produced while `\p` is active
    Drawing {
        /// Drawing commands
        text: String,
        /// `\p` level in effect
        scale: i32,
    },
    /// Parsed `{...}` override block
    Override(OverrideBlock),
}

impl Block {
    /// Serialized text of this block
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Plain(text) | Self::Drawing { text, .. } => Cow::Borrowed(text.as_str()),
            Self::Override(block) => Cow::Owned(block.text()),
        }
    }

    /// Whether this is a `{...}` comment kept as plain text
    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Plain(text) if text.len() >= 2 && text.starts_with('{') && text.ends_with('}'))
    }

    /// Text this block contributes to the visible line
    #[must_use]
    pub fn visible_text(&self) -> &str {
        match self {
            Self::Plain(_) if self.is_comment() => "",
            Self::Plain(text) | Self::Drawing { text, .. } => text.as_str(),
            Self::Override(_) => "",
        }
    }
}

/// Contents of one `{...}` pair
///
/// Keeps the verbatim interior next to the parsed tags. Equality compares
/// tags only.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverrideBlock {
    /// Interior text as it appeared in the source
    raw: String,
    /// Parsed tags in source order
    tags: Vec<OverrideTag>,
}

impl PartialEq for OverrideBlock {
    fn eq(&self, other: &Self) -> bool {
        self.tags == other.tags
    }
}

impl OverrideBlock {
    /// Parse the interior of an override block (braces excluded)
    #[must_use]
    pub fn parse(interior: &str) -> Self {
        Self::parse_with(interior, &mut DiagnosticSink::default())
    }

    pub(crate) fn parse_with(interior: &str, sink: &mut DiagnosticSink) -> Self {
        let tags = split_tags(interior)
            .into_iter()
            .map(|tag| OverrideTag::parse_with(tag, sink))
            .collect();
        Self {
            raw: interior.to_string(),
            tags,
        }
    }

    /// Parsed tags
    #[must_use]
    pub fn tags(&self) -> &[OverrideTag] {
        &self.tags
    }

    /// Mutable parsed tags
    pub fn tags_mut(&mut self) -> &mut Vec<OverrideTag> {
        &mut self.tags
    }

    /// Parse and append a tag
    pub fn add_tag(&mut self, text: &str) {
        self.tags.push(OverrideTag::parse(text));
    }

    /// First tag with the given name
    #[must_use]
    pub fn find_tag(&self, name: &str) -> Option<&OverrideTag> {
        self.tags.iter().find(|tag| tag.name() == name)
    }

    /// Interior text as originally parsed
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Serialized tags without braces
    #[must_use]
    pub fn interior(&self) -> String {
        self.tags.iter().map(ToString::to_string).collect()
    }

    /// Serialized block with braces
    #[must_use]
    pub fn text(&self) -> String {
        format!("{{{}}}", self.interior())
    }

    /// Visit every present parameter, recursing into nested blocks
    pub fn process_parameters<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&str, usize, &mut OverrideParameter),
    {
        for tag in &mut self.tags {
            let name = tag.name().to_string();
            for (index, param) in tag.params_mut().iter_mut().enumerate() {
                if param.is_omitted() {
                    continue;
                }
                visitor(&name, index, param);
                if let Ok(nested) = param.as_block_mut() {
                    nested.process_parameters(visitor);
                }
            }
        }
    }
}

/// Split line text into blocks
#[must_use]
pub fn parse_blocks(text: &str) -> Vec<Block> {
    split_blocks(text, &mut DiagnosticSink::default())
}

/// Split line text into blocks and report everything that was repaired
#[must_use]
pub fn parse_blocks_with_diagnostics(text: &str) -> (Vec<Block>, Vec<TagDiagnostic>) {
    let mut sink = DiagnosticSink::default();
    let blocks = split_blocks(text, &mut sink);
    (blocks, sink.into_vec())
}

fn split_blocks(text: &str, sink: &mut DiagnosticSink) -> Vec<Block> {
    if text.is_empty() {
        return vec![Block::Plain(String::new())];
    }

    let mut blocks = Vec::new();
    let mut drawing_level = 0;
    let mut cur = 0;

    while cur < text.len() {
        let rest = &text[cur..];
        sink.at(cur);

        if rest.starts_with('{') {
            let Some(close) = rest.find('}') else {
                tracing::warn!(offset = cur, "unclosed override block");
                sink.push(DiagnosticKind::UnclosedOverride, rest);
                blocks.push(text_block(rest, drawing_level));
                break;
            };

            let interior = &rest[1..close];
            cur += close + 1;

            if !interior.is_empty() && !interior.contains('\\') {
                blocks.push(Block::Plain(format!("{{{interior}}}")));
                continue;
            }

            let block = OverrideBlock::parse_with(interior, sink);
            for tag in block.tags().iter().filter(|t| t.name() == "\\p") {
                drawing_level = tag.param(0).and_then(|p| p.as_int().ok()).unwrap_or(0);
            }
            blocks.push(Block::Override(block));
            continue;
        }

        let end = rest.find('{').unwrap_or(rest.len());
        blocks.push(text_block(&rest[..end], drawing_level));
        cur += end;
    }

    tracing::trace!(blocks = blocks.len(), "parsed dialogue line");
    blocks
}

fn text_block(text: &str, drawing_level: i32) -> Block {
    if drawing_level == 0 {
        Block::Plain(text.to_string())
    } else {
        Block::Drawing {
            text: text.to_string(),
            scale: drawing_level,
        }
    }
}

/// Concatenate serialized blocks
#[must_use]
pub fn serialize_blocks(blocks: &[Block]) -> String {
    blocks.iter().map(Block::text).collect()
}

/// Visible text of parsed blocks: plain spans and drawings, no comments
#[must_use]
pub fn stripped_text(blocks: &[Block]) -> String {
    blocks.iter().map(Block::visible_text).collect()
}

static OVERRIDE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]*\}").expect("override span pattern is valid"));

/// Remove every `{...}` span without tokenizing
#[must_use]
pub fn strip_tags(text: &str) -> String {
    OVERRIDE_SPAN.replace_all(text, "").into_owned()
}

/// Visit every present parameter of every override block
///
/// The visitor receives the tag name, the parameter's slot index and the
/// parameter itself. Block parameters are visited first and then
/// descended into.
pub fn process_parameters<F>(blocks: &mut [Block], mut visitor: F)
where
    F: FnMut(&str, usize, &mut OverrideParameter),
{
    for block in blocks {
        if let Block::Override(ovr) = block {
            ovr.process_parameters(&mut visitor);
        }
    }
}

/// Drop parsed blocks once the caller is done with them
pub fn clear_blocks(blocks: &mut Vec<Block>) {
    blocks.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::ParamClass;
    use pretty_assertions::assert_eq;

    fn plain(text: &str) -> Block {
        Block::Plain(text.to_string())
    }

    #[test]
    fn empty_line_has_one_block() {
        assert_eq!(parse_blocks(""), vec![plain("")]);
    }

    #[test]
    fn plain_and_override_spans() {
        let blocks = parse_blocks("Yes, I {\\i1}am{\\i0} here.");
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0], plain("Yes, I "));
        assert_eq!(blocks[2], plain("am"));
        assert_eq!(blocks[4], plain(" here."));

        let Block::Override(ovr) = &blocks[1] else {
            panic!("expected override block");
        };
        assert_eq!(ovr.raw_text(), "\\i1");
        assert_eq!(ovr.tags()[0].name(), "\\i");
        assert!(ovr.tags()[0].params()[0].as_bool().unwrap());
    }

    #[test]
    fn comments_stay_plain() {
        let blocks = parse_blocks("{note to self}text");
        assert_eq!(blocks, vec![plain("{note to self}"), plain("text")]);
        assert!(blocks[0].is_comment());
        assert!(!blocks[1].is_comment());
        assert_eq!(stripped_text(&blocks), "text");
    }

    #[test]
    fn empty_braces_are_an_override() {
        let blocks = parse_blocks("a{}b");
        let Block::Override(ovr) = &blocks[1] else {
            panic!("expected override block");
        };
        assert!(ovr.tags().is_empty());
        assert_eq!(serialize_blocks(&blocks), "a{}b");
    }

    #[test]
    fn unclosed_brace_is_text() {
        let (blocks, diags) = parse_blocks_with_diagnostics("ab{\\b1 never closed");
        assert_eq!(blocks, vec![plain("ab"), plain("{\\b1 never closed")]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnclosedOverride);
        assert_eq!(diags[0].offset, 2);
    }

    #[test]
    fn drawing_mode() {
        let blocks = parse_blocks("{\\p2}m 0 0 l 10 10{\\p0}text");
        assert_eq!(
            blocks[1],
            Block::Drawing {
                text: "m 0 0 l 10 10".to_string(),
                scale: 2
            }
        );
        assert_eq!(blocks[3], plain("text"));
        assert_eq!(stripped_text(&blocks), "m 0 0 l 10 10text");
    }

    #[test]
    fn drawing_level_survives_unrelated_blocks() {
        let blocks = parse_blocks("{\\p1}m 0 0{\\c&HFF&}l 5 5");
        assert!(matches!(blocks[3], Block::Drawing { scale: 1, .. }));
    }

    #[test]
    fn strip_tags_removes_spans() {
        assert_eq!(strip_tags("{\\b1}bold{\\b0} {x}plain"), "bold plain");
        assert_eq!(strip_tags("no tags"), "no tags");
        assert_eq!(strip_tags("open { brace"), "open { brace");
    }

    #[test]
    fn override_equality_ignores_raw_text() {
        let a = OverrideBlock::parse("\\pos(1.50,2)");
        let b = OverrideBlock::parse("\\pos(1.5,2)");
        assert_eq!(a, b);
        assert_ne!(a.raw_text(), b.raw_text());
    }

    #[test]
    fn find_and_add_tags() {
        let mut block = OverrideBlock::parse("\\b1");
        block.add_tag("\\pos(10,20)");
        assert_eq!(block.text(), "{\\b1\\pos(10,20)}");
        assert_eq!(
            block.find_tag("\\pos").unwrap().params()[1].as_float().unwrap(),
            20.0
        );
        assert!(block.find_tag("\\i").is_none());
    }

    #[test]
    fn process_parameters_visits_nested() {
        let mut blocks = parse_blocks("{\\move(1,2,3,4)\\t(100,200,\\fad(10,20))}x");
        let mut seen = Vec::new();
        process_parameters(&mut blocks, |name, index, param| {
            seen.push((name.to_string(), index));
            if param.class() == ParamClass::RelativeTimeStart {
                let shifted = param.as_int().unwrap_or(0) * 2;
                param.set_int(shifted);
            }
        });

        assert_eq!(
            seen,
            vec![
                ("\\move".to_string(), 0),
                ("\\move".to_string(), 1),
                ("\\move".to_string(), 2),
                ("\\move".to_string(), 3),
                ("\\t".to_string(), 0),
                ("\\t".to_string(), 1),
                ("\\t".to_string(), 3),
                ("\\fad".to_string(), 0),
                ("\\fad".to_string(), 1),
            ]
        );
        assert_eq!(
            serialize_blocks(&blocks),
            "{\\move(1,2,3,4)\\t(200,400,\\fad(20,20))}x"
        );
    }
}
