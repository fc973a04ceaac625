//! # ASS Override
//!
//! Parser and serializer for the inline override tags of ASS/SSA dialogue
//! lines (`{\b1\pos(10,20)\t(0,500,\fscx120)}`). Turns a line's raw text into
//! an editable block model and writes it back without losing anything a
//! human typed, however malformed.
//!
//! ## Features
//!
//! - **Prototype table**: every standard tag with typed, classified
//!   parameters, including optional slots and `\clip`/`\iclip` overloads
//! - **Nested tags**: `\t(...)` carries its modifiers as a parsed block
//! - **Lossless recovery**: unknown tags, bad numbers and stray parentheses
//!   are kept and reported as diagnostics, never as errors
//! - **Bulk transforms**: [`process_parameters`] visits every present
//!   parameter for retiming or resampling passes
//! - **Thread-safe**: the prototype table is initialized once and shared
//!
//! ## Quick Start
//!
//! ```rust
//! use ass_override::{parse_blocks, process_parameters, serialize_blocks, ParamClass};
//!
//! let mut blocks = parse_blocks("{\\fad(200,300)\\pos(320,240)}Hello");
//!
//! // Shift every position by 10 pixels
//! process_parameters(&mut blocks, |_, _, param| {
//!     if matches!(param.class(), ParamClass::AbsolutePosX | ParamClass::AbsolutePosY) {
//!         let moved = param.as_float().unwrap_or(0.0) + 10.0;
//!         param.set_float(moved);
//!     }
//! });
//!
//! assert_eq!(serialize_blocks(&blocks), "{\\fad(200,300)\\pos(330,250)}Hello");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod block;
pub mod color;
pub mod diagnostics;
pub mod errors;
pub mod line;
pub mod parameter;
pub mod prototype;
pub mod tag;

pub use block::{
    clear_blocks, parse_blocks, parse_blocks_with_diagnostics, process_parameters,
    serialize_blocks, strip_tags, stripped_text, Block, OverrideBlock,
};
pub use color::Color;
pub use diagnostics::{DiagnosticKind, DiagnosticLevel, TagDiagnostic};
pub use errors::{OverrideError, Result};
pub use line::DialogueLine;
pub use parameter::{float_to_string, OverrideParameter, ParameterValue};
pub use prototype::{ParamClass, ParamPresence, ParamType, PrototypeTable, TagPrototype};
pub use tag::OverrideTag;

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn prototype_table_is_reachable() {
        assert!(PrototypeTable::global().contains("\\pos"));
        assert!(!PrototypeTable::global().is_empty());
    }

    #[test]
    fn auto4_placeholders_round_trip() {
        let text = "{\\pos(!line.left!,$y)\\t(%start%,500,\\fs30)}x";
        assert_eq!(serialize_blocks(&parse_blocks(text)), text);
    }
}
