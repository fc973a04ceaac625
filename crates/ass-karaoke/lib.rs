//! # ASS Karaoke
//!
//! Syllable timing model for karaoke lines built from `\k`, `\K`, `\kf` and
//! `\ko` tags. Loads a [`DialogueLine`](ass_override::DialogueLine), exposes
//! the timed syllables for editing and writes them back as tagged text.
//!
//! ## Features
//!
//! - **Lossless**: non-karaoke overrides, comments and drawings stay pinned
//!   to their position inside the syllable text
//! - **Timing edits**: split, merge, drag a boundary, retime the whole line
//! - **Auto-split**: untimed lines are cut at spaces on load
//! - **Notifications**: handlers are told whenever the syllable set changes
//!
//! ## Quick Start
//!
//! ```rust
//! use ass_karaoke::{KaraokeModel, KaraokeTag, LoadOptions};
//! use ass_override::DialogueLine;
//!
//! let line = DialogueLine::new(0, 1000, "{\\k50}Hello {\\k50}world");
//! let mut kara = KaraokeModel::from_line(&line, LoadOptions::new().normalize(true));
//!
//! kara.set_start_time(1, 400).unwrap();
//! kara.set_tag_type(KaraokeTag::Kf);
//!
//! assert_eq!(kara.get_text(true), "{\\kf40}Hello {\\kf60}world");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod events;
pub mod model;
pub mod syllable;

pub use config::LoadOptions;
pub use errors::{KaraokeError, Result};
pub use events::{EventChannel, EventChannelConfig, EventHandler, EventStats, KaraokeEvent};
pub use model::KaraokeModel;
pub use syllable::{KaraokeTag, Syllable};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
