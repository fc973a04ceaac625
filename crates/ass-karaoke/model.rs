//! Karaoke syllable model for one dialogue line
//!
//! Loads the `\k`-family timing of a line into a list of [`Syllable`]s,
//! supports the edits a timing UI performs (split, merge, drag a boundary,
//! retime the line) and writes the result back as tagged text.
//!
//! # Invariants
//!
//! After [`KaraokeModel::load`] the first syllable starts at the line start
//! and every syllable ends where the next one begins. Splits, merges and
//! boundary moves keep that contiguity; durations never go negative.
//!
//! # Example
//!
//! ```rust
//! use ass_karaoke::KaraokeModel;
//! use ass_override::DialogueLine;
//!
//! let line = DialogueLine::new(0, 500, "{\\k20}Hel{\\k30}lo");
//! let mut kara = KaraokeModel::new();
//! kara.load(&line, false, true);
//!
//! assert_eq!(kara.len(), 2);
//! assert_eq!(kara.syllables()[1].start_time, 200);
//! assert_eq!(kara.get_text(true), "{\\k20}Hel{\\k30}lo");
//! ```

use ass_override::{parse_blocks, Block, DialogueLine};

use crate::{
    config::LoadOptions,
    errors::{KaraokeError, Result},
    events::{EventChannel, EventHandler, KaraokeEvent},
    syllable::{KaraokeTag, Syllable},
};

/// Timed syllables of one line plus change notification
#[derive(Debug, Default)]
pub struct KaraokeModel {
    /// Syllables in time order
    syllables: Vec<Syllable>,
    /// Subscribers to syllable changes
    events: EventChannel,
}

impl KaraokeModel {
    /// Empty model; call [`KaraokeModel::load`] before editing
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Model loaded from a line
    #[must_use]
    pub fn from_line(line: &DialogueLine, options: LoadOptions) -> Self {
        let mut model = Self::new();
        model.load_with(line, options);
        model
    }

    /// Replace the syllables with those parsed from `line`
    pub fn load(&mut self, line: &DialogueLine, auto_split: bool, normalize: bool) {
        self.load_with(
            line,
            LoadOptions::new().auto_split(auto_split).normalize(normalize),
        );
    }

    /// [`KaraokeModel::load`] with an options struct
    pub fn load_with(&mut self, line: &DialogueLine, options: LoadOptions) {
        self.syllables = parse_syllables(line);

        if options.normalize {
            self.normalize(line.end);
        }

        if options.auto_split && self.syllables.len() == 1 {
            self.events.suppress();
            while let Some(pos) = self.syllables.last().and_then(|syl| syl.text.find(' ')) {
                let last = self.syllables.len() - 1;
                // A space is one byte, so pos + 1 is always a boundary
                if self.add_split(last, pos + 1).is_err() {
                    break;
                }
            }
            self.events.resume();
        }

        tracing::trace!(
            syllables = self.syllables.len(),
            start = line.start,
            end = line.end,
            "karaoke line loaded"
        );
        self.announce();
    }

    /// Fit the total duration to the line end
    fn normalize(&mut self, end_time: i32) {
        let Some(last_end) = self.syllables.last().map(Syllable::end_time) else {
            return;
        };

        if last_end < end_time {
            if let Some(last) = self.syllables.last_mut() {
                last.duration = last.duration.saturating_add(end_time.saturating_sub(last_end));
            }
        } else if last_end > end_time {
            for syl in &mut self.syllables {
                if syl.start_time > end_time {
                    syl.start_time = end_time;
                    syl.duration = 0;
                } else {
                    syl.duration = syl.duration.min(end_time.saturating_sub(syl.start_time));
                }
            }
        }
    }

    /// Tagged text for the whole line
    #[must_use]
    pub fn get_text(&self, include_k_tags: bool) -> String {
        self.syllables
            .iter()
            .map(|syl| syl.get_text(include_k_tags))
            .collect()
    }

    /// Split syllable `index` at byte offset `pos` of its text
    ///
    /// The new syllable receives a share of the duration proportional to
    /// its character count, rounded to 10 ms. An offset at or past the end
    /// inserts an empty zero-length syllable.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or `pos` falls inside a
    /// multi-byte character.
    pub fn add_split(&mut self, index: usize, pos: usize) -> Result<()> {
        let syl = self.syllable_mut(index)?;
        if pos < syl.text.len() && !syl.text.is_char_boundary(pos) {
            return Err(KaraokeError::NotCharBoundary { offset: pos });
        }

        let new_text = if pos < syl.text.len() {
            syl.text.split_off(pos)
        } else {
            String::new()
        };

        let new_duration = if new_text.is_empty() {
            0
        } else if syl.text.is_empty() {
            syl.duration
        } else {
            let old_chars = count_chars(&syl.text);
            let new_chars = count_chars(&new_text);
            let share = i64::from(syl.duration) * new_chars / (old_chars + new_chars);
            let rounded = (share + 5) / 10 * 10;
            i32::try_from(rounded)
                .unwrap_or(syl.duration)
                .min(syl.duration)
        };
        syl.duration = syl.duration.saturating_sub(new_duration);

        let split_at = syl.text.len();
        let moved = syl.inline_overrides.split_off(&split_at);
        let new_syl = Syllable {
            start_time: syl.end_time(),
            duration: new_duration,
            text: new_text,
            tag_type: syl.tag_type,
            inline_overrides: moved
                .into_iter()
                .map(|(offset, ovr)| (offset - split_at, ovr))
                .collect(),
        };

        tracing::trace!(index, pos, new_duration, "karaoke syllable split");
        self.syllables.insert(index + 1, new_syl);
        self.announce();
        Ok(())
    }

    /// Merge syllable `index` into its predecessor
    ///
    /// Returns `Ok(false)` for the first syllable, which cannot be merged.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn remove_split(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(false);
        }

        let syl = self.syllables.remove(index);
        let prev = &mut self.syllables[index - 1];
        prev.duration = prev.duration.saturating_add(syl.duration);

        let base = prev.text.len();
        for (offset, ovr) in syl.inline_overrides {
            prev.inline_overrides
                .entry(offset + base)
                .or_default()
                .push_str(&ovr);
        }
        prev.text.push_str(&syl.text);

        tracing::trace!(index, "karaoke syllables merged");
        self.announce();
        Ok(true)
    }

    /// Move the boundary between syllables `index - 1` and `index`
    ///
    /// Returns `Ok(false)` for the first syllable, which is anchored to the
    /// line start. No change notification is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or `time` lies outside
    /// `[previous.start_time, syllable.end_time()]`.
    pub fn set_start_time(&mut self, index: usize, time: i32) -> Result<bool> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(false);
        }

        let min = self.syllables[index - 1].start_time;
        let max = self.syllables[index].end_time();
        if !(min..=max).contains(&time) {
            return Err(KaraokeError::TimeOutOfRange { time, min, max });
        }

        let syl = &mut self.syllables[index];
        let delta = time.saturating_sub(syl.start_time);
        syl.start_time = time;
        syl.duration = syl.duration.saturating_sub(delta);
        let prev = &mut self.syllables[index - 1];
        prev.duration = prev.duration.saturating_add(delta);
        Ok(true)
    }

    /// Re-anchor the syllables to new line times
    ///
    /// Syllables before `start` are cut, those after `end` collapse to
    /// zero length at `end`, and the last remaining syllable is stretched or
    /// trimmed to end exactly at `end`. No change notification is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if `end` precedes `start`.
    pub fn set_line_times(&mut self, start: i32, end: i32) -> Result<()> {
        if end < start {
            return Err(KaraokeError::InvalidLineTimes { start, end });
        }
        if self.syllables.is_empty() {
            return Ok(());
        }

        let mut idx = 0;
        loop {
            let syl = &mut self.syllables[idx];
            let delta = start.saturating_sub(syl.start_time);
            syl.start_time = start;
            syl.duration = syl.duration.saturating_sub(delta).max(0);
            idx += 1;
            if idx >= self.syllables.len() || self.syllables[idx].start_time >= start {
                break;
            }
        }

        let mut idx = self.syllables.len() - 1;
        while idx > 0 && self.syllables[idx].start_time > end {
            let syl = &mut self.syllables[idx];
            syl.start_time = end;
            syl.duration = 0;
            idx -= 1;
        }
        let syl = &mut self.syllables[idx];
        syl.duration = end.saturating_sub(syl.start_time);

        tracing::trace!(start, end, "karaoke line retimed");
        Ok(())
    }

    /// Karaoke style of the first syllable
    #[must_use]
    pub fn tag_type(&self) -> KaraokeTag {
        self.syllables
            .first()
            .map_or(KaraokeTag::default(), |syl| syl.tag_type)
    }

    /// Apply a karaoke style to every syllable
    pub fn set_tag_type(&mut self, tag: KaraokeTag) {
        for syl in &mut self.syllables {
            syl.tag_type = tag;
        }
        self.announce();
    }

    /// One line per syllable, copying the template's style fields
    ///
    /// Empty zero-length syllables are skipped.
    #[must_use]
    pub fn split_lines(&self, template: &DialogueLine) -> Vec<DialogueLine> {
        self.syllables
            .iter()
            .filter(|syl| syl.duration > 0 || !syl.text.is_empty())
            .map(|syl| {
                let mut line = template.clone();
                line.start = syl.start_time;
                line.end = syl.end_time();
                line.set_text(syl.get_text(false));
                line
            })
            .collect()
    }

    /// All syllables
    #[must_use]
    pub fn syllables(&self) -> &[Syllable] {
        &self.syllables
    }

    /// Syllable by index
    #[must_use]
    pub fn syllable(&self, index: usize) -> Option<&Syllable> {
        self.syllables.get(index)
    }

    /// Iterate over syllables
    pub fn iter(&self) -> impl Iterator<Item = &Syllable> {
        self.syllables.iter()
    }

    /// Number of syllables
    #[must_use]
    pub fn len(&self) -> usize {
        self.syllables.len()
    }

    /// Whether nothing has been loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.syllables.is_empty()
    }

    /// Register a change handler
    ///
    /// # Errors
    ///
    /// Returns [`KaraokeError::HandlerLimit`] if the channel is full.
    pub fn subscribe(&mut self, handler: impl EventHandler + 'static) -> Result<usize> {
        self.events.register_handler(Box::new(handler))
    }

    /// Remove a change handler, returning whether it was registered
    pub fn unsubscribe(&mut self, handler_id: usize) -> bool {
        self.events.unregister_handler(handler_id)
    }

    /// The underlying event channel
    #[must_use]
    pub const fn events(&self) -> &EventChannel {
        &self.events
    }

    fn announce(&mut self) {
        let event = KaraokeEvent::SyllablesChanged {
            syllable_count: self.syllables.len(),
        };
        self.events.dispatch(&event);
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.syllables.len() {
            Ok(())
        } else {
            Err(KaraokeError::SyllableOutOfRange {
                index,
                len: self.syllables.len(),
            })
        }
    }

    fn syllable_mut(&mut self, index: usize) -> Result<&mut Syllable> {
        let len = self.syllables.len();
        self.syllables
            .get_mut(index)
            .ok_or(KaraokeError::SyllableOutOfRange { index, len })
    }
}

impl<'a> IntoIterator for &'a KaraokeModel {
    type Item = &'a Syllable;
    type IntoIter = core::slice::Iter<'a, Syllable>;

    fn into_iter(self) -> Self::IntoIter {
        self.syllables.iter()
    }
}

/// Largest `\k` argument taken at face value
const MAX_CENTISECONDS: i32 = i32::MAX / 10;

fn count_chars(text: &str) -> i64 {
    i64::try_from(text.chars().count()).unwrap_or(i64::MAX)
}

/// Walk the blocks of `line` and cut them into syllables at karaoke tags
fn parse_syllables(line: &DialogueLine) -> Vec<Syllable> {
    let mut syllables = Vec::new();
    let mut syl = Syllable {
        start_time: line.start,
        ..Syllable::default()
    };

    for block in parse_blocks(line.text()) {
        match &block {
            Block::Plain(text) if !block.is_comment() => syl.text.push_str(text),
            Block::Plain(text) | Block::Drawing { text, .. } => {
                let at = syl.text.len();
                syl.inline_overrides.entry(at).or_default().push_str(text);
            }
            Block::Override(ovr) => {
                let mut in_tag = false;
                for tag in ovr.tags() {
                    if tag.is_karaoke() {
                        if in_tag {
                            close_override(&mut syl);
                            in_tag = false;
                        }

                        // Zero-length syllables with no text carry nothing
                        if syl.duration > 0 || !syl.text.is_empty() {
                            let next = Syllable {
                                start_time: syl.start_time,
                                duration: syl.duration,
                                tag_type: syl.tag_type,
                                ..Syllable::default()
                            };
                            syllables.push(core::mem::replace(&mut syl, next));
                        }

                        syl.tag_type = tag.name().parse().unwrap_or_default();
                        syl.start_time = syl.start_time.saturating_add(syl.duration);
                        let centis = tag
                            .try_param(0)
                            .and_then(|p| p.as_int())
                            .unwrap_or(0)
                            .clamp(0, MAX_CENTISECONDS);
                        syl.duration = centis * 10;
                    } else {
                        let at = syl.text.len();
                        let slot = syl.inline_overrides.entry(at).or_default();
                        if !in_tag {
                            slot.push('{');
                            in_tag = true;
                        }
                        slot.push_str(&tag.to_string());
                    }
                }
                if in_tag {
                    close_override(&mut syl);
                }
            }
        }
    }

    syllables.push(syl);
    syllables
}

fn close_override(syl: &mut Syllable) {
    let at = syl.text.len();
    syl.inline_overrides.entry(at).or_default().push('}');
}
