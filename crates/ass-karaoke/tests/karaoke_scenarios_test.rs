//! Scenario tests for the karaoke model
//!
//! Lines shaped like the ones timers actually produce: hand-timed syllables,
//! untimed lyrics awaiting auto-split, styled syllables and drawings.

use ass_karaoke::{
    EventHandler, KaraokeError, KaraokeEvent, KaraokeModel, KaraokeTag, LoadOptions,
};
use ass_override::DialogueLine;
use pretty_assertions::assert_eq;
use std::{cell::RefCell, rc::Rc};

fn timings(kara: &KaraokeModel) -> Vec<(i32, i32, String)> {
    kara.iter()
        .map(|s| (s.start_time, s.duration, s.text.clone()))
        .collect()
}

#[test]
fn hand_timed_line() {
    let line = DialogueLine::new(0, 500, "{\\k20}Hel{\\k30}lo");
    let kara = KaraokeModel::from_line(&line, LoadOptions::new().normalize(true));

    assert_eq!(
        timings(&kara),
        vec![(0, 200, "Hel".to_string()), (200, 300, "lo".to_string())]
    );
    assert_eq!(kara.get_text(true), "{\\k20}Hel{\\k30}lo");
    assert_eq!(kara.get_text(false), "Hello");
}

#[test]
fn line_offset_from_zero() {
    let line = DialogueLine::new(61_000, 62_000, "{\\kf25}ka{\\kf25}ra{\\kf50}oke");
    let kara = KaraokeModel::from_line(&line, LoadOptions::new().normalize(true));

    let starts: Vec<i32> = kara.iter().map(|s| s.start_time).collect();
    assert_eq!(starts, vec![61_000, 61_250, 61_500]);
    assert_eq!(kara.tag_type(), KaraokeTag::Kf);
    assert_eq!(kara.syllables()[2].end_time(), 62_000);
}

#[test]
fn untimed_lyrics_auto_split() {
    let line = DialogueLine::new(0, 1000, "la la la");
    let kara = KaraokeModel::from_line(&line, LoadOptions::new().auto_split(true).normalize(true));

    let texts: Vec<&str> = kara.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["la ", "la ", "la"]);

    let total: i32 = kara.iter().map(|s| s.duration).sum();
    assert_eq!(total, 1000);
    assert_eq!(kara.get_text(false), "la la la");
}

#[test]
fn auto_split_skips_timed_lines() {
    let line = DialogueLine::new(0, 1000, "{\\k50}la la{\\k50}la");
    let kara = KaraokeModel::from_line(&line, LoadOptions::new().auto_split(true));
    assert_eq!(kara.len(), 2);
}

#[test]
fn drawing_stays_inside_its_syllable() {
    let line = DialogueLine::new(0, 300, "{\\k10\\p1}m 0 0 l 10 10{\\p0\\k20}b");
    let kara = KaraokeModel::from_line(&line, LoadOptions::new());

    assert_eq!(kara.len(), 2);
    assert_eq!(kara.syllables()[0].text, "");
    assert_eq!(
        kara.get_text(true),
        "{\\k10}{\\p1}m 0 0 l 10 10{\\p0}{\\k20}b"
    );
}

#[test]
fn edit_session() {
    let line = DialogueLine::new(1000, 2000, "{\\k100}happy birthday");
    let mut kara = KaraokeModel::from_line(&line, LoadOptions::new().normalize(true));

    // "happy " | "birthday"
    kara.add_split(0, 6).unwrap();
    assert_eq!(kara.len(), 2);
    let total: i32 = kara.iter().map(|s| s.duration).sum();
    assert_eq!(total, 1000);

    assert!(kara.set_start_time(1, 1400).unwrap());
    assert_eq!(kara.syllables()[0].duration, 400);
    assert_eq!(kara.syllables()[1].duration, 600);

    kara.set_line_times(1200, 1800).unwrap();
    assert_eq!(kara.syllables()[0].start_time, 1200);
    assert_eq!(kara.syllables()[1].end_time(), 1800);

    assert_eq!(kara.get_text(true), "{\\k20}happy {\\k40}birthday");

    assert!(kara.remove_split(1).unwrap());
    assert_eq!(kara.get_text(true), "{\\k60}happy birthday");
}

#[test]
fn out_of_range_edits_leave_model_untouched() {
    let line = DialogueLine::new(0, 600, "{\\k30}a{\\k30}b");
    let mut kara = KaraokeModel::from_line(&line, LoadOptions::new());
    let before = kara.syllables().to_vec();

    let err = kara.set_start_time(1, -10).unwrap_err();
    assert!(err.is_recoverable());
    assert!(kara.add_split(9, 0).is_err());
    assert!(kara.remove_split(9).is_err());
    assert_eq!(
        kara.set_line_times(500, 100),
        Err(KaraokeError::InvalidLineTimes {
            start: 500,
            end: 100
        })
    );

    assert_eq!(kara.syllables(), before.as_slice());
}

struct Log {
    name: &'static str,
    priority: i32,
    seen: Rc<RefCell<Vec<(&'static str, usize)>>>,
}

impl EventHandler for Log {
    fn handle_event(&mut self, event: &KaraokeEvent) {
        let KaraokeEvent::SyllablesChanged { syllable_count } = event;
        self.seen.borrow_mut().push((self.name, *syllable_count));
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[test]
fn timing_views_hear_about_changes() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut kara = KaraokeModel::new();
    for (name, priority) in [("audio", 0), ("grid", 5)] {
        kara.subscribe(Log {
            name,
            priority,
            seen: Rc::clone(&seen),
        })
        .unwrap();
    }

    kara.load(&DialogueLine::new(0, 900, "one two three"), true, true);
    kara.remove_split(2).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![("grid", 3), ("audio", 3), ("grid", 2), ("audio", 2)]
    );
    assert_eq!(kara.events().stats().events_dispatched, 2);
    assert_eq!(kara.events().stats().events_suppressed, 2);
}

#[test]
fn split_into_lines() {
    let mut template = DialogueLine::new(0, 400, "{\\k10}{\\k20}do{\\k10}re");
    template.actor = "Chorus".to_string();

    let kara = KaraokeModel::from_line(&template, LoadOptions::new().normalize(true));
    let lines = kara.split_lines(&template);

    let spans: Vec<(i32, i32, &str)> = lines.iter().map(|l| (l.start, l.end, l.text())).collect();
    assert_eq!(spans, vec![(0, 100, ""), (100, 300, "do"), (300, 400, "re")]);
    assert!(lines.iter().all(|l| l.actor == "Chorus"));
}
