//! Scenario tests for block parsing and serialization
//!
//! Covers the real-world line shapes editors feed into the parser:
//! mixed plain/override text, nested transforms, overloaded clips and the
//! malformed input typesetters produce by hand.

use ass_override::{
    parse_blocks, parse_blocks_with_diagnostics, process_parameters, serialize_blocks, strip_tags,
    stripped_text, Block, DiagnosticKind, DiagnosticLevel, OverrideBlock, ParamClass, ParamType,
    ParameterValue,
};
use pretty_assertions::assert_eq;

fn override_at(blocks: &[Block], index: usize) -> &OverrideBlock {
    match &blocks[index] {
        Block::Override(block) => block,
        other => panic!("block {index} is not an override block: {other:?}"),
    }
}

#[test]
fn italics_scenario() {
    let text = "Yes, I {\\i1}am{\\i0} here.";
    let blocks = parse_blocks(text);

    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[0], Block::Plain("Yes, I ".to_string()));
    assert_eq!(override_at(&blocks, 1).raw_text(), "\\i1");
    assert_eq!(blocks[2], Block::Plain("am".to_string()));
    assert_eq!(override_at(&blocks, 3).raw_text(), "\\i0");
    assert_eq!(blocks[4], Block::Plain(" here.".to_string()));

    assert_eq!(strip_tags(text), "Yes, I am here.");
    assert_eq!(stripped_text(&blocks), "Yes, I am here.");
    assert_eq!(serialize_blocks(&blocks), text);
}

#[test]
fn nested_transform_tokenizes_as_one_tag() {
    let blocks = parse_blocks("{\\t(0,500,\\fad(1,2))}");
    let block = override_at(&blocks, 0);
    assert_eq!(block.tags().len(), 1);

    let transform = &block.tags()[0];
    assert_eq!(transform.name(), "\\t");
    let nested = transform.params()[3].as_block().unwrap();
    assert_eq!(nested.tags().len(), 1);

    let fad = &nested.tags()[0];
    assert_eq!(fad.name(), "\\fad");
    assert_eq!(fad.params().len(), 2);
    assert!(fad.params().iter().all(|p| p.ty() == ParamType::Int));
    assert_eq!(fad.params()[0].value(), Some(&ParameterValue::Int(1)));
    assert_eq!(fad.params()[1].value(), Some(&ParameterValue::Int(2)));
}

#[test]
fn move_with_and_without_times() {
    let blocks = parse_blocks("{\\move(1,2,3,4)}");
    let tag = &override_at(&blocks, 0).tags()[0];
    assert!(tag.params()[4].is_omitted());
    assert!(tag.params()[5].is_omitted());

    let blocks = parse_blocks("{\\move(1,2,3,4,100,200)}");
    let tag = &override_at(&blocks, 0).tags()[0];
    assert!(tag.params().iter().all(|p| !p.is_omitted()));
    assert_eq!(tag.params()[4].as_int().unwrap(), 100);
}

#[test]
fn malformed_float_defaults_to_zero() {
    let (blocks, diagnostics) = parse_blocks_with_diagnostics("{\\fs+abc}text");
    let tag = &override_at(&blocks, 0).tags()[0];

    assert!(tag.is_valid());
    assert_eq!(tag.name(), "\\fs+");
    assert_eq!(tag.params()[0].value(), Some(&ParameterValue::Float(0.0)));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedNumber);
    assert_eq!(diagnostics[0].level(), DiagnosticLevel::Warning);
}

#[test]
fn hand_edited_numbers_survive_round_trip() {
    for text in [
        "{\\org(640.5,360.25)}x",
        "{\\be1.5}x",
        "{\\clip(10.5,20,30,40)}x",
        "{\\k20abc}x",
        "{\\fs+abc}text",
    ] {
        let (blocks, diagnostics) = parse_blocks_with_diagnostics(text);
        assert_eq!(serialize_blocks(&blocks), text);
        assert!(diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::MalformedNumber));
    }
}

#[test]
fn retiming_leaves_untouched_tags_alone() {
    let mut blocks = parse_blocks("{\\be1.5\\fad(100,200)}x");
    process_parameters(&mut blocks, |_, _, param| {
        if param.class() == ParamClass::RelativeTimeStart {
            let shifted = param.as_int().unwrap_or(0) * 2;
            param.set_int(shifted);
        }
    });
    assert_eq!(serialize_blocks(&blocks), "{\\be1.5\\fad(200,200)}x");
}

#[test]
fn longest_prefix_wins() {
    let blocks = parse_blocks("{\\bord5\\b1\\blur2\\be1}");
    let names: Vec<_> = override_at(&blocks, 0)
        .tags()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(names, vec!["\\bord", "\\b", "\\blur", "\\be"]);
}

#[test]
fn unknown_tags_survive_round_trip() {
    let text = "{\\xyz12\\b1\\weird(a,b)}hi";
    let (blocks, diagnostics) = parse_blocks_with_diagnostics(text);
    let tags = override_at(&blocks, 0).tags();

    assert!(!tags[0].is_valid());
    assert!(tags[1].is_valid());
    assert!(!tags[2].is_valid());
    assert_eq!(serialize_blocks(&blocks), text);
    assert_eq!(
        diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnknownTag)
            .count(),
        2
    );
}

#[test]
fn junk_before_first_backslash_is_kept() {
    let text = "{junk\\b1}x";
    let blocks = parse_blocks(text);
    let tags = override_at(&blocks, 0).tags();
    assert_eq!(tags.len(), 2);
    assert!(!tags[0].is_valid());
    assert_eq!(tags[0].name(), "junk");
    assert_eq!(serialize_blocks(&blocks), text);
}

#[test]
fn unbalanced_parentheses_do_not_abort_the_line() {
    let (blocks, diagnostics) = parse_blocks_with_diagnostics("{\\pos(10,20}after");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1], Block::Plain("after".to_string()));

    let pos = &override_at(&blocks, 0).tags()[0];
    assert_eq!(pos.params()[0].as_float().unwrap(), 10.0);
    assert_eq!(pos.params()[1].as_float().unwrap(), 20.0);
    assert!(diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnbalancedParentheses));
}

#[test]
fn drawing_blocks_carry_scale() {
    let blocks = parse_blocks("{\\p4}m 0 0 l 100 0 100 100{\\p0}done");
    assert_eq!(
        blocks[1],
        Block::Drawing {
            text: "m 0 0 l 100 0 100 100".to_string(),
            scale: 4,
        }
    );
    assert_eq!(blocks[3], Block::Plain("done".to_string()));
}

#[test]
fn multibyte_text_is_split_on_char_boundaries() {
    let text = "日本{\\b1}語{コメント}です";
    let blocks = parse_blocks(text);
    assert_eq!(blocks.len(), 5);
    assert!(blocks[3].is_comment());
    assert_eq!(stripped_text(&blocks), "日本語です");
    assert_eq!(serialize_blocks(&blocks), text);
}

#[test]
fn diagnostics_carry_block_offsets() {
    let (_, diagnostics) = parse_blocks_with_diagnostics("abc{\\nope}def{\\bord?}");
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownTag);
    assert_eq!(diagnostics[0].offset, 3);
    assert_eq!(diagnostics[1].kind, DiagnosticKind::MalformedNumber);
    assert_eq!(diagnostics[1].offset, 13);
}

#[test]
fn recovery_paths_log_without_panicking() {
    use tracing_subscriber::prelude::*;

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("ass_override=trace"))
        .with(tracing_subscriber::fmt::layer().with_test_writer());

    tracing::subscriber::with_default(subscriber, || {
        let text = "{\\pos(1,2\\fs+abc\\nope}x{\\fad(1,2)junk}{\\b1";
        let blocks = parse_blocks(text);
        assert_eq!(blocks.len(), 4);
        assert!(!serialize_blocks(&blocks).is_empty());
    });
}
