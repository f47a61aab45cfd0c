//! Integration tests for chordscore
//!
//! Exercises the public API end to end: chord text, score text processing,
//! configuration and shared access.

use chordscore::chord::{chord_from_keys, keys_from_chord, BAND_STEP_12};
use chordscore::{lyrics, parse_chord_text, process, step_chord, transpose, Head, ScoreConfig, ScoreError, SharedHead};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::thread;

#[rstest]
#[case("C", 2, None, "D")]
#[case("(Am)", 3, Some(true), "(Cm)")]
#[case("G7/H", 5, None, "C7/E")]
#[case("not a chord", 5, None, "not a chord")]
fn test_step_chord(#[case] text: &str, #[case] semitones: i32, #[case] sharp: Option<bool>, #[case] expected: &str) {
    assert_eq!(step_chord(text, semitones * BAND_STEP_12 as i32, sharp), expected);
}

#[test]
fn test_chord_text_round_trip() {
    let spec = parse_chord_text("G7/H").unwrap();
    assert_eq!(spec.to_text(false), "G7/H");

    let keys = keys_from_chord(&spec, 60 * BAND_STEP_12);
    assert!(!keys.is_empty());
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_decode_major_triad() {
    let keys = [60 * BAND_STEP_12, 64 * BAND_STEP_12, 67 * BAND_STEP_12];
    let spec = chord_from_keys(&keys).unwrap();
    assert_eq!(spec.to_text(false), "C");
}

#[test]
fn test_transpose_notes_and_chords() {
    assert_eq!(transpose("S\"(Cm7)\" C5 E5B\n", 2, None), "S\"(Dm7)\" D5 F5\n");
    assert_eq!(transpose("C5\n", -1, None), "H4\n");
}

#[test]
fn test_lyrics() {
    let source = "L0: S\"Verse\"\nS\"(Am)Hello (G7/H)world\" C5 E5\n";
    assert_eq!(lyrics(source, false), "[Verse]\nAm    G7/H\nHello world");
    assert_eq!(lyrics(source, true), "[Verse]\nHello world");
}

#[test]
fn test_process_with_config() {
    let config = ScoreConfig::from_yaml("transpose: 2\noptimise: true\n").unwrap();
    let head = process("T0 C5\nT0  D5\n", &config);
    assert_eq!(head.to_text(), "T0 D5\nE5\n");
    assert!(head.elements().iter().enumerate().all(|(i, e)| e.seq as usize == i));
}

#[test]
fn test_config_errors() {
    let err = ScoreConfig::from_yaml("limit: X9").unwrap_err();
    assert_eq!(err.to_string(), "Invalid limit: 'X9' is not a note");

    let err = ScoreConfig::from_yaml("tempo: 120").unwrap_err();
    assert!(matches!(err, ScoreError::Config(_)));
}

#[test]
fn test_playback_loops_through_jump() {
    let mut head = Head::parse("L0: C5\nD5\nJ0\n");
    let first = head.step_line().unwrap();
    assert_eq!(head.line_events(first)[0].key, 60 * BAND_STEP_12);

    let second = head.step_line().unwrap();
    assert_eq!(head.line_events(second)[0].key, 62 * BAND_STEP_12);

    assert_eq!(head.step_line(), Some(first));
}

#[test]
fn test_shared_head_across_threads() {
    let shared = SharedHead::new(Head::parse("C5\n"));
    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            shared.with(|head| {
                head.push_str("D5\n");
                head.flush();
            })
        })
    };
    writer.join().unwrap();

    let lines = shared.with(|head| head.lines().count());
    assert_eq!(lines, 2);
    assert_eq!(shared.lock().to_text(), "C5\nD5\n");
}
