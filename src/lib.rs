pub mod chord;
pub mod config;
pub mod error;
pub mod score;
pub mod sync;

pub use chord::{parse_chord_text, render_chord_name, step_chord, Chord, ChordSpec};
pub use config::ScoreConfig;
pub use error::*;
pub use score::{Element, ElementKind, Head, LineSpan};
pub use sync::SharedHead;

/// Parse score text and run the configured transforms on it.
/// This is the main entry point for the library.
pub fn process(source: &str, config: &ScoreConfig) -> Head {
    let mut head = Head::parse(source);
    config.apply(&mut head);
    head.sequence();
    head
}

/// Lyrics of score text, chords above the words unless `no_chords`
pub fn lyrics(source: &str, no_chords: bool) -> String {
    Head::parse(source).to_lyrics(no_chords)
}

/// Transpose score text by `semitones`, notes and chords alike
pub fn transpose(source: &str, semitones: i32, sharp: Option<bool>) -> String {
    let mut head = Head::parse(source);
    head.transpose_score(semitones * chord::BAND_STEP_12 as i32, sharp);
    head.to_text()
}
