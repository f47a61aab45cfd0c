//! # Chord Engine
//!
//! Symbolic chords as pitch-class bit-sets, and their text names.
//!
//! - [`bits`]: the [`Chord`] bit-set, one octave in [`MAX_BANDS`] bands
//! - [`root`]: canonical rotation search and inversion/shape stepping
//! - [`table`]: the priority-ordered chord template table
//! - [`text`]: chord text parsing, naming and transposition
//! - [`voicing`]: conversion between chords and score keys
//!
//! ## Example
//! ```
//! use chordscore::chord::{parse_chord_text, render_chord_name, BAND_STEP_12};
//!
//! let spec = parse_chord_text("G7/B").unwrap();
//! assert_eq!(spec.root, 7 * BAND_STEP_12);
//! assert_eq!(render_chord_name(spec.mask, spec.root, spec.bass, false), "G7/H");
//! ```

pub mod bits;
pub mod root;
pub mod table;
pub mod text;
pub mod voicing;

pub use bits::{Chord, BAND_STEP_12, BAND_STEP_192, BAND_STEP_24, BAND_STEP_48, BAND_STEP_96, MAX_BANDS};
pub use root::{find_chord_root, next_chord_root, prev_chord_root, roll_down, roll_up};
pub use table::{score_variants, ScoreVariant};
pub use text::{
    chord_suffix, note_name, parse_chord_text, parse_note, render_chord_name, resolve_root, step_chord, ChordSpec,
};
pub use voicing::{chord_from_keys, keys_from_chord};
