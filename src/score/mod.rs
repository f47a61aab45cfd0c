//! # Score Text Model
//!
//! Turns score text into an ordered list of typed [`Element`]s and works on
//! that list: line traversal, playback stepping with labels and jumps, and
//! whole-score transforms (optimise, transpose, limit, bass offset, lyrics).
//!
//! ## Score text
//! ```text
//! L0: T0 U4 C5 E5 G5   /* a comment */
//! S"Hello (C)world" W100.200
//! JR0
//! ```
//! One-letter commands (`C D E F G A H B` notes, `T` channel, `U` duration,
//! `L` label, `M` macro, `J` jump, `K` command, `W` timer, `X` transpose,
//! `S"..."` display string, `V"..."` comment string), nestable `/* */`
//! comments, and `\n` or `;` as line terminators. Every character of the
//! input lands in exactly one element, so [`Head::to_text`] gives back the
//! original text.
//!
//! ## Example
//! ```
//! use chordscore::score::Head;
//!
//! let mut head = Head::new();
//! head += "C5 E5 G5\n";
//! head.flush();
//! assert_eq!(head.lines().count(), 1);
//! assert_eq!(head.to_text(), "C5 E5 G5\n");
//! ```

pub mod element;
pub mod head;
pub mod lexer;
pub mod lyrics;
pub mod playback;
pub mod transform;
pub mod value;

pub use element::{CommandOp, Element, ElementKind, JumpFlags, TransposeMode};
pub use head::{ElementRef, Head, LineSpan};
pub use playback::{DisplayProps, PlayEvent, PlaySettings};
pub use transform::split_bass_treble;

/// Label table size, `L0` to `L31`
pub const MAX_LABELS: usize = 32;
/// Macro index range, `M0` to `M31`
pub const MAX_MACROS: usize = 32;
/// Channel range, `T0` to `T15`
pub const MAX_CHANNELS: usize = 16;
/// Largest duration in ticks
pub const MAX_DURATION: u32 = 65535;
/// Largest timer value, for both fields
pub const MAX_TIMER: u32 = 0xffffff;
/// Highest score key in bands: MIDI key 127 plus 15 sub-bands
pub const MAX_SCORE_KEY: u32 = 128 * 16 - 1;
/// Jumps and wrap-arounds one playback step may take
pub const MAX_STEP_RETRIES: u32 = 8;
