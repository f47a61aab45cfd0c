//! Pitch-class bit-set
//!
//! A [`Chord`] is a fixed-width bit vector covering one octave split into
//! [`MAX_BANDS`] bands. Bit `n` set means "the note `n` bands above the
//! reference is sounding". Chords are plain values: `Copy`, compared as one
//! big unsigned integer (highest word first), which makes the canonical
//! rotation (the smallest one) always have bit 0 set.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Number of bands in one octave
pub const MAX_BANDS: usize = 192;

/// Bands per semitone
pub const BAND_STEP_12: u32 = (MAX_BANDS / 12) as u32;
/// Bands per quarter tone
pub const BAND_STEP_24: u32 = (MAX_BANDS / 24) as u32;
pub const BAND_STEP_48: u32 = (MAX_BANDS / 48) as u32;
pub const BAND_STEP_96: u32 = (MAX_BANDS / 96) as u32;
pub const BAND_STEP_192: u32 = (MAX_BANDS / 192) as u32;

const WORD_BITS: usize = 64;
const WORDS: usize = MAX_BANDS / WORD_BITS;

/// Bit-set of active bands within one octave
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Chord {
    words: [u64; WORDS],
}

impl Chord {
    /// The empty chord, also the "not a chord" sentinel
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Build a chord from band offsets, each taken modulo one octave
    pub fn from_bands(bands: &[u32]) -> Self {
        let mut chord = Self::new();
        for &band in bands {
            chord.set(band as usize % MAX_BANDS);
        }
        chord
    }

    /// Build a chord from semitone offsets
    pub fn from_semitones(semitones: &[u8]) -> Self {
        let mut chord = Self::new();
        for &semi in semitones {
            chord.set((semi as usize % 12) * BAND_STEP_12 as usize);
        }
        chord
    }

    pub fn set(&mut self, bit: usize) {
        debug_assert!(bit < MAX_BANDS);
        self.words[bit / WORD_BITS] |= 1u64 << (bit % WORD_BITS);
    }

    pub fn clear(&mut self, bit: usize) {
        debug_assert!(bit < MAX_BANDS);
        self.words[bit / WORD_BITS] &= !(1u64 << (bit % WORD_BITS));
    }

    pub fn toggle(&mut self, bit: usize) {
        debug_assert!(bit < MAX_BANDS);
        self.words[bit / WORD_BITS] ^= 1u64 << (bit % WORD_BITS);
    }

    pub fn test(&self, bit: usize) -> bool {
        bit < MAX_BANDS && (self.words[bit / WORD_BITS] >> (bit % WORD_BITS)) & 1 != 0
    }

    /// Population count
    pub fn order(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_BANDS).filter(move |&bit| self.test(bit))
    }

    pub fn lowest(&self) -> Option<usize> {
        self.iter().next()
    }

    pub fn highest(&self) -> Option<usize> {
        (0..MAX_BANDS).rev().find(|&bit| self.test(bit))
    }

    /// True when every set bit is a multiple of `step`
    pub fn is_aligned(&self, step: u32) -> bool {
        step != 0 && self.iter().all(|bit| bit % step as usize == 0)
    }

    /// Clear every bit that is not a multiple of `step`
    pub fn aligned(mut self, step: u32) -> Self {
        let step = step.max(1) as usize;
        for bit in 0..MAX_BANDS {
            if bit % step != 0 {
                self.clear(bit);
            }
        }
        self
    }

    /// Shift every bit down by one; bit 0 wraps into the top bit.
    pub fn rotate_right(&mut self) {
        let carry = self.words[0] & 1;
        for i in 0..WORDS {
            let upper = if i + 1 < WORDS { self.words[i + 1] << (WORD_BITS - 1) } else { 0 };
            self.words[i] = (self.words[i] >> 1) | upper;
        }
        self.words[WORDS - 1] |= carry << (WORD_BITS - 1);
    }

    /// Shift every bit up by one; the top bit wraps into bit 0.
    pub fn rotate_left(&mut self) {
        let carry = self.words[WORDS - 1] >> (WORD_BITS - 1);
        for i in (0..WORDS).rev() {
            let lower = if i > 0 { self.words[i - 1] >> (WORD_BITS - 1) } else { carry };
            self.words[i] = (self.words[i] << 1) | lower;
        }
    }

    /// Copy rotated right `count` times
    pub fn rotated_right(mut self, count: u32) -> Self {
        for _ in 0..count as usize % MAX_BANDS {
            self.rotate_right();
        }
        self
    }

    /// Copy rotated left `count` times
    pub fn rotated_left(mut self, count: u32) -> Self {
        for _ in 0..count as usize % MAX_BANDS {
            self.rotate_left();
        }
        self
    }
}

impl Ord for Chord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words.iter().rev().cmp(other.words.iter().rev())
    }
}

impl PartialOrd for Chord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl BitAnd for Chord {
    type Output = Chord;

    fn bitand(mut self, rhs: Chord) -> Chord {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a &= b;
        }
        self
    }
}

impl BitOr for Chord {
    type Output = Chord;

    fn bitor(mut self, rhs: Chord) -> Chord {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a |= b;
        }
        self
    }
}

impl Not for Chord {
    type Output = Chord;

    fn not(mut self) -> Chord {
        for w in self.words.iter_mut() {
            *w = !*w;
        }
        self
    }
}

impl fmt::Debug for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
