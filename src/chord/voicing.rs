//! Chord <-> score key conversion for the chord picker

use super::bits::{Chord, MAX_BANDS};
use super::text::{resolve_root, ChordSpec};
use crate::score::MAX_SCORE_KEY;

/// Recognize a chord from pressed score keys (in bands).
///
/// The lowest key is the bass. Returns `None` when no keys are given.
pub fn chord_from_keys(keys: &[u32]) -> Option<ChordSpec> {
    let bass_key = *keys.iter().min()?;
    let bass = bass_key % MAX_BANDS as u32;

    let mut mask = Chord::new();
    for &key in keys {
        mask.set(((key - bass_key) % MAX_BANDS as u32) as usize);
    }

    Some(match resolve_root(mask, bass) {
        Some((variant, root)) => ChordSpec::new(variant.footprint, root, bass),
        None => ChordSpec::new(mask, bass, bass),
    })
}

/// Voice a chord for insertion into a score.
///
/// Chord tones are placed at or above `base_key`, the bass within the
/// octave below it. Keys outside the score range are dropped. The result is
/// sorted and free of duplicates.
pub fn keys_from_chord(spec: &ChordSpec, base_key: u32) -> Vec<u32> {
    let octave = MAX_BANDS as u32;
    let base_class = base_key % octave;
    let mut keys = Vec::new();

    if base_key >= octave {
        let below = base_key - octave;
        keys.push(below + (spec.bass % octave + octave - base_class) % octave);
    }
    for bit in spec.mask.iter() {
        let class = (spec.root + bit as u32) % octave;
        keys.push(base_key + (class + octave - base_class) % octave);
    }

    keys.retain(|&key| key <= MAX_SCORE_KEY);
    keys.sort_unstable();
    keys.dedup();
    keys
}
