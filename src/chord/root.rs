//! Canonical root search and inversion stepping
//!
//! Chord identity does not depend on inversion, so every lookup works on the
//! canonical rotation: the smallest bit pattern reachable by rotating the
//! mask. The number of rotations needed to get there tells how far the real
//! root sits above the reference bit of the input.

use super::bits::{Chord, MAX_BANDS};

/// Find the canonical rotation of `mask`.
///
/// Rotates right one band at a time until the pattern repeats, keeping the
/// smallest pattern seen. Returns it together with the number of right
/// rotations that produced it. An empty mask is returned unchanged.
///
/// ```
/// use chordscore::chord::{find_chord_root, Chord};
///
/// // E-G-C is a C major triad in first inversion
/// let (canonical, rots) = find_chord_root(Chord::from_semitones(&[0, 3, 8]));
/// assert_eq!(canonical, Chord::from_semitones(&[0, 4, 7]));
/// assert_eq!(rots, 8 * 16);
/// ```
pub fn find_chord_root(mask: Chord) -> (Chord, u32) {
    if mask.is_empty() {
        return (mask, 0);
    }

    let mut best = mask;
    let mut best_rots = 0;
    let mut current = mask;

    for rots in 1..MAX_BANDS as u32 {
        current.rotate_right();
        if current == mask {
            break;
        }
        if current < best {
            best = current;
            best_rots = rots;
        }
    }
    (best, best_rots)
}

/// Move the lowest note up an octave.
///
/// Returns the re-based mask (bit 0 is the new lowest note) and how many
/// bands the reference moved up.
pub fn roll_up(mask: Chord) -> Option<(Chord, u32)> {
    if mask.is_empty() {
        return None;
    }
    let mut current = mask;
    let mut delta = 0;
    loop {
        current.rotate_right();
        delta += 1;
        if current.test(0) {
            return Some((current, delta));
        }
    }
}

/// Move the highest note down an octave.
///
/// Returns the re-based mask and how many bands the reference moved down.
pub fn roll_down(mask: Chord) -> Option<(Chord, u32)> {
    if mask.is_empty() {
        return None;
    }
    let mut current = mask;
    let mut delta = 0;
    loop {
        current.rotate_left();
        delta += 1;
        if current.test(0) {
            return Some((current, delta));
        }
    }
}

/// Next canonical chord shape with the same number of notes.
///
/// Bits that are not multiples of `step` are dropped first. The set-bit
/// pattern is then advanced (keeping its population count) until a pattern
/// that is its own canonical rotation turns up, wrapping around at the end.
pub fn next_chord_root(mask: Chord, step: u32) -> Chord {
    walk_shapes(mask, step, next_combination)
}

/// Previous canonical chord shape with the same number of notes.
pub fn prev_chord_root(mask: Chord, step: u32) -> Chord {
    walk_shapes(mask, step, prev_combination)
}

fn walk_shapes(mask: Chord, step: u32, advance: fn(&mut [usize], usize)) -> Chord {
    let step = step.clamp(1, MAX_BANDS as u32) as usize;
    let slots = MAX_BANDS / step;
    let mut positions: Vec<usize> = mask.aligned(step as u32).iter().map(|bit| bit / step).collect();
    if positions.is_empty() || positions.len() == slots {
        return expand(&positions, step);
    }

    let original = positions.clone();
    loop {
        advance(&mut positions, slots);
        if positions == original {
            return expand(&positions, step);
        }
        // A canonical pattern always has its lowest slot occupied
        if positions[0] != 0 {
            continue;
        }
        let candidate = expand(&positions, step);
        if find_chord_root(candidate).0 == candidate {
            return candidate;
        }
    }
}

fn expand(positions: &[usize], step: usize) -> Chord {
    let mut chord = Chord::new();
    for &pos in positions {
        chord.set(pos * step);
    }
    chord
}

/// Advance a sorted position list to the next pattern in numeric order.
fn next_combination(positions: &mut [usize], slots: usize) {
    let k = positions.len();
    for j in 0..k {
        let limit = if j + 1 < k { positions[j + 1] } else { slots };
        if positions[j] + 1 < limit {
            positions[j] += 1;
            for (i, pos) in positions.iter_mut().enumerate().take(j) {
                *pos = i;
            }
            return;
        }
    }
    for (i, pos) in positions.iter_mut().enumerate() {
        *pos = i;
    }
}

/// Step a sorted position list back to the previous pattern in numeric order.
fn prev_combination(positions: &mut [usize], slots: usize) {
    let k = positions.len();
    for j in 0..k {
        let floor = if j > 0 { positions[j - 1] + 1 } else { 0 };
        if positions[j] > floor {
            positions[j] -= 1;
            let top = positions[j];
            for i in 0..j {
                positions[i] = top - (j - i);
            }
            return;
        }
    }
    for (i, pos) in positions.iter_mut().enumerate() {
        *pos = slots - k + i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::bits::BAND_STEP_12;

    #[test]
    fn test_root_of_root_position_triad() {
        let major = Chord::from_semitones(&[0, 4, 7]);
        assert_eq!(find_chord_root(major), (major, 0));
    }

    #[test]
    fn test_root_of_inversions() {
        let major = Chord::from_semitones(&[0, 4, 7]);
        // G-C-E: second inversion, C is 5 semitones above the bass
        let (canonical, rots) = find_chord_root(Chord::from_semitones(&[0, 5, 9]));
        assert_eq!(canonical, major);
        assert_eq!(rots, 5 * BAND_STEP_12);
    }

    #[test]
    fn test_rotation_invariance() {
        let shapes: [&[u8]; 4] = [&[0, 4, 7], &[0, 3, 7, 10], &[0, 2, 5, 7, 10], &[0, 1, 6]];
        for shape in shapes {
            let mask = Chord::from_semitones(shape);
            let (canonical, _) = find_chord_root(mask);
            for k in [1, 16, 37, 100, 191] {
                assert_eq!(find_chord_root(mask.rotated_right(k)).0, canonical);
            }
            // Idempotent
            assert_eq!(find_chord_root(canonical).0, canonical);
            assert!(canonical.test(0));
        }
    }

    #[test]
    fn test_symmetric_chord_stops_early() {
        // Augmented triad repeats every 4 semitones
        let aug = Chord::from_semitones(&[0, 4, 8]);
        assert_eq!(find_chord_root(aug), (aug, 0));
    }

    #[test]
    fn test_roll_up_and_down() {
        let major = Chord::from_semitones(&[0, 4, 7]);
        let (first_inv, delta) = roll_up(major).unwrap();
        assert_eq!(first_inv, Chord::from_semitones(&[0, 3, 8]));
        assert_eq!(delta, 4 * BAND_STEP_12);

        let (back, delta) = roll_down(first_inv).unwrap();
        assert_eq!(back, major);
        assert_eq!(delta, 4 * BAND_STEP_12);

        assert!(roll_up(Chord::new()).is_none());
    }

    #[test]
    fn test_next_and_prev_shapes_are_canonical() {
        let major = Chord::from_semitones(&[0, 4, 7]);
        let next = next_chord_root(major, BAND_STEP_12);
        assert_ne!(next, major);
        assert_eq!(next.order(), 3);
        assert_eq!(find_chord_root(next).0, next);
        assert_eq!(prev_chord_root(next, BAND_STEP_12), major);
    }

    #[test]
    fn test_shapes_cycle_back() {
        // Every three-note shape in 12-TET is reached and the walk wraps
        let start = Chord::from_semitones(&[0, 1, 2]);
        let mut shape = start;
        let mut seen = 0;
        loop {
            shape = next_chord_root(shape, BAND_STEP_12);
            seen += 1;
            if shape == start {
                break;
            }
            assert!(seen < 100);
        }
        assert_eq!(seen, 19);
    }
}
