//! Chord template table
//!
//! Each template pairs a footprint (scale steps above the root, in
//! semitones) with one to four spellings. Spellings may contain macro
//! markers, a `$` followed by one letter, that stand for a small set of
//! interchangeable literal strings (`$m` is "m", "min" or "-").
//!
//! Order is priority. Parsing takes the first template whose spelling
//! matches and naming takes the first template whose footprint matches, so
//! triads come before sevenths, sevenths before extended chords, and the
//! large sus families come last. New entries must keep that order, and the
//! first spelling of an entry must not be claimed by an earlier entry with a
//! different footprint.

use super::bits::Chord;
use super::root::find_chord_root;
use std::sync::OnceLock;

/// Expansions for each macro marker. The first expansion is used when
/// rendering a name.
pub fn macro_expansions(marker: char) -> Option<&'static [&'static str]> {
    let expansions: &'static [&'static str] = match marker {
        'M' => &["maj", "M", "Maj", "Δ"],
        'm' => &["m", "min", "-"],
        'a' => &["add"],
        'd' => &["dim", "°", "o"],
        'A' => &["aug", "+"],
        'O' => &["ø", "Ø"],
        'X' => &["alt"],
        'S' => &["#", "+"],
        'f' => &["b", "-"],
        'h' => &["hdim"],
        '7' => &["7", "dom"],
        _ => return None,
    };
    Some(expansions)
}

type Template = (&'static [u8], &'static [&'static str]);

#[rustfmt::skip]
const TEMPLATES: &[Template] = &[
    // Triads
    (&[0, 4, 7], &["", "$M"]),
    (&[0, 3, 7], &["$m"]),
    (&[0, 3, 6], &["$d"]),
    (&[0, 4, 8], &["$A"]),
    (&[0, 7], &["5"]),
    (&[0, 4, 6], &["($f5)", "$M$f5"]),
    (&[0, 3, 8], &["$m$S5"]),
    (&[0, 4], &["$M3", "no5"]),
    (&[0, 3], &["$m3", "$mno5"]),

    // Sevenths
    (&[0, 4, 7, 10], &["$7"]),
    (&[0, 4, 7, 11], &["$M7", "j7"]),
    (&[0, 3, 7, 10], &["$m7"]),
    (&[0, 3, 7, 11], &["$m$M7", "$m($M7)"]),
    (&[0, 3, 6, 9], &["$d7"]),
    (&[0, 3, 6, 10], &["$m7$f5", "$O", "$O7", "$h"]),
    (&[0, 3, 6, 11], &["$d$M7"]),
    (&[0, 4, 8, 10], &["$A7", "7$S5"]),
    (&[0, 4, 8, 11], &["$A$M7", "$M7$S5"]),
    (&[0, 4, 6, 10], &["7$f5"]),
    (&[0, 4, 6, 11], &["$M7$f5"]),
    (&[0, 3, 8, 10], &["$m7$S5"]),
    (&[0, 4, 10], &["7no5"]),
    (&[0, 4, 11], &["$M7no5"]),
    (&[0, 3, 10], &["$m7no5"]),
    (&[0, 7, 10], &["7no3"]),
    (&[0, 7, 11], &["$M7no3"]),

    // Sixths
    (&[0, 4, 7, 9], &["6"]),
    (&[0, 3, 7, 9], &["$m6"]),
    (&[0, 2, 4, 7, 9], &["6/9", "69"]),
    (&[0, 2, 3, 7, 9], &["$m6/9", "$m69"]),
    (&[0, 3, 6, 8], &["$m6$f5"]),
    (&[0, 4, 8, 9], &["6$S5"]),
    (&[0, 4, 6, 9], &["6$f5"]),

    // Added tones
    (&[0, 2, 4, 7], &["$a9", "$a2"]),
    (&[0, 2, 3, 7], &["$m$a9", "$m$a2"]),
    (&[0, 4, 5, 7], &["$a11", "$a4"]),
    (&[0, 3, 5, 7], &["$m$a11", "$m$a4"]),
    (&[0, 1, 4, 7], &["$a$f9"]),
    (&[0, 3, 4, 7], &["$a$S9"]),
    (&[0, 4, 6, 7], &["$a$S11"]),
    (&[0, 4, 7, 8], &["$a$f13"]),
    (&[0, 1, 3, 7], &["$m$a$f9"]),
    (&[0, 2, 4, 5, 7], &["$a9$a11"]),
    (&[0, 2, 3, 6], &["$d$a9"]),

    // Ninths
    (&[0, 2, 4, 7, 10], &["9"]),
    (&[0, 2, 4, 7, 11], &["$M9"]),
    (&[0, 2, 3, 7, 10], &["$m9"]),
    (&[0, 2, 3, 7, 11], &["$m$M9"]),
    (&[0, 1, 4, 7, 10], &["7$f9"]),
    (&[0, 3, 4, 7, 10], &["7$S9"]),
    (&[0, 2, 4, 6, 10], &["9$f5"]),
    (&[0, 2, 4, 8, 10], &["9$S5", "$A9"]),
    (&[0, 2, 3, 6, 10], &["$m9$f5"]),
    (&[0, 2, 3, 6, 9], &["$d9", "$d7$a9"]),
    (&[0, 1, 4, 6, 10], &["7$f5$f9"]),
    (&[0, 3, 4, 6, 10], &["7$f5$S9"]),
    (&[0, 1, 4, 8, 10], &["7$S5$f9"]),
    (&[0, 3, 4, 8, 10], &["7$S5$S9", "7$X"]),
    (&[0, 2, 4, 6, 11], &["$M9$f5"]),
    (&[0, 2, 4, 8, 11], &["$M9$S5"]),
    (&[0, 1, 3, 7, 10], &["$m7$f9"]),
    (&[0, 1, 3, 6, 10], &["$m7$f5$f9"]),
    (&[0, 2, 4, 10], &["9no5"]),
    (&[0, 2, 3, 10], &["$m9no5"]),
    (&[0, 2, 7, 10], &["9no3"]),

    // Elevenths
    (&[0, 2, 4, 5, 7, 10], &["11"]),
    (&[0, 2, 3, 5, 7, 10], &["$m11"]),
    (&[0, 2, 4, 5, 7, 11], &["$M11"]),
    (&[0, 2, 3, 5, 7, 11], &["$m$M11"]),
    (&[0, 4, 5, 7, 10], &["7$a11", "7$a4"]),
    (&[0, 3, 5, 7, 10], &["$m7$a11", "$m7$a4"]),
    (&[0, 4, 6, 7, 10], &["7$S11"]),
    (&[0, 2, 4, 6, 7, 10], &["9$S11"]),
    (&[0, 4, 6, 7, 11], &["$M7$S11"]),
    (&[0, 2, 4, 6, 7, 11], &["$M9$S11"]),
    (&[0, 2, 3, 5, 6, 10], &["$m11$f5"]),
    (&[0, 1, 4, 6, 7, 10], &["7$f9$S11"]),
    (&[0, 3, 4, 6, 7, 10], &["7$S9$S11"]),
    (&[0, 3, 5, 10], &["$m11no5"]),
    (&[0, 4, 5, 7, 11], &["$M7$a11"]),

    // Thirteenths
    (&[0, 2, 4, 7, 9, 10], &["13"]),
    (&[0, 2, 3, 7, 9, 10], &["$m13"]),
    (&[0, 2, 4, 7, 9, 11], &["$M13"]),
    (&[0, 2, 3, 7, 9, 11], &["$m$M13"]),
    (&[0, 2, 4, 5, 7, 9, 10], &["13($a11)", "11/13"]),
    (&[0, 2, 3, 5, 7, 9, 10], &["$m13($a11)", "$m11/13"]),
    (&[0, 4, 7, 9, 10], &["7/6", "7$a13"]),
    (&[0, 3, 7, 9, 10], &["$m7/6", "$m7$a13"]),
    (&[0, 4, 7, 9, 11], &["$M7/6", "$M7$a13"]),
    (&[0, 1, 4, 7, 9, 10], &["13$f9"]),
    (&[0, 3, 4, 7, 9, 10], &["13$S9"]),
    (&[0, 2, 4, 6, 7, 9, 10], &["13$S11"]),
    (&[0, 2, 4, 6, 7, 9, 11], &["$M13$S11"]),
    (&[0, 4, 7, 8, 10], &["7$f13"]),
    (&[0, 2, 4, 7, 8, 10], &["9$f13"]),
    (&[0, 1, 4, 7, 8, 10], &["7$f9$f13"]),
    (&[0, 3, 4, 7, 8, 10], &["7$S9$f13"]),
    (&[0, 1, 3, 4, 7, 10], &["7$f9$S9"]),
    (&[0, 4, 6, 8, 10], &["7$f5$S5"]),
    (&[0, 2, 4, 6, 8, 10], &["9$f5$S5"]),
    (&[0, 1, 4, 6, 8, 10], &["7$f5$S5$f9"]),
    (&[0, 3, 4, 6, 8, 10], &["7$f5$S5$S9"]),
    (&[0, 1, 3, 4, 6, 8, 10], &["7$f5$S5$f9$S9"]),
    (&[0, 4, 9, 10], &["13no5"]),

    // Diminished and half-diminished extensions
    (&[0, 3, 5, 6, 9], &["$d7$a11"]),
    (&[0, 3, 6, 8, 9], &["$d7$a$f13"]),
    (&[0, 2, 3, 6, 11], &["$d$M9"]),
    (&[0, 2, 3, 5, 6, 9], &["$d11"]),
    (&[0, 3, 5, 6, 10], &["$m7$f5$a11"]),

    // Sus4 family
    (&[0, 5, 7], &["sus4", "sus"]),
    (&[0, 5, 7, 10], &["7sus4", "7sus"]),
    (&[0, 5, 7, 11], &["$M7sus4", "$M7sus"]),
    (&[0, 5, 7, 9], &["6sus4", "6sus"]),
    (&[0, 2, 5, 7, 10], &["9sus4", "9sus"]),
    (&[0, 2, 5, 7, 11], &["$M9sus4", "$M9sus"]),
    (&[0, 2, 5, 7, 9, 10], &["13sus4", "13sus"]),
    (&[0, 1, 5, 7, 10], &["7sus4$f9", "7sus$f9"]),
    (&[0, 5, 7, 8, 10], &["7sus4$f13", "7sus$f13"]),
    (&[0, 5, 7, 9, 10], &["7sus4$a13", "7sus$a13"]),
    (&[0, 2, 5, 7], &["sus4$a9", "sus24"]),
    (&[0, 5, 6], &["sus4$f5", "sus$f5"]),
    (&[0, 5, 8], &["sus4$S5", "sus$S5"]),
    (&[0, 5, 6, 10], &["7sus4$f5", "7sus$f5"]),
    (&[0, 5, 8, 10], &["7sus4$S5", "7sus$S5"]),
    (&[0, 5, 10], &["7sus4no5", "7susno5"]),
    (&[0, 2, 5, 7, 9], &["6/9sus4", "69sus4"]),
    (&[0, 1, 5, 7], &["sus4$a$f9"]),
    (&[0, 5, 7, 11, 9], &["$M13sus4no9"]),

    // Sus2 family
    (&[0, 2, 7], &["sus2"]),
    (&[0, 2, 7, 11], &["$M7sus2"]),
    (&[0, 2, 7, 9], &["6sus2"]),
    (&[0, 2, 6], &["sus2$f5"]),
    (&[0, 2, 8], &["sus2$S5"]),
    (&[0, 2, 6, 10], &["7sus2$f5"]),
    (&[0, 2, 8, 10], &["7sus2$S5"]),
    (&[0, 1, 7], &["sus$f2"]),
    (&[0, 1, 7, 10], &["7sus$f2"]),
    (&[0, 2, 6, 11], &["$M7sus2$f5"]),
    (&[0, 2, 7, 9, 11], &["$M13sus2"]),
    (&[0, 2, 5, 6], &["sus24$f5"]),
];

/// One entry of the template table
#[derive(Debug, Clone)]
pub struct ScoreVariant {
    /// Scale steps above the root at 12-TET resolution
    pub footprint: Chord,
    /// Canonical rotation of `footprint`
    pub canonical: Chord,
    /// Right rotations from `footprint` to `canonical`
    pub rotations: u32,
    /// Alternative spellings, first one preferred
    pub patterns: &'static [&'static str],
}

impl ScoreVariant {
    /// First spelling with macro markers expanded
    pub fn name(&self) -> String {
        expand_pattern(self.patterns[0])
    }
}

/// The template table in priority order, built on first use.
pub fn score_variants() -> &'static [ScoreVariant] {
    static VARIANTS: OnceLock<Vec<ScoreVariant>> = OnceLock::new();
    VARIANTS.get_or_init(|| {
        TEMPLATES
            .iter()
            .map(|&(steps, patterns)| {
                let footprint = Chord::from_semitones(steps);
                let (canonical, rotations) = find_chord_root(footprint);
                ScoreVariant {
                    footprint,
                    canonical,
                    rotations,
                    patterns,
                }
            })
            .collect()
    })
}

/// Replace every macro marker with its first expansion.
pub fn expand_pattern(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(first) = chars.next().and_then(macro_expansions).map(|e| e[0]) {
                out.push_str(first);
            }
        } else {
            out.push(c);
        }
    }
    out
}
