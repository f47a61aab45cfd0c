//! Chord text conversion
//!
//! Converts between chord names such as `Cmaj7`, `G7/H` or `F#m7b5` and a
//! [`ChordSpec`] (footprint mask relative to the root, root and bass in
//! bands). Nothing here fails loudly: text that cannot be read gives `None`,
//! a chord that cannot be named gives an empty string, and stepping text
//! that does not parse hands the text back unchanged.

use super::bits::{Chord, BAND_STEP_12, MAX_BANDS};
use super::root::find_chord_root;
use super::table::{macro_expansions, score_variants, ScoreVariant};
use serde::Serialize;

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "H"];
const FLAT_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Hb", "H"];

/// Semitones of the major scale degrees 1..7
const MAJOR_SCALE: [u32; 7] = [0, 2, 4, 5, 7, 9, 11];

const OCTAVE: i64 = MAX_BANDS as i64;

/// A recognized chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChordSpec {
    /// Footprint with the root at bit 0
    pub mask: Chord,
    /// Root pitch class in bands
    pub root: u32,
    /// Bass pitch class in bands, equal to `root` when there is no slash bass
    pub bass: u32,
}

impl ChordSpec {
    pub fn new(mask: Chord, root: u32, bass: u32) -> Self {
        Self {
            mask,
            root: wrap_band(root as i64),
            bass: wrap_band(bass as i64),
        }
    }

    /// Render as chord text, empty when it cannot be named
    pub fn to_text(&self, sharp: bool) -> String {
        render_chord_name(self.mask, self.root, self.bass, sharp)
    }

    /// Shift root and bass by `adjust` bands
    pub fn transposed(&self, adjust: i32) -> Self {
        Self {
            mask: self.mask,
            root: wrap_band(self.root as i64 + adjust as i64),
            bass: wrap_band(self.bass as i64 + adjust as i64),
        }
    }
}

fn wrap_band(value: i64) -> u32 {
    value.rem_euclid(OCTAVE) as u32
}

/// Spelling of a pitch class given in semitones
pub fn note_name(semitone: u32, sharp: bool) -> &'static str {
    let names = if sharp { &SHARP_NAMES } else { &FLAT_NAMES };
    names[(semitone % 12) as usize]
}

/// Read a note letter with optional `#`/`b`. Returns the pitch class in
/// semitones and the remaining text.
pub fn parse_note(text: &str) -> Option<(u32, &str)> {
    let mut chars = text.chars();
    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'H' | 'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (shift, rest) = if let Some(after) = rest.strip_prefix('#') {
        (1, after)
    } else if let Some(after) = rest.strip_prefix('b') {
        (-1, after)
    } else {
        (0, rest)
    };
    Some(((base + shift).rem_euclid(12) as u32, rest))
}

/// Parse chord text into a [`ChordSpec`].
///
/// The template table is scanned in priority order and the first template
/// whose spelling matches the whole suffix (after optional `addN` tones and
/// an optional `/bass`) wins. A numeric step list such as `C(0-2,6)` is
/// accepted as a last resort.
///
/// ```
/// use chordscore::chord::{parse_chord_text, Chord};
///
/// let spec = parse_chord_text("Cm7").unwrap();
/// assert_eq!(spec.mask, Chord::from_semitones(&[0, 3, 7, 10]));
/// assert_eq!(spec.root, 0);
/// ```
pub fn parse_chord_text(text: &str) -> Option<ChordSpec> {
    let (root_semi, suffix) = parse_note(text.trim())?;
    let root = root_semi * BAND_STEP_12;

    for variant in score_variants() {
        for pattern in variant.patterns {
            if let Some((mask, bass)) = match_pattern(pattern, suffix, &|rest| parse_tail(rest, variant.footprint)) {
                return Some(ChordSpec::new(mask, root, bass.map_or(root, |b| b * BAND_STEP_12)));
            }
        }
    }

    let (mask, rest) = parse_step_list(suffix)?;
    let (mask, bass) = parse_tail(rest, mask)?;
    Some(ChordSpec::new(mask, root, bass.map_or(root, |b| b * BAND_STEP_12)))
}

/// Match `input` against a template spelling, trying every expansion of
/// each macro marker and backtracking when the remainder does not fit.
fn match_pattern<T>(pattern: &str, input: &str, tail: &dyn Fn(&str) -> Option<T>) -> Option<T> {
    let mut chars = pattern.chars();
    match chars.next() {
        None => tail(input),
        Some('$') => {
            let expansions = macro_expansions(chars.next()?)?;
            let rest = chars.as_str();
            expansions.iter().find_map(|expansion| {
                input
                    .strip_prefix(expansion)
                    .and_then(|after| match_pattern(rest, after, tail))
            })
        }
        Some(c) => {
            let after = input.strip_prefix(c)?;
            match_pattern(chars.as_str(), after, tail)
        }
    }
}

/// Consume trailing `addN` tones and a `/bass`; the input must be used up.
fn parse_tail(mut rest: &str, mut mask: Chord) -> Option<(Chord, Option<u32>)> {
    while let Some(after) = rest.strip_prefix("add") {
        let (semitone, after) = parse_degree(after)?;
        mask.set((semitone * BAND_STEP_12) as usize);
        rest = after;
    }
    let mut bass = None;
    if let Some(after) = rest.strip_prefix('/') {
        let (note, after) = parse_note(after)?;
        bass = Some(note);
        rest = after;
    }
    rest.is_empty().then_some((mask, bass))
}

/// Scale degree with optional `#`/`b`, e.g. `9`, `#11`, `b13`
fn parse_degree(text: &str) -> Option<(u32, &str)> {
    let (shift, text) = if let Some(after) = text.strip_prefix('#') {
        (1, after)
    } else if let Some(after) = text.strip_prefix('b') {
        (-1, after)
    } else {
        (0, text)
    };
    let digits = text.bytes().take_while(u8::is_ascii_digit).count().min(2);
    let degree: u32 = text[..digits].parse().ok()?;
    if !(1..=13).contains(&degree) {
        return None;
    }
    let semitone = MAJOR_SCALE[((degree - 1) % 7) as usize] as i32 + shift;
    Some((semitone.rem_euclid(12) as u32, &text[digits..]))
}

/// `(0-2,6)` style list of semitone steps
fn parse_step_list(text: &str) -> Option<(Chord, &str)> {
    let body_end = text.find(')')?;
    let body = text.strip_prefix('(')?.get(..body_end - 1)?;
    let mut mask = Chord::new();
    for item in body.split(',') {
        let (lo, hi) = match item.split_once('-') {
            Some((lo, hi)) => (lo.trim().parse::<u32>().ok()?, hi.trim().parse::<u32>().ok()?),
            None => {
                let step = item.trim().parse::<u32>().ok()?;
                (step, step)
            }
        };
        if lo > hi || hi >= 12 {
            return None;
        }
        for step in lo..=hi {
            mask.set((step * BAND_STEP_12) as usize);
        }
    }
    Some((mask, &text[body_end + 1..]))
}

/// Find the template naming `mask` and the root it implies.
///
/// A template whose footprint equals `mask` keeps the given root. Failing
/// that, a template with the same canonical rotation is taken and the root
/// is moved to where that template puts it.
pub fn resolve_root(mask: Chord, root: u32) -> Option<(&'static ScoreVariant, u32)> {
    let variants = score_variants();
    if let Some(variant) = variants.iter().find(|v| v.footprint == mask) {
        return Some((variant, wrap_band(root as i64)));
    }
    let (canonical, rots) = find_chord_root(mask);
    variants
        .iter()
        .find(|v| v.canonical == canonical)
        .map(|v| (v, wrap_band(root as i64 + rots as i64 - v.rotations as i64)))
}

/// Template suffix for a footprint at its own root, e.g. `""` for a major
/// triad or `"m7"` for a minor seventh.
pub fn chord_suffix(mask: Chord) -> Option<String> {
    score_variants()
        .iter()
        .find(|v| v.footprint == mask)
        .map(ScoreVariant::name)
}

/// Name a chord.
///
/// Returns an empty string when the mask is empty or the root, bass or any
/// chord tone falls between semitones. Unknown shapes are written as a
/// numeric step list after the root.
pub fn render_chord_name(mask: Chord, root: u32, bass: u32, sharp: bool) -> String {
    let step = BAND_STEP_12;
    if mask.is_empty() || !mask.is_aligned(step) || root % step != 0 || bass % step != 0 {
        return String::new();
    }

    let (suffix, root) = match resolve_root(mask, root) {
        Some((variant, root)) => (variant.name(), root),
        None => (format_step_list(mask), wrap_band(root as i64)),
    };
    let bass = wrap_band(bass as i64);

    let mut out = String::from(note_name(root / step, sharp));
    out.push_str(&suffix);
    if bass != root {
        out.push('/');
        out.push_str(note_name(bass / step, sharp));
    }
    out
}

fn format_step_list(mask: Chord) -> String {
    let steps: Vec<u32> = mask.iter().map(|bit| bit as u32 / BAND_STEP_12).collect();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        let mut j = i;
        while j + 1 < steps.len() && steps[j + 1] == steps[j] + 1 {
            j += 1;
        }
        if j > i {
            parts.push(format!("{}-{}", steps[i], steps[j]));
        } else {
            parts.push(steps[i].to_string());
        }
        i = j + 1;
    }
    format!("({})", parts.join(","))
}

/// Transpose chord text by `adjust` bands.
///
/// Parentheses around the chord are kept. `sharp` forces the spelling;
/// `None` keeps sharps when the input has one. Text that is not a
/// recognized chord comes back unchanged.
///
/// ```
/// use chordscore::chord::{step_chord, BAND_STEP_12};
///
/// assert_eq!(step_chord("Cm7", 2 * BAND_STEP_12 as i32, None), "Dm7");
/// assert_eq!(step_chord("(G7/H)", BAND_STEP_12 as i32, None), "(Ab7/C)");
/// assert_eq!(step_chord("(hello)", 2, None), "(hello)");
/// ```
pub fn step_chord(text: &str, adjust: i32, sharp: Option<bool>) -> String {
    let (open, inner, close) = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => ("(", inner, ")"),
        None => ("", text, ""),
    };
    let Some(spec) = parse_chord_text(inner) else {
        return text.to_string();
    };
    let sharp = sharp.unwrap_or_else(|| inner.contains('#'));
    let name = spec.transposed(adjust).to_text(sharp);
    if name.is_empty() {
        return text.to_string();
    }
    format!("{open}{name}{close}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn semis(steps: &[u8]) -> Chord {
        Chord::from_semitones(steps)
    }

    #[rstest]
    #[case("C", &[0, 4, 7], 0)]
    #[case("Cmaj", &[0, 4, 7], 0)]
    #[case("Am", &[0, 3, 7], 9)]
    #[case("A-", &[0, 3, 7], 9)]
    #[case("Amin", &[0, 3, 7], 9)]
    #[case("G7", &[0, 4, 7, 10], 7)]
    #[case("Fmaj7", &[0, 4, 7, 11], 5)]
    #[case("FΔ7", &[0, 4, 7, 11], 5)]
    #[case("Ebdim7", &[0, 3, 6, 9], 3)]
    #[case("F#m7b5", &[0, 3, 6, 10], 6)]
    #[case("Hø", &[0, 3, 6, 10], 11)]
    #[case("Bb+", &[0, 4, 8], 10)]
    #[case("Dsus4", &[0, 5, 7], 2)]
    #[case("Dsus", &[0, 5, 7], 2)]
    #[case("Asus2", &[0, 2, 7], 9)]
    #[case("C6/9", &[0, 2, 4, 7, 9], 0)]
    #[case("C7#9", &[0, 3, 4, 7, 10], 0)]
    #[case("C7-9", &[0, 1, 4, 7, 10], 0)]
    #[case("CmM7", &[0, 3, 7, 11], 0)]
    #[case("C13", &[0, 2, 4, 7, 9, 10], 0)]
    fn test_parse_names(#[case] text: &str, #[case] steps: &[u8], #[case] root: u32) {
        let spec = parse_chord_text(text).unwrap();
        assert_eq!(spec.mask, semis(steps));
        assert_eq!(spec.root, root * BAND_STEP_12);
        assert_eq!(spec.bass, spec.root);
    }

    #[test]
    fn test_parse_minor_seventh_footprint() {
        let spec = parse_chord_text("Cm7").unwrap();
        assert_eq!(spec, ChordSpec::new(semis(&[0, 3, 7, 10]), 0, 0));
    }

    #[test]
    fn test_parse_bass_and_add() {
        let spec = parse_chord_text("G7/B").unwrap();
        assert_eq!(spec.root, 7 * BAND_STEP_12);
        assert_eq!(spec.bass, 11 * BAND_STEP_12);

        let spec = parse_chord_text("Cadd9").unwrap();
        assert_eq!(spec.mask, semis(&[0, 2, 4, 7]));

        let spec = parse_chord_text("Cmadd#11/Eb").unwrap();
        assert_eq!(spec.mask, semis(&[0, 3, 6, 7]));
        assert_eq!(spec.bass, 3 * BAND_STEP_12);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_chord_text(""), None);
        assert_eq!(parse_chord_text("X7"), None);
        assert_eq!(parse_chord_text("Cfoo"), None);
        assert_eq!(parse_chord_text("C/"), None);
        assert_eq!(parse_chord_text("Cadd"), None);
        assert_eq!(parse_chord_text("Cadd14"), None);
    }

    #[test]
    fn test_parse_step_list() {
        let spec = parse_chord_text("C(0-2,6)").unwrap();
        assert_eq!(spec.mask, semis(&[0, 1, 2, 6]));
        assert_eq!(parse_chord_text("C(0,12)"), None);
    }

    #[test]
    fn test_render_names() {
        assert_eq!(render_chord_name(semis(&[0, 4, 7]), 0, 0, false), "C");
        assert_eq!(render_chord_name(semis(&[0, 3, 7, 10]), 2 * 16, 2 * 16, false), "Dm7");
        assert_eq!(render_chord_name(semis(&[0, 4, 7, 10]), 7 * 16, 11 * 16, false), "G7/H");
        assert_eq!(render_chord_name(semis(&[0, 4, 7]), 10 * 16, 10 * 16, false), "Hb");
        assert_eq!(render_chord_name(semis(&[0, 4, 7]), 10 * 16, 10 * 16, true), "A#");
    }

    #[test]
    fn test_render_inversion_finds_root() {
        // G-C-E relative to G names C major with G in the bass
        assert_eq!(render_chord_name(semis(&[0, 5, 9]), 7 * 16, 7 * 16, false), "C/G");
        // E-G-C is a template of its own and keeps E as the root
        assert_eq!(render_chord_name(semis(&[0, 3, 8]), 4 * 16, 4 * 16, false), "Em#5");
    }

    #[test]
    fn test_render_exact_footprint_beats_rotation() {
        // C-E-G-A is both C6 and Am7; the given root decides
        assert_eq!(render_chord_name(semis(&[0, 4, 7, 9]), 0, 0, false), "C6");
        assert_eq!(render_chord_name(semis(&[0, 3, 7, 10]), 9 * 16, 9 * 16, false), "Am7");
    }

    #[test]
    fn test_render_fallback_and_invalid() {
        assert_eq!(render_chord_name(semis(&[0, 1, 2, 3, 6]), 0, 0, false), "C(0-3,6)");
        assert_eq!(render_chord_name(Chord::new(), 0, 0, false), "");
        assert_eq!(render_chord_name(Chord::from_bands(&[0, 8]), 0, 0, false), "");
        assert_eq!(render_chord_name(semis(&[0, 4, 7]), 3, 3, false), "");
    }

    #[test]
    fn test_chord_suffix() {
        assert_eq!(chord_suffix(semis(&[0, 4, 7])), Some(String::new()));
        assert_eq!(chord_suffix(semis(&[0, 3, 6, 10])), Some("m7b5".to_string()));
        assert_eq!(chord_suffix(semis(&[0, 1, 2, 3, 6])), None);
    }

    #[test]
    fn test_every_template_round_trips() {
        for variant in score_variants() {
            let name = render_chord_name(variant.footprint, 0, 0, false);
            assert!(!name.is_empty());
            let spec = parse_chord_text(&name).unwrap_or_else(|| panic!("'{}' does not parse", name));
            assert_eq!(spec.mask, variant.footprint, "'{}' parsed to another footprint", name);
            assert_eq!(spec.root, 0);
            assert_eq!(spec.bass, 0);
        }
    }

    #[test]
    fn test_step_chord() {
        assert_eq!(step_chord("Cm7", 32, None), "Dm7");
        assert_eq!(step_chord("A", 16, None), "Hb");
        assert_eq!(step_chord("A", 16, Some(true)), "A#");
        assert_eq!(step_chord("F#", 16, None), "G");
        assert_eq!(step_chord("F#", 32, None), "G#");
        assert_eq!(step_chord("H", 16, None), "C");
        assert_eq!(step_chord("C", -16, None), "H");
    }

    #[test]
    fn test_step_chord_round_trip() {
        for text in ["G7/H", "Ebmaj7", "F#m7b5", "Asus4", "C6/9", "Dbdim7"] {
            let original = parse_chord_text(text).unwrap();
            for n in 1..12 {
                let up = step_chord(text, n * 16, None);
                let back = step_chord(&up, -n * 16, None);
                assert_eq!(parse_chord_text(&back).unwrap(), original, "{} -> {} -> {}", text, up, back);
            }
        }
    }

    #[test]
    fn test_step_chord_leaves_unknown_text() {
        assert_eq!(step_chord("la la", 16, None), "la la");
        assert_eq!(step_chord("", 16, None), "");
        assert_eq!(step_chord("(Xyz)", 16, None), "(Xyz)");
    }
}
