//! Whole-score text transforms

use super::element::{Element, ElementKind};
use super::head::Head;
use super::value::{render_channel, render_duration, render_score_key};
use super::MAX_SCORE_KEY;
use crate::chord::{step_chord, MAX_BANDS};
use log::debug;
use std::ops::Range;

const OCTAVE: u32 = MAX_BANDS as u32;

/// Bass flags for `keys`, in the same order: the lowest key and at most one
/// more key of its pitch class, counted from the bottom up.
fn bass_flags(keys: &[u32]) -> Vec<bool> {
    let mut flags = vec![false; keys.len()];
    let Some(&lowest) = keys.iter().min() else {
        return flags;
    };
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_key(|&i| keys[i]);

    let mut seen = 0;
    for i in order {
        if seen < 2 && keys[i] % OCTAVE == lowest % OCTAVE {
            flags[i] = true;
            seen += 1;
        }
    }
    flags
}

/// Split keys into bass and treble, each in ascending order.
///
/// The bass is the first one or two keys sharing the pitch class of the
/// lowest key. A third key of that pitch class is treble, like every other
/// key.
pub fn split_bass_treble(keys: &[u32]) -> (Vec<u32>, Vec<u32>) {
    let mut bass = Vec::new();
    let mut treble = Vec::new();
    for (&key, is_bass) in keys.iter().zip(bass_flags(keys)) {
        if is_bass {
            bass.push(key);
        } else {
            treble.push(key);
        }
    }
    bass.sort_unstable();
    treble.sort_unstable();
    (bass, treble)
}

fn lower_to(key: &mut u32, limit: u32) {
    while *key > limit && *key >= OCTAVE {
        *key -= OCTAVE;
    }
}

/// Elements a note run is made of
fn in_note_run(element: &Element) -> bool {
    matches!(
        element.kind,
        ElementKind::Score { .. } | ElementKind::Channel { .. } | ElementKind::Duration { .. } | ElementKind::Space
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setter {
    Channel(u8),
    Duration(u32),
}

fn setter(element: &Element) -> Option<Setter> {
    match element.kind {
        ElementKind::Channel { channel } => Some(Setter::Channel(channel)),
        ElementKind::Duration { ticks } => Some(Setter::Duration(ticks)),
        _ => None,
    }
}

fn same_setter_kind(a: Setter, b: Setter) -> bool {
    matches!(
        (a, b),
        (Setter::Channel(_), Setter::Channel(_)) | (Setter::Duration(_), Setter::Duration(_))
    )
}

/// Carried channel and duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Voice {
    channel: u8,
    duration: u32,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            channel: 0,
            duration: 1,
        }
    }
}

impl Voice {
    fn apply(&mut self, element: &Element) {
        match setter(element) {
            Some(Setter::Channel(channel)) => self.channel = channel,
            Some(Setter::Duration(ticks)) => self.duration = ticks,
            None => {}
        }
    }
}

impl Head {
    /// Drop redundant channel/duration setters and tidy spacing.
    ///
    /// A setter is dropped when another setter of the same kind replaces it
    /// before any note uses it. A setter that repeats the value in effect is
    /// dropped too. Labels reset the value in effect.
    ///
    /// Space runs shrink to one space and vanish at line edges. Elements
    /// left without text are deleted, except labels. Returns the number of
    /// elements removed.
    pub fn optimise(&mut self) -> usize {
        self.flush();
        let elements = self.elements();
        let mut keep = vec![true; elements.len()];
        let mut channel = None;
        let mut duration = None;

        for (i, element) in elements.iter().enumerate() {
            if let ElementKind::Label { .. } = element.kind {
                channel = None;
                duration = None;
                continue;
            }
            let Some(current) = setter(element) else {
                continue;
            };
            let used = elements[i + 1..]
                .iter()
                .find_map(|e| match setter(e) {
                    Some(other) if same_setter_kind(current, other) => Some(false),
                    _ if e.is_playable() || matches!(e.kind, ElementKind::Label { .. }) => Some(true),
                    _ => None,
                })
                .unwrap_or(false);
            let repeated = match current {
                Setter::Channel(c) => channel == Some(c),
                Setter::Duration(d) => duration == Some(d),
            };
            if !used || repeated {
                keep[i] = false;
                continue;
            }
            match current {
                Setter::Channel(c) => channel = Some(c),
                Setter::Duration(d) => duration = Some(d),
            }
        }

        let mut kept: Vec<Element> = elements
            .iter()
            .zip(&keep)
            .filter(|(_, &k)| k)
            .map(|(e, _)| e.clone())
            .collect();
        normalize_spaces(&mut kept);

        let before = self.len();
        kept.retain(|e| !e.txt.is_empty() || matches!(e.kind, ElementKind::Label { .. }));
        let removed = before - kept.len();
        debug!("optimise removed {} of {} elements", removed, before);
        self.replace_all(kept);
        removed
    }

    /// Move every note by `adjust` bands and step every chord in display
    /// strings by the same amount. `sharp` forces the chord spelling; by
    /// default sharps are used when any chord already has one. Returns the
    /// number of elements changed.
    pub fn transpose_score(&mut self, adjust: i32, sharp: Option<bool>) -> usize {
        self.flush();
        let sharp = sharp.unwrap_or_else(|| {
            self.elements()
                .iter()
                .any(|e| e.kind == ElementKind::StringChord && e.txt.contains('#'))
        });

        let mut changed = 0;
        for element in self.elements_mut() {
            let txt = match element.kind {
                ElementKind::Score { key } => {
                    let key = (key as i64 + adjust as i64).clamp(0, MAX_SCORE_KEY as i64) as u32;
                    element.kind = ElementKind::Score { key };
                    render_score_key(key)
                }
                ElementKind::StringChord => step_chord(&element.txt, adjust, Some(sharp)),
                _ => continue,
            };
            if txt != element.txt {
                element.txt = txt;
                changed += 1;
            }
        }
        debug!("transpose by {} bands changed {} elements", adjust, changed);
        changed
    }

    /// Move notes down by whole octaves until none is above `limit`, then
    /// move the bass of each line below its lowest treble note. Returns the
    /// number of note runs rewritten.
    pub fn limit_score(&mut self, limit: u32) -> usize {
        self.rewrite_notes(|keys, bass| {
            for key in keys.iter_mut() {
                lower_to(key, limit);
            }
            let lowest_treble = keys
                .iter()
                .zip(bass)
                .filter(|&(_, &is_bass)| !is_bass)
                .map(|(&key, _)| key)
                .min();
            if let Some(lowest) = lowest_treble {
                for (key, &is_bass) in keys.iter_mut().zip(bass) {
                    if is_bass {
                        lower_to(key, lowest.saturating_sub(1));
                    }
                }
            }
        })
    }

    /// Move bass notes by `offset` bands, leaving the treble alone
    pub fn bass_offset(&mut self, offset: i32) -> usize {
        self.rewrite_notes(|keys, bass| {
            for (key, &is_bass) in keys.iter_mut().zip(bass) {
                if is_bass {
                    *key = (*key as i64 + offset as i64).clamp(0, MAX_SCORE_KEY as i64) as u32;
                }
            }
        })
    }

    /// Rewrite the notes of every logical line.
    ///
    /// `adjust` gets the keys of one line in text order, with their bass
    /// flags. A note run is a stretch of notes, `T`/`U` setters and spaces
    /// between other elements. Runs with a changed key are rebuilt as the
    /// notes sorted by channel, duration and key, with setters where the
    /// value changes. The channel and duration the run left behind are
    /// restored at its end. Everything outside the runs stays in place.
    /// Returns the number of runs rewritten.
    fn rewrite_notes(&mut self, adjust: impl Fn(&mut [u32], &[bool])) -> usize {
        self.flush();
        let elements = self.elements();

        let mut voice = Voice::default();
        let after: Vec<Voice> = elements
            .iter()
            .map(|element| {
                voice.apply(element);
                voice
            })
            .collect();

        let mut adjusted: Vec<Option<u32>> = vec![None; elements.len()];
        for span in self.lines() {
            let notes: Vec<usize> = span
                .range()
                .filter(|&i| matches!(elements[i].kind, ElementKind::Score { .. }))
                .collect();
            let mut keys: Vec<u32> = notes.iter().filter_map(|&i| elements[i].score_key()).collect();
            let bass = bass_flags(&keys);
            adjust(&mut keys, &bass);
            for (&i, key) in notes.iter().zip(keys) {
                adjusted[i] = Some(key);
            }
        }

        let mut plans: Vec<(Range<usize>, Vec<Element>)> = Vec::new();
        let mut i = 0;
        while i < elements.len() {
            if !in_note_run(&elements[i]) || elements[i].kind == ElementKind::Space {
                i += 1;
                continue;
            }
            let start = i;
            let mut end = i;
            while i < elements.len() && in_note_run(&elements[i]) {
                if elements[i].kind != ElementKind::Space {
                    end = i + 1;
                }
                i += 1;
            }

            let changed = (start..end)
                .any(|n| elements[n].score_key().is_some() && adjusted[n] != elements[n].score_key());
            if !changed {
                continue;
            }

            let mut notes: Vec<(u8, u32, u32)> = (start..end)
                .filter_map(|n| adjusted[n].map(|key| (after[n].channel, after[n].duration, key)))
                .collect();
            notes.sort_unstable();

            let line = elements[start].line;
            let entry = if start == 0 { Voice::default() } else { after[start - 1] };
            let exit = after[end - 1];
            let mut words = Vec::new();
            let mut state = entry;
            for (channel, duration, key) in notes {
                if channel != state.channel {
                    words.push(channel_element(channel, line));
                }
                if duration != state.duration {
                    words.push(duration_element(duration, line));
                }
                state = Voice { channel, duration };
                words.push(Element::new(ElementKind::Score { key }, render_score_key(key), line));
            }
            if exit.channel != state.channel {
                words.push(channel_element(exit.channel, line));
            }
            if exit.duration != state.duration {
                words.push(duration_element(exit.duration, line));
            }

            let mut replacement = Vec::with_capacity(words.len() * 2);
            for (n, word) in words.into_iter().enumerate() {
                if n > 0 {
                    replacement.push(Element::new(ElementKind::Space, " ", line));
                }
                replacement.push(word);
            }
            plans.push((start..end, replacement));
        }

        let rewritten = plans.len();
        for (range, replacement) in plans.into_iter().rev() {
            self.splice(range, replacement);
        }
        debug!("rewrote {} note runs", rewritten);
        rewritten
    }
}

fn channel_element(channel: u8, line: u32) -> Element {
    Element::new(ElementKind::Channel { channel }, render_channel(channel), line)
}

fn duration_element(ticks: u32, line: u32) -> Element {
    Element::new(ElementKind::Duration { ticks }, render_duration(ticks), line)
}

/// Collapse space runs to a single space and drop spaces at line edges
fn normalize_spaces(elements: &mut [Element]) {
    let len = elements.len();
    for i in 0..len {
        if elements[i].kind != ElementKind::Space {
            continue;
        }
        let prev = elements[..i].iter().rev().find(|e| !e.txt.is_empty());
        let at_start = prev.map_or(true, |e| matches!(e.kind, ElementKind::Space | ElementKind::Newline));
        let at_end = elements[i + 1..]
            .iter()
            .find(|e| !e.txt.is_empty())
            .map_or(true, |e| e.kind == ElementKind::Newline);
        elements[i].txt = if at_start || at_end { String::new() } else { " ".to_string() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn key(midi: u32) -> u32 {
        midi * 16
    }

    #[rstest]
    #[case(&[], &[], &[])]
    #[case(&[key(48)], &[key(48)], &[])]
    #[case(&[key(48), key(64), key(67)], &[key(48)], &[key(64), key(67)])]
    #[case(&[key(36), key(52), key(60)], &[key(36), key(60)], &[key(52)])]
    #[case(&[key(60), key(72)], &[key(60), key(72)], &[])]
    #[case(&[key(36), key(48), key(60), key(64)], &[key(36), key(48)], &[key(60), key(64)])]
    #[case(&[key(67), key(60), key(64)], &[key(60)], &[key(64), key(67)])]
    fn test_split_bass_treble(#[case] keys: &[u32], #[case] bass: &[u32], #[case] treble: &[u32]) {
        assert_eq!(split_bass_treble(keys), (bass.to_vec(), treble.to_vec()));
    }

    #[test]
    fn test_optimise_drops_repeats() {
        let mut head = Head::parse("T0 U4 C5\nT0 U4 D5\nU2 E5\n");
        let removed = head.optimise();
        assert_eq!(head.to_text(), "T0 U4 C5\nD5\nU2 E5\n");
        assert_eq!(removed, 4);
    }

    #[test]
    fn test_optimise_drops_overridden_setters() {
        let mut head = Head::parse("U2 U4   C5 T1\n");
        head.optimise();
        assert_eq!(head.to_text(), "U4 C5\n");
    }

    #[test]
    fn test_optimise_keeps_setters_after_labels() {
        let mut head = Head::parse("T1 C5\nL0: T1 D5\nJ0\n");
        head.optimise();
        assert_eq!(head.to_text(), "T1 C5\nL0: T1 D5\nJ0\n");
    }

    #[test]
    fn test_optimise_normalizes_spaces() {
        let mut head = Head::parse("  C5 \t D5  \n\tE5");
        head.optimise();
        assert_eq!(head.to_text(), "C5 D5\nE5");
    }

    #[test]
    fn test_transpose_score() {
        let mut head = Head::parse("C5 E5B\nS\"(Am)la (G7/H)\"");
        let changed = head.transpose_score(2 * 16, None);
        assert_eq!(head.to_text(), "D5 F5\nS\"(Hm)la (A7/Db)\"");
        assert_eq!(changed, 4);
    }

    #[test]
    fn test_transpose_score_keeps_sharps() {
        let mut head = Head::parse("S\"(F#m) (A)\"");
        head.transpose_score(16, None);
        assert_eq!(head.to_text(), "S\"(Gm) (A#)\"");
    }

    #[test]
    fn test_transpose_leaves_unknown_chords() {
        let mut head = Head::parse("S\"(intro)\"");
        assert_eq!(head.transpose_score(16, None), 0);
        assert_eq!(head.to_text(), "S\"(intro)\"");
    }

    #[test]
    fn test_limit_score() {
        let mut head = Head::parse("T0 U4 C3 E7 G7\n");
        let runs = head.limit_score(key(72));
        assert_eq!(runs, 1);
        // T0 is the channel in effect anyway
        assert_eq!(head.to_text(), "U4 C3 E5 G5\n");
    }

    #[test]
    fn test_limit_moves_bass_under_treble() {
        let mut head = Head::parse("T0 U4 A5 C6 E6\n");
        head.limit_score(key(60));
        // Treble drops to C5/E4, bass A5 must go below E4
        assert_eq!(head.to_text(), "U4 A3 E4 C5\n");
    }

    #[test]
    fn test_limit_keeps_every_note_under_limit() {
        let mut head = Head::parse("E7\nC4 C6 G7\nT2 A6 X1 D7 /* F8 */\n");
        head.limit_score(key(72));
        let keys: Vec<u32> = head.elements().iter().filter_map(Element::score_key).collect();
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|&k| k <= key(72)), "{:?}", keys);
        assert!(head.to_text().ends_with("/* F8 */\n"));
    }

    #[test]
    fn test_bass_offset() {
        let mut head = Head::parse("L0: U4 C3 E5 G5 J0\n");
        head.bass_offset(-12 * 16);
        assert_eq!(head.to_text(), "L0: U4 C2 E5 G5 J0\n");
    }

    #[test]
    fn test_rewrite_groups_and_restores_state() {
        let mut head = Head::parse("T1 U2 E5 T0 C4 C5\nD5\n");
        assert_eq!(head.bass_offset(-12 * 16), 2);
        assert_eq!(head.to_text(), "U2 C3 C4 T1 E5 T0\nD4\n");
    }

    #[test]
    fn test_rewrite_keeps_notes_around_open_comment() {
        let text = "C5 /* a\nb */ E5\n";
        let mut head = Head::parse(text);
        let kinds: Vec<ElementKind> = head.elements().iter().map(|e| e.kind.clone()).collect();

        assert_eq!(head.bass_offset(0), 0);
        assert_eq!(head.to_text(), text);

        head.bass_offset(-12 * 16);
        assert_eq!(head.to_text(), "C4 /* a\nb */ E4\n");
        let comments = |kinds: &[ElementKind]| kinds.iter().filter(|k| **k == ElementKind::Comment).count();
        let shifted: Vec<ElementKind> = head.elements().iter().map(|e| e.kind.clone()).collect();
        assert_eq!(shifted.len(), kinds.len());
        assert_eq!(comments(&shifted), comments(&kinds));
        assert_eq!(
            head.elements().iter().filter_map(Element::score_key).collect::<Vec<_>>(),
            vec![key(48), key(52)]
        );
    }

    #[test]
    fn test_rewrite_keeps_transpose_in_place() {
        let mut head = Head::parse("E5 X2 C4 C5\n");
        head.bass_offset(-12 * 16);
        assert_eq!(head.to_text(), "E5 X2 C3 C4\n");
    }

    #[rstest]
    #[case(0)]
    #[case(-12 * 16)]
    fn test_rewrite_preserves_element_kinds(#[case] offset: i32) {
        let text = "L0: T1 U4 C3 /* open\nstill C5 */ E5 G5\nX2 C4 K1 E5 V\"v\" S\"(C)la\"\nJ0\n";
        let mut head = Head::parse(text);
        let kinds = |head: &Head| -> Vec<std::mem::Discriminant<ElementKind>> {
            head.elements().iter().map(|e| std::mem::discriminant(&e.kind)).collect()
        };
        let before = kinds(&head);
        let keys: Vec<u32> = head.elements().iter().filter_map(Element::score_key).collect();

        head.bass_offset(offset);
        assert_eq!(kinds(&head), before);
        if offset == 0 {
            assert_eq!(head.to_text(), text);
            let after: Vec<u32> = head.elements().iter().filter_map(Element::score_key).collect();
            assert_eq!(after, keys);
        } else {
            assert_eq!(
                head.to_text(),
                "L0: T1 U4 C2 /* open\nstill C5 */ E4 G5\nX2 C3 K1 E5 V\"v\" S\"(C)la\"\nJ0\n"
            );
        }
    }
}
