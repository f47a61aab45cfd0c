//! Playback cursor
//!
//! Stepping walks logical lines in play order: `K` commands are applied as
//! they are passed, jumps move the cursor to their label, and a step stops on
//! the first line holding something playable. Jumps and wrap-arounds are
//! bounded by [`MAX_STEP_RETRIES`] so a jump cycle without notes cannot spin.

use super::element::{CommandOp, ElementKind, TransposeMode};
use super::head::{ElementRef, Head, LineSpan};
use super::{MAX_SCORE_KEY, MAX_STEP_RETRIES};
use crate::chord::{BAND_STEP_12, MAX_BANDS};
use log::{trace, warn};
use serde::Serialize;

/// Display properties set by `K6`..`K8`, consumed by a presentation layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayProps {
    pub image: u8,
    pub image_align: u8,
    pub text_align: u8,
}

/// Player settings set by `K2`..`K5`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlaySettings {
    pub reference_bpm: u32,
    pub reference_period: u32,
    pub auto_melody: bool,
    pub micro_tune: bool,
    pub key_mode: u8,
}

/// One note to send to the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlayEvent {
    pub channel: u8,
    pub duration: u32,
    pub key: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Resume {
    #[default]
    Start,
    After(LineSpan),
    At(ElementRef),
}

#[derive(Debug, Clone, Copy)]
struct Voice {
    channel: u8,
    duration: u32,
    transpose: (i32, u32, TransposeMode),
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            channel: 0,
            duration: 1,
            transpose: (0, 0, TransposeMode::Fixed),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PlayState {
    resume: Resume,
    curr: Option<LineSpan>,
    last: Option<LineSpan>,
    did_jump: bool,
    key_locked: bool,
    relative_armed: bool,
    dynamic_base: u32,
    voice: Voice,
    display: DisplayProps,
    settings: PlaySettings,
}

impl PlayState {
    /// Back to the top, keeping settings
    pub fn rewind(&mut self) {
        self.resume = Resume::Start;
        self.curr = None;
        self.last = None;
        self.did_jump = false;
        self.voice = Voice::default();
    }
}

impl Head {
    /// Advance the playback cursor to the next line with playable content.
    ///
    /// Returns `None` when the score has nothing to play or the retry budget
    /// runs out; the current line is left as it was in that case.
    pub fn step_line(&mut self) -> Option<LineSpan> {
        self.play.did_jump = false;
        let mut cursor = self.resume_index();
        let mut retries = 0;

        loop {
            if cursor >= self.len() {
                retries += 1;
                if self.is_empty() || retries > MAX_STEP_RETRIES {
                    break;
                }
                cursor = 0;
                continue;
            }
            let span = self.line_at(cursor)?;

            let mut playable = false;
            let mut jump_to = None;
            for index in span.range() {
                let kind = self.elements()[index].kind.clone();
                match kind {
                    ElementKind::Command { op } => self.apply_command(&op),
                    ElementKind::Jump { label, flags } => {
                        if flags.relative && !self.play.relative_armed {
                            trace!("relative jump to L{} not armed", label);
                            continue;
                        }
                        if flags.relative {
                            self.play.relative_armed = false;
                        }
                        jump_to = Some(label);
                    }
                    _ => playable |= self.elements()[index].is_playable(),
                }
            }

            let target = jump_to.and_then(|label| self.label(label as usize));
            if let (Some(label), None) = (jump_to, target) {
                trace!("jump to undefined L{}", label);
            }

            if playable {
                self.play.resume = match target {
                    Some(target) => Resume::At(self.after(target)),
                    None => Resume::After(span),
                };
                self.set_curr(span);
                return Some(span);
            }

            match target {
                Some(target) => {
                    retries += 1;
                    if retries > MAX_STEP_RETRIES {
                        break;
                    }
                    trace!("jump to element {}", target.index);
                    cursor = target.index + 1;
                }
                None => cursor = span.end,
            }
        }

        warn!(
            "no playable line found within {} jumps, cursor not moved",
            MAX_STEP_RETRIES
        );
        None
    }

    /// The line the last successful step stopped on
    pub fn curr_line(&self) -> Option<LineSpan> {
        self.play.curr.filter(|span| span.generation == self.generation())
    }

    /// The line played before the current one
    pub fn last_line(&self) -> Option<LineSpan> {
        self.play.last.filter(|span| span.generation == self.generation())
    }

    /// Continue playback after label `n`. Returns false when the label does
    /// not exist.
    pub fn jump_label(&mut self, n: usize) -> bool {
        match self.label(n) {
            Some(target) => {
                let after = self.after(target);
                self.jump_to(after);
                true
            }
            None => false,
        }
    }

    /// Continue playback at an arbitrary element
    pub fn jump_pointer(&mut self, position: ElementRef) -> bool {
        if self.element(position).is_none() {
            return false;
        }
        self.jump_to(position);
        true
    }

    /// Whether the cursor was moved from outside since the last step
    pub fn did_jump(&self) -> bool {
        self.play.did_jump
    }

    /// Let the next relative (`JR`) jump fire
    pub fn arm_relative_jump(&mut self) {
        self.play.relative_armed = true;
    }

    pub fn is_key_locked(&self) -> bool {
        self.play.key_locked
    }

    /// Base key for dynamic transposition, usually the played bass key
    pub fn set_dynamic_base(&mut self, key: u32) {
        self.play.dynamic_base = key;
    }

    pub fn display_props(&self) -> DisplayProps {
        self.play.display
    }

    pub fn play_settings(&self) -> PlaySettings {
        self.play.settings
    }

    /// Notes of a line with channel, duration and transposition in effect.
    /// Setters on the line update the carried state for later lines.
    pub fn line_events(&mut self, span: LineSpan) -> Vec<PlayEvent> {
        let Some(elements) = self.line_elements(span) else {
            return Vec::new();
        };
        let mut voice = self.play.voice;
        let mut events = Vec::new();
        for element in elements {
            match element.kind {
                ElementKind::Channel { channel } => voice.channel = channel,
                ElementKind::Duration { ticks } => voice.duration = ticks,
                ElementKind::Transpose { steps, sub, mode } => voice.transpose = (steps, sub, mode),
                ElementKind::Score { key } => events.push(PlayEvent {
                    channel: voice.channel,
                    duration: voice.duration,
                    key: transpose_key(key, voice.transpose, self.play.dynamic_base),
                }),
                _ => {}
            }
        }
        self.play.voice = voice;
        events
    }

    fn apply_command(&mut self, op: &CommandOp) {
        let play = &mut self.play;
        match *op {
            CommandOp::Unlock => play.key_locked = false,
            CommandOp::Lock => play.key_locked = true,
            CommandOp::ReferenceBpm { bpm, period } => {
                play.settings.reference_bpm = bpm;
                play.settings.reference_period = period;
            }
            CommandOp::AutoMelody { on } => play.settings.auto_melody = on,
            CommandOp::MicroTune { on } => play.settings.micro_tune = on,
            CommandOp::KeyMode { mode } => play.settings.key_mode = mode,
            CommandOp::ShowImage { index } => play.display.image = index,
            CommandOp::ImageAlign { align } => play.display.image_align = align,
            CommandOp::TextAlign { align } => play.display.text_align = align,
            CommandOp::Other { .. } => {}
        }
    }

    fn jump_to(&mut self, position: ElementRef) {
        self.play.resume = Resume::At(position);
        self.play.did_jump = true;
        self.play.key_locked = false;
    }

    fn after(&self, position: ElementRef) -> ElementRef {
        ElementRef {
            index: position.index + 1,
            generation: position.generation,
        }
    }

    fn set_curr(&mut self, span: LineSpan) {
        self.play.last = self.play.curr.replace(span);
    }

    fn resume_index(&self) -> usize {
        let generation = self.generation();
        match self.play.resume {
            Resume::After(span) if span.generation == generation => span.end,
            Resume::At(position) if position.generation == generation => position.index,
            _ => 0,
        }
    }
}

fn transpose_key(key: u32, (steps, sub, mode): (i32, u32, TransposeMode), base: u32) -> u32 {
    let mut shift = steps as i64 * BAND_STEP_12 as i64 + sub as i64;
    shift += match mode {
        TransposeMode::Fixed => 0,
        TransposeMode::DynamicFull => base as i64,
        TransposeMode::DynamicRemainder => (base % MAX_BANDS as u32) as i64,
    };
    (key as i64 + shift).clamp(0, MAX_SCORE_KEY as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(head: &Head, span: LineSpan) -> String {
        head.line_elements(span).unwrap().iter().map(|e| e.txt.as_str()).collect()
    }

    #[test]
    fn test_steps_skip_lines_without_notes() {
        let mut head = Head::parse("C5\n/* c */\nK1\nD5\n");
        let first = head.step_line().unwrap();
        assert_eq!(line_text(&head, first), "C5\n");
        let second = head.step_line().unwrap();
        assert_eq!(line_text(&head, second), "D5\n");
        assert!(head.is_key_locked());
        assert_eq!(head.last_line(), Some(first));
        assert_eq!(head.curr_line(), Some(second));
    }

    #[test]
    fn test_wraps_at_end() {
        let mut head = Head::parse("C5\nD5\n");
        head.step_line();
        head.step_line();
        let third = head.step_line().unwrap();
        assert_eq!(line_text(&head, third), "C5\n");
    }

    #[test]
    fn test_jump_to_label() {
        let mut head = Head::parse("C5\nL1:D5\nE5 J1\n");
        let texts: Vec<String> = (0..5)
            .map(|_| {
                let span = head.step_line().unwrap();
                line_text(&head, span)
            })
            .collect();
        assert_eq!(texts, vec!["C5\n", "D5\n", "E5 J1", "D5\n", "E5 J1"]);
    }

    #[test]
    fn test_relative_jump_needs_arming() {
        let mut head = Head::parse("L0:C5\nD5\nJR0\nE5\n");
        let mut next = || {
            let span = head.step_line().unwrap();
            line_text(&head, span)
        };
        assert_eq!(next(), "C5\n");
        assert_eq!(next(), "D5\n");
        assert_eq!(next(), "E5\n");

        let mut head = Head::parse("L0:C5\nD5\nJR0\nE5\n");
        head.step_line();
        head.step_line();
        head.arm_relative_jump();
        let span = head.step_line().unwrap();
        assert_eq!(line_text(&head, span), "C5\n");
    }

    #[test]
    fn test_jump_cycle_without_notes_gives_up() {
        let mut head = Head::parse("L0: J1\nL1: J0\n");
        assert_eq!(head.step_line(), None);
        assert_eq!(head.curr_line(), None);

        let mut head = Head::parse("/* nothing */\n");
        assert_eq!(head.step_line(), None);
        assert_eq!(Head::new().step_line(), None);
    }

    #[test]
    fn test_external_jumps() {
        let mut head = Head::parse("C5\nL2:D5\nE5\n");
        assert!(head.jump_label(2));
        assert!(head.did_jump());
        let span = head.step_line().unwrap();
        assert_eq!(line_text(&head, span), "D5\n");
        assert!(!head.did_jump());
        assert!(!head.jump_label(3));

        let target = head.element_ref(0).unwrap();
        head.step_line();
        assert!(head.jump_pointer(target));
        let span = head.step_line().unwrap();
        assert_eq!(line_text(&head, span), "C5\n");
    }

    #[test]
    fn test_jump_clears_key_lock() {
        let mut head = Head::parse("K1 C5\nL0:D5\n");
        head.step_line();
        assert!(head.is_key_locked());
        head.jump_label(0);
        assert!(!head.is_key_locked());
    }

    #[test]
    fn test_commands_update_settings() {
        let mut head = Head::parse("K2.120.500 K6.3 K8.1 K3.1 C5\n");
        head.step_line();
        let settings = head.play_settings();
        assert_eq!(settings.reference_bpm, 120);
        assert_eq!(settings.reference_period, 500);
        assert!(settings.auto_melody);
        assert_eq!(
            head.display_props(),
            DisplayProps {
                image: 3,
                image_align: 0,
                text_align: 1
            }
        );
    }

    #[test]
    fn test_line_events_carry_state() {
        let mut head = Head::parse("T2 U4 C5 E5\nG5\nX2 U1. C5\n");
        let lines: Vec<LineSpan> = head.lines().collect();
        let first = head.line_events(lines[0]);
        assert_eq!(
            first,
            vec![
                PlayEvent { channel: 2, duration: 7, key: 60 * 16 },
                PlayEvent { channel: 2, duration: 7, key: 64 * 16 },
            ]
        );
        assert_eq!(head.line_events(lines[1]), vec![PlayEvent { channel: 2, duration: 7, key: 67 * 16 }]);
        assert_eq!(head.line_events(lines[2]), vec![PlayEvent { channel: 2, duration: 2, key: 62 * 16 }]);
    }

    #[test]
    fn test_dynamic_transpose() {
        let mut head = Head::parse("X0.0.1 C5\nX0.0.2 C5\n");
        head.set_dynamic_base(50 * 16);
        let lines: Vec<LineSpan> = head.lines().collect();
        assert_eq!(head.line_events(lines[0])[0].key, 60 * 16 + 50 * 16);
        assert_eq!(head.line_events(lines[1])[0].key, 60 * 16 + 2 * 16);
    }

    #[test]
    fn test_transpose_clamps() {
        assert_eq!(transpose_key(10, (-5, 0, TransposeMode::Fixed), 0), 0);
        assert_eq!(transpose_key(MAX_SCORE_KEY, (1, 0, TransposeMode::Fixed), 0), MAX_SCORE_KEY);
    }

    #[test]
    fn test_stale_cursor_restarts() {
        let mut head = Head::parse("C5\nD5\n");
        head.step_line();
        head.push_str("E5\n");
        head.splice(0..0, Vec::new());
        let span = head.step_line().unwrap();
        assert_eq!(line_text(&head, span), "C5\n");
    }
}
