//! Score element types

use serde::Serialize;

/// How an `X` transpose command applies its offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransposeMode {
    /// Only the given steps
    #[default]
    Fixed,
    /// Steps plus the externally supplied base key
    DynamicFull,
    /// Steps plus the base key modulo one octave
    DynamicRemainder,
}

impl TransposeMode {
    pub fn from_index(index: i64) -> Self {
        match index.clamp(0, 2) {
            0 => TransposeMode::Fixed,
            1 => TransposeMode::DynamicFull,
            _ => TransposeMode::DynamicRemainder,
        }
    }
}

/// Prefix flags of a `J` jump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JumpFlags {
    /// `P`: start a new page when jumping
    pub new_page: bool,
    /// `R`: only jump when armed from outside
    pub relative: bool,
}

/// Decoded `K` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum CommandOp {
    /// `K0`
    Unlock,
    /// `K1`
    Lock,
    /// `K2.bpm.period`
    ReferenceBpm { bpm: u32, period: u32 },
    /// `K3.on`
    AutoMelody { on: bool },
    /// `K4.on`
    MicroTune { on: bool },
    /// `K5.mode`
    KeyMode { mode: u8 },
    /// `K6.index`
    ShowImage { index: u8 },
    /// `K7.align`
    ImageAlign { align: u8 },
    /// `K8.align`
    TextAlign { align: u8 },
    /// Any other opcode, arguments as written
    Other { opcode: i64, args: Vec<i64> },
}

/// What an element is, with the values decoded from its text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ElementKind {
    /// Note, key in bands (MIDI key × 16 + sub-band)
    Score { key: u32 },
    Duration { ticks: u32 },
    Channel { channel: u8 },
    Jump { label: u8, flags: JumpFlags },
    Label { label: u8 },
    Macro { index: u8 },
    Timer { pre: u32, post: u32 },
    /// `steps` in semitones, `sub` in bands
    Transpose { steps: i32, sub: u32, mode: TransposeMode },
    Command { op: CommandOp },
    /// Literal text of a display string
    StringDesc,
    /// Beat marker in a display string, `.` or `.[n]`
    StringDot { beats: Option<u32> },
    /// Chord in a display string, `(Am7)`
    StringChord,
    Comment,
    Space,
    Newline,
    Unknown,
}

/// One lexical unit of score text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Source text, exactly as typed
    pub txt: String,
    /// Source line, starting at 0
    pub line: u32,
    /// Ordering number, assigned by [`Head::sequence`](super::Head::sequence)
    pub seq: u32,
}

impl Element {
    pub fn new(kind: ElementKind, txt: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            txt: txt.into(),
            line,
            seq: 0,
        }
    }

    /// Notes, macros and timers are what a playback step stops on
    pub fn is_playable(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Score { .. } | ElementKind::Macro { .. } | ElementKind::Timer { .. }
        )
    }

    /// Newlines, jumps and labels close a logical line
    pub fn ends_line(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Newline | ElementKind::Jump { .. } | ElementKind::Label { .. }
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::StringDesc | ElementKind::StringDot { .. } | ElementKind::StringChord
        )
    }

    pub fn score_key(&self) -> Option<u32> {
        match self.kind {
            ElementKind::Score { key } => Some(key),
            _ => None,
        }
    }
}
