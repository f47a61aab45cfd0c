//! Element value decoding and rendering
//!
//! Values are always clamped into range, never rejected: `U99999` becomes
//! the longest duration, `T99` the last channel.

use super::element::{CommandOp, ElementKind, JumpFlags, TransposeMode};
use super::{MAX_CHANNELS, MAX_DURATION, MAX_LABELS, MAX_MACROS, MAX_TIMER};
use crate::chord::BAND_STEP_12;

/// Cursor over command text reading signed integers
pub(crate) struct IntReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> IntReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `c` if it is next
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Optional sign then greedy digits. Saturates on overflow. With no
    /// digits the position is left where it was.
    pub fn read_int(&mut self) -> Option<i64> {
        let start = self.pos;
        let negative = if self.eat('-') {
            true
        } else {
            self.eat('+');
            false
        };

        let mut value: i64 = 0;
        let mut digits = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(d as i64);
            self.pos += 1;
            digits += 1;
        }

        if digits == 0 {
            self.pos = start;
            return None;
        }
        Some(if negative { -value } else { value })
    }

    /// Read `.`-separated integers, at most `max` of them
    pub fn read_list(&mut self, max: usize) -> Vec<i64> {
        let mut values = Vec::new();
        while values.len() < max {
            values.push(self.read_int().unwrap_or(0));
            if !self.eat('.') {
                break;
            }
        }
        values
    }
}

/// Reverse the low four bits
pub fn bitrev4(value: u32) -> u32 {
    ((value & 1) << 3) | ((value & 2) << 1) | ((value & 4) >> 1) | ((value & 8) >> 3)
}

fn clamp_u32(value: i64, max: u32) -> u32 {
    value.clamp(0, max as i64) as u32
}

fn letter_semitone(letter: char) -> Option<i64> {
    Some(match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'H' | 'B' => 11,
        _ => return None,
    })
}

/// Decode note text such as `C5`, `E5B` (E flat) or `A4.8`
pub fn parse_score_key(text: &str) -> Option<u32> {
    let mut reader = IntReader::new(text);
    let base = letter_semitone(reader.bump()?)?;
    let octave = match reader.peek() {
        Some(c) if c.is_ascii_digit() => reader.read_int().unwrap_or(0).clamp(0, 10),
        _ => 0,
    };
    let flat = if reader.eat('b') || reader.eat('B') { 1 } else { 0 };
    let sub = if reader.eat('.') {
        reader.read_int().unwrap_or(0).clamp(0, 15) as u32
    } else {
        0
    };
    let midi = (base + 12 * octave - flat).clamp(0, 127) as u32;
    Some(midi * BAND_STEP_12 + bitrev4(sub))
}

/// Note text for a score key. Flats are written with an upper-case `B`.
pub fn render_score_key(key: u32) -> String {
    const NAMES: [(char, bool); 12] = [
        ('C', false),
        ('D', true),
        ('D', false),
        ('E', true),
        ('E', false),
        ('F', false),
        ('G', true),
        ('G', false),
        ('A', true),
        ('A', false),
        ('H', true),
        ('H', false),
    ];
    let midi = key / BAND_STEP_12;
    let (letter, flat) = NAMES[(midi % 12) as usize];
    let octave = (midi + flat as u32) / 12;

    let mut out = format!("{}{}", letter, octave);
    if flat {
        out.push('B');
    }
    let sub = bitrev4(key % BAND_STEP_12);
    if sub != 0 {
        out.push_str(&format!(".{}", sub));
    }
    out
}

/// `U` value: doubled, minus one tick unless a `.` follows
pub fn parse_duration(args: &str) -> u32 {
    let mut reader = IntReader::new(args);
    let value = reader.read_int().unwrap_or(0);
    let dotted = reader.eat('.');
    clamp_u32(value.saturating_mul(2).saturating_sub(if dotted { 0 } else { 1 }), MAX_DURATION)
}

pub fn render_duration(ticks: u32) -> String {
    if ticks % 2 == 1 {
        format!("U{}", (ticks + 1) / 2)
    } else {
        format!("U{}.", ticks / 2)
    }
}

pub fn render_channel(channel: u8) -> String {
    format!("T{}", channel)
}

/// Decode a finished command element. `text` includes the command letter.
pub fn parse_command(text: &str) -> ElementKind {
    let mut chars = text.chars();
    let Some(letter) = chars.next() else {
        return ElementKind::Unknown;
    };
    let args = chars.as_str();
    let mut reader = IntReader::new(args);

    match letter {
        'C' | 'D' | 'E' | 'F' | 'G' | 'A' | 'H' | 'B' => match parse_score_key(text) {
            Some(key) => ElementKind::Score { key },
            None => ElementKind::Unknown,
        },
        'U' => ElementKind::Duration {
            ticks: parse_duration(args),
        },
        'T' => ElementKind::Channel {
            channel: clamp_u32(reader.read_int().unwrap_or(0), MAX_CHANNELS as u32 - 1) as u8,
        },
        'L' => ElementKind::Label {
            label: clamp_u32(reader.read_int().unwrap_or(0), MAX_LABELS as u32 - 1) as u8,
        },
        'M' => ElementKind::Macro {
            index: clamp_u32(reader.read_int().unwrap_or(0), MAX_MACROS as u32 - 1) as u8,
        },
        'J' => {
            let mut flags = JumpFlags::default();
            loop {
                if reader.eat('P') {
                    flags.new_page = true;
                } else if reader.eat('R') {
                    flags.relative = true;
                } else {
                    break;
                }
            }
            ElementKind::Jump {
                label: clamp_u32(reader.read_int().unwrap_or(0), MAX_LABELS as u32 - 1) as u8,
                flags,
            }
        }
        'W' => {
            let values = reader.read_list(2);
            let field = |i: usize| clamp_u32(values.get(i).copied().unwrap_or(0), MAX_TIMER);
            ElementKind::Timer {
                pre: field(0),
                post: field(1),
            }
        }
        'X' => {
            let values = reader.read_list(3);
            let field = |i: usize| values.get(i).copied().unwrap_or(0);
            ElementKind::Transpose {
                steps: field(0).clamp(-127, 127) as i32,
                sub: bitrev4(field(1).clamp(0, 15) as u32),
                mode: TransposeMode::from_index(field(2)),
            }
        }
        'K' => ElementKind::Command {
            op: parse_command_op(&reader.read_list(4)),
        },
        _ => ElementKind::Unknown,
    }
}

fn parse_command_op(values: &[i64]) -> CommandOp {
    let arg = |i: usize| values.get(i + 1).copied().unwrap_or(0);
    match values.first().copied().unwrap_or(0) {
        0 => CommandOp::Unlock,
        1 => CommandOp::Lock,
        2 => CommandOp::ReferenceBpm {
            bpm: clamp_u32(arg(0), 6000),
            period: clamp_u32(arg(1), 60000),
        },
        3 => CommandOp::AutoMelody { on: arg(0) != 0 },
        4 => CommandOp::MicroTune { on: arg(0) != 0 },
        5 => CommandOp::KeyMode {
            mode: clamp_u32(arg(0), 3) as u8,
        },
        6 => CommandOp::ShowImage {
            index: clamp_u32(arg(0), 255) as u8,
        },
        7 => CommandOp::ImageAlign {
            align: clamp_u32(arg(0), 2) as u8,
        },
        8 => CommandOp::TextAlign {
            align: clamp_u32(arg(0), 2) as u8,
        },
        opcode => CommandOp::Other {
            opcode,
            args: values.iter().skip(1).copied().collect(),
        },
    }
}

/// `.[n]` beat count of a string dot
pub fn parse_string_dot(text: &str) -> Option<u32> {
    let inner = text.strip_prefix(".[")?;
    let mut reader = IntReader::new(inner);
    reader.read_int().map(|n| clamp_u32(n, MAX_DURATION))
}
