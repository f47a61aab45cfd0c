//! Character-at-a-time score text lexer
//!
//! The lexer keeps one element in progress and finishes it as soon as a
//! character cannot extend it. Newlines and `;` always finish the current
//! element and emit a [`ElementKind::Newline`], whatever string or comment
//! state is open; an unterminated block comment carries on into a fresh
//! comment element on the next line.

use super::element::{Element, ElementKind};
use super::value::{parse_command, parse_string_dot};
use log::trace;

const COMMAND_LETTERS: &str = "CDEFGAHBTKLMJUSVWX";
const NOTE_LETTERS: &str = "CDEFGAHB";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Note { flat: bool, dot: bool },
    Command(char),
    /// `S` or `V` waiting for its opening quote
    Quote(char),
    Space,
    Unknown,
    Comment,
    Desc,
    Dot,
    Chord,
    Remark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringMode {
    Display,
    Remark,
}

#[derive(Debug, Default)]
pub struct Lexer {
    pending: Option<(Pending, String)>,
    pending_line: u32,
    /// Open `/*` count
    comment: u32,
    prev: Option<char>,
    string: Option<StringMode>,
    /// Parenthesis depth of a chord inside a display string
    level: u32,
    line: u32,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering source lines from `line`
    pub fn with_line(line: u32) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn comment_depth(&self) -> u32 {
        self.comment
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one character, appending any finished elements to `out`
    pub fn push(&mut self, c: char, out: &mut Vec<Element>) {
        if c == '\n' || c == ';' {
            self.finish(out);
            out.push(Element::new(ElementKind::Newline, c, self.line));
            self.line += 1;
            self.string = None;
            self.level = 0;
            self.prev = None;
            return;
        }

        if self.comment > 0 {
            self.push_comment(c, out);
            return;
        }

        match self.string {
            Some(StringMode::Remark) => {
                self.append(c);
                if c == '"' {
                    self.string = None;
                    self.finish(out);
                }
                return;
            }
            Some(StringMode::Display) => {
                self.push_display(c, out);
                return;
            }
            None => {}
        }

        if !self.extend(c, out) {
            self.finish(out);
            self.start(c);
        }
    }

    /// Finish the element in progress, if any
    pub fn finish(&mut self, out: &mut Vec<Element>) {
        let Some((pending, txt)) = self.pending.take() else {
            return;
        };
        let kind = match pending {
            Pending::Note { .. } | Pending::Command(_) => parse_command(&txt),
            Pending::Quote(_) | Pending::Unknown => ElementKind::Unknown,
            Pending::Space => ElementKind::Space,
            Pending::Comment | Pending::Remark => ElementKind::Comment,
            Pending::Desc => ElementKind::StringDesc,
            Pending::Dot => ElementKind::StringDot {
                beats: parse_string_dot(&txt),
            },
            Pending::Chord => ElementKind::StringChord,
        };
        trace!("line {}: {:?} {:?}", self.pending_line, kind, txt);
        out.push(Element::new(kind, txt, self.pending_line));
    }

    fn begin(&mut self, pending: Pending, txt: &str) {
        self.pending = Some((pending, txt.to_string()));
        self.pending_line = self.line;
    }

    fn append(&mut self, c: char) {
        if let Some((_, txt)) = self.pending.as_mut() {
            txt.push(c);
        }
    }

    fn pending_kind(&self) -> Option<Pending> {
        self.pending.as_ref().map(|(pending, _)| *pending)
    }

    fn pending_text(&self) -> &str {
        self.pending.as_ref().map_or("", |(_, txt)| txt.as_str())
    }

    fn push_comment(&mut self, c: char, out: &mut Vec<Element>) {
        if self.pending_kind() != Some(Pending::Comment) {
            self.finish(out);
            self.begin(Pending::Comment, "");
        }
        self.append(c);
        match (self.prev, c) {
            (Some('/'), '*') => {
                self.comment += 1;
                self.prev = None;
            }
            (Some('*'), '/') => {
                self.comment -= 1;
                self.prev = None;
                if self.comment == 0 {
                    self.finish(out);
                }
            }
            _ => self.prev = Some(c),
        }
    }

    fn push_display(&mut self, c: char, out: &mut Vec<Element>) {
        if c == '"' {
            if self.pending_kind() != Some(Pending::Desc) {
                self.finish(out);
                self.begin(Pending::Desc, "");
            }
            self.append(c);
            self.finish(out);
            self.string = None;
            self.level = 0;
            return;
        }

        if self.level > 0 {
            self.append(c);
            match c {
                '(' => self.level += 1,
                ')' => {
                    self.level -= 1;
                    if self.level == 0 {
                        self.finish(out);
                    }
                }
                _ => {}
            }
            return;
        }

        if self.pending_kind() == Some(Pending::Dot) {
            let txt = self.pending_text();
            let open = txt.starts_with(".[") && !txt.ends_with(']');
            if (txt == "." && c == '[') || (open && (c.is_ascii_digit() || c == ']')) {
                self.append(c);
                if c == ']' {
                    self.finish(out);
                }
                return;
            }
        }

        match c {
            '.' => {
                self.finish(out);
                self.begin(Pending::Dot, ".");
            }
            '(' => {
                self.finish(out);
                self.begin(Pending::Chord, "(");
                self.level = 1;
            }
            _ => {
                if self.pending_kind() != Some(Pending::Desc) {
                    self.finish(out);
                    self.begin(Pending::Desc, "");
                }
                self.append(c);
            }
        }
    }

    /// Try to grow the element in progress by `c`
    fn extend(&mut self, c: char, out: &mut Vec<Element>) -> bool {
        let Some(pending) = self.pending_kind() else {
            return false;
        };
        match pending {
            Pending::Note { flat, dot } => {
                let next = match c {
                    '0'..='9' if dot || !flat => Some(Pending::Note { flat, dot }),
                    'b' | 'B' if !flat && !dot => Some(Pending::Note { flat: true, dot }),
                    '.' if !dot => Some(Pending::Note { flat, dot: true }),
                    _ => None,
                };
                match next {
                    Some(next) => {
                        if let Some((kind, txt)) = self.pending.as_mut() {
                            *kind = next;
                            txt.push(c);
                        }
                        true
                    }
                    None => false,
                }
            }
            Pending::Command(letter) => {
                let txt = self.pending_text();
                let after_sep = txt.len() == 1 || txt.ends_with('.');
                let no_digits = !txt.chars().any(|d| d.is_ascii_digit());
                let accept = match c {
                    '0'..='9' | '.' => true,
                    '+' | '-' => after_sep,
                    'P' | 'R' => letter == 'J' && no_digits,
                    ':' => letter == 'L',
                    _ => false,
                };
                if accept {
                    self.append(c);
                    if c == ':' {
                        self.finish(out);
                    }
                }
                accept
            }
            Pending::Quote(letter) => {
                if c != '"' {
                    return false;
                }
                if letter == 'S' {
                    self.pending = Some((Pending::Desc, "S\"".to_string()));
                    self.string = Some(StringMode::Display);
                    self.level = 0;
                } else {
                    self.pending = Some((Pending::Remark, "V\"".to_string()));
                    self.string = Some(StringMode::Remark);
                }
                true
            }
            Pending::Space => {
                if is_space(c) {
                    self.append(c);
                }
                is_space(c)
            }
            Pending::Unknown => {
                if self.pending_text() == "/" && c == '*' {
                    self.pending = Some((Pending::Comment, "/*".to_string()));
                    self.comment = 1;
                    self.prev = None;
                    return true;
                }
                let boundary = is_space(c) || c == '/' || COMMAND_LETTERS.contains(c) || self.pending_text() == "/";
                if !boundary {
                    self.append(c);
                }
                !boundary
            }
            Pending::Comment | Pending::Desc | Pending::Dot | Pending::Chord | Pending::Remark => false,
        }
    }

    fn start(&mut self, c: char) {
        let pending = if is_space(c) {
            Pending::Space
        } else if c == 'S' || c == 'V' {
            Pending::Quote(c)
        } else if NOTE_LETTERS.contains(c) {
            Pending::Note {
                flat: false,
                dot: false,
            }
        } else if COMMAND_LETTERS.contains(c) {
            Pending::Command(c)
        } else {
            Pending::Unknown
        };
        self.pending = Some((pending, c.to_string()));
        self.pending_line = self.line;
    }
}
