//! Lyrics export
//!
//! Display strings are laid out per source line: chords on a line of their
//! own above the text, each chord starting in the column of the text it was
//! written before. Lines with labels become `[section]` markers.

use super::element::{Element, ElementKind};
use super::head::{strip_parens, Head};

fn desc_text(txt: &str) -> &str {
    let txt = txt.strip_prefix("S\"").unwrap_or(txt);
    txt.strip_suffix('"').unwrap_or(txt)
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().is_some_and(|last| !last.is_empty()) {
        out.push(String::new());
    }
}

impl Head {
    /// Lyrics with chords above the text, or the text alone with
    /// `no_chords`
    pub fn to_lyrics(&self, no_chords: bool) -> String {
        let mut out: Vec<String> = Vec::new();

        for line in self.elements().split_inclusive(|e| e.kind == ElementKind::Newline) {
            let line: &[Element] = match line.split_last() {
                Some((last, rest)) if last.kind == ElementKind::Newline => rest,
                _ => line,
            };
            if line.is_empty() {
                push_blank(&mut out);
                continue;
            }

            let label = line.iter().find_map(|e| match e.kind {
                ElementKind::Label { label } => Some(label),
                _ => None,
            });
            if label.is_none() && !line.iter().any(Element::is_string) {
                continue;
            }

            let mut chords = String::new();
            let mut text = String::new();
            for element in line {
                match element.kind {
                    ElementKind::StringDesc => text.push_str(desc_text(&element.txt)),
                    ElementKind::StringChord => {
                        let column = text.chars().count();
                        let width = chords.chars().count();
                        if width < column {
                            chords.extend(std::iter::repeat(' ').take(column - width));
                        } else if width > 0 {
                            chords.push(' ');
                        }
                        chords.push_str(strip_parens(&element.txt));
                    }
                    _ => {}
                }
            }

            if let Some(label) = label {
                let title = text.trim();
                if title.is_empty() {
                    out.push(format!("[L{}]", label));
                } else {
                    out.push(format!("[{}]", title));
                }
                continue;
            }

            let chords = chords.trim_end();
            let text = text.trim_end();
            if !no_chords && !chords.is_empty() {
                out.push(chords.to_string());
            }
            if !text.is_empty() {
                out.push(text.to_string());
            } else if no_chords || chords.is_empty() {
                push_blank(&mut out);
            }
        }

        while out.last().is_some_and(String::is_empty) {
            out.pop();
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chords_above_text() {
        let head = Head::parse("S\"(Am)Hello (G7/H)world\" C5 E5\n");
        assert_eq!(head.to_lyrics(false), "Am    G7/H\nHello world");
        assert_eq!(head.to_lyrics(true), "Hello world");
    }

    #[test]
    fn test_labels_become_sections() {
        let head = Head::parse("L0: S\"Chorus\"\nS\"la la\"\nL1:\nS\"li\"\n");
        assert_eq!(head.to_lyrics(true), "[Chorus]\nla la\n[L1]\nli");
    }

    #[test]
    fn test_lines_without_strings_are_skipped() {
        let head = Head::parse("C5 D5\nS\"one\"\nE5\n\n\n\nS\"two\"\n\n");
        assert_eq!(head.to_lyrics(false), "one\n\ntwo");
    }

    #[test]
    fn test_dots_and_comments_ignored() {
        let head = Head::parse("S\"a.b.[2]c  \" V\"note\" /* x */\n");
        assert_eq!(head.to_lyrics(false), "abc");
    }

    #[test]
    fn test_adjacent_chords() {
        let head = Head::parse("S\"(C)(G)x\"\n");
        assert_eq!(head.to_lyrics(false), "C G\nx");
    }
}
