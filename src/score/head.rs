//! Element list container
//!
//! [`Head`] owns the elements of one score buffer, the lexer feeding it and
//! the playback cursor. Positions handed out ([`LineSpan`], [`ElementRef`],
//! label table entries) are indices tagged with the generation they were
//! taken at. Any structural edit bumps the generation, so a position from
//! before the edit is recognized as stale instead of pointing at the wrong
//! element.

use super::element::{Element, ElementKind};
use super::lexer::Lexer;
use super::playback::PlayState;
use super::MAX_LABELS;
use log::debug;
use serde::Serialize;
use std::ops::{AddAssign, Range};

/// One logical line: `start..end` in the element list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSpan {
    pub start: usize,
    /// Exclusive
    pub end: usize,
    pub generation: u64,
}

impl LineSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Position of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementRef {
    pub index: usize,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct Head {
    elements: Vec<Element>,
    generation: u64,
    labels: [Option<usize>; MAX_LABELS],
    lexer: Lexer,
    pub(crate) play: PlayState,
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lex `text` into a new, flushed head
    pub fn parse(text: &str) -> Self {
        let mut head = Self::new();
        head.push_str(text);
        head.flush();
        head
    }

    pub fn push_char(&mut self, c: char) {
        let before = self.elements.len();
        self.lexer.push(c, &mut self.elements);
        self.register_labels(before);
    }

    pub fn push_str(&mut self, text: &str) {
        let before = self.elements.len();
        for c in text.chars() {
            self.lexer.push(c, &mut self.elements);
        }
        self.register_labels(before);
    }

    /// Finish the element the lexer is building
    pub fn flush(&mut self) {
        let before = self.elements.len();
        self.lexer.finish(&mut self.elements);
        self.register_labels(before);
    }

    /// Drop all elements and reset lexer and cursors
    pub fn clear(&mut self) {
        self.elements.clear();
        self.lexer.reset();
        self.labels = [None; MAX_LABELS];
        self.generation += 1;
        self.play.rewind();
    }

    /// [`clear`](Self::clear), and also forget playback settings
    pub fn reset(&mut self) {
        self.clear();
        self.play = PlayState::default();
    }

    /// Number the elements in list order
    pub fn sequence(&mut self) {
        for (seq, element) in self.elements.iter_mut().enumerate() {
            element.seq = seq as u32;
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Concatenated element text; equals everything pushed so far once
    /// flushed
    pub fn to_text(&self) -> String {
        self.elements.iter().map(|e| e.txt.as_str()).collect()
    }

    pub fn element_ref(&self, index: usize) -> Option<ElementRef> {
        (index < self.elements.len()).then_some(ElementRef {
            index,
            generation: self.generation,
        })
    }

    pub fn element(&self, position: ElementRef) -> Option<&Element> {
        if position.generation != self.generation {
            return None;
        }
        self.elements.get(position.index)
    }

    /// Where label `n` is defined
    pub fn label(&self, n: usize) -> Option<ElementRef> {
        let index = (*self.labels.get(n)?)?;
        self.element_ref(index)
    }

    /// The logical line after `prev`, or the first one when `prev` is
    /// `None`. A span from an older generation yields `None`.
    pub fn foreach_line(&self, prev: Option<LineSpan>) -> Option<LineSpan> {
        let start = match prev {
            None => 0,
            Some(span) if span.generation == self.generation => span.end,
            Some(_) => return None,
        };
        self.line_at(start)
    }

    /// The logical line starting at element `start`
    pub(crate) fn line_at(&self, start: usize) -> Option<LineSpan> {
        if start >= self.elements.len() {
            return None;
        }
        let end = self.elements[start..]
            .iter()
            .position(Element::ends_line)
            .map_or(self.elements.len(), |offset| start + offset + 1);
        Some(LineSpan {
            start,
            end,
            generation: self.generation,
        })
    }

    /// All logical lines, first to last
    pub fn lines(&self) -> impl Iterator<Item = LineSpan> + '_ {
        std::iter::successors(self.foreach_line(None), move |span| self.foreach_line(Some(*span)))
    }

    /// Elements of a line; `None` for a stale span
    pub fn line_elements(&self, span: LineSpan) -> Option<&[Element]> {
        if span.generation != self.generation {
            return None;
        }
        self.elements.get(span.range())
    }

    /// Chord texts found in display strings, without their parentheses
    pub fn chords(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|e| e.kind == ElementKind::StringChord)
            .map(|e| strip_parens(&e.txt))
            .filter(|txt| !txt.is_empty())
            .collect()
    }

    /// Replace `range` with `replacement`. Every outstanding position
    /// becomes stale.
    pub(crate) fn splice(&mut self, range: Range<usize>, replacement: Vec<Element>) {
        debug!(
            "splice {:?} with {} elements (generation {})",
            range,
            replacement.len(),
            self.generation + 1
        );
        self.elements.splice(range, replacement);
        self.rebuild_labels();
    }

    /// Swap in a whole new element list
    pub(crate) fn replace_all(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        self.rebuild_labels();
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    fn rebuild_labels(&mut self) {
        self.generation += 1;
        self.labels = [None; MAX_LABELS];
        self.register_labels(0);
    }

    /// First definition of a label wins
    fn register_labels(&mut self, from: usize) {
        for (index, element) in self.elements.iter().enumerate().skip(from) {
            if let ElementKind::Label { label } = element.kind {
                let slot = &mut self.labels[label as usize];
                if slot.is_none() {
                    *slot = Some(index);
                }
            }
        }
    }
}

pub(crate) fn strip_parens(txt: &str) -> &str {
    let txt = txt.strip_prefix('(').unwrap_or(txt);
    txt.strip_suffix(')').unwrap_or(txt)
}

impl AddAssign<char> for Head {
    fn add_assign(&mut self, c: char) {
        self.push_char(c);
    }
}

impl AddAssign<&str> for Head {
    fn add_assign(&mut self, text: &str) {
        self.push_str(text);
    }
}
