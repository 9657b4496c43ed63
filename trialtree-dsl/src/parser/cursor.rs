//! Character cursor over DSL source

use super::cst::Span;

/// Saved cursor position, used to backtrack out of a failed optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: usize,
    line: usize,
    column: usize,
}

impl Checkpoint {
    pub fn offset(&self) -> usize {
        self.pos
    }
}

/// Cursor over the source text tracking byte offset, line and column.
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
    }

    /// Span from `start` up to the current position.
    pub fn span_from(&self, start: Checkpoint) -> Span {
        Span {
            start: start.pos,
            end: self.pos,
            line: start.line,
            column: start.column,
        }
    }

    /// Text between `start` and the current position.
    pub fn slice_from(&self, start: Checkpoint) -> &'a str {
        &self.source[start.pos..self.pos]
    }

    pub fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    pub fn starts_with(&self, literal: &str) -> bool {
        self.source[self.pos..].starts_with(literal)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume `literal` if the input continues with it.
    pub fn eat(&mut self, literal: &str) -> bool {
        if !self.starts_with(literal) {
            return false;
        }
        for _ in literal.chars() {
            self.advance();
        }
        true
    }

    /// Consume characters while `accept` holds; returns how many were taken.
    pub fn eat_while(&mut self, mut accept: impl FnMut(&Self, char) -> bool) -> usize {
        let mut taken = 0;
        while let Some(c) = self.peek_char() {
            if !accept(self, c) {
                break;
            }
            self.advance();
            taken += 1;
        }
        taken
    }
}
