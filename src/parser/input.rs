//! One slot of the input entity stack.

use std::rc::Rc;

/// Where the characters of an input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserInputKind {
    /// The outermost input of the parse (internal subset text or the
    /// external subset stream).
    Document,
    /// Expansion of an internal entity's replacement text.
    InternalEntity,
    /// Resolved content of an external entity.
    ExternalEntity,
}

/// An input entity: one position in one entity's decoded character
/// stream, with its own line/column tracking and one-character pushback.
#[doc(alias = "xmlParserInput")]
pub struct ParserInput {
    /// Name of the entity this input expands, `None` for the document.
    pub entity_name: Option<Rc<str>>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub kind: ParserInputKind,
    /// Whether this input expands a parameter entity.
    pub parameter: bool,
    /// Serial number of this input within the parse. Declarations must
    /// start and stop in the same entity, which is checked by comparing
    /// these numbers.
    pub id: u32,
    /// Decoded content, line endings already normalized to `\n`.
    content: String,
    cur: usize,
    pushback: Option<char>,
    // Position restored by ungetc.
    prev_line: u32,
    prev_col: u32,
    pub line: u32,
    pub col: u32,
    /// Characters consumed from this input so far.
    pub consumed: u64,
}

impl ParserInput {
    pub fn new(
        content: &str,
        kind: ParserInputKind,
        entity_name: Option<Rc<str>>,
        public_id: Option<String>,
        system_id: Option<String>,
        parameter: bool,
        id: u32,
    ) -> Self {
        // 2.11 end-of-line handling: both "\r\n" and a lone "\r" are
        // passed to the grammar as a single "\n".
        let content = if content.contains('\r') {
            content.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            content.to_string()
        };
        Self {
            entity_name,
            public_id,
            system_id,
            kind,
            parameter,
            id,
            content,
            cur: 0,
            pushback: None,
            prev_line: 1,
            prev_col: 1,
            line: 1,
            col: 1,
            consumed: 0,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self.kind, ParserInputKind::Document)
    }

    /// Whether every character of this input has been handed out.
    pub fn exhausted(&self) -> bool {
        self.pushback.is_none() && self.cur >= self.content.len()
    }

    /// Read the next character, if any.
    pub fn getc(&mut self) -> Option<char> {
        let c = match self.pushback.take() {
            Some(c) => c,
            None => {
                let c = self.content[self.cur..].chars().next()?;
                self.cur += c.len_utf8();
                c
            }
        };
        self.prev_line = self.line;
        self.prev_col = self.col;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.consumed += 1;
        Some(c)
    }

    /// Whether a pushed-back character is waiting to be re-read.
    pub fn has_pushback(&self) -> bool {
        self.pushback.is_some()
    }

    /// Push back the most recently read character.
    ///
    /// At most one character may be pending; a second push without an
    /// intervening read is an engine bug.
    pub fn ungetc(&mut self, c: char) {
        debug_assert!(self.pushback.is_none(), "double pushback");
        self.pushback = Some(c);
        self.line = self.prev_line;
        self.col = self.prev_col;
        self.consumed -= 1;
    }

    /// Whether the unread content of this input begins with `literal`.
    /// Does not consume anything.
    pub fn starts_with(&self, literal: &str) -> bool {
        match self.pushback {
            Some(c) => {
                let mut chars = literal.chars();
                match chars.next() {
                    Some(first) if first == c => self.content[self.cur..].starts_with(chars.as_str()),
                    Some(_) => false,
                    None => true,
                }
            }
            None => self.content[self.cur..].starts_with(literal),
        }
    }

    /// Consume exactly the characters of a successfully matched literal.
    pub fn advance(&mut self, literal: &str) {
        for c in literal.chars() {
            // Literals never contain newlines, so no line bookkeeping
            // beyond the column is needed.
            let got = self.getc();
            debug_assert_eq!(got, Some(c));
        }
    }

    /// Number of characters remaining, counting a pending pushback.
    pub fn remaining(&self) -> usize {
        self.content[self.cur..].chars().count() + usize::from(self.pushback.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(content: &str) -> ParserInput {
        ParserInput::new(content, ParserInputKind::Document, None, None, None, false, 1)
    }

    #[test]
    fn getc_tracks_lines_and_columns() {
        let mut inp = input("ab\ncd");
        assert_eq!(inp.getc(), Some('a'));
        assert_eq!((inp.line, inp.col), (1, 2));
        inp.getc();
        inp.getc();
        assert_eq!((inp.line, inp.col), (2, 1));
        assert_eq!(inp.getc(), Some('c'));
        assert_eq!((inp.line, inp.col), (2, 2));
    }

    #[test]
    fn eol_normalization() {
        let mut inp = input("a\r\nb\rc");
        let mut out = String::new();
        while let Some(c) = inp.getc() {
            out.push(c);
        }
        assert_eq!(out, "a\nb\nc");
        assert_eq!(inp.line, 3);
    }

    #[test]
    fn ungetc_restores_position() {
        let mut inp = input("xy");
        let c = inp.getc().unwrap();
        inp.ungetc(c);
        assert_eq!((inp.line, inp.col), (1, 1));
        assert_eq!(inp.getc(), Some('x'));
        assert_eq!(inp.getc(), Some('y'));
        assert!(inp.exhausted());
    }

    #[test]
    fn starts_with_sees_pushback() {
        let mut inp = input("ELEMENT");
        let c = inp.getc().unwrap();
        inp.ungetc(c);
        assert!(inp.starts_with("ELEMENT"));
        assert!(!inp.starts_with("ENTITY"));
    }
}
