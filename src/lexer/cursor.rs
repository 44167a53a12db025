// Shaped after `rustc_lexer`'s cursor, cut down to what field splitting needs.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

pub(crate) const EOF_CHAR: char = '\0';

/// Peekable iterator over a char sequence.
pub struct Cursor<'a> {
    len_remaining: usize,
    /// Full input, kept for slicing tokens back out
    src: &'a str,
    chars: Chars<'a>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            len_remaining: input.len(),
            src: input,
            chars: input.chars(),
        }
    }

    /// Peek the next char without consuming it
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    /// Input is exhausted
    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    pub fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    pub fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while predicate(self.first()) && !self.is_eof() {
            self.bump();
        }
    }

    /// Byte offset of the cursor into the input
    pub fn offset(&self) -> usize {
        self.src.len() - self.chars.as_str().len()
    }

    /// Bytes consumed since the last `reset_pos`
    pub fn pos_in_token(&self) -> usize {
        self.len_remaining - self.chars.as_str().len()
    }

    pub fn reset_pos(&mut self) {
        self.len_remaining = self.chars.as_str().len();
    }

    /// Consume one whitespace-delimited field
    pub fn advance_field(&mut self) -> Option<&'a str> {
        self.take_while(char::is_whitespace);
        self.reset_pos();
        if self.is_eof() {
            return None;
        }
        let start = self.offset();
        self.take_while(|c| !c.is_whitespace());
        let len = self.pos_in_token();
        self.reset_pos();
        Some(&self.src[start..start + len])
    }
}
