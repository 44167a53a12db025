//! Splitting raw source lines into fields.

use lazy_static::lazy_static;
use regex::Regex;

use crate::lexer::cursor::Cursor;

pub mod cursor;

/// Most fields a line can carry: label, operator, operand, two modifiers, extra.
pub const MAX_FIELDS: usize = 6;
pub const COMMENT_SEPARATOR: char = '#';
pub const INCLUDE_MARKER: char = '$';
pub const HTML_OPEN: &str = "<HTML>";
pub const HTML_CLOSE: &str = "</HTML>";

lazy_static! {
    static ref FALSE_LABEL: Regex = Regex::new(r"^[+-][0-9]+D?$").unwrap();
}

/// A line with its comment removed and the rest split on whitespace.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RawLine<'a> {
    pub tokens: Vec<&'a str>,
    pub comment: &'a str,
    /// Text starts in column 1, so the first token is a label.
    pub label_in_col1: bool,
    /// Starts with two blanks, so an unlabelled first token is a fake label.
    pub space_indented: bool,
}

/// Line-number style markers such as `+3` or `-12D` that sit in the label column.
pub fn is_false_label(token: &str) -> bool {
    FALSE_LABEL.is_match(token)
}

pub fn strip_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Name of the file an include directive points at.
pub fn include_target(line: &str) -> Option<&str> {
    let rest = strip_newline(line).strip_prefix(INCLUDE_MARKER)?;
    Cursor::new(rest).advance_field()
}

pub fn split_line(line: &str) -> RawLine<'_> {
    let line = strip_newline(line);
    let (body, comment) = match line.split_once(COMMENT_SEPARATOR) {
        Some((body, comment)) => (body, comment),
        None => (line, ""),
    };

    let mut cursor = Cursor::new(body);
    let mut tokens = Vec::with_capacity(MAX_FIELDS);
    while tokens.len() < MAX_FIELDS {
        match cursor.advance_field() {
            Some(token) => tokens.push(token),
            None => break,
        }
    }

    RawLine {
        tokens,
        comment,
        label_in_col1: body.starts_with(|c: char| !c.is_whitespace()),
        space_indented: body.starts_with("  "),
    }
}
