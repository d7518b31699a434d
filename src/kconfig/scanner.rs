//! Line scanner for preprocessed Kconfig text
//!
//! Kconfig is line oriented: every directive and property occupies one
//! logical line. The parser loads each joined and expanded line into the
//! [`Scanner`], which offers cursor primitives (identifiers, quoted
//! strings, keywords) over it.
//!
//! A `#` outside a quoted string ends the significant part of a line, so
//! [`Scanner::eol`] treats a trailing comment like the end of the line.
//! [`Scanner::consume_line`] and [`Scanner::current`] still see the raw text,
//! which is what help blocks need.

use super::errors::{ErrorContext, KconfigError};

/// Columns a tab advances to when measuring indentation.
const TAB_WIDTH: usize = 8;

/// Line/column pair, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Cursor over one logical line at a time
pub struct Scanner {
    file: String,
    current: String,
    /// Byte offset of the cursor in `current`
    col: usize,
    line: usize,
}

impl Scanner {
    /// Create a scanner for `file`, which is only used in diagnostics.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            current: String::new(),
            col: 0,
            line: 0,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Replace the current line with `text`, numbered `line`. Callers join
    /// continuation lines and expand macros before handing text over.
    pub fn load_line(&mut self, text: &str, line: usize) {
        self.current = text.trim_end_matches([' ', '\t', '\r']).to_string();
        self.col = 0;
        self.line = line;
    }

    /// The whole current line, regardless of cursor position
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Unconsumed remainder of the current line
    pub fn rest(&self) -> &str {
        &self.current[self.col..]
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.col + 1)
    }

    /// True at the end of the line or at the start of a trailing comment
    pub fn eol(&self) -> bool {
        let rest = self.rest();
        rest.is_empty() || rest.starts_with('#')
    }

    pub fn skip_spaces(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t']);
        self.col += rest.len() - trimmed.len();
    }

    /// Indentation of the current line in columns, tabs expanded to 8
    pub fn indent_level(&self) -> usize {
        indent_of(&self.current)
    }

    /// Take the raw remainder of the line, leaving the cursor at its end.
    pub fn consume_line(&mut self) -> String {
        let rest = self.rest().to_string();
        self.col = self.current.len();
        rest
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume `what` if the line continues with it, then skip spaces.
    pub fn try_consume(&mut self, what: &str) -> bool {
        if !self.rest().starts_with(what) {
            return false;
        }
        self.col += what.len();
        self.skip_spaces();
        true
    }

    /// Like [`Scanner::try_consume`] but only matches a whole word.
    pub fn try_keyword(&mut self, word: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(word) {
            return false;
        }
        if rest[word.len()..].chars().next().is_some_and(is_ident_char) {
            return false;
        }
        self.col += word.len();
        self.skip_spaces();
        true
    }

    pub fn must_consume(&mut self, what: &str) -> Result<(), KconfigError> {
        if self.try_consume(what) {
            Ok(())
        } else {
            Err(self.fail(format!("expected '{}'", what)))
        }
    }

    pub fn must_keyword(&mut self, word: &str) -> Result<(), KconfigError> {
        if self.try_keyword(word) {
            Ok(())
        } else {
            Err(self.fail(format!("expected '{}'", word)))
        }
    }

    /// Parse an identifier: letters, digits, `_` and `-`.
    pub fn ident(&mut self) -> Result<String, KconfigError> {
        let rest = self.rest();
        let len = rest
            .find(|ch: char| !is_ident_char(ch))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.fail("expected an identifier"));
        }
        let ident = rest[..len].to_string();
        self.col += len;
        self.skip_spaces();
        Ok(ident)
    }

    /// Parse a single- or double-quoted string, resolving `\` escapes.
    pub fn quoted_string(&mut self) -> Result<String, KconfigError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.fail("expected a quoted string")),
        };

        let mut text = String::new();
        let mut chars = self.rest().char_indices().skip(1);
        let mut end = None;
        while let Some((idx, ch)) = chars.next() {
            if ch == quote {
                end = Some(idx + ch.len_utf8());
                break;
            }
            if ch == '\\' {
                match chars.next() {
                    Some((_, escaped)) => text.push(escaped),
                    None => break,
                }
            } else {
                text.push(ch);
            }
        }

        match end {
            Some(len) => {
                self.col += len;
                self.skip_spaces();
                Ok(text)
            }
            None => Err(self.fail("unterminated string")),
        }
    }

    pub fn try_quoted_string(&mut self) -> Result<Option<String>, KconfigError> {
        match self.peek() {
            Some('"' | '\'') => self.quoted_string().map(Some),
            _ => Ok(None),
        }
    }

    /// Fail unless only whitespace or a comment is left on the line.
    pub fn expect_eol(&self) -> Result<(), KconfigError> {
        if self.eol() {
            Ok(())
        } else {
            Err(self.fail("trailing data at the end of line"))
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext {
            file: self.file.clone(),
            line: self.line,
            column: self.col + 1,
            source_line: self.current.clone(),
        }
    }

    /// Build a syntax error at the cursor.
    pub fn fail(&self, message: impl Into<String>) -> KconfigError {
        KconfigError::Syntax {
            ctx: self.context(),
            message: message.into(),
        }
    }
}

pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

pub(crate) fn indent_of(line: &str) -> usize {
    let mut level = 0;
    for ch in line.chars() {
        match ch {
            ' ' => level += 1,
            '\t' => level += TAB_WIDTH - level % TAB_WIDTH,
            _ => break,
        }
    }
    level
}

/// Drop up to `columns` columns of leading whitespace from `line`.
pub(crate) fn strip_indent(line: &str, columns: usize) -> &str {
    let mut level = 0;
    for (idx, ch) in line.char_indices() {
        if level >= columns {
            return &line[idx..];
        }
        match ch {
            ' ' => level += 1,
            '\t' => level += TAB_WIDTH - level % TAB_WIDTH,
            _ => return &line[idx..],
        }
    }
    ""
}
