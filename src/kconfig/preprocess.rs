//! Macro preprocessor
//!
//! Expands raw Kconfig text before the grammar parser sees it. The parser
//! expands one logical line at a time with [`Preprocessor::expand_line`], so
//! bindings made while parsing an included file are visible to the lines
//! that follow the `source`; [`Preprocessor::process`] expands a whole text.
//!
//!
//! - `$(NAME)` expands to the environment binding `NAME`.
//! - `$(handler,arg,...)` dispatches to a registered [`MacroHandler`].
//! - `NAME := VALUE` binds `NAME` in the environment; the line itself is
//!   removed from the output.
//! - `#` outside a substitution starts a comment: the rest of the line is
//!   copied through without expansion.
//! - a trailing `\` joins the next line.
//!
//! Substitutions nest (`$(FOO_$(ARCH))`). Lines removed by joining or by an
//! assignment are replaced with blank lines so that line numbers in the
//! output match the input.
//!
//! [`MacroHandler`]: super::handlers::MacroHandler

use super::env::KeyValueMap;
use super::errors::{ErrorContext, PreprocessError};
use super::handlers::{HandlerTable, MacroContext};

/// Derived-path bindings evaluated once against a seeded `UK_BASE`.
pub const UK_PREAMBLE: &str = "\
UK_ARCH_DIR := $(UK_BASE)/arch
UK_PLAT_DIR := $(UK_BASE)/plat
UK_LIB_DIR := $(UK_BASE)/lib
UK_DRIVERS_DIR := $(UK_BASE)/drivers
UK_SUPPORT_DIR := $(UK_BASE)/support
KCONFIG_DIR := $(UK_SUPPORT_DIR)/kconfig
";

/// A line after joining `\` continuations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the first physical line
    pub line: usize,
    /// Physical lines joined into this one
    pub physical: usize,
    pub text: String,
}

/// Iterator over the [`LogicalLine`]s of a text
pub struct LogicalLines<'a> {
    physical: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> LogicalLines<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            physical: data.lines(),
            line_no: 0,
        }
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        let first = self.physical.next()?;
        self.line_no += 1;
        let start = self.line_no;

        let mut text = String::new();
        let mut line = first.trim_end_matches('\r');
        while let Some(head) = line.strip_suffix('\\') {
            text.push_str(head);
            match self.physical.next() {
                Some(next) => {
                    self.line_no += 1;
                    line = next.trim_end_matches('\r');
                }
                None => {
                    line = "";
                    break;
                }
            }
        }
        text.push_str(line);

        Some(LogicalLine {
            line: start,
            physical: self.line_no - start + 1,
            text,
        })
    }
}

/// One open `$(` and the text captured inside it so far
struct Frame {
    text: String,
    /// Unmatched plain `(` inside this substitution
    parens: usize,
    column: usize,
}

pub struct Preprocessor<'h> {
    handlers: &'h HandlerTable,
}

impl<'h> Preprocessor<'h> {
    pub fn new(handlers: &'h HandlerTable) -> Self {
        Self { handlers }
    }

    /// Seed `env` with the [`UK_PREAMBLE`] bindings.
    ///
    /// Returns `Ok(false)` without touching `env` when `UK_BASE` is unbound.
    pub fn seed_preamble(&self, env: &mut KeyValueMap) -> Result<bool, PreprocessError> {
        if !env.contains_key("UK_BASE") {
            log::debug!("UK_BASE is not bound, skipping path preamble");
            return Ok(false);
        }
        self.process(UK_PREAMBLE, "<preamble>", env)?;
        Ok(true)
    }

    /// Expand `data` read from `file`, updating `env` with any assignments.
    pub fn process(
        &self,
        data: &str,
        file: &str,
        env: &mut KeyValueMap,
    ) -> Result<String, PreprocessError> {
        let mut output = String::with_capacity(data.len());

        for logical in LogicalLines::new(data) {
            if let Some(expanded) = self.expand_line(&logical.text, file, logical.line, env)? {
                output.push_str(&expanded);
            }
            for _ in 0..logical.physical {
                output.push('\n');
            }
        }

        Ok(output)
    }

    /// Expand one logical line. `None` means the line was an assignment.
    pub fn expand_line(
        &self,
        line: &str,
        file: &str,
        line_no: usize,
        env: &mut KeyValueMap,
    ) -> Result<Option<String>, PreprocessError> {
        let ctx = |column: usize| ErrorContext {
            file: file.to_string(),
            line: line_no,
            column,
            source_line: line.to_string(),
        };

        let mut out = String::with_capacity(line.len());
        let mut frames: Vec<Frame> = Vec::new();
        let mut comment = false;
        let mut assignment_at: Option<usize> = None;

        let mut chars = line.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if comment {
                out.push(ch);
                continue;
            }

            if ch == '$' && chars.peek().map(|&(_, next)| next) == Some('(') {
                chars.next();
                frames.push(Frame {
                    text: String::new(),
                    parens: 0,
                    column: idx + 1,
                });
                continue;
            }

            if let Some(frame) = frames.last_mut() {
                match ch {
                    '(' => {
                        frame.parens += 1;
                        frame.text.push(ch);
                    }
                    ')' if frame.parens > 0 => {
                        frame.parens -= 1;
                        frame.text.push(ch);
                    }
                    ')' => {
                        let closed = frames.pop().map(|f| (f.text, f.column));
                        if let Some((text, column)) = closed {
                            let value = self.evaluate(&text, file, line_no, env, || ctx(column))?;
                            match frames.last_mut() {
                                Some(outer) => outer.text.push_str(&value),
                                None => out.push_str(&value),
                            }
                        }
                    }
                    _ => frame.text.push(ch),
                }
                continue;
            }

            match ch {
                '#' => {
                    comment = true;
                    out.push(ch);
                }
                ':' if chars.peek().map(|&(_, next)| next) == Some('=') => {
                    chars.next();
                    assignment_at = Some(out.len());
                    out.push_str(":=");
                }
                _ => out.push(ch),
            }
        }

        if let Some(open) = frames.first() {
            return Err(PreprocessError::Unterminated {
                ctx: ctx(open.column),
            });
        }

        let Some(at) = assignment_at else {
            return Ok(Some(out));
        };

        let name = out[..at].trim();
        if name.is_empty() {
            return Err(PreprocessError::InvalidAssignment { ctx: ctx(at + 1) });
        }
        let value = out[at + 2..].trim();
        log::debug!("{}:{}: {} := {}", file, line_no, name, value);
        env.insert(name, value);
        Ok(None)
    }

    /// Resolve the text captured between `$(` and `)`.
    fn evaluate(
        &self,
        text: &str,
        file: &str,
        line_no: usize,
        env: &KeyValueMap,
        ctx: impl Fn() -> ErrorContext,
    ) -> Result<String, PreprocessError> {
        let macro_ctx = MacroContext {
            file,
            line: line_no,
        };

        if !text.contains(',') {
            let key = text.trim();
            if let Some(value) = env.get(key) {
                return Ok(value.to_string());
            }
            return match self.handlers.get(key) {
                Some(handler) => handler
                    .expand(&macro_ctx, &[])
                    .map_err(|source| PreprocessError::Handler {
                        ctx: ctx(),
                        name: key.to_string(),
                        source,
                    }),
                None => Err(PreprocessError::UnknownSubstitution {
                    ctx: ctx(),
                    key: key.to_string(),
                }),
            };
        }

        let mut parts = text.split(',');
        let name = parts.next().unwrap_or_default().trim();
        let args: Vec<&str> = parts.collect();

        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| PreprocessError::UnknownHandler {
                ctx: ctx(),
                name: name.to_string(),
            })?;

        handler
            .expand(&macro_ctx, &args)
            .map_err(|source| PreprocessError::Handler {
                ctx: ctx(),
                name: name.to_string(),
                source,
            })
    }
}
