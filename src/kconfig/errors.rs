//! Error types for macro expansion and Kconfig parsing
//!
//! Every error that can be attributed to a source position carries an
//! [`ErrorContext`] so the caller can show file, line, column and the
//! offending line in one message. Parsing short-circuits on the first
//! error; a tree is never returned alongside an error.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Position of an error inside a (preprocessed) source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub source_line: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Failure reported by a macro handler such as `$(shell,...)`
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Subprocess {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("{0}")]
    Failed(String),
}

/// Errors raised while expanding `$(...)` references and `:=` assignments
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("{ctx}: unknown substitution `{key}`\n{}", .ctx.source_line)]
    UnknownSubstitution { ctx: ErrorContext, key: String },

    #[error("{ctx}: unknown macro handler `{name}`\n{}", .ctx.source_line)]
    UnknownHandler { ctx: ErrorContext, name: String },

    #[error("{ctx}: {name}: {source}\n{}", .ctx.source_line)]
    Handler {
        ctx: ErrorContext,
        name: String,
        #[source]
        source: HandlerError,
    },

    #[error("{ctx}: unterminated substitution\n{}", .ctx.source_line)]
    Unterminated { ctx: ErrorContext },

    #[error("{ctx}: assignment without a variable name\n{}", .ctx.source_line)]
    InvalidAssignment { ctx: ErrorContext },
}

/// Errors raised while reading and parsing a Kconfig tree
#[derive(Debug, Error)]
pub enum KconfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("{ctx}: {message}\n{}", .ctx.source_line)]
    Syntax { ctx: ErrorContext, message: String },

    #[error("{source}\nincluded from {ctx}")]
    Include {
        ctx: ErrorContext,
        #[source]
        source: Box<KconfigError>,
    },

    #[error("no mainmenu in {}", .file.display())]
    MissingMainMenu { file: PathBuf },

    #[error("config {name} declared twice ({first} and {second})")]
    DuplicateConfig {
        name: String,
        first: String,
        second: String,
    },
}

impl KconfigError {
    /// Innermost error of a chain of `source` inclusions.
    pub fn root_cause(&self) -> &KconfigError {
        match self {
            KconfigError::Include { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
