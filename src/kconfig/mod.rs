//! Kconfig front-end
//!
//! Raw text goes through the [`Preprocessor`] and then the [`Parser`],
//! which builds a [`KConfigFile`] arena of [`KConfigMenu`] nodes.

pub mod deps;
pub mod env;
pub mod errors;
pub mod expr;
pub mod expressions;
pub mod handlers;
pub mod menu;
pub mod parser;
pub mod preprocess;
pub mod scanner;

pub use env::{KeyValue, KeyValueMap};
pub use errors::{ErrorContext, HandlerError, KconfigError, PreprocessError};
pub use expr::{expr_and, CompareOp, Expr, Literal, SymbolLookup, Tristate};
pub use handlers::{HandlerTable, MacroContext, MacroHandler, ShellHandler};
pub use menu::{
    ConfigType, DefaultValue, KConfigFile, KConfigMenu, MenuId, MenuKind, Prompt, Range,
    ReverseDependency,
};
pub use parser::{DuplicatePolicy, MissingMainMenu, ParseOptions, Parser};
pub use preprocess::Preprocessor;
pub use scanner::{Scanner, SourceLocation};

use std::path::Path;

/// Parse `path` with the built-in handlers and default options.
pub fn parse_file(path: impl AsRef<Path>, env: KeyValueMap) -> Result<KConfigFile, KconfigError> {
    Parser::new(env).parse_file(path)
}

/// Parse `data` as if read from `path`.
pub fn parse_str(
    data: &str,
    path: impl AsRef<Path>,
    env: KeyValueMap,
) -> Result<KConfigFile, KconfigError> {
    Parser::new(env).parse_str(data, path)
}
