//! # Introduction
//!
//! ukconfig reads the Kconfig option trees of a unikernel build and the
//! `.config` files they produce. The option tree can be browsed and edited
//! through a terminal UI built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! Kconfig → Preprocessor → Scanner → Parser → KConfigFile ─┐
//!                                                          ├→ TUI
//! .config ──────────────────────────────→ DotConfigFile ───┘
//! ```
//!
//! 1. [`kconfig`] - expands `$(...)` macros and `:=` assignments, parses the
//!    grammar into an arena of menu nodes, propagates `depends on` and
//!    `visible if` down the tree, and resolves transitive dependencies.
//! 2. [`dotconfig`] - parses, edits and serializes `.config` files, keeping
//!    comments in place.
//! 3. [`ui`] - ratatui-based menu browser; not part of the stable library
//!    API.
//!
//! ## Example
//!
//! ```
//! use ukconfig::kconfig::{parse_str, KeyValueMap};
//!
//! let kconf = parse_str(
//!     "mainmenu \"Test\"\nconfig A\n\tbool \"A\"\nconfig B\n\tbool \"B\"\n\tdepends on A\n",
//!     "Config.uk",
//!     KeyValueMap::new(),
//! )
//! .unwrap();
//! assert!(kconf.depends_on_symbol("B").unwrap().contains("A"));
//! ```

pub mod dotconfig;
pub mod kconfig;
pub mod ui;
