//! Terminal menu browser built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]** - application state, keyboard event loop, menu navigation,
//!   value edits and saving
//! - **[`panes`]** - stateless render functions for each visible pane (menu,
//!   details, status bar)
//! - **[`theme`]** - centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a parsed
//! [`KConfigFile`] and a [`DotConfigFile`], then call [`App::run`] to start
//! the event loop.
//!
//! [`KConfigFile`]: crate::kconfig::KConfigFile
//! [`DotConfigFile`]: crate::dotconfig::DotConfigFile
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
