//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`menu`]: Entries of the open menu with their current values
//! - [`detail`]: Type, conditions, dependencies and help of the selection
//! - [`status`]: Status bar with keybindings and save state
//! - `utils`: Shared helpers (border styles, value markers, scrolling)
//!
//! Each pane module exports a `render_*` function taking the data it draws
//! and its own scroll state.

mod utils;

pub mod detail;
pub mod menu;
pub mod status;

pub use detail::render_detail_pane;
pub use menu::render_menu_pane;
pub use status::render_status_bar;
