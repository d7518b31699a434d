//! Main TUI application state and logic

use crate::dotconfig::{ConfigValue, DotConfigFile};
use crate::kconfig::{ConfigType, KConfigFile, MenuId, MenuKind, Tristate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Menu,
    Detail,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Menu => FocusedPane::Detail,
            FocusedPane::Detail => FocusedPane::Menu,
        }
    }
}

/// Entries listed for menu `id`: its children, with `if` blocks flattened
/// into their parent.
pub fn menu_entries(kconf: &KConfigFile, id: MenuId) -> Vec<MenuId> {
    let mut entries = Vec::new();
    for &child in kconf.children(id) {
        if kconf.menu(child).kind == MenuKind::If {
            entries.extend(menu_entries(kconf, child));
        } else {
            entries.push(child);
        }
    }
    entries
}

/// The main application state
pub struct App {
    pub kconf: KConfigFile,
    pub config: DotConfigFile,

    /// Where `s` writes the `.config`
    pub config_path: PathBuf,

    pub focused_pane: FocusedPane,

    /// Menu whose entries are listed
    pub current: MenuId,

    /// Menus above `current`, with the selection to restore on the way back
    pub history: Vec<(MenuId, usize)>,

    pub entries: Vec<MenuId>,
    pub selected: usize,

    pub menu_scroll: usize,
    pub detail_scroll: usize,

    /// Unsaved changes
    pub dirty: bool,

    pub should_quit: bool,
    pub status_message: String,
    /// The status message reports a failure
    pub status_is_error: bool,
}

impl App {
    pub fn new(kconf: KConfigFile, config: DotConfigFile, config_path: PathBuf) -> Self {
        let current = kconf.root();
        let entries = menu_entries(&kconf, current);
        App {
            kconf,
            config,
            config_path,
            focused_pane: FocusedPane::Menu,
            current,
            history: Vec::new(),
            entries,
            selected: 0,
            menu_scroll: 0,
            detail_scroll: 0,
            dirty: false,
            should_quit: false,
            status_message: String::from("Ready!"),
            status_is_error: false,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.status_is_error = false;
    }

    pub fn selected_id(&self) -> Option<MenuId> {
        self.entries.get(self.selected).copied()
    }

    /// Titles of the open menus, root first
    pub fn breadcrumb(&self) -> String {
        self.history
            .iter()
            .map(|&(id, _)| id)
            .chain(std::iter::once(self.current))
            .map(|id| self.kconf.menu(id).title())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        super::panes::render_menu_pane(
            frame,
            columns[0],
            &self.kconf,
            &self.config,
            self.kconf.menu(self.current).title(),
            &self.entries,
            self.selected,
            self.focused_pane == FocusedPane::Menu,
            &mut self.menu_scroll,
        );

        super::panes::render_detail_pane(
            frame,
            columns[1],
            &self.kconf,
            &self.config,
            self.selected_id(),
            self.focused_pane == FocusedPane::Detail,
            &mut self.detail_scroll,
        );

        let location = self.breadcrumb();
        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.status_is_error,
            &location,
            self.dirty,
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Menu => {
                    if self.selected > 0 {
                        self.selected -= 1;
                        self.detail_scroll = 0;
                    }
                }
                FocusedPane::Detail => {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Menu => {
                    if self.selected + 1 < self.entries.len() {
                        self.selected += 1;
                        self.detail_scroll = 0;
                    }
                }
                FocusedPane::Detail => {
                    self.detail_scroll = self.detail_scroll.saturating_add(1);
                }
            },
            KeyCode::Enter => self.descend(),
            KeyCode::Backspace | KeyCode::Esc => self.ascend(),
            KeyCode::Char('y') => self.set_selected(Tristate::Yes),
            KeyCode::Char('m') => self.set_selected(Tristate::Module),
            KeyCode::Char('n') => self.set_selected(Tristate::No),
            KeyCode::Char(' ') => self.cycle_selected(),
            KeyCode::Char('s') => self.save(),
            _ => {}
        }
    }

    fn descend(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let menu = self.kconf.menu(id);
        let opens = matches!(menu.kind, MenuKind::Menu | MenuKind::Choice | MenuKind::MenuConfig);
        let entries = menu_entries(&self.kconf, id);
        if !opens || entries.is_empty() {
            let message = format!("{} has no submenu", menu.title());
            self.set_status(message);
            return;
        }

        self.history.push((self.current, self.selected));
        self.current = id;
        self.entries = entries;
        self.selected = 0;
        self.menu_scroll = 0;
        self.detail_scroll = 0;
        let message = format!("Opened {}", self.kconf.menu(id).title());
        self.set_status(message);
    }

    fn ascend(&mut self) {
        let Some((parent, selected)) = self.history.pop() else {
            self.set_status("Already at the top");
            return;
        };
        self.current = parent;
        self.entries = menu_entries(&self.kconf, parent);
        self.selected = selected.min(self.entries.len().saturating_sub(1));
        self.detail_scroll = 0;
        let message = format!("Back to {}", self.kconf.menu(parent).title());
        self.set_status(message);
    }

    /// Set the selected bool/tristate option, capped by what its
    /// dependencies allow.
    fn set_selected(&mut self, value: Tristate) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let menu = self.kconf.menu(id);
        if !menu.is_config() {
            return;
        }
        let name = menu.name.clone();
        let ty = menu.ty;

        match ty {
            ConfigType::Bool if value == Tristate::Module => {
                self.set_status(format!("{} is a bool option", name));
                return;
            }
            ConfigType::Bool | ConfigType::Tristate => {}
            _ => {
                self.set_status(format!("{} is a {} option; edit it in the .config", name, ty));
                return;
            }
        }

        let limit = self.kconf.availability(id, &self.config);
        let value = if value > limit {
            if limit == Tristate::No {
                self.set_status(format!("{} is not available", name));
                return;
            }
            self.set_status(format!("{} limited to '{}' by its dependencies", name, limit));
            limit
        } else {
            self.set_status(format!("{} set to '{}'", name, value));
            value
        };

        log::debug!("setting {} to {}", name, value);
        self.config.set(name, ConfigValue::from(value));
        self.dirty = true;
    }

    /// Space: n -> m -> y -> n for tristates, n <-> y for bools
    fn cycle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let menu = self.kconf.menu(id);
        let current = self.config.value(&menu.name).tristate();
        let next = match (menu.ty, current) {
            (ConfigType::Tristate, Tristate::No) => Tristate::Module,
            (_, Tristate::No) => Tristate::Yes,
            (ConfigType::Tristate, Tristate::Module) => Tristate::Yes,
            _ => Tristate::No,
        };
        self.set_selected(next);
    }

    fn save(&mut self) {
        match self.config.write_to(&self.config_path) {
            Ok(()) => {
                self.dirty = false;
                self.set_status(format!("Saved {}", self.config_path.display()));
            }
            Err(err) => {
                log::debug!("save failed: {}", err);
                self.status_message = err.to_string();
                self.status_is_error = true;
            }
        }
    }
}
