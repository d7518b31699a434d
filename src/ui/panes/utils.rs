//! Shared helpers for pane rendering

use crate::dotconfig::{ConfigValue, DotConfigFile};
use crate::kconfig::{ConfigType, KConfigMenu, MenuKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::style::{Modifier, Style};

pub(super) fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Value column of a menu line, menuconfig style: `[*]`, `<M>`, `(42)`
pub(super) fn value_marker(menu: &KConfigMenu, config: &DotConfigFile) -> String {
    if !menu.is_config() {
        return match menu.kind {
            MenuKind::Choice => "   ".to_string(),
            _ => String::new(),
        };
    }

    let value = config.value(&menu.name);
    match menu.ty {
        ConfigType::Bool => match value {
            ConfigValue::Yes => "[*]".to_string(),
            _ => "[ ]".to_string(),
        },
        ConfigType::Tristate => match value {
            ConfigValue::Yes => "<*>".to_string(),
            ConfigValue::Module => "<M>".to_string(),
            _ => "< >".to_string(),
        },
        ConfigType::String | ConfigType::Int | ConfigType::Hex => {
            format!("({})", value.text().unwrap_or_default())
        }
        ConfigType::Unknown => "   ".to_string(),
    }
}

/// Clamp `scroll` so that `selected` stays inside a window of `height` rows.
pub(super) fn follow_selection(scroll: &mut usize, selected: usize, height: usize) {
    if selected < *scroll {
        *scroll = selected;
    } else if selected >= *scroll + height {
        *scroll = selected + 1 - height;
    }
}
