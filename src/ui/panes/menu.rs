//! Menu pane: the entries of the open menu, menuconfig style
//!
//! Entries whose dependencies are not met under the current `.config` are
//! drawn dimmed. Submenus end in `--->`.

use super::utils::{border_style, follow_selection, value_marker};
use crate::dotconfig::DotConfigFile;
use crate::kconfig::{KConfigFile, MenuId, MenuKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Render the menu pane
#[allow(clippy::too_many_arguments)]
pub fn render_menu_pane(
    frame: &mut Frame,
    area: Rect,
    kconf: &KConfigFile,
    config: &DotConfigFile,
    title: &str,
    entries: &[MenuId],
    selected: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if entries.is_empty() {
        let paragraph = Paragraph::new("(empty menu)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    follow_selection(scroll_offset, selected, visible_height);

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|(idx, &id)| menu_line(kconf, config, id, idx == selected))
        .collect();

    let list = List::new(items).block(block.padding(Padding::new(1, 0, 0, 0)));
    frame.render_widget(list, area);
}

fn menu_line<'a>(
    kconf: &'a KConfigFile,
    config: &DotConfigFile,
    id: MenuId,
    is_selected: bool,
) -> ListItem<'a> {
    let menu = kconf.menu(id);
    let available = kconf.is_visible(id, config);

    let base = if !available {
        Style::default().fg(DEFAULT_THEME.comment)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    };
    let base = if is_selected {
        base.bg(DEFAULT_THEME.current_line_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        base
    };

    let mut spans = Vec::new();
    let marker = value_marker(menu, config);
    if !marker.is_empty() {
        spans.push(Span::styled(format!("{} ", marker), base));
    }

    match menu.kind {
        MenuKind::Comment => {
            spans.push(Span::styled(
                format!("*** {} ***", menu.title()),
                base.fg(DEFAULT_THEME.comment),
            ));
        }
        MenuKind::Menu | MenuKind::Choice => {
            let style = if available {
                base.fg(DEFAULT_THEME.menu)
            } else {
                base
            };
            spans.push(Span::styled(format!("{}  --->", menu.title()), style));
        }
        MenuKind::MenuConfig if !kconf.children(id).is_empty() => {
            spans.push(Span::styled(format!("{}  --->", menu.title()), base));
        }
        _ => {
            spans.push(Span::styled(menu.title().to_string(), base));
        }
    }

    if menu.is_config() && menu.prompt.is_none() {
        spans.push(Span::styled(" (no prompt)", base.fg(DEFAULT_THEME.comment)));
    }

    ListItem::new(Line::from(spans)).style(base)
}
