//! Detail pane for the selected entry

use super::utils::border_style;
use crate::dotconfig::DotConfigFile;
use crate::kconfig::{Expr, KConfigFile, MenuId, Tristate};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

/// Render the detail pane
pub fn render_detail_pane(
    frame: &mut Frame,
    area: Rect,
    kconf: &KConfigFile,
    config: &DotConfigFile,
    selected: Option<MenuId>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused))
        .padding(Padding::new(1, 1, 0, 0));

    let Some(id) = selected else {
        let paragraph = Paragraph::new("(nothing selected)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    };

    let lines = detail_lines(kconf, config, id);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let max_scroll = lines.len().saturating_sub(visible_height);
    *scroll_offset = (*scroll_offset).min(max_scroll);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((*scroll_offset as u16, 0));
    frame.render_widget(paragraph, area);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(
        format!("{:<13}", text),
        Style::default()
            .fg(DEFAULT_THEME.comment)
            .add_modifier(Modifier::BOLD),
    )
}

fn expr_line(name: &str, expr: Option<&Expr>) -> Option<Line<'static>> {
    expr.map(|expr| {
        Line::from(vec![
            label(name),
            Span::styled(expr.to_string(), Style::default().fg(DEFAULT_THEME.expression)),
        ])
    })
}

fn detail_lines(kconf: &KConfigFile, config: &DotConfigFile, id: MenuId) -> Vec<Line<'static>> {
    let menu = kconf.menu(id);
    let fg = Style::default().fg(DEFAULT_THEME.fg);
    let mut lines = Vec::new();

    if menu.is_config() {
        lines.push(Line::from(vec![
            label("Symbol"),
            Span::styled(
                format!("CONFIG_{}", menu.name),
                Style::default().fg(DEFAULT_THEME.symbol),
            ),
        ]));
        lines.push(Line::from(vec![
            label("Type"),
            Span::styled(menu.ty.to_string(), Style::default().fg(DEFAULT_THEME.type_name)),
        ]));
        let value = config.value(&menu.name);
        let value_style = match value.tristate() {
            Tristate::Module => Style::default().fg(DEFAULT_THEME.module),
            Tristate::Yes => Style::default().fg(DEFAULT_THEME.success),
            Tristate::No => fg,
        };
        lines.push(Line::from(vec![
            label("Value"),
            Span::styled(value.to_string(), value_style),
        ]));
    } else {
        lines.push(Line::from(vec![
            label("Kind"),
            Span::styled(menu.kind.as_str(), Style::default().fg(DEFAULT_THEME.menu)),
        ]));
    }

    if let Some(prompt) = &menu.prompt {
        lines.push(Line::from(vec![label("Prompt"), Span::styled(prompt.text.clone(), fg)]));
    }
    lines.push(Line::from(vec![
        label("Defined at"),
        Span::styled(menu.location(), fg),
    ]));
    lines.extend(expr_line("Depends on", menu.depends_on_expr()));
    lines.extend(expr_line("Visible if", menu.visible_if_expr()));

    for default in &menu.defaults {
        let mut text = default.value.to_string();
        if let Some(cond) = &default.condition {
            text.push_str(&format!(" if {}", cond));
        }
        lines.push(Line::from(vec![label("Default"), Span::styled(text, fg)]));
    }
    for select in &menu.selects {
        lines.push(Line::from(vec![
            label("Selects"),
            Span::styled(select.symbol.clone(), Style::default().fg(DEFAULT_THEME.symbol)),
        ]));
    }

    if menu.is_config() {
        let selectors: Vec<&str> = kconf
            .selected_by(&menu.name)
            .iter()
            .map(|&sel| kconf.menu(sel).name.as_str())
            .collect();
        if !selectors.is_empty() {
            lines.push(Line::from(vec![
                label("Selected by"),
                Span::styled(selectors.join(", "), Style::default().fg(DEFAULT_THEME.symbol)),
            ]));
        }
    }

    let deps = kconf.depends_on(id);
    if !deps.is_empty() {
        let names: Vec<&str> = deps.iter().map(String::as_str).collect();
        lines.push(Line::from(vec![
            label("Requires"),
            Span::styled(names.join(" "), Style::default().fg(DEFAULT_THEME.symbol)),
        ]));
    }

    if let Some(help) = &menu.help {
        lines.push(Line::from(""));
        for text in help.lines() {
            lines.push(Line::from(Span::styled(text.to_string(), fg)));
        }
    }

    lines
}
