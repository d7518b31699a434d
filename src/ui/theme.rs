use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub menu: Color,      // Submenus and choices
    pub symbol: Color,    // Config symbol names
    pub type_name: Color, // Cyan for option types
    pub module: Color,    // Tristate `m`
    pub expression: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),   // Blue
    secondary: Color::Rgb(250, 179, 135), // Orange
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175), // Yellow border for focus
    border_normal: Color::Rgb(108, 112, 134),  // Grey border for normal
    current_line_bg: Color::Rgb(50, 50, 70),   // Slightly lighter BG for the selection
    menu: Color::Rgb(249, 226, 175),           // Yellow for submenus
    symbol: Color::Rgb(137, 180, 250),         // Blue for symbol names
    type_name: Color::Rgb(148, 226, 213),      // Cyan/teal for type names
    module: Color::Rgb(245, 194, 231),         // Pink for modules
    expression: Color::Rgb(250, 179, 135),     // Orange for conditions
};
