//! Color palette and style constants for the terminal presenter.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT)
}

pub fn style_playing() -> Style {
    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
}

pub fn style_selected() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
