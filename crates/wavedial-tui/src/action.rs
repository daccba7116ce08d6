//! Normalized input events the controller reacts to.
//!
//! The presenter turns raw terminal events into these; the controller never
//! sees crossterm types.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    // ── Playback ─────────────────────────────────────────────────────────────
    Confirm,
    Stop,
    Refresh,
    Pause,
    Mute,
    VolumeUp,
    VolumeDown,

    // ── Navigation ───────────────────────────────────────────────────────────
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    LogUp,
    LogDown,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Key(Key),
    Resize(u16, u16),
}

/// One-line key help shown in the footer.
pub const HELP_FOOTER: &str = "k/↑ : Up | j/↓: Down | Enter: Select | p: Pause | m: Mute | s: Stop | +: Louder | -: Quieter | R: Refresh | q: Quit";

pub fn key_from_event(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Key::Quit),
            _ => None,
        };
    }

    let mapped = match key.code {
        KeyCode::Enter => Key::Confirm,
        KeyCode::Char('s') => Key::Stop,
        KeyCode::Char('R') => Key::Refresh,
        KeyCode::Char('p') => Key::Pause,
        KeyCode::Char('m') => Key::Mute,
        KeyCode::Char('+') | KeyCode::Char('=') => Key::VolumeUp,
        KeyCode::Char('-') => Key::VolumeDown,
        KeyCode::Char('k') | KeyCode::Up => Key::Up,
        KeyCode::Char('j') | KeyCode::Down => Key::Down,
        KeyCode::Char('K') | KeyCode::PageUp => Key::PageUp,
        KeyCode::Char('J') | KeyCode::PageDown => Key::PageDown,
        KeyCode::Char('g') | KeyCode::Home => Key::Top,
        KeyCode::Char('G') | KeyCode::End => Key::Bottom,
        KeyCode::Char('h') | KeyCode::Left => Key::LogUp,
        KeyCode::Char('l') | KeyCode::Right => Key::LogDown,
        KeyCode::Char('q') | KeyCode::Esc => Key::Quit,
        _ => return None,
    };
    Some(mapped)
}

pub fn ui_event_from(event: Event) -> Option<UiEvent> {
    match event {
        Event::Key(key) => key_from_event(key).map(UiEvent::Key),
        Event::Resize(w, h) => Some(UiEvent::Resize(w, h)),
        _ => None,
    }
}
