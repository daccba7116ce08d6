//! Terminal presenter: draws `ViewState` and turns terminal events into
//! `UiEvent`s.

use std::io::{self, Stdout};
use std::time::Duration;

use ratatui::crossterm::{
    event, execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::action::{self, UiEvent, HELP_FOOTER};
use crate::app_state::ViewState;
use crate::controller::Presenter;
use crate::theme::{
    style_accent, style_border, style_default, style_muted, style_playing, style_secondary,
    style_selected,
};
use crate::widgets::volume::draw_volume;

const INPUT_POLL: Duration = Duration::from_millis(100);

pub struct TerminalPresenter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalPresenter {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        debug!("ui: terminal entered");
        Ok(Self { terminal })
    }

    /// Give the terminal back.  Safe to call more than once.
    pub fn restore(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn size() -> anyhow::Result<(u16, u16)> {
        Ok(terminal::size()?)
    }
}

impl Presenter for TerminalPresenter {
    fn draw(&mut self, view: &ViewState) -> anyhow::Result<()> {
        self.terminal.draw(|frame| render(frame, view))?;
        Ok(())
    }
}

/// Forward terminal input until the receiver goes away.
pub fn spawn_input_reader(tx: mpsc::UnboundedSender<UiEvent>) {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!("ui: input poll failed: {}", e);
                    break;
                }
            }
            match event::read() {
                Ok(ev) => {
                    if let Some(evt) = action::ui_event_from(ev) {
                        if tx.send(evt).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    debug!("ui: input read failed: {}", e);
                    break;
                }
            }
        }
        debug!("ui: input reader stopped");
    });
}

// ── rendering ─────────────────────────────────────────────────────────────────

pub fn render(frame: &mut Frame, view: &ViewState) {
    let g = &view.geometry;

    draw_now_playing(frame, view);
    draw_volume(frame, g.volume, &view.volume);
    draw_stations(frame, view);
    if let Some(area) = g.log {
        draw_log(frame, area, view);
    }

    let footer = Paragraph::new(Line::from(Span::styled(HELP_FOOTER, style_muted())));
    frame.render_widget(footer, g.footer);
}

fn draw_now_playing(frame: &mut Frame, view: &ViewState) {
    let area = view.geometry.now_playing;
    let label = "Currently playing: ";
    let max = (area.width as usize).saturating_sub(label.width());
    let line = Line::from(vec![
        Span::styled(label, style_secondary()),
        Span::styled(truncate(&view.now_playing, max), style_accent()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_stations(frame: &mut Frame, view: &ViewState) {
    let area = view.geometry.stations;
    let rows = view.geometry.station_rows();
    let inner_width = (area.width as usize).saturating_sub(4);

    let items: Vec<ListItem> = view
        .stations
        .visible_items(rows)
        .into_iter()
        .map(|(idx, name)| {
            let playing = view.playing == Some(idx);
            let marker = if playing { "▶ " } else { "  " };
            let mut style = if playing {
                style_playing()
            } else {
                style_default()
            };
            if idx == view.stations.selected {
                style = style_selected().patch(if playing {
                    style_playing()
                } else {
                    style_default()
                });
            }
            ListItem::new(Line::from(format!("{}{}", marker, truncate(name, inner_width))))
                .style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_border())
        .title(Span::styled(" Stations ", style_secondary()));
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_log(frame: &mut Frame, area: ratatui::layout::Rect, view: &ViewState) {
    let rows = view.geometry.log_rows();
    let inner_width = (area.width as usize).saturating_sub(2);
    let lines: Vec<Line> = view
        .log
        .window(rows)
        .into_iter()
        .map(|l| Line::from(Span::styled(truncate(l, inner_width), style_secondary())))
        .collect();

    let title = if view.log.scroll_back > 0 {
        format!(" Log (-{}) ", view.log.scroll_back)
    } else {
        " Log ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_border())
        .title(Span::styled(title, style_secondary()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Cut `s` to at most `max` display columns.
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}
