//! Screen geometry, recomputed on every resize.
//!
//! ```text
//!  ┌ now playing ─────────────────────────────┬ volume ┐   row 0
//!  │ stations                │ log (debug only)         │
//!  │                         │                          │
//!  └ footer ───────────────────────────────────────────┘   last row
//! ```

use ratatui::layout::{Constraint, Direction, Layout, Rect};

const VOLUME_WIDTH: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub area: Rect,
    pub now_playing: Rect,
    pub volume: Rect,
    pub stations: Rect,
    pub log: Option<Rect>,
    pub footer: Rect,
}

impl Geometry {
    pub fn compute(width: u16, height: u16, debug: bool) -> Self {
        let area = Rect::new(0, 0, width, height);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(VOLUME_WIDTH)])
            .split(rows[0]);

        let (stations, log) = if debug {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[1]);
            (body[0], Some(body[1]))
        } else {
            (rows[1], None)
        };

        Self {
            area,
            now_playing: header[0],
            volume: header[1],
            stations,
            log,
            footer: rows[2],
        }
    }

    /// Station rows that fit inside the bordered list pane.
    pub fn station_rows(&self) -> usize {
        self.stations.height.saturating_sub(2) as usize
    }

    /// Log rows that fit inside the bordered log pane (0 when hidden).
    pub fn log_rows(&self) -> usize {
        self.log
            .map(|r| r.height.saturating_sub(2) as usize)
            .unwrap_or(0)
    }
}
