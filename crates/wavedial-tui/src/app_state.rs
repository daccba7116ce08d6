//! ViewState: everything the presenter needs to draw one frame.
//!
//! The controller is the only writer; presenters read it.

use std::collections::VecDeque;

use crate::layout::Geometry;
use crate::widgets::scrollable_list::ScrollableList;

/// Log entries kept before eviction kicks in.
pub const LOG_MAX_ENTRIES: usize = 1000;
/// Oldest entries dropped once `LOG_MAX_ENTRIES` is exceeded.
pub const LOG_EVICT_ENTRIES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeGauge {
    pub percent: u16,
    pub visible: bool,
}

impl VolumeGauge {
    /// Zero hides the gauge; anything else shows it.
    pub fn set(&mut self, percent: u16) {
        self.percent = percent;
        self.visible = percent > 0;
    }

    pub fn hide(&mut self) {
        self.set(0);
    }
}

/// Bounded diagnostic log with a scroll-back position.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: VecDeque<String>,
    /// Rows scrolled back from the newest entry; 0 follows new output.
    pub scroll_back: usize,
}

impl DiagnosticLog {
    /// Append a line and jump back to the newest entry.
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push_back(line.into());
        if self.entries.len() > LOG_MAX_ENTRIES {
            self.entries.drain(..LOG_EVICT_ENTRIES);
        }
        self.scroll_back = 0;
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn page_up(&mut self, rows: usize) {
        self.scroll_back = (self.scroll_back + rows.max(1)).min(self.entries.len());
    }

    pub fn page_down(&mut self, rows: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(rows.max(1));
    }

    /// Entries that fit in `height` rows at the current scroll position.
    pub fn window(&self, height: usize) -> Vec<&str> {
        let end = self.entries.len().saturating_sub(self.scroll_back);
        let start = end.saturating_sub(height);
        self.entries
            .range(start..end)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    /// Station names with the keyboard cursor.
    pub stations: ScrollableList<String>,
    /// Row highlighted as playing.
    pub playing: Option<usize>,
    /// Current stream title; empty when unknown.
    pub now_playing: String,
    pub volume: VolumeGauge,
    pub log: DiagnosticLog,
    pub debug: bool,
    pub geometry: Geometry,
}

impl ViewState {
    pub fn new(rows: Vec<String>, debug: bool, size: (u16, u16)) -> Self {
        Self {
            stations: ScrollableList::new(rows),
            playing: None,
            now_playing: String::new(),
            volume: VolumeGauge::default(),
            log: DiagnosticLog::default(),
            debug,
            geometry: Geometry::compute(size.0, size.1, debug),
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.geometry = Geometry::compute(width, height, self.debug);
        self.stations.ensure_visible(self.geometry.station_rows());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_visibility() {
        let mut gauge = VolumeGauge::default();
        gauge.set(42);
        assert!(gauge.visible);
        gauge.set(0);
        assert!(!gauge.visible);
        gauge.set(1);
        gauge.hide();
        assert_eq!(gauge, VolumeGauge::default());
    }

    #[test]
    fn test_log_evicts_oldest_half() {
        let mut log = DiagnosticLog::default();
        for i in 0..=LOG_MAX_ENTRIES {
            log.push(format!("line {}", i));
        }
        assert_eq!(log.len(), LOG_MAX_ENTRIES + 1 - LOG_EVICT_ENTRIES);
        assert_eq!(log.iter().next(), Some("line 500"));
        assert_eq!(log.last(), Some("line 1000"));
    }

    #[test]
    fn test_log_window_and_scroll() {
        let mut log = DiagnosticLog::default();
        for i in 0..10 {
            log.push(i.to_string());
        }
        assert_eq!(log.window(3), vec!["7", "8", "9"]);
        log.page_up(3);
        assert_eq!(log.window(3), vec!["4", "5", "6"]);
        log.page_up(100);
        assert!(log.window(3).is_empty());
        log.page_down(100);
        assert_eq!(log.window(20).len(), 10);
    }

    #[test]
    fn test_new_entry_follows_bottom() {
        let mut log = DiagnosticLog::default();
        for i in 0..10 {
            log.push(i.to_string());
        }
        log.page_up(3);
        log.push("10");
        assert_eq!(log.scroll_back, 0);
        assert_eq!(log.window(3), vec!["8", "9", "10"]);
    }
}
