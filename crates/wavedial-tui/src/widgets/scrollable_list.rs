//! Scrollable list cursor: selection plus the first visible row.

#[derive(Debug, Clone)]
pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }
}

impl<T> ScrollableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut list = Self::default();
        list.set_items(items);
        list
    }

    /// Replace the items, keeping the cursor in range.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    pub fn select_up(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len().saturating_sub(1));
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    /// Returns (index, &item) pairs visible in `height` rows.
    /// Call ensure_visible first to update scroll_offset.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        if height == 0 || self.items.is_empty() {
            return Vec::new();
        }
        let start = self.scroll_offset.min(self.items.len());
        let end = (start + height).min(self.items.len());
        self.items[start..end]
            .iter()
            .enumerate()
            .map(|(i, item)| (start + i, item))
            .collect()
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected.saturating_sub(height - 1);
        }
    }
}
