/// Scrollback geometry reported by the engine, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scrollbar {
    pub total: u64,
    pub offset: u64,
    pub len: u64,
}

/// Keeps a native scroll container in step with the engine's scrollback.
///
/// While a user scroll gesture is live the container is authoritative and
/// the engine is told which row is on top; otherwise engine updates move
/// the container.
#[derive(Debug, Clone, Default)]
pub struct ScrollSync {
    scrollbar: Option<Scrollbar>,
    cell_height: f64,
    content_height: f64,
    document_height: f64,
    scroll_offset_y: f64,
    live: bool,
    last_sent_row: Option<i64>,
}

impl ScrollSync {
    pub fn document_height(&self) -> f64 {
        self.document_height
    }

    /// Container offset, measured from the bottom of the document.
    pub fn scroll_offset_y(&self) -> f64 {
        self.scroll_offset_y
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn last_sent_row(&self) -> Option<i64> {
        self.last_sent_row
    }

    pub fn scrollbar(&self) -> Option<Scrollbar> {
        self.scrollbar
    }

    pub fn update_scrollbar(&mut self, scrollbar: Scrollbar) {
        self.scrollbar = Some(scrollbar);
        self.synchronize();
    }

    pub fn update_cell_height(&mut self, cell_height: f64) {
        self.cell_height = cell_height;
        self.synchronize();
    }

    /// Height of the visible viewport.
    pub fn update_content_height(&mut self, content_height: f64) {
        self.content_height = content_height;
        self.synchronize();
    }

    pub fn begin_live_scroll(&mut self) {
        self.live = true;
    }

    pub fn end_live_scroll(&mut self) {
        self.live = false;
    }

    /// The user scrolled the container to `visible_y` (bottom edge of the
    /// visible rect) with `visible_height`.
    ///
    /// Returns the binding action to send when the top row changed.
    pub fn live_scroll(
        &mut self,
        visible_y: f64,
        visible_height: f64,
    ) -> Option<String> {
        if !self.live || self.cell_height <= 0.0 {
            return None;
        }
        self.scroll_offset_y = visible_y;
        let offset = self.document_height - visible_y - visible_height;
        let row = ((offset / self.cell_height).floor() as i64).max(0);
        if self.last_sent_row == Some(row) {
            return None;
        }
        self.last_sent_row = Some(row);
        Some(format!("scroll_to_row:{row}"))
    }

    fn synchronize(&mut self) {
        self.document_height = self.compute_document_height();
        if self.live || self.cell_height <= 0.0 {
            return;
        }
        let Some(scrollbar) = self.scrollbar else {
            return;
        };
        let rows_below = scrollbar
            .total
            .saturating_sub(scrollbar.offset)
            .saturating_sub(scrollbar.len);
        self.scroll_offset_y = rows_below as f64 * self.cell_height;
        self.last_sent_row = i64::try_from(scrollbar.offset).ok();
    }

    fn compute_document_height(&self) -> f64 {
        match self.scrollbar {
            Some(scrollbar) if self.cell_height > 0.0 => {
                let grid = scrollbar.total as f64 * self.cell_height;
                let visible = scrollbar.len as f64 * self.cell_height;
                let padding = self.content_height - visible;
                grid + padding
            },
            _ => self.content_height,
        }
    }
}
