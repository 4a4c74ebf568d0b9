//! DOM Window object implementation.

use common::Rect;

/// Browser window: a viewport scrolled over the document.
#[derive(Clone, Debug)]
pub struct Window {
    /// Inner dimensions.
    pub inner_width: u32,
    pub inner_height: u32,
    /// Scroll position.
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Window {
    pub fn new(inner_width: u32, inner_height: u32) -> Self {
        Self {
            inner_width,
            inner_height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// The visible viewport in client coordinates.
    pub fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, self.inner_width as f64, self.inner_height as f64)
    }

    /// Scroll to an absolute position. Negative offsets clamp to zero.
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll_x = x.max(0.0);
        self.scroll_y = y.max(0.0);
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll_x + dx, self.scroll_y + dy);
    }

    /// Largest vertical scroll offset for a document of the given height.
    pub fn max_scroll_y(&self, document_height: f64) -> f64 {
        (document_height - self.inner_height as f64).max(0.0)
    }

    /// Map a document-space rect into client coordinates.
    pub fn to_client(&self, rect: &Rect) -> Rect {
        rect.translate(-self.scroll_x, -self.scroll_y)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}
