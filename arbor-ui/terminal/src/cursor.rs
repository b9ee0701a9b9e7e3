use arbor_engine::action::{MouseShape, MouseVisibility};
use cursor_icon::CursorIcon;

/// OS cursor for an engine mouse shape.
///
/// Edge and axis resize shapes collapse onto the two bidirectional resize
/// cursors.
pub fn cursor_icon(shape: MouseShape) -> CursorIcon {
    match shape {
        MouseShape::Default => CursorIcon::Default,
        MouseShape::ContextMenu => CursorIcon::ContextMenu,
        MouseShape::Help => CursorIcon::Help,
        MouseShape::Pointer => CursorIcon::Pointer,
        MouseShape::Progress => CursorIcon::Progress,
        MouseShape::Wait => CursorIcon::Wait,
        MouseShape::Cell => CursorIcon::Cell,
        MouseShape::Crosshair => CursorIcon::Crosshair,
        MouseShape::Text => CursorIcon::Text,
        MouseShape::VerticalText => CursorIcon::VerticalText,
        MouseShape::Alias => CursorIcon::Alias,
        MouseShape::Copy => CursorIcon::Copy,
        MouseShape::Move => CursorIcon::Move,
        MouseShape::NoDrop | MouseShape::NotAllowed => CursorIcon::NotAllowed,
        MouseShape::Grab => CursorIcon::Grab,
        MouseShape::Grabbing => CursorIcon::Grabbing,
        MouseShape::AllScroll => CursorIcon::AllScroll,
        MouseShape::EwResize
        | MouseShape::ColResize
        | MouseShape::EResize
        | MouseShape::WResize => CursorIcon::EwResize,
        MouseShape::NsResize
        | MouseShape::RowResize
        | MouseShape::NResize
        | MouseShape::SResize => CursorIcon::NsResize,
        MouseShape::NeResize => CursorIcon::NeResize,
        MouseShape::NwResize => CursorIcon::NwResize,
        MouseShape::SeResize => CursorIcon::SeResize,
        MouseShape::SwResize => CursorIcon::SwResize,
        MouseShape::NeswResize => CursorIcon::NeswResize,
        MouseShape::NwseResize => CursorIcon::NwseResize,
        MouseShape::ZoomIn => CursorIcon::ZoomIn,
        MouseShape::ZoomOut => CursorIcon::ZoomOut,
    }
}

/// The view's current cursor.
///
/// Redundant requests leave the invalidation flag untouched so the host
/// only resets cursor rects on real changes.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    icon: CursorIcon,
    hidden: bool,
    invalidated: bool,
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self {
            icon: CursorIcon::Text,
            hidden: false,
            invalidated: false,
        }
    }
}

impl CursorTracker {
    /// Cursor to show, `None` while hidden.
    pub fn icon(&self) -> Option<CursorIcon> {
        (!self.hidden).then_some(self.icon)
    }

    pub fn set_shape(&mut self, shape: MouseShape) {
        let icon = cursor_icon(shape);
        if icon != self.icon {
            self.icon = icon;
            self.invalidated = true;
        }
    }

    pub fn set_visibility(&mut self, visibility: MouseVisibility) {
        let hidden = visibility == MouseVisibility::Hidden;
        if hidden != self.hidden {
            self.hidden = hidden;
            self.invalidated = true;
        }
    }

    /// The pointer moved; a hidden cursor comes back.
    pub fn mouse_moved(&mut self) {
        self.set_visibility(MouseVisibility::Visible);
    }

    /// Whether the host must refresh the cursor, clearing the flag.
    pub fn take_invalidation(&mut self) -> bool {
        std::mem::take(&mut self.invalidated)
    }
}
