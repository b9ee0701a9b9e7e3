//! Per-surface host layer for arbor terminals.
//!
//! [`SurfaceBridge`] turns engine actions into [`SurfaceState`] changes and
//! host callbacks. [`SurfaceView`] owns a bridge and translates OS keyboard,
//! IME and mouse input into engine calls.

mod bridge;
mod cursor;
mod focus;
mod input;
mod modifiers;
mod scroll;
mod secure_input;
mod split;
mod state;
mod view;

pub use bridge::{
    DetachedView, EditCommand, PROGRESS_RESET_TIMEOUT, SurfaceBridge,
    ViewSink,
};
pub use cursor::{CursorTracker, cursor_icon};
pub use focus::{FocusPoll, FocusRequest};
pub use input::{
    AppMenu, InputMethod, InputState, KeyContext, KeyboardLayout,
    NativeKeyEvent, NativeKeyKind, TextInputClient, menu_first,
};
pub use modifiers::{NativeModifiers, from_engine_mods, to_engine_mods};
pub use scroll::{ScrollSync, Scrollbar};
pub use secure_input::{SecureEventInput, SecureInputContext};
pub use split::{
    FocusDirection, NewSplitDirection, ResizeSplitDirection, SplitAction,
};
pub use state::{KeyTableTag, SurfaceState};
pub use view::{ActionContext, SurfaceView, ViewCommand};
