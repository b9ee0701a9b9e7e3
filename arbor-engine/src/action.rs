//! Actions the engine emits towards the host.
//!
//! The set is closed on the host side; anything newer than this crate is
//! delivered as [`Action::Unknown`] so dispatch stays total.

use std::time::Duration;

use crate::config::Config;
use crate::registry::SurfaceId;
use crate::trigger::Trigger;

/// Receiver of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    App,
    Surface(SurfaceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTabMode {
    This,
    Other,
    Right,
}

/// `goto_tab` argument: a non-negative tab index or one of the negative
/// sentinels below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoTab(pub i32);

impl GotoTab {
    pub const PREVIOUS: GotoTab = GotoTab(-1);
    pub const NEXT: GotoTab = GotoTab(-2);
    pub const LAST: GotoTab = GotoTab(-3);
}

/// Raw `new_split` direction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDirection(pub u32);

impl SplitDirection {
    pub const RIGHT: SplitDirection = SplitDirection(0);
    pub const DOWN: SplitDirection = SplitDirection(1);
    pub const LEFT: SplitDirection = SplitDirection(2);
    pub const UP: SplitDirection = SplitDirection(3);
}

/// Raw `goto_split` direction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoSplit(pub u32);

impl GotoSplit {
    pub const PREVIOUS: GotoSplit = GotoSplit(0);
    pub const NEXT: GotoSplit = GotoSplit(1);
    pub const UP: GotoSplit = GotoSplit(2);
    pub const LEFT: GotoSplit = GotoSplit(3);
    pub const DOWN: GotoSplit = GotoSplit(4);
    pub const RIGHT: GotoSplit = GotoSplit(5);
}

/// Raw `resize_split` direction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDirection(pub u32);

impl ResizeDirection {
    pub const UP: ResizeDirection = ResizeDirection(0);
    pub const DOWN: ResizeDirection = ResizeDirection(1);
    pub const LEFT: ResizeDirection = ResizeDirection(2);
    pub const RIGHT: ResizeDirection = ResizeDirection(3);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTitle {
    Surface,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressState {
    Remove,
    Set,
    Error,
    Indeterminate,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseShape {
    Default,
    ContextMenu,
    Help,
    Pointer,
    Progress,
    Wait,
    Cell,
    Crosshair,
    Text,
    VerticalText,
    Alias,
    Copy,
    Move,
    NoDrop,
    NotAllowed,
    Grab,
    Grabbing,
    AllScroll,
    ColResize,
    RowResize,
    NResize,
    EResize,
    SResize,
    WResize,
    NeResize,
    NwResize,
    SeResize,
    SwResize,
    EwResize,
    NsResize,
    NeswResize,
    NwseResize,
    ZoomIn,
    ZoomOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseVisibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererHealth {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenUrlKind {
    Unknown,
    Text,
}

/// Which color an OSC color change addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    Foreground,
    Background,
    Cursor,
    Palette(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTable {
    Activate { name: String },
    Deactivate,
    DeactivateAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureInput {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWindow {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitTimer {
    Start,
    Stop,
}

/// Tagged action union.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NewTab,
    CloseTab(CloseTabMode),
    GotoTab(GotoTab),
    MoveTab { amount: isize },
    ToggleCommandPalette,
    GotoWindow,
    ToggleQuickTerminal,
    CloseAllWindows,
    Undo,
    Redo,

    NewSplit(SplitDirection),
    GotoSplit(GotoSplit),
    ResizeSplit { direction: ResizeDirection, amount: u16 },
    EqualizeSplits,
    ToggleSplitZoom,

    SetTitle { title: Option<String> },
    PromptTitle(PromptTitle),
    Pwd { pwd: Option<String> },
    DesktopNotification { title: Option<String>, body: Option<String> },

    /// `progress` is a percentage, `-1` when the reporter gave none.
    ProgressReport { state: ProgressState, progress: i8 },
    /// `exit_code` is `-1` when unknown.
    CommandFinished { exit_code: i16, duration: Duration },
    ShowChildExited { exit_code: u32, runtime: Duration },
    Readonly(bool),
    RingBell,

    MouseShape(MouseShape),
    MouseVisibility(MouseVisibility),
    MouseOverLink { url: Option<String> },
    RendererHealth(RendererHealth),
    OpenUrl { kind: OpenUrlKind, url: String },
    ColorChange { kind: ColorKind, r: u8, g: u8, b: u8 },

    Scrollbar { total: u64, offset: u64, len: u64 },
    StartSearch { needle: Option<String> },
    EndSearch,
    SearchTotal(isize),
    SearchSelected(isize),

    SizeLimit {
        min_width: u32,
        min_height: u32,
        max_width: u32,
        max_height: u32,
    },
    InitialSize { width: u32, height: u32 },
    CellSize { width: u32, height: u32 },
    ResetWindowSize,
    KeySequence { active: bool, trigger: Option<Trigger> },
    KeyTable(KeyTable),

    SecureInput(SecureInput),
    FloatWindow(FloatWindow),
    ReloadConfig { soft: bool },
    ConfigChange { config: Box<Config> },
    OpenConfig,
    PresentTerminal,
    QuitTimer(QuitTimer),

    /// Tag this version does not model.
    Unknown(u32),
}
