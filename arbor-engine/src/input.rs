//! Input wire structures understood by the engine.

use bitflags::bitflags;

bitflags! {
    /// Modifier mask in engine encoding.
    ///
    /// The `*_RIGHT` bits are set in addition to the generic bit when the
    /// right-hand key of a pair is held, so bindings can tell left-Cmd from
    /// right-Cmd apart.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mods: u32 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
        const CAPS = 1 << 4;
        const NUM = 1 << 5;
        const SHIFT_RIGHT = 1 << 6;
        const CTRL_RIGHT = 1 << 7;
        const ALT_RIGHT = 1 << 8;
        const SUPER_RIGHT = 1 << 9;
    }
}

impl Mods {
    /// Only the side-independent modifier bits.
    pub fn generic(self) -> Mods {
        self & (Mods::SHIFT | Mods::CTRL | Mods::ALT | Mods::SUPER)
    }
}

bitflags! {
    /// Classification the engine attaches to a matched key binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BindingFlags: u32 {
        const CONSUMED = 1 << 0;
        const ALL = 1 << 1;
        const GLOBAL = 1 << 2;
        const PERFORMABLE = 1 << 3;
    }
}

/// Key transition kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

/// Key event handed to the engine, one per committed unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    /// Native (layout independent) key code.
    pub keycode: u32,
    pub mods: Mods,
    /// Modifiers the layout already used to produce `text`.
    pub consumed_mods: Mods,
    /// Code point the key produces with no modifiers held, `0` if unknown.
    pub unshifted_codepoint: u32,
    /// UTF-8 payload, only set for printable text.
    pub text: Option<String>,
    pub composing: bool,
}

impl KeyEvent {
    pub fn new(action: KeyAction, keycode: u32, mods: Mods) -> Self {
        Self {
            action,
            keycode,
            mods,
            consumed_mods: Mods::empty(),
            unshifted_codepoint: 0,
            text: None,
            composing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseState {
    Press,
    Release,
}

/// Momentum phase reported by precision scrolling devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MomentumPhase {
    #[default]
    None,
    Began,
    Stationary,
    Changed,
    Ended,
    Cancelled,
    MayBegin,
}

/// Scroll modifiers packed the way the engine expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMods {
    pub precision: bool,
    pub momentum: MomentumPhase,
}

impl ScrollMods {
    /// Bit 0 is precision, bits 1..=3 the momentum phase.
    pub fn bits(self) -> i32 {
        let momentum = match self.momentum {
            MomentumPhase::None => 0,
            MomentumPhase::Began => 1,
            MomentumPhase::Stationary => 2,
            MomentumPhase::Changed => 3,
            MomentumPhase::Ended => 4,
            MomentumPhase::Cancelled => 5,
            MomentumPhase::MayBegin => 6,
        };
        i32::from(self.precision) | (momentum << 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    Light,
    Dark,
}

/// Selection read back from a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionText {
    pub text: String,
    /// Start of the selection as a UTF-8 byte offset.
    pub offset_start: u32,
    pub offset_len: u32,
    /// Top-left corner of the selection in surface pixels.
    pub tl_px_x: f64,
    pub tl_px_y: f64,
}

/// Caret rectangle the IME candidate window anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImePoint {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel and grid geometry of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub columns: u16,
    pub rows: u16,
    pub width_px: u32,
    pub height_px: u32,
    pub cell_width_px: u32,
    pub cell_height_px: u32,
}
