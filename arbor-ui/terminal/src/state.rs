use std::time::Duration;

use arbor_engine::Trigger;
use arbor_engine::action::{
    ColorKind, FloatWindow, MouseShape, MouseVisibility, OpenUrlKind,
    ProgressState, PromptTitle, QuitTimer, RendererHealth, SecureInput,
};

/// Kind of the last key table transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTableTag {
    Activate,
    Deactivate,
    DeactivateAll,
}

/// Observable per-surface state maintained by the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceState {
    pub title: String,
    pub prompt_title: Option<PromptTitle>,
    pub pwd: Option<String>,

    pub progress_state: Option<ProgressState>,
    /// Percentage in `0..=100`.
    pub progress_value: Option<u8>,
    pub command_exit_code: Option<i16>,
    pub command_duration: Option<Duration>,
    pub child_exit_code: Option<u32>,
    pub child_runtime: Option<Duration>,
    pub read_only: bool,
    pub bell_count: u64,

    pub mouse_shape: Option<MouseShape>,
    pub mouse_visibility: Option<MouseVisibility>,
    pub mouse_over_link: Option<String>,
    pub renderer_health: Option<RendererHealth>,
    pub open_url_kind: Option<OpenUrlKind>,
    pub open_url: Option<String>,
    pub color_change: Option<(ColorKind, [u8; 3])>,

    pub search_needle: Option<String>,
    pub search_total: Option<usize>,
    pub search_selected: Option<usize>,
    /// Bumped on every start-search so observers can re-focus.
    pub search_focus_count: u64,

    pub size_limit_min: Option<(u32, u32)>,
    pub size_limit_max: Option<(u32, u32)>,
    pub initial_size: Option<(u32, u32)>,
    pub reset_window_size_count: u64,
    pub key_sequence_active: bool,
    pub key_sequence_trigger: Option<Trigger>,
    pub key_table_tag: Option<KeyTableTag>,
    pub key_table_name: Option<String>,
    pub key_table_depth: u32,

    pub secure_input: Option<SecureInput>,
    pub float_window: Option<FloatWindow>,
    pub reload_config_soft: Option<bool>,
    pub config_change_count: u64,
    pub open_config_count: u64,
    pub present_terminal_count: u64,
    pub quit_timer: Option<QuitTimer>,
}

impl SurfaceState {
    /// Whether a multi-key chord or key table is in progress.
    pub fn key_chord_active(&self) -> bool {
        self.key_sequence_active || self.key_table_depth > 0
    }
}
