use std::path::PathBuf;

use crate::clipboard::ClipboardRequestId;
use crate::config::Config;
use crate::error::Result;
use crate::input::{
    BindingFlags, ColorScheme, ImePoint, KeyEvent, Mods, MouseButton,
    MouseState, ScrollMods, SelectionText, SurfaceSize,
};
use crate::registry::SurfaceId;

/// Parameters for a new engine surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub working_directory: Option<PathBuf>,
    /// Typed into the surface once the child starts.
    pub initial_input: Option<String>,
    pub scale_factor: f64,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            working_directory: None,
            initial_input: None,
            scale_factor: 2.0,
        }
    }
}

/// Application-level engine instance.
///
/// Implementations wrap the embedded emulator. They report back through
/// the [`RuntimeProxy`](crate::RuntimeProxy) handed to the factory and may
/// do so from any thread. Every other call happens on the UI thread.
pub trait Engine {
    /// Drain the engine's internal queue.
    fn tick(&mut self);

    fn set_focus(&mut self, focused: bool);

    fn set_color_scheme(&mut self, scheme: ColorScheme);

    fn update_config(&mut self, config: &Config);

    /// The OS keyboard layout changed.
    fn keyboard_changed(&mut self);

    fn new_surface(
        &mut self,
        id: SurfaceId,
        options: &SurfaceOptions,
    ) -> Result<()>;

    fn free_surface(&mut self, id: SurfaceId);

    fn surface(&mut self, id: SurfaceId) -> Option<&mut dyn EngineSurface>;
}

/// A single terminal session inside the engine.
pub trait EngineSurface {
    fn set_color_scheme(&mut self, scheme: ColorScheme);

    fn update_config(&mut self, config: &Config);

    fn set_focus(&mut self, focused: bool);

    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> SurfaceSize;

    fn set_content_scale(&mut self, x: f64, y: f64);

    /// Returns whether the engine consumed the key.
    fn key(&mut self, event: &KeyEvent) -> bool;

    /// Binding flags when `event` matches a configured binding.
    fn key_is_binding(&mut self, event: &KeyEvent) -> Option<BindingFlags>;

    /// Modifiers the current layout should see for text translation.
    fn key_translation_mods(&self, mods: Mods) -> Mods;

    /// Write text as if pasted.
    fn text(&mut self, text: &str);

    /// Replace the preedit buffer. `None` clears it.
    fn preedit(&mut self, text: Option<&str>);

    fn binding_action(&mut self, action: &str) -> bool;

    fn mouse_pos(&mut self, x: f64, y: f64, mods: Mods);

    fn mouse_button(
        &mut self,
        state: MouseState,
        button: MouseButton,
        mods: Mods,
    ) -> bool;

    fn mouse_scroll(&mut self, dx: f64, dy: f64, mods: ScrollMods);

    fn mouse_pressure(&mut self, stage: u32, pressure: f64);

    fn mouse_captured(&self) -> bool;

    fn has_selection(&self) -> bool;

    fn read_selection(&self) -> Option<SelectionText>;

    fn ime_point(&self) -> ImePoint;

    fn complete_clipboard_request(
        &mut self,
        request: ClipboardRequestId,
        text: &str,
        confirmed: bool,
    );
}

