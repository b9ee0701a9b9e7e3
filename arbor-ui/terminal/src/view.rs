use std::time::Instant;

use arbor_engine::action::{MouseShape, MouseVisibility, SecureInput};
use arbor_engine::{
    Action, EngineHandle, ImePoint, MomentumPhase, MouseButton, MouseState,
    ScrollMods, SelectionText, SurfaceId,
};

use crate::bridge::{EditCommand, SurfaceBridge, ViewSink};
use crate::cursor::CursorTracker;
use crate::focus::{FocusPoll, FocusRequest};
use crate::input::{
    AppMenu, InputState, KeyContext, KeyInput, NativeKeyEvent, TextInput,
    TextInputClient,
};
use crate::modifiers::{NativeModifiers, to_engine_mods};
use crate::scroll::{ScrollSync, Scrollbar};
use crate::secure_input::SecureInputContext;
use crate::state::SurfaceState;

/// Host services an engine action may reach.
pub struct ActionContext<'a> {
    pub secure_input: &'a mut SecureInputContext,
    pub menu: &'a mut dyn AppMenu,
}

/// Engine binding actions the view exposes as commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    Copy,
    Paste,
    SelectAll,
    Reset,
    ScrollToTop,
    ScrollToBottom,
}

impl ViewCommand {
    pub fn binding_action(self) -> &'static str {
        match self {
            Self::Copy => "copy_to_clipboard",
            Self::Paste => "paste_from_clipboard",
            Self::SelectAll => "select_all",
            Self::Reset => "reset",
            Self::ScrollToTop => "scroll_to_top",
            Self::ScrollToBottom => "scroll_to_bottom",
        }
    }
}

/// Host view of one terminal surface.
///
/// Translates OS input into engine calls and engine actions into view
/// effects. Input for a surface the engine no longer knows is dropped.
pub struct SurfaceView {
    bridge: SurfaceBridge,
    input: InputState,
    cursor: CursorTracker,
    scroll: ScrollSync,
    cell_size: (u32, u32),
    focused: bool,
    attached: bool,
    password_input: bool,
}

impl SurfaceView {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            bridge: SurfaceBridge::new(surface),
            input: InputState::default(),
            cursor: CursorTracker::default(),
            scroll: ScrollSync::default(),
            cell_size: (0, 0),
            focused: false,
            attached: true,
            password_input: false,
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.bridge.surface()
    }

    pub fn bridge(&self) -> &SurfaceBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut SurfaceBridge {
        &mut self.bridge
    }

    pub fn state(&self) -> &SurfaceState {
        self.bridge.state()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn cursor(&self) -> &CursorTracker {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut CursorTracker {
        &mut self.cursor
    }

    pub fn scroll(&self) -> &ScrollSync {
        &self.scroll
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn password_input(&self) -> bool {
        self.password_input
    }

    /// Whether the view sits in a window and can take keyboard focus.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    pub fn handle_action(
        &mut self,
        action: Action,
        now: Instant,
        ctx: &mut ActionContext<'_>,
    ) -> bool {
        let surface = self.bridge.surface();
        let mut effects = ViewEffects {
            surface,
            cursor: &mut self.cursor,
            scroll: &mut self.scroll,
            cell_size: &mut self.cell_size,
            password_input: &mut self.password_input,
            focused: self.focused,
            ctx,
        };
        self.bridge.handle_action(action, now, &mut effects)
    }

    /// Fire due bridge timers.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        self.bridge.poll_timers(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.bridge.next_deadline()
    }

    pub fn key_down(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) {
        self.key_input().key_down(event, ctx);
    }

    pub fn key_up(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) {
        self.key_input().key_up(event, ctx);
    }

    pub fn flags_changed(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) {
        self.key_input().flags_changed(event, ctx);
    }

    /// Offer a key equivalent to the terminal. Returns whether it was
    /// handled here or by the menu.
    pub fn perform_key_equivalent(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) -> bool {
        let state = self.bridge.state();
        let chord = (state.key_sequence_active, state.key_table_depth);
        let focused = self.focused;
        self.key_input()
            .perform_key_equivalent(event, focused, chord, ctx)
    }

    fn key_input(&mut self) -> KeyInput<'_> {
        KeyInput {
            surface: self.bridge.surface(),
            state: &mut self.input,
        }
    }

    /// Commit text outside a key event, e.g. from the character palette.
    pub fn insert_text(&mut self, engine: &mut EngineHandle, text: &str) {
        self.text_input(engine).insert_text(text);
    }

    pub fn set_marked_text(&mut self, engine: &mut EngineHandle, text: &str) {
        self.text_input(engine).set_marked_text(text);
    }

    pub fn unmark_text(&mut self, engine: &mut EngineHandle) {
        self.text_input(engine).unmark_text();
    }

    fn text_input<'a>(
        &'a mut self,
        engine: &'a mut EngineHandle,
    ) -> TextInput<'a> {
        TextInput {
            surface: self.bridge.surface(),
            state: &mut self.input,
            engine,
        }
    }

    pub fn mouse_down(
        &mut self,
        engine: &mut EngineHandle,
        button: MouseButton,
        modifiers: NativeModifiers,
    ) -> bool {
        self.mouse_button(engine, MouseState::Press, button, modifiers)
    }

    pub fn mouse_up(
        &mut self,
        engine: &mut EngineHandle,
        button: MouseButton,
        modifiers: NativeModifiers,
    ) -> bool {
        self.mouse_button(engine, MouseState::Release, button, modifiers)
    }

    fn mouse_button(
        &mut self,
        engine: &mut EngineHandle,
        state: MouseState,
        button: MouseButton,
        modifiers: NativeModifiers,
    ) -> bool {
        engine
            .surface_mut(self.surface())
            .is_some_and(|surface| {
                surface.mouse_button(state, button, to_engine_mods(modifiers))
            })
    }

    /// Pointer moved to `(x, y)` in view coordinates, origin top left.
    pub fn mouse_moved(
        &mut self,
        engine: &mut EngineHandle,
        x: f64,
        y: f64,
        modifiers: NativeModifiers,
    ) {
        self.cursor.mouse_moved();
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.mouse_pos(x, y, to_engine_mods(modifiers));
        }
    }

    /// Pointer left the view. A drag keeps reporting its last position.
    pub fn mouse_exited(
        &mut self,
        engine: &mut EngineHandle,
        buttons_pressed: bool,
        modifiers: NativeModifiers,
    ) {
        if buttons_pressed {
            return;
        }
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.mouse_pos(-1.0, -1.0, to_engine_mods(modifiers));
        }
    }

    pub fn scroll_wheel(
        &mut self,
        engine: &mut EngineHandle,
        dx: f64,
        dy: f64,
        precise: bool,
        momentum: MomentumPhase,
    ) {
        let (dx, dy) = if precise { (dx * 2.0, dy * 2.0) } else { (dx, dy) };
        let mods = ScrollMods {
            precision: precise,
            momentum,
        };
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.mouse_scroll(dx, dy, mods);
        }
    }

    pub fn pressure_change(
        &mut self,
        engine: &mut EngineHandle,
        stage: u32,
        pressure: f64,
    ) {
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.mouse_pressure(stage, pressure);
        }
    }

    pub fn focus_did_change(
        &mut self,
        engine: &mut EngineHandle,
        secure_input: &mut SecureInputContext,
        focused: bool,
    ) {
        self.focused = focused;
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.set_focus(focused);
        }
        if self.password_input {
            secure_input.set_scoped(self.surface(), focused);
        }
    }

    /// Poll a pending focus move towards this view, focusing it once it
    /// is attached. Returns whether the request is finished.
    pub fn poll_focus(
        &mut self,
        request: &mut FocusRequest,
        now: Instant,
        engine: &mut EngineHandle,
        secure_input: &mut SecureInputContext,
    ) -> bool {
        match request.poll(now, self.attached) {
            FocusPoll::Pending => false,
            FocusPoll::Ready(_) => {
                self.focus_did_change(engine, secure_input, true);
                true
            },
            FocusPoll::Abandoned(_) => true,
        }
    }

    /// The view was resized to `width` x `height` pixels.
    ///
    /// Once the cell size is known the surface is only resized while at
    /// least 5 columns and 2 rows fit.
    pub fn resize(
        &mut self,
        engine: &mut EngineHandle,
        width: u32,
        height: u32,
    ) {
        let (cell_width, cell_height) = self.cell_size;
        if cell_width > 0 && cell_height > 0 {
            let columns = width / cell_width;
            let rows = height / cell_height;
            if columns < 5 || rows < 2 {
                return;
            }
        }
        self.scroll.update_content_height(f64::from(height));
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.set_size(width, height);
        }
    }

    pub fn set_content_scale(
        &mut self,
        engine: &mut EngineHandle,
        x: f64,
        y: f64,
    ) {
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.set_content_scale(x, y);
        }
    }

    pub fn begin_live_scroll(&mut self) {
        self.scroll.begin_live_scroll();
    }

    pub fn end_live_scroll(&mut self) {
        self.scroll.end_live_scroll();
    }

    /// The user scrolled the container during a live gesture.
    pub fn live_scroll(
        &mut self,
        engine: &mut EngineHandle,
        visible_y: f64,
        visible_height: f64,
    ) {
        let Some(action) = self.scroll.live_scroll(visible_y, visible_height)
        else {
            return;
        };
        if let Some(surface) = engine.surface_mut(self.surface()) {
            surface.binding_action(&action);
        }
    }

    pub fn perform(
        &mut self,
        engine: &mut EngineHandle,
        command: ViewCommand,
    ) -> bool {
        let action = command.binding_action();
        engine
            .surface_mut(self.surface())
            .is_some_and(|surface| surface.binding_action(action))
    }

    pub fn selection(
        &self,
        engine: &mut EngineHandle,
    ) -> Option<SelectionText> {
        let surface = engine.surface_mut(self.surface())?;
        if !surface.has_selection() {
            return None;
        }
        surface.read_selection()
    }

    /// Caret rectangle for the IME candidate window.
    pub fn ime_point(&self, engine: &mut EngineHandle) -> Option<ImePoint> {
        engine
            .surface_mut(self.surface())
            .map(|surface| surface.ime_point())
    }

    /// Toggle password-style input for this view.
    pub fn set_password_input(
        &mut self,
        secure_input: &mut SecureInputContext,
        enabled: bool,
    ) {
        apply_password_input(
            self.surface(),
            &mut self.password_input,
            self.focused,
            secure_input,
            enabled,
        );
    }

    /// Release everything the view holds and free its surface.
    pub fn close(
        &mut self,
        engine: &mut EngineHandle,
        secure_input: &mut SecureInputContext,
    ) {
        secure_input.remove_scoped(self.surface());
        engine.free_surface(self.surface());
    }
}

fn apply_password_input(
    surface: SurfaceId,
    password_input: &mut bool,
    focused: bool,
    secure_input: &mut SecureInputContext,
    enabled: bool,
) {
    *password_input = enabled;
    if enabled {
        secure_input.set_scoped(surface, focused);
    } else {
        secure_input.remove_scoped(surface);
    }
}

/// [`ViewSink`] over the parts of a [`SurfaceView`] the bridge may touch.
struct ViewEffects<'v, 'c> {
    surface: SurfaceId,
    cursor: &'v mut CursorTracker,
    scroll: &'v mut ScrollSync,
    cell_size: &'v mut (u32, u32),
    password_input: &'v mut bool,
    focused: bool,
    ctx: &'v mut ActionContext<'c>,
}

impl ViewSink for ViewEffects<'_, '_> {
    fn set_mouse_shape(&mut self, shape: MouseShape) {
        self.cursor.set_shape(shape);
    }

    fn set_mouse_visibility(&mut self, visibility: MouseVisibility) {
        self.cursor.set_visibility(visibility);
    }

    fn update_scrollbar(&mut self, total: u64, offset: u64, len: u64) {
        self.scroll.update_scrollbar(Scrollbar { total, offset, len });
    }

    fn update_cell_size(&mut self, width: u32, height: u32) {
        *self.cell_size = (width, height);
        self.scroll.update_cell_height(f64::from(height));
    }

    fn set_password_input(&mut self, mode: SecureInput) {
        let enabled = match mode {
            SecureInput::On => true,
            SecureInput::Off => false,
            SecureInput::Toggle => !*self.password_input,
        };
        apply_password_input(
            self.surface,
            self.password_input,
            self.focused,
            self.ctx.secure_input,
            enabled,
        );
    }

    fn perform_edit(&mut self, command: EditCommand) {
        self.ctx.menu.perform_edit(command);
    }
}
