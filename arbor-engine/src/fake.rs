//! In-memory engine that records every call made into it.
//!
//! Hosts use it in tests to drive the runtime without the real emulator.
//! [`FakeProbe`] shares the recorded state after the engine itself has
//! been moved into an [`EngineHandle`](crate::EngineHandle).

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::clipboard::ClipboardRequestId;
use crate::config::Config;
use crate::engine::{Engine, EngineSurface, SurfaceOptions};
use crate::error::{EngineError, Result};
use crate::input::{
    BindingFlags, ColorScheme, ImePoint, KeyEvent, Mods, MouseButton,
    MouseState, ScrollMods, SelectionText, SurfaceSize,
};
use crate::registry::SurfaceId;

/// Everything a single fake surface received.
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub options: SurfaceOptions,
    pub color_schemes: Vec<ColorScheme>,
    pub config_updates: usize,
    pub focus: Vec<bool>,
    pub sizes: Vec<(u32, u32)>,
    pub content_scale: Option<(f64, f64)>,
    pub keys: Vec<KeyEvent>,
    pub texts: Vec<String>,
    pub preedits: Vec<Option<String>>,
    pub binding_actions: Vec<String>,
    pub mouse_positions: Vec<(f64, f64, Mods)>,
    pub mouse_buttons: Vec<(MouseState, MouseButton, Mods)>,
    pub scrolls: Vec<(f64, f64, ScrollMods)>,
    pub pressures: Vec<(u32, f64)>,
    pub clipboard_completions: Vec<(ClipboardRequestId, String, bool)>,
}

/// Surface lifecycle calls, in the order the engine received them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Created(SurfaceId),
    Focus(SurfaceId, bool),
    Freed(SurfaceId),
}

/// Shared recording and knobs of a [`FakeEngine`].
#[derive(Debug, Default)]
pub struct FakeState {
    pub ticks: usize,
    pub app_focus: Vec<bool>,
    pub app_color_schemes: Vec<ColorScheme>,
    pub app_config_updates: usize,
    pub keyboard_changes: usize,
    /// Live surfaces.
    pub surfaces: BTreeMap<SurfaceId, SurfaceLog>,
    pub freed: Vec<SurfaceId>,
    /// Surface focus changes across all surfaces, in call order.
    pub focus_changes: Vec<(SurfaceId, bool)>,
    pub lifecycle: Vec<SurfaceEvent>,

    /// Fail the next `new_surface` call.
    pub fail_next_surface: bool,
    /// Replacement returned by `key_translation_mods`, identity if unset.
    pub translation_mods: Option<Mods>,
    /// `(keycode, generic mods, flags)` treated as configured bindings.
    pub bindings: Vec<(u32, Mods, BindingFlags)>,
    /// Whether `key` reports the event as consumed.
    pub consume_keys: bool,
    pub cell_size: (u32, u32),
    pub selection: Option<SelectionText>,
    pub ime_point: ImePoint,
    pub mouse_captured: bool,
}

/// Read access to a [`FakeEngine`]'s recording.
#[derive(Debug, Clone)]
pub struct FakeProbe(Rc<RefCell<FakeState>>);

impl FakeProbe {
    pub fn state(&self) -> Ref<'_, FakeState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, FakeState> {
        self.0.borrow_mut()
    }

    /// Recording of a live surface.
    pub fn surface(&self, id: SurfaceId) -> Option<Ref<'_, SurfaceLog>> {
        Ref::filter_map(self.0.borrow(), |state| state.surfaces.get(&id)).ok()
    }

    pub fn live_surfaces(&self) -> usize {
        self.0.borrow().surfaces.len()
    }
}

pub struct FakeEngine {
    state: Rc<RefCell<FakeState>>,
    surfaces: BTreeMap<SurfaceId, FakeSurface>,
}

impl FakeEngine {
    pub fn new() -> (Self, FakeProbe) {
        let state = Rc::new(RefCell::new(FakeState {
            consume_keys: true,
            cell_size: (8, 16),
            ..FakeState::default()
        }));
        let engine = Self {
            state: Rc::clone(&state),
            surfaces: BTreeMap::new(),
        };
        (engine, FakeProbe(state))
    }
}

impl Engine for FakeEngine {
    fn tick(&mut self) {
        self.state.borrow_mut().ticks += 1;
    }

    fn set_focus(&mut self, focused: bool) {
        self.state.borrow_mut().app_focus.push(focused);
    }

    fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.state.borrow_mut().app_color_schemes.push(scheme);
    }

    fn update_config(&mut self, _config: &Config) {
        self.state.borrow_mut().app_config_updates += 1;
    }

    fn keyboard_changed(&mut self) {
        self.state.borrow_mut().keyboard_changes += 1;
    }

    fn new_surface(
        &mut self,
        id: SurfaceId,
        options: &SurfaceOptions,
    ) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.fail_next_surface {
                state.fail_next_surface = false;
                return Err(EngineError::SurfaceCreate("fake failure".into()));
            }
            state.lifecycle.push(SurfaceEvent::Created(id));
            state.surfaces.insert(
                id,
                SurfaceLog {
                    options: options.clone(),
                    ..SurfaceLog::default()
                },
            );
        }
        self.surfaces.insert(
            id,
            FakeSurface {
                id,
                state: Rc::clone(&self.state),
            },
        );
        Ok(())
    }

    fn free_surface(&mut self, id: SurfaceId) {
        self.surfaces.remove(&id);
        let mut state = self.state.borrow_mut();
        state.surfaces.remove(&id);
        state.freed.push(id);
        state.lifecycle.push(SurfaceEvent::Freed(id));
    }

    fn surface(&mut self, id: SurfaceId) -> Option<&mut dyn EngineSurface> {
        self.surfaces
            .get_mut(&id)
            .map(|surface| surface as &mut dyn EngineSurface)
    }
}

struct FakeSurface {
    id: SurfaceId,
    state: Rc<RefCell<FakeState>>,
}

impl FakeSurface {
    fn record(&self, apply: impl FnOnce(&mut SurfaceLog)) {
        if let Some(log) = self.state.borrow_mut().surfaces.get_mut(&self.id)
        {
            apply(log);
        }
    }
}

impl EngineSurface for FakeSurface {
    fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.record(|log| log.color_schemes.push(scheme));
    }

    fn update_config(&mut self, _config: &Config) {
        self.record(|log| log.config_updates += 1);
    }

    fn set_focus(&mut self, focused: bool) {
        {
            let mut state = self.state.borrow_mut();
            state.focus_changes.push((self.id, focused));
            state.lifecycle.push(SurfaceEvent::Focus(self.id, focused));
        }
        self.record(|log| log.focus.push(focused));
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.record(|log| log.sizes.push((width, height)));
    }

    fn size(&self) -> SurfaceSize {
        let state = self.state.borrow();
        let (cell_width_px, cell_height_px) = state.cell_size;
        let (width_px, height_px) = state
            .surfaces
            .get(&self.id)
            .and_then(|log| log.sizes.last().copied())
            .unwrap_or((800, 600));
        SurfaceSize {
            columns: (width_px / cell_width_px.max(1)) as u16,
            rows: (height_px / cell_height_px.max(1)) as u16,
            width_px,
            height_px,
            cell_width_px,
            cell_height_px,
        }
    }

    fn set_content_scale(&mut self, x: f64, y: f64) {
        self.record(|log| log.content_scale = Some((x, y)));
    }

    fn key(&mut self, event: &KeyEvent) -> bool {
        let event = event.clone();
        self.record(|log| log.keys.push(event));
        self.state.borrow().consume_keys
    }

    fn key_is_binding(&mut self, event: &KeyEvent) -> Option<BindingFlags> {
        self.state
            .borrow()
            .bindings
            .iter()
            .find(|(keycode, mods, _)| {
                *keycode == event.keycode && *mods == event.mods.generic()
            })
            .map(|(_, _, flags)| *flags)
    }

    fn key_translation_mods(&self, mods: Mods) -> Mods {
        self.state.borrow().translation_mods.unwrap_or(mods)
    }

    fn text(&mut self, text: &str) {
        self.record(|log| log.texts.push(text.to_string()));
    }

    fn preedit(&mut self, text: Option<&str>) {
        let text = text.map(str::to_string);
        self.record(|log| log.preedits.push(text));
    }

    fn binding_action(&mut self, action: &str) -> bool {
        self.record(|log| log.binding_actions.push(action.to_string()));
        true
    }

    fn mouse_pos(&mut self, x: f64, y: f64, mods: Mods) {
        self.record(|log| log.mouse_positions.push((x, y, mods)));
    }

    fn mouse_button(
        &mut self,
        state: MouseState,
        button: MouseButton,
        mods: Mods,
    ) -> bool {
        self.record(|log| log.mouse_buttons.push((state, button, mods)));
        true
    }

    fn mouse_scroll(&mut self, dx: f64, dy: f64, mods: ScrollMods) {
        self.record(|log| log.scrolls.push((dx, dy, mods)));
    }

    fn mouse_pressure(&mut self, stage: u32, pressure: f64) {
        self.record(|log| log.pressures.push((stage, pressure)));
    }

    fn mouse_captured(&self) -> bool {
        self.state.borrow().mouse_captured
    }

    fn has_selection(&self) -> bool {
        self.state.borrow().selection.is_some()
    }

    fn read_selection(&self) -> Option<SelectionText> {
        self.state.borrow().selection.clone()
    }

    fn ime_point(&self) -> ImePoint {
        self.state.borrow().ime_point
    }

    fn complete_clipboard_request(
        &mut self,
        request: ClipboardRequestId,
        text: &str,
        confirmed: bool,
    ) {
        let text = text.to_string();
        self.record(|log| {
            log.clipboard_completions.push((request, text, confirmed))
        });
    }
}
