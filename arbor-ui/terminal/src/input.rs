//! Keyboard and IME translation into engine key events.
//!
//! The OS keyboard stack is modeled by three seams:
//! - [`KeyboardLayout`] re-derives characters for a modifier set and
//!   reports which input source is active,
//! - [`InputMethod`] runs an event through composition and reports marked
//!   and committed text back through a [`TextInputClient`],
//! - [`AppMenu`] gets first refusal on some key equivalents.

use arbor_engine::{
    BindingFlags, EngineHandle, KeyAction, KeyEvent, Mods, SurfaceId,
};

use crate::bridge::EditCommand;
use crate::modifiers::{
    NativeModifiers, from_engine_mods, modifier_key, to_engine_mods,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKeyKind {
    KeyDown,
    KeyUp,
    FlagsChanged,
}

/// Keyboard event as delivered by the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeKeyEvent {
    pub kind: NativeKeyKind,
    pub keycode: u16,
    pub modifiers: NativeModifiers,
    pub characters: Option<String>,
    pub characters_ignoring_modifiers: Option<String>,
    pub is_repeat: bool,
    /// Seconds since boot, `0.0` for synthesized events.
    pub timestamp: f64,
}

impl NativeKeyEvent {
    pub fn key_down(
        keycode: u16,
        modifiers: NativeModifiers,
        text: &str,
    ) -> Self {
        Self {
            kind: NativeKeyKind::KeyDown,
            keycode,
            modifiers,
            characters: Some(text.to_string()),
            characters_ignoring_modifiers: Some(text.to_string()),
            is_repeat: false,
            timestamp: 0.0,
        }
    }
}

pub trait KeyboardLayout {
    /// Characters `keycode` produces with `modifiers` held.
    fn characters(
        &self,
        keycode: u16,
        modifiers: NativeModifiers,
    ) -> Option<String>;

    /// Identifier of the active input source.
    fn layout_id(&self) -> Option<String>;
}

/// Receiver of input method output.
pub trait TextInputClient {
    fn has_marked_text(&self) -> bool;
    fn set_marked_text(&mut self, text: &str);
    fn unmark_text(&mut self);
    fn insert_text(&mut self, text: &str);
}

pub trait InputMethod {
    /// Run `event` through composition, reporting into `client`.
    fn interpret(
        &mut self,
        event: &NativeKeyEvent,
        client: &mut dyn TextInputClient,
    );
}

/// Host application menu.
pub trait AppMenu {
    /// Try `event` as a menu shortcut. Returns whether a menu item fired.
    fn perform_key_equivalent(&mut self, event: &NativeKeyEvent) -> bool;

    fn perform_edit(&mut self, command: EditCommand);
}

/// Everything a keyboard event needs besides the view itself.
pub struct KeyContext<'a> {
    pub engine: &'a mut EngineHandle,
    pub layout: &'a dyn KeyboardLayout,
    pub input_method: &'a mut dyn InputMethod,
    pub menu: &'a mut dyn AppMenu,
}

/// Whether the application menu should see a bound key before the
/// terminal does.
///
/// | all | performable | consumed | chord active | menu first |
/// |-----|-------------|----------|--------------|------------|
/// | no  | no          | yes      | no           | yes        |
/// | any other combination                     || no         |
pub fn menu_first(
    flags: BindingFlags,
    key_sequence_active: bool,
    key_table_depth: u32,
) -> bool {
    if key_sequence_active || key_table_depth > 0 {
        return false;
    }
    !flags.contains(BindingFlags::ALL)
        && !flags.contains(BindingFlags::PERFORMABLE)
        && flags.contains(BindingFlags::CONSUMED)
}

/// Characters to send for `event`.
///
/// Control characters are re-derived without the control modifier so the
/// engine sees the base key, and the private-use function key range is
/// dropped.
pub(crate) fn event_characters(
    event: &NativeKeyEvent,
    layout: &dyn KeyboardLayout,
) -> Option<String> {
    let characters = event.characters.as_ref()?;
    let mut scalars = characters.chars();
    if let (Some(scalar), None) = (scalars.next(), scalars.next()) {
        if u32::from(scalar) < 0x20 {
            return layout.characters(
                event.keycode,
                event.modifiers - NativeModifiers::CONTROL,
            );
        }
        if ('\u{F700}'..='\u{F8FF}').contains(&scalar) {
            return None;
        }
    }
    Some(characters.clone())
}

/// Per-view keyboard state.
#[derive(Debug, Default)]
pub struct InputState {
    marked_text: String,
    /// Commits collected while a key down is being interpreted.
    accumulator: Option<Vec<String>>,
    last_perform_key_event: Option<f64>,
}

impl InputState {
    pub fn marked_text(&self) -> &str {
        &self.marked_text
    }

    pub fn has_marked_text(&self) -> bool {
        !self.marked_text.is_empty()
    }
}

/// Key handling for one surface.
pub(crate) struct KeyInput<'a> {
    pub(crate) surface: SurfaceId,
    pub(crate) state: &'a mut InputState,
}

impl KeyInput<'_> {
    pub(crate) fn key_down(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) {
        let Some(surface) = ctx.engine.surface_mut(self.surface) else {
            return;
        };
        let action = if event.is_repeat {
            KeyAction::Repeat
        } else {
            KeyAction::Press
        };

        let translated =
            surface.key_translation_mods(to_engine_mods(event.modifiers));
        let translation_mods = translate_modifiers(event.modifiers, translated);
        let translation_event = NativeKeyEvent {
            modifiers: translation_mods,
            characters: if translation_mods == event.modifiers {
                event.characters.clone()
            } else {
                ctx.layout.characters(event.keycode, translation_mods)
            },
            ..event.clone()
        };

        self.state.accumulator = Some(Vec::new());
        let marked_before = self.state.has_marked_text();
        let layout_before = if marked_before {
            None
        } else {
            ctx.layout.layout_id()
        };

        ctx.input_method.interpret(
            &translation_event,
            &mut TextInput {
                surface: self.surface,
                state: &mut *self.state,
                engine: &mut *ctx.engine,
            },
        );
        let accumulated = self.state.accumulator.take().unwrap_or_default();

        if !marked_before && ctx.layout.layout_id() != layout_before {
            log::debug!("input source changed, dropping key {}", event.keycode);
            return;
        }

        sync_preedit(self.surface, self.state, ctx.engine, marked_before);

        if !accumulated.is_empty() {
            for text in accumulated {
                self.send_key(
                    action,
                    event,
                    Some(translation_mods),
                    Some(&text),
                    false,
                    ctx,
                );
            }
            return;
        }

        let text = event_characters(&translation_event, ctx.layout);
        let composing = self.state.has_marked_text() || marked_before;
        self.send_key(
            action,
            event,
            Some(translation_mods),
            text.as_deref(),
            composing,
            ctx,
        );
    }

    pub(crate) fn key_up(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) {
        self.send_key(KeyAction::Release, event, None, None, false, ctx);
    }

    pub(crate) fn flags_changed(
        &mut self,
        event: &NativeKeyEvent,
        ctx: &mut KeyContext<'_>,
    ) {
        let Some((mod_bit, right_bit)) = modifier_key(event.keycode) else {
            return;
        };
        if self.state.has_marked_text() {
            return;
        }

        let mods = to_engine_mods(event.modifiers);
        let side_pressed =
            right_bit.is_none_or(|bit| event.modifiers.contains(bit));
        let action = if mods.contains(mod_bit) && side_pressed {
            KeyAction::Press
        } else {
            KeyAction::Release
        };
        self.send_key(action, event, None, None, false, ctx);
    }

    /// Route a key equivalent between the menu and the terminal. Returns
    /// whether the event was handled.
    pub(crate) fn perform_key_equivalent(
        &mut self,
        event: &NativeKeyEvent,
        focused: bool,
        chord: (bool, u32),
        ctx: &mut KeyContext<'_>,
    ) -> bool {
        if event.kind != NativeKeyKind::KeyDown || !focused {
            return false;
        }
        let Some(surface) = ctx.engine.surface_mut(self.surface) else {
            return false;
        };

        let mut probe = key_event(KeyAction::Press, event, None, ctx.layout);
        probe.text = event_characters(event, ctx.layout);
        if let Some(flags) = surface.key_is_binding(&probe) {
            let (sequence_active, table_depth) = chord;
            if menu_first(flags, sequence_active, table_depth)
                && ctx.menu.perform_key_equivalent(event)
            {
                return true;
            }
            self.key_down(event, ctx);
            return true;
        }

        let Some(equivalent) = self.equivalent_key(event) else {
            return false;
        };
        let synthesized = NativeKeyEvent {
            characters: Some(equivalent.clone()),
            characters_ignoring_modifiers: Some(equivalent),
            ..event.clone()
        };
        self.key_down(&synthesized, ctx);
        true
    }

    fn equivalent_key(&mut self, event: &NativeKeyEvent) -> Option<String> {
        let modifiers = event.modifiers;
        match event.characters_ignoring_modifiers.as_deref() {
            Some("\r") => modifiers
                .contains(NativeModifiers::CONTROL)
                .then(|| "\r".to_string()),
            Some("/") => {
                let plain_ctrl = modifiers.contains(NativeModifiers::CONTROL)
                    && !modifiers.intersects(
                        NativeModifiers::SHIFT
                            | NativeModifiers::COMMAND
                            | NativeModifiers::OPTION,
                    );
                plain_ctrl.then(|| "_".to_string())
            },
            _ => {
                if event.timestamp == 0.0 {
                    return None;
                }
                let shortcut =
                    NativeModifiers::COMMAND | NativeModifiers::CONTROL;
                if !modifiers.intersects(shortcut) {
                    self.state.last_perform_key_event = None;
                    return None;
                }
                // A key equivalent the menu passed on comes back here a
                // second time with the same timestamp.
                if let Some(last) = self.state.last_perform_key_event.take() {
                    if last == event.timestamp {
                        return Some(
                            event.characters.clone().unwrap_or_default(),
                        );
                    }
                }
                self.state.last_perform_key_event = Some(event.timestamp);
                None
            },
        }
    }

    fn send_key(
        &mut self,
        action: KeyAction,
        event: &NativeKeyEvent,
        translation_mods: Option<NativeModifiers>,
        text: Option<&str>,
        composing: bool,
        ctx: &mut KeyContext<'_>,
    ) {
        let mut key = key_event(action, event, translation_mods, ctx.layout);
        key.composing = composing;
        key.text = text
            .filter(|text| text.as_bytes().first().is_some_and(|b| *b >= 0x20))
            .map(str::to_string);
        if let Some(surface) = ctx.engine.surface_mut(self.surface) {
            surface.key(&key);
        }
    }
}

/// Engine key event for `event` without text.
fn key_event(
    action: KeyAction,
    event: &NativeKeyEvent,
    translation_mods: Option<NativeModifiers>,
    layout: &dyn KeyboardLayout,
) -> KeyEvent {
    let mut key = KeyEvent::new(
        action,
        u32::from(event.keycode),
        to_engine_mods(event.modifiers),
    );
    let consumed = translation_mods.unwrap_or(event.modifiers)
        - (NativeModifiers::CONTROL | NativeModifiers::COMMAND);
    key.consumed_mods = to_engine_mods(consumed);
    if event.kind != NativeKeyKind::FlagsChanged {
        key.unshifted_codepoint = layout
            .characters(event.keycode, NativeModifiers::empty())
            .and_then(|chars| chars.chars().next())
            .map_or(0, u32::from);
    }
    key
}

/// Apply the engine's translated modifier state to the generic bits of
/// `original`, keeping every other bit of the OS mask.
fn translate_modifiers(
    original: NativeModifiers,
    translated: Mods,
) -> NativeModifiers {
    let translated = from_engine_mods(translated);
    let mut result = original;
    for flag in [
        NativeModifiers::SHIFT,
        NativeModifiers::CONTROL,
        NativeModifiers::OPTION,
        NativeModifiers::COMMAND,
    ] {
        result.set(flag, translated.contains(flag));
    }
    result
}

/// Push the current marked text to the engine's preedit. An empty marked
/// text is sent as an explicit clear when `clear_if_needed` is set.
fn sync_preedit(
    surface: SurfaceId,
    state: &InputState,
    engine: &mut EngineHandle,
    clear_if_needed: bool,
) {
    let Some(surface) = engine.surface_mut(surface) else {
        return;
    };
    if state.has_marked_text() {
        surface.preedit(Some(&state.marked_text));
    } else if clear_if_needed {
        surface.preedit(None);
    }
}

/// [`TextInputClient`] backed by a view's input state.
pub(crate) struct TextInput<'a> {
    pub(crate) surface: SurfaceId,
    pub(crate) state: &'a mut InputState,
    pub(crate) engine: &'a mut EngineHandle,
}

impl TextInputClient for TextInput<'_> {
    fn has_marked_text(&self) -> bool {
        self.state.has_marked_text()
    }

    fn set_marked_text(&mut self, text: &str) {
        self.state.marked_text = text.to_string();
        // Outside of a key down, e.g. a layout switch mid composition.
        if self.state.accumulator.is_none() {
            sync_preedit(self.surface, self.state, self.engine, true);
        }
    }

    fn unmark_text(&mut self) {
        if self.state.has_marked_text() {
            self.state.marked_text.clear();
            sync_preedit(self.surface, self.state, self.engine, true);
        }
    }

    fn insert_text(&mut self, text: &str) {
        self.unmark_text();
        if let Some(accumulator) = self.state.accumulator.as_mut() {
            accumulator.push(text.to_string());
            return;
        }
        if let Some(surface) = self.engine.surface_mut(self.surface) {
            surface.text(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use arbor_engine::fake::{FakeEngine, FakeProbe};
    use arbor_engine::{
        BindingFlags, ConfigSources, Engine, EngineHandle, KeyAction, Mods,
        SurfaceId, SurfaceOptions,
    };

    use super::*;

    /// US layout for the handful of keys the tests press.
    struct StubLayout {
        id: Rc<RefCell<String>>,
    }

    impl KeyboardLayout for StubLayout {
        fn characters(
            &self,
            keycode: u16,
            modifiers: NativeModifiers,
        ) -> Option<String> {
            let shifted = modifiers.contains(NativeModifiers::SHIFT);
            let ctrl = modifiers.contains(NativeModifiers::CONTROL);
            let text = match (keycode, shifted, ctrl) {
                (0x00, _, true) => "\u{1}",
                (0x00, false, false) => "a",
                (0x00, true, false) => "A",
                (0x0E, _, _) => "e",
                (0x24, _, _) => "\r",
                (0x2C, _, _) => "/",
                (0x7E, _, _) => "\u{F700}",
                _ => return None,
            };
            Some(text.to_string())
        }

        fn layout_id(&self) -> Option<String> {
            Some(self.id.borrow().clone())
        }
    }

    enum Script {
        Passthrough,
        Commit(Vec<&'static str>),
        Mark(&'static str),
        SwitchLayout(Rc<RefCell<String>>),
    }

    struct StubInputMethod {
        script: Script,
        seen: Vec<NativeKeyEvent>,
    }

    impl InputMethod for StubInputMethod {
        fn interpret(
            &mut self,
            event: &NativeKeyEvent,
            client: &mut dyn TextInputClient,
        ) {
            self.seen.push(event.clone());
            match &self.script {
                Script::Passthrough => {},
                Script::Commit(texts) => {
                    for text in texts {
                        client.insert_text(text);
                    }
                },
                Script::Mark(text) => client.set_marked_text(text),
                Script::SwitchLayout(id) => *id.borrow_mut() = "jp".into(),
            }
        }
    }

    #[derive(Default)]
    struct StubMenu {
        claims: bool,
        offered: usize,
    }

    impl AppMenu for StubMenu {
        fn perform_key_equivalent(&mut self, _event: &NativeKeyEvent) -> bool {
            self.offered += 1;
            self.claims
        }

        fn perform_edit(&mut self, _command: EditCommand) {}
    }

    struct Fixture {
        handle: EngineHandle,
        probe: FakeProbe,
        surface: SurfaceId,
        state: InputState,
        layout_id: Rc<RefCell<String>>,
        menu: StubMenu,
    }

    impl Fixture {
        fn new() -> Self {
            let (engine, probe) = FakeEngine::new();
            let mut handle = EngineHandle::initialize(
                ConfigSources::default(),
                move |_config, _proxy| Ok(Box::new(engine) as Box<dyn Engine>),
            )
            .expect("fake engine should initialize");
            let surface = handle
                .create_surface(SurfaceOptions::default())
                .expect("surface should be created");
            Self {
                handle,
                probe,
                surface,
                state: InputState::default(),
                layout_id: Rc::new(RefCell::new("us".into())),
                menu: StubMenu::default(),
            }
        }

        fn key_down(
            &mut self,
            event: &NativeKeyEvent,
            ime: &mut StubInputMethod,
        ) {
            let layout = StubLayout {
                id: Rc::clone(&self.layout_id),
            };
            let mut ctx = KeyContext {
                engine: &mut self.handle,
                layout: &layout,
                input_method: ime,
                menu: &mut self.menu,
            };
            KeyInput {
                surface: self.surface,
                state: &mut self.state,
            }
            .key_down(event, &mut ctx);
        }

        fn perform(
            &mut self,
            event: &NativeKeyEvent,
            chord: (bool, u32),
        ) -> bool {
            let layout = StubLayout {
                id: Rc::clone(&self.layout_id),
            };
            let mut ime = ime(Script::Passthrough);
            let mut ctx = KeyContext {
                engine: &mut self.handle,
                layout: &layout,
                input_method: &mut ime,
                menu: &mut self.menu,
            };
            KeyInput {
                surface: self.surface,
                state: &mut self.state,
            }
            .perform_key_equivalent(event, true, chord, &mut ctx)
        }

        fn keys(&self) -> Vec<KeyEvent> {
            self.probe
                .surface(self.surface)
                .map(|log| log.keys.clone())
                .unwrap_or_default()
        }
    }

    fn ime(script: Script) -> StubInputMethod {
        StubInputMethod {
            script,
            seen: Vec::new(),
        }
    }

    #[test]
    fn given_ime_commits_two_strings_when_key_down_then_two_text_events_are_sent()
     {
        let mut fixture = Fixture::new();
        let mut ime = ime(Script::Commit(vec!["é", "!"]));

        fixture.key_down(
            &NativeKeyEvent::key_down(0x0E, NativeModifiers::empty(), "e"),
            &mut ime,
        );

        let keys = fixture.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].text.as_deref(), Some("é"));
        assert_eq!(keys[1].text.as_deref(), Some("!"));
        assert!(keys.iter().all(|key| !key.composing));
        assert!(keys.iter().all(|key| key.action == KeyAction::Press));
        let log = fixture.probe.surface(fixture.surface).expect("live");
        assert!(log.texts.is_empty());
    }

    #[test]
    fn given_plain_key_when_key_down_then_one_event_carries_characters() {
        let mut fixture = Fixture::new();
        let mut ime = ime(Script::Passthrough);

        fixture.key_down(
            &NativeKeyEvent::key_down(
                0x00,
                NativeModifiers::SHIFT | NativeModifiers::LEFT_SHIFT,
                "A",
            ),
            &mut ime,
        );

        let keys = fixture.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].text.as_deref(), Some("A"));
        assert_eq!(keys[0].mods, Mods::SHIFT);
        assert_eq!(keys[0].consumed_mods, Mods::SHIFT);
        assert_eq!(keys[0].unshifted_codepoint, u32::from('a'));
        assert!(!keys[0].composing);
    }

    #[test]
    fn given_control_character_when_key_down_then_base_character_is_sent() {
        let mut fixture = Fixture::new();
        let mut ime = ime(Script::Passthrough);

        fixture.key_down(
            &NativeKeyEvent::key_down(0x00, NativeModifiers::CONTROL, "\u{1}"),
            &mut ime,
        );

        let keys = fixture.keys();
        assert_eq!(keys[0].text.as_deref(), Some("a"));
        assert_eq!(keys[0].mods, Mods::CTRL);
        assert_eq!(keys[0].consumed_mods, Mods::empty());
    }

    #[test]
    fn given_function_key_when_key_down_then_no_text_is_sent() {
        let mut fixture = Fixture::new();
        let mut ime = ime(Script::Passthrough);

        fixture.key_down(
            &NativeKeyEvent::key_down(
                0x7E,
                NativeModifiers::FUNCTION,
                "\u{F700}",
            ),
            &mut ime,
        );

        let keys = fixture.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].text, None);
    }

    #[test]
    fn given_composition_when_key_down_then_preedit_is_sent_and_key_is_composing()
     {
        let mut fixture = Fixture::new();
        let mut ime = ime(Script::Mark("´"));

        fixture.key_down(
            &NativeKeyEvent::key_down(0x0E, NativeModifiers::OPTION, "´"),
            &mut ime,
        );

        let log = fixture.probe.surface(fixture.surface).expect("live");
        assert_eq!(log.preedits, vec![Some("´".to_string())]);
        assert!(log.keys[0].composing);
        assert_eq!(fixture.state.marked_text(), "´");
    }

    #[test]
    fn given_layout_switch_when_key_down_then_nothing_is_sent() {
        let mut fixture = Fixture::new();
        let mut ime = ime(Script::SwitchLayout(Rc::clone(&fixture.layout_id)));

        fixture.key_down(
            &NativeKeyEvent::key_down(0x31, NativeModifiers::CONTROL, " "),
            &mut ime,
        );

        assert!(fixture.keys().is_empty());
    }

    #[test]
    fn given_translation_mods_when_key_down_then_input_method_sees_them() {
        let mut fixture = Fixture::new();
        fixture.probe.state_mut().translation_mods = Some(Mods::empty());
        let mut ime = ime(Script::Passthrough);

        fixture.key_down(
            &NativeKeyEvent::key_down(0x00, NativeModifiers::OPTION, "å"),
            &mut ime,
        );

        assert_eq!(ime.seen[0].modifiers, NativeModifiers::empty());
        assert_eq!(ime.seen[0].characters.as_deref(), Some("a"));
        let keys = fixture.keys();
        assert_eq!(keys[0].mods, Mods::ALT);
        assert_eq!(keys[0].consumed_mods, Mods::empty());
    }

    #[test]
    fn given_right_shift_released_when_flags_change_then_release_is_sent() {
        let mut fixture = Fixture::new();
        let layout = StubLayout {
            id: Rc::clone(&fixture.layout_id),
        };
        let mut ime = ime(Script::Passthrough);
        let mut menu = StubMenu::default();
        let mut ctx = KeyContext {
            engine: &mut fixture.handle,
            layout: &layout,
            input_method: &mut ime,
            menu: &mut menu,
        };
        let mut input = KeyInput {
            surface: fixture.surface,
            state: &mut fixture.state,
        };
        let flags = |modifiers| NativeKeyEvent {
            kind: NativeKeyKind::FlagsChanged,
            keycode: 0x3C,
            modifiers,
            characters: None,
            characters_ignoring_modifiers: None,
            is_repeat: false,
            timestamp: 1.0,
        };

        input.flags_changed(
            &flags(NativeModifiers::SHIFT | NativeModifiers::RIGHT_SHIFT),
            &mut ctx,
        );
        // Left shift still held.
        input.flags_changed(
            &flags(NativeModifiers::SHIFT | NativeModifiers::LEFT_SHIFT),
            &mut ctx,
        );

        let keys = fixture.keys();
        assert_eq!(keys[0].action, KeyAction::Press);
        assert_eq!(keys[0].mods, Mods::SHIFT | Mods::SHIFT_RIGHT);
        assert_eq!(keys[1].action, KeyAction::Release);
    }

    #[test]
    fn given_menu_first_table_when_evaluated_then_only_consumed_plain_bindings_qualify()
     {
        assert!(menu_first(BindingFlags::CONSUMED, false, 0));
        assert!(!menu_first(BindingFlags::CONSUMED, true, 0));
        assert!(!menu_first(BindingFlags::CONSUMED, false, 1));
        assert!(!menu_first(
            BindingFlags::CONSUMED | BindingFlags::ALL,
            false,
            0
        ));
        assert!(!menu_first(
            BindingFlags::CONSUMED | BindingFlags::PERFORMABLE,
            false,
            0
        ));
        assert!(!menu_first(BindingFlags::empty(), false, 0));
    }

    #[test]
    fn given_consumed_binding_when_menu_claims_it_then_terminal_gets_nothing() {
        let mut fixture = Fixture::new();
        fixture.probe.state_mut().bindings =
            vec![(0x00, Mods::SUPER, BindingFlags::CONSUMED)];
        fixture.menu.claims = true;
        let event =
            NativeKeyEvent::key_down(0x00, NativeModifiers::COMMAND, "a");

        assert!(fixture.perform(&event, (false, 0)));

        assert_eq!(fixture.menu.offered, 1);
        assert!(fixture.keys().is_empty());
    }

    #[test]
    fn given_active_key_table_when_binding_matches_then_terminal_wins() {
        let mut fixture = Fixture::new();
        fixture.probe.state_mut().bindings =
            vec![(0x00, Mods::SUPER, BindingFlags::CONSUMED)];
        fixture.menu.claims = true;
        let event =
            NativeKeyEvent::key_down(0x00, NativeModifiers::COMMAND, "a");

        assert!(fixture.perform(&event, (false, 1)));

        assert_eq!(fixture.menu.offered, 0);
        assert_eq!(fixture.keys().len(), 1);
    }

    #[test]
    fn given_ctrl_return_when_not_bound_then_return_is_sent() {
        let mut fixture = Fixture::new();
        let event =
            NativeKeyEvent::key_down(0x24, NativeModifiers::CONTROL, "\r");

        assert!(fixture.perform(&event, (false, 0)));

        let keys = fixture.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].mods, Mods::CTRL);
    }

    #[test]
    fn given_ctrl_slash_when_not_bound_then_underscore_is_sent() {
        let mut fixture = Fixture::new();
        let event =
            NativeKeyEvent::key_down(0x2C, NativeModifiers::CONTROL, "/");

        assert!(fixture.perform(&event, (false, 0)));

        assert_eq!(fixture.keys()[0].text.as_deref(), Some("_"));
    }

    #[test]
    fn given_command_key_when_seen_twice_then_second_pass_sends_it() {
        let mut fixture = Fixture::new();
        let event = NativeKeyEvent {
            timestamp: 42.0,
            ..NativeKeyEvent::key_down(0x00, NativeModifiers::COMMAND, "a")
        };

        assert!(!fixture.perform(&event, (false, 0)));
        assert!(fixture.perform(&event, (false, 0)));

        assert_eq!(fixture.keys()[0].text.as_deref(), Some("a"));
    }

    #[test]
    fn given_insert_outside_key_down_when_committed_then_text_is_written() {
        let mut fixture = Fixture::new();
        fixture.state.marked_text = "か".into();

        TextInput {
            surface: fixture.surface,
            state: &mut fixture.state,
            engine: &mut fixture.handle,
        }
        .insert_text("蚊");

        let log = fixture.probe.surface(fixture.surface).expect("live");
        assert_eq!(log.preedits, vec![None]);
        assert_eq!(log.texts, vec!["蚊".to_string()]);
    }
}
