use std::time::{Duration, Instant};

use arbor_engine::action::{
    CloseTabMode, GotoTab, KeyTable, MouseShape, MouseVisibility,
    ProgressState, SecureInput,
};
use arbor_engine::{Action, EngineHandle, SurfaceId};

use crate::split::SplitAction;
use crate::state::{KeyTableTag, SurfaceState};

/// How long a progress report may stay without a follow-up before it is
/// cleared on the reporter's behalf.
pub const PROGRESS_RESET_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    Undo,
    Redo,
}

/// View-layer effects the bridge may trigger directly.
pub trait ViewSink {
    fn set_mouse_shape(&mut self, shape: MouseShape);
    fn set_mouse_visibility(&mut self, visibility: MouseVisibility);
    fn update_scrollbar(&mut self, total: u64, offset: u64, len: u64);
    fn update_cell_size(&mut self, width: u32, height: u32);
    fn set_password_input(&mut self, mode: SecureInput);
    fn perform_edit(&mut self, command: EditCommand);
}

/// Sink for bridges that are not attached to a view.
#[derive(Debug, Default)]
pub struct DetachedView;

impl ViewSink for DetachedView {
    fn set_mouse_shape(&mut self, _shape: MouseShape) {}
    fn set_mouse_visibility(&mut self, _visibility: MouseVisibility) {}
    fn update_scrollbar(&mut self, _total: u64, _offset: u64, _len: u64) {}
    fn update_cell_size(&mut self, _width: u32, _height: u32) {}
    fn set_password_input(&mut self, _mode: SecureInput) {}
    fn perform_edit(&mut self, _command: EditCommand) {}
}

type Hook<A> = Option<Box<dyn FnMut(A)>>;
type Handler<A> = Option<Box<dyn FnMut(A) -> bool>>;

#[derive(Default)]
struct Callbacks {
    title_change: Hook<String>,
    close_request: Hook<bool>,
    new_tab: Handler<()>,
    close_tab: Handler<CloseTabMode>,
    goto_tab: Handler<GotoTab>,
    move_tab: Handler<isize>,
    command_palette_toggle: Handler<()>,
    progress_report: Hook<ProgressState>,
    desktop_notification: Hook<(String, String)>,
    split_action: Handler<SplitAction>,
}

/// Per-surface protocol adapter between the engine's actions and the host.
///
/// Owns the [`SurfaceState`] record and the optional host callbacks.
/// Every action lands in [`SurfaceBridge::handle_action`], which never
/// fails: unknown or unmodeled input is reported as not handled.
pub struct SurfaceBridge {
    surface: SurfaceId,
    state: SurfaceState,
    callbacks: Callbacks,
    progress_deadline: Option<Instant>,
}

impl SurfaceBridge {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            state: SurfaceState::default(),
            callbacks: Callbacks::default(),
            progress_deadline: None,
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    pub fn on_title_change(&mut self, hook: impl FnMut(String) + 'static) {
        self.callbacks.title_change = Some(Box::new(hook));
    }

    pub fn on_close_request(&mut self, hook: impl FnMut(bool) + 'static) {
        self.callbacks.close_request = Some(Box::new(hook));
    }

    pub fn on_new_tab(&mut self, mut handler: impl FnMut() -> bool + 'static) {
        self.callbacks.new_tab = Some(Box::new(move |()| handler()));
    }

    pub fn on_close_tab(
        &mut self,
        handler: impl FnMut(CloseTabMode) -> bool + 'static,
    ) {
        self.callbacks.close_tab = Some(Box::new(handler));
    }

    pub fn on_goto_tab(
        &mut self,
        handler: impl FnMut(GotoTab) -> bool + 'static,
    ) {
        self.callbacks.goto_tab = Some(Box::new(handler));
    }

    pub fn on_move_tab(
        &mut self,
        handler: impl FnMut(isize) -> bool + 'static,
    ) {
        self.callbacks.move_tab = Some(Box::new(handler));
    }

    pub fn on_command_palette_toggle(
        &mut self,
        mut handler: impl FnMut() -> bool + 'static,
    ) {
        self.callbacks.command_palette_toggle =
            Some(Box::new(move |()| handler()));
    }

    pub fn on_progress_report(
        &mut self,
        hook: impl FnMut(ProgressState) + 'static,
    ) {
        self.callbacks.progress_report = Some(Box::new(hook));
    }

    pub fn on_desktop_notification(
        &mut self,
        mut hook: impl FnMut(String, String) + 'static,
    ) {
        self.callbacks.desktop_notification =
            Some(Box::new(move |(title, body)| hook(title, body)));
    }

    pub fn on_split_action(
        &mut self,
        handler: impl FnMut(SplitAction) -> bool + 'static,
    ) {
        self.callbacks.split_action = Some(Box::new(handler));
    }

    /// Apply one engine action. Returns whether it was fully consumed.
    pub fn handle_action(
        &mut self,
        action: Action,
        now: Instant,
        view: &mut dyn ViewSink,
    ) -> bool {
        match action {
            action @ (Action::NewTab
            | Action::CloseTab(_)
            | Action::GotoTab(_)
            | Action::MoveTab { .. }
            | Action::ToggleCommandPalette
            | Action::GotoWindow
            | Action::ToggleQuickTerminal
            | Action::CloseAllWindows
            | Action::Undo
            | Action::Redo) => self.handle_app_action(action, view),
            action @ (Action::NewSplit(_)
            | Action::GotoSplit(_)
            | Action::ResizeSplit { .. }
            | Action::EqualizeSplits
            | Action::ToggleSplitZoom) => self.handle_split_action(action),
            action @ (Action::SetTitle { .. }
            | Action::PromptTitle(_)
            | Action::Pwd { .. }
            | Action::DesktopNotification { .. }) => {
                self.handle_title_action(action)
            },
            action @ (Action::ProgressReport { .. }
            | Action::CommandFinished { .. }
            | Action::ShowChildExited { .. }
            | Action::Readonly(_)
            | Action::RingBell) => self.handle_status_action(action, now),
            action @ (Action::MouseShape(_)
            | Action::MouseVisibility(_)
            | Action::MouseOverLink { .. }
            | Action::RendererHealth(_)
            | Action::OpenUrl { .. }
            | Action::ColorChange { .. }) => {
                self.handle_mouse_action(action, view)
            },
            action @ (Action::Scrollbar { .. }
            | Action::StartSearch { .. }
            | Action::EndSearch
            | Action::SearchTotal(_)
            | Action::SearchSelected(_)) => {
                self.handle_search_action(action, view)
            },
            action @ (Action::SizeLimit { .. }
            | Action::InitialSize { .. }
            | Action::CellSize { .. }
            | Action::ResetWindowSize
            | Action::KeySequence { .. }
            | Action::KeyTable(_)) => self.handle_size_action(action, view),
            action @ (Action::SecureInput(_)
            | Action::FloatWindow(_)
            | Action::ReloadConfig { .. }
            | Action::ConfigChange { .. }
            | Action::OpenConfig
            | Action::PresentTerminal
            | Action::QuitTimer(_)) => self.handle_config_action(action, view),
            Action::Unknown(_) => false,
        }
    }

    fn handle_app_action(
        &mut self,
        action: Action,
        view: &mut dyn ViewSink,
    ) -> bool {
        let callbacks = &mut self.callbacks;
        match action {
            Action::NewTab => invoke(&mut callbacks.new_tab, ()),
            Action::CloseTab(mode) => invoke(&mut callbacks.close_tab, mode),
            Action::GotoTab(target) => invoke(&mut callbacks.goto_tab, target),
            Action::MoveTab { amount } => {
                invoke(&mut callbacks.move_tab, amount)
            },
            Action::ToggleCommandPalette => {
                invoke(&mut callbacks.command_palette_toggle, ())
            },
            Action::Undo => {
                view.perform_edit(EditCommand::Undo);
                true
            },
            Action::Redo => {
                view.perform_edit(EditCommand::Redo);
                true
            },
            _ => false,
        }
    }

    fn handle_split_action(&mut self, action: Action) -> bool {
        let split = match action {
            Action::NewSplit(direction) => SplitAction::new_split(direction),
            Action::GotoSplit(direction) => SplitAction::goto_split(direction),
            Action::ResizeSplit { direction, amount } => {
                SplitAction::resize_split(direction, amount)
            },
            Action::EqualizeSplits => Some(SplitAction::EqualizeSplits),
            Action::ToggleSplitZoom => Some(SplitAction::ToggleSplitZoom),
            _ => None,
        };
        match split {
            Some(split) => invoke(&mut self.callbacks.split_action, split),
            None => false,
        }
    }

    fn handle_title_action(&mut self, action: Action) -> bool {
        match action {
            Action::SetTitle { title: Some(title) } => {
                self.state.title = title.clone();
                fire(&mut self.callbacks.title_change, title);
            },
            Action::PromptTitle(target) => {
                self.state.prompt_title = Some(target)
            },
            Action::Pwd { pwd } => self.state.pwd = pwd,
            Action::DesktopNotification { title, body } => {
                let title = title.unwrap_or_default();
                let body = body.unwrap_or_default();
                if !title.is_empty() || !body.is_empty() {
                    fire(
                        &mut self.callbacks.desktop_notification,
                        (title, body),
                    );
                }
            },
            _ => {},
        }
        false
    }

    fn handle_status_action(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::ProgressReport { state, progress } => {
                self.apply_progress(state, progress, now)
            },
            Action::CommandFinished {
                exit_code,
                duration,
            } => {
                self.state.command_exit_code =
                    (exit_code >= 0).then_some(exit_code);
                self.state.command_duration = Some(duration);
            },
            Action::ShowChildExited { exit_code, runtime } => {
                self.state.child_exit_code = Some(exit_code);
                self.state.child_runtime = Some(runtime);
            },
            Action::Readonly(read_only) => self.state.read_only = read_only,
            Action::RingBell => self.state.bell_count += 1,
            _ => {},
        }
        false
    }

    fn apply_progress(
        &mut self,
        progress_state: ProgressState,
        progress: i8,
        now: Instant,
    ) {
        self.progress_deadline = None;
        if progress_state == ProgressState::Remove {
            self.state.progress_state = None;
            self.state.progress_value = None;
        } else {
            self.state.progress_state = Some(progress_state);
            self.state.progress_value =
                u8::try_from(progress).ok().map(|value| value.min(100));
            self.progress_deadline = Some(now + PROGRESS_RESET_TIMEOUT);
        }
        fire(&mut self.callbacks.progress_report, progress_state);
    }

    fn handle_mouse_action(
        &mut self,
        action: Action,
        view: &mut dyn ViewSink,
    ) -> bool {
        match action {
            Action::MouseShape(shape) => {
                self.state.mouse_shape = Some(shape);
                view.set_mouse_shape(shape);
            },
            Action::MouseVisibility(visibility) => {
                self.state.mouse_visibility = Some(visibility);
                view.set_mouse_visibility(visibility);
            },
            Action::MouseOverLink { url } => self.state.mouse_over_link = url,
            Action::RendererHealth(health) => {
                self.state.renderer_health = Some(health)
            },
            Action::OpenUrl { kind, url } => {
                self.state.open_url_kind = Some(kind);
                self.state.open_url = Some(url);
            },
            Action::ColorChange { kind, r, g, b } => {
                self.state.color_change = Some((kind, [r, g, b]))
            },
            _ => {},
        }
        false
    }

    fn handle_search_action(
        &mut self,
        action: Action,
        view: &mut dyn ViewSink,
    ) -> bool {
        match action {
            Action::Scrollbar { total, offset, len } => {
                view.update_scrollbar(total, offset, len)
            },
            Action::StartSearch { needle } => {
                self.state.search_needle = Some(needle.unwrap_or_default());
                self.state.search_total = None;
                self.state.search_selected = None;
                self.state.search_focus_count += 1;
            },
            Action::EndSearch => {
                self.state.search_needle = None;
                self.state.search_total = None;
                self.state.search_selected = None;
            },
            Action::SearchTotal(total) => {
                self.state.search_total = usize::try_from(total).ok()
            },
            Action::SearchSelected(selected) => {
                self.state.search_selected = usize::try_from(selected).ok()
            },
            _ => {},
        }
        false
    }

    fn handle_size_action(
        &mut self,
        action: Action,
        view: &mut dyn ViewSink,
    ) -> bool {
        match action {
            Action::SizeLimit {
                min_width,
                min_height,
                max_width,
                max_height,
            } => {
                self.state.size_limit_min = Some((min_width, min_height));
                self.state.size_limit_max = Some((max_width, max_height));
            },
            Action::InitialSize { width, height } => {
                self.state.initial_size = Some((width, height))
            },
            Action::CellSize { width, height } => {
                view.update_cell_size(width, height)
            },
            Action::ResetWindowSize => self.state.reset_window_size_count += 1,
            Action::KeySequence { active, trigger } => {
                self.state.key_sequence_active = active;
                self.state.key_sequence_trigger =
                    if active { trigger } else { None };
            },
            Action::KeyTable(table) => self.apply_key_table(table),
            _ => {},
        }
        false
    }

    fn apply_key_table(&mut self, table: KeyTable) {
        let state = &mut self.state;
        match table {
            KeyTable::Activate { name } => {
                state.key_table_tag = Some(KeyTableTag::Activate);
                state.key_table_name = Some(name);
                state.key_table_depth += 1;
            },
            KeyTable::Deactivate => {
                state.key_table_tag = Some(KeyTableTag::Deactivate);
                state.key_table_name = None;
                state.key_table_depth = state.key_table_depth.saturating_sub(1);
            },
            KeyTable::DeactivateAll => {
                state.key_table_tag = Some(KeyTableTag::DeactivateAll);
                state.key_table_name = None;
                state.key_table_depth = 0;
            },
        }
    }

    fn handle_config_action(
        &mut self,
        action: Action,
        view: &mut dyn ViewSink,
    ) -> bool {
        match action {
            Action::SecureInput(mode) => {
                self.state.secure_input = Some(mode);
                view.set_password_input(mode);
            },
            Action::FloatWindow(mode) => self.state.float_window = Some(mode),
            Action::ReloadConfig { soft } => {
                self.state.reload_config_soft = Some(soft)
            },
            Action::ConfigChange { .. } => self.state.config_change_count += 1,
            Action::OpenConfig => self.state.open_config_count += 1,
            Action::PresentTerminal => self.state.present_terminal_count += 1,
            Action::QuitTimer(timer) => self.state.quit_timer = Some(timer),
            _ => {},
        }
        false
    }

    /// When the pending progress reset is due, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.progress_deadline
    }

    /// Fire timers that are due at `now`. Returns whether anything fired.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        match self.progress_deadline {
            Some(deadline) if deadline <= now => {
                log::debug!("progress on surface {} timed out", self.surface);
                self.apply_progress(ProgressState::Remove, -1, now);
                true
            },
            _ => false,
        }
    }

    /// Write `text` into the surface as if it was pasted.
    pub fn send_text(&self, engine: &mut EngineHandle, text: &str) {
        if let Some(surface) = engine.surface_mut(self.surface) {
            surface.text(text);
        }
    }

    /// Type `command` and press enter.
    pub fn send_command(&self, engine: &mut EngineHandle, command: &str) {
        self.send_text(engine, &format!("{command}\n"));
    }

    /// The engine asked to close this surface.
    pub fn close_surface(&mut self, process_alive: bool) {
        fire(&mut self.callbacks.close_request, process_alive);
    }
}

fn invoke<A>(handler: &mut Handler<A>, arg: A) -> bool {
    handler.as_mut().is_some_and(|handler| handler(arg))
}

fn fire<A>(hook: &mut Hook<A>, arg: A) {
    if let Some(hook) = hook.as_mut() {
        hook(arg);
    }
}
