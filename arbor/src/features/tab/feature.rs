use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use arbor_engine::action::{GotoTab, ProgressState};
use arbor_engine::{
    Action, ActionDispatcher, EngineHandle, SurfaceId, SurfaceOptions,
};
use arbor_ui_term::{
    ActionContext, AppMenu, FocusRequest, SecureInputContext, SurfaceView,
};
use flume::{Receiver, Sender};

use super::errors::{Result, TabError};
use super::event::{TabEvent, wire_callbacks};
use super::model::{Tab, TabId, TabKind};
use super::state::TabState;
use super::status::SessionStatus;
use crate::features::notification::Notifier;
use crate::paths;
use crate::services::{RecentWorktreeStore, ToolSettings};

/// Owns every open tab and the worktree/tab selection.
///
/// Surface callbacks are queued as [`TabEvent`]s and reduced by
/// [`TabManager::process_events`]; dispatching engine actions through the
/// manager does this automatically.
pub struct TabManager {
    state: TabState,
    tools: ToolSettings,
    search_path: Option<OsString>,
    recent: Option<RecentWorktreeStore>,
    notifier: Notifier,
    secure_input: SecureInputContext,
    menu: Box<dyn AppMenu>,
    sender: Sender<TabEvent>,
    receiver: Receiver<TabEvent>,
    pending_focus: Option<FocusRequest>,
}

impl TabManager {
    pub fn new(
        secure_input: SecureInputContext,
        menu: Box<dyn AppMenu>,
    ) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            state: TabState::default(),
            tools: ToolSettings::default(),
            search_path: env::var_os("PATH"),
            recent: None,
            notifier: Notifier::default(),
            secure_input,
            menu,
            sender,
            receiver,
            pending_focus: None,
        }
    }

    pub fn with_tools(mut self, tools: ToolSettings) -> Self {
        self.tools = tools;
        self
    }

    /// Directories searched for tool executables instead of `PATH`.
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_recent_store(mut self, store: RecentWorktreeStore) -> Self {
        self.recent = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn tabs(&self) -> &[Tab] {
        self.state.tabs()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.state.tab(id)
    }

    pub fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.state.tab_mut(id)
    }

    pub fn selected_tab_id(&self) -> Option<TabId> {
        self.state.selected_tab()
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.state.selected_tab().and_then(|id| self.state.tab(id))
    }

    pub fn selected_worktree(&self) -> Option<&Path> {
        self.state.selected_worktree()
    }

    /// Tabs of the selected worktree, in tab order.
    pub fn visible_tabs(&self) -> Vec<&Tab> {
        match self.state.selected_worktree() {
            Some(worktree) => self.state.tabs_in(worktree).collect(),
            None => Vec::new(),
        }
    }

    /// Tab remembered as last active in `worktree`.
    pub fn last_selected_tab(&self, worktree: &Path) -> Option<TabId> {
        self.state.last_selected(&paths::standardize(worktree))
    }

    pub fn has_running_terminals(&self) -> bool {
        !self.state.tabs().is_empty()
    }

    pub fn session_status(&self, worktree: &Path) -> SessionStatus {
        let worktree = paths::standardize(worktree);
        SessionStatus::of_tabs(self.state.tabs_in(&worktree))
    }

    /// Worktrees with open tabs, in first-opened order.
    pub fn active_worktree_paths(&self) -> Vec<PathBuf> {
        self.state.active_worktrees()
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn set_tools(&mut self, tools: ToolSettings) {
        self.tools = tools;
    }

    pub fn recent_store(&self) -> Option<&RecentWorktreeStore> {
        self.recent.as_ref()
    }

    pub fn secure_input(&self) -> &SecureInputContext {
        &self.secure_input
    }

    pub fn secure_input_mut(&mut self) -> &mut SecureInputContext {
        &mut self.secure_input
    }

    /// Show `worktree`, restoring its last active tab or opening an agent
    /// tab when it has none.
    pub fn select_worktree(
        &mut self,
        engine: &mut EngineHandle,
        worktree: &Path,
    ) -> Result<TabId> {
        let worktree = paths::standardize(worktree);
        self.record_recent(&worktree);

        let previous = self
            .selected_tab()
            .map(|tab| (tab.id(), tab.worktree().to_path_buf()));
        if let Some((id, previous_worktree)) = &previous {
            self.state.remember(previous_worktree.clone(), *id);
            if *previous_worktree == worktree {
                return Ok(*id);
            }
        }
        let outgoing = previous.map(|(id, _)| id);

        let remembered = self.state.last_selected(&worktree).filter(|id| {
            self.state
                .tab(*id)
                .is_some_and(|tab| tab.worktree() == worktree)
        });
        let target = remembered
            .or_else(|| self.state.tabs_in(&worktree).next().map(Tab::id));

        match target {
            Some(target) => {
                self.state.select(worktree, Some(target));
                self.transfer_focus(engine, outgoing, target);
                Ok(target)
            },
            None => {
                self.spawn_tab(engine, TabKind::default(), worktree, outgoing)
            },
        }
    }

    /// Open a tab of `kind` in `working_directory` and select it.
    pub fn create_tab(
        &mut self,
        engine: &mut EngineHandle,
        kind: TabKind,
        working_directory: &Path,
    ) -> Result<TabId> {
        let outgoing = self.state.selected_tab();
        self.spawn_tab(
            engine,
            kind,
            paths::standardize(working_directory),
            outgoing,
        )
    }

    /// Close `id`, freeing its surface before returning.
    pub fn close_tab(
        &mut self,
        engine: &mut EngineHandle,
        id: TabId,
    ) -> bool {
        let Some(mut tab) = self.state.remove(id) else {
            return false;
        };
        tab.view_mut().close(engine, &mut self.secure_input);
        self.cancel_focus(tab.surface());
        self.state.forget(tab.worktree(), id);
        log::debug!("closed tab {id} in {}", tab.worktree().display());

        if self.state.selected_tab() == Some(id) {
            match self.state.visible_ids().first().copied() {
                Some(next) => {
                    self.state.set_selected_tab(Some(next));
                    self.state.remember(tab.worktree().to_path_buf(), next);
                    self.request_focus(engine, next);
                },
                None => self.state.clear_selection(),
            }
        }
        debug_assert!(self.state.is_consistent());
        true
    }

    /// Select `id` among the visible tabs.
    pub fn select_tab(
        &mut self,
        engine: &mut EngineHandle,
        id: TabId,
    ) -> bool {
        if !self.state.visible_ids().contains(&id) {
            return false;
        }
        let previous = self.state.selected_tab();
        self.state.set_selected_tab(Some(id));
        if let Some(tab) = self.state.tab_mut(id) {
            tab.set_notification(false);
            let worktree = tab.worktree().to_path_buf();
            self.state.remember(worktree, id);
        }
        self.transfer_focus(engine, previous, id);
        true
    }

    pub fn select_next_tab(&mut self, engine: &mut EngineHandle) -> bool {
        self.select_relative(engine, 1)
    }

    pub fn select_previous_tab(&mut self, engine: &mut EngineHandle) -> bool {
        self.select_relative(engine, -1)
    }

    pub fn select_last_tab(&mut self, engine: &mut EngineHandle) -> bool {
        match self.state.visible_ids().last().copied() {
            Some(id) => self.select_tab(engine, id),
            None => false,
        }
    }

    /// Select the `index`th visible tab.
    pub fn select_tab_by_index(
        &mut self,
        engine: &mut EngineHandle,
        index: usize,
    ) -> bool {
        match self.state.visible_ids().get(index).copied() {
            Some(id) => self.select_tab(engine, id),
            None => false,
        }
    }

    /// Select the `index`th worktree of [`Self::active_worktree_paths`].
    pub fn select_worktree_by_index(
        &mut self,
        engine: &mut EngineHandle,
        index: usize,
    ) -> Result<Option<TabId>> {
        let worktrees = self.active_worktree_paths();
        let Some(worktree) = worktrees.get(index) else {
            return Ok(None);
        };
        self.select_worktree(engine, worktree).map(Some)
    }

    pub fn app_did_become_active(&mut self) {
        self.secure_input.app_did_become_active();
    }

    pub fn app_did_resign_active(&mut self) {
        self.secure_input.app_did_resign_active();
    }

    /// Reduce queued surface callbacks. Returns how many were handled.
    pub fn process_events(&mut self, engine: &mut EngineHandle) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.reduce(engine, event);
            count += 1;
        }
        count
    }

    /// Fire due progress resets and focus retries.
    pub fn poll_timers(&mut self, engine: &mut EngineHandle, now: Instant) {
        for tab in self.state.tabs_mut() {
            tab.view_mut().poll_timers(now);
        }
        if let Some(mut request) = self.pending_focus.take() {
            let target = request.target();
            let finished = match self.state.tab_by_surface_mut(target) {
                Some(tab) => tab.view_mut().poll_focus(
                    &mut request,
                    now,
                    engine,
                    &mut self.secure_input,
                ),
                None => true,
            };
            if !finished {
                self.pending_focus = Some(request);
            }
        }
        self.process_events(engine);
    }

    /// Earliest instant [`Self::poll_timers`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state
            .tabs()
            .iter()
            .filter_map(|tab| tab.view().next_deadline())
            .chain(self.pending_focus.as_ref().map(FocusRequest::due))
            .min()
    }

    fn reduce(&mut self, engine: &mut EngineHandle, event: TabEvent) {
        match event {
            TabEvent::SetTitle { tab_id, title } => {
                if let Some(tab) = self.state.tab_mut(tab_id) {
                    tab.set_title(title);
                }
            },
            TabEvent::CloseRequested { tab_id, .. }
            | TabEvent::CloseTab { tab_id, .. } => {
                self.close_tab(engine, tab_id);
            },
            TabEvent::Progress { tab_id, state } => {
                let running = match state {
                    ProgressState::Set | ProgressState::Indeterminate => true,
                    ProgressState::Remove => false,
                    _ => return,
                };
                if let Some(tab) = self.state.tab_mut(tab_id) {
                    tab.set_running(running);
                }
            },
            TabEvent::Notification {
                tab_id,
                title,
                body,
            } => {
                let selected = self.state.selected_tab();
                if let Some(tab) = self.state.tab_mut(tab_id) {
                    if selected != Some(tab_id) {
                        tab.set_notification(true);
                    }
                }
                self.notifier.post(&title, &body);
            },
            TabEvent::NewTab { tab_id } => {
                let Some(worktree) = self
                    .state
                    .tab(tab_id)
                    .map(|tab| tab.worktree().to_path_buf())
                else {
                    return;
                };
                let result = self.create_tab(engine, TabKind::Shell, &worktree);
                if let Err(err) = result {
                    log::warn!("engine new-tab failed: {err}");
                }
            },
            TabEvent::GotoTab { target } => {
                match target {
                    GotoTab::PREVIOUS => self.select_previous_tab(engine),
                    GotoTab::NEXT => self.select_next_tab(engine),
                    GotoTab::LAST => self.select_last_tab(engine),
                    GotoTab(index) => match usize::try_from(index) {
                        Ok(index) => self.select_tab_by_index(engine, index),
                        Err(_) => false,
                    },
                };
            },
        }
    }

    fn spawn_tab(
        &mut self,
        engine: &mut EngineHandle,
        kind: TabKind,
        worktree: PathBuf,
        outgoing: Option<TabId>,
    ) -> Result<TabId> {
        if let Some(executable) = self
            .tools
            .missing_executable(&kind, self.search_path.as_deref())?
        {
            log::warn!(
                "{} is unavailable: {executable} not found",
                kind.display_name()
            );
            return Err(TabError::ToolUnavailable {
                display: kind.display_name().to_string(),
                executable,
            });
        }

        if let Some(outgoing) = outgoing {
            self.lose_focus(engine, outgoing);
        }
        let options = SurfaceOptions {
            working_directory: Some(worktree.clone()),
            initial_input: self.tools.command(&kind).map(str::to_string),
            ..SurfaceOptions::default()
        };
        let surface = match engine.create_surface(options) {
            Ok(surface) => surface,
            Err(err) => {
                if let Some(outgoing) = outgoing {
                    self.request_focus(engine, outgoing);
                }
                return Err(err.into());
            },
        };

        let view = SurfaceView::new(surface);
        let mut tab = Tab::new(kind, worktree.clone(), view);
        let id = tab.id();
        wire_callbacks(tab.view_mut(), id, &self.sender);
        log::debug!(
            "opened {} tab {id} in {}",
            tab.kind().display_name(),
            worktree.display()
        );
        self.state.push(tab);
        self.state.select(worktree, Some(id));
        self.request_focus(engine, id);
        Ok(id)
    }

    fn select_relative(
        &mut self,
        engine: &mut EngineHandle,
        step: isize,
    ) -> bool {
        let visible = self.state.visible_ids();
        let Some(current) = self
            .state
            .selected_tab()
            .and_then(|id| visible.iter().position(|tab| *tab == id))
        else {
            return false;
        };
        let count = visible.len() as isize;
        let next = (current as isize + step).rem_euclid(count) as usize;
        self.select_tab(engine, visible[next])
    }

    /// Focus-lost for `from` strictly before focus-gained for `to`.
    fn transfer_focus(
        &mut self,
        engine: &mut EngineHandle,
        from: Option<TabId>,
        to: TabId,
    ) {
        if from == Some(to) {
            return;
        }
        if let Some(from) = from {
            self.lose_focus(engine, from);
        }
        self.request_focus(engine, to);
    }

    fn lose_focus(&mut self, engine: &mut EngineHandle, id: TabId) {
        let Some(tab) = self.state.tab_mut(id) else {
            return;
        };
        let surface = tab.surface();
        tab.view_mut()
            .focus_did_change(engine, &mut self.secure_input, false);
        self.cancel_focus(surface);
    }

    fn request_focus(&mut self, engine: &mut EngineHandle, id: TabId) {
        let Some(tab) = self.state.tab_mut(id) else {
            return;
        };
        let now = Instant::now();
        let mut request = FocusRequest::new(tab.surface(), now);
        let finished = tab.view_mut().poll_focus(
            &mut request,
            now,
            engine,
            &mut self.secure_input,
        );
        self.pending_focus = (!finished).then_some(request);
    }

    fn cancel_focus(&mut self, surface: SurfaceId) {
        if self
            .pending_focus
            .as_ref()
            .is_some_and(|request| request.target() == surface)
        {
            self.pending_focus = None;
        }
    }

    fn record_recent(&mut self, worktree: &Path) {
        let Some(store) = self.recent.as_mut() else {
            return;
        };
        let (project, name) = worktree_names(worktree);
        if let Err(err) = store.record_open(worktree, &project, &name) {
            log::warn!("failed to record recent worktree: {err}");
        }
    }
}

impl ActionDispatcher for TabManager {
    fn dispatch_action(
        &mut self,
        engine: &mut EngineHandle,
        surface: SurfaceId,
        action: Action,
    ) -> bool {
        let Some(tab) = self.state.tab_by_surface_mut(surface) else {
            return false;
        };
        let mut ctx = ActionContext {
            secure_input: &mut self.secure_input,
            menu: self.menu.as_mut(),
        };
        let handled =
            tab.view_mut().handle_action(action, Instant::now(), &mut ctx);
        self.process_events(engine);
        handled
    }

    fn close_surface(
        &mut self,
        engine: &mut EngineHandle,
        surface: SurfaceId,
        process_alive: bool,
    ) {
        match self.state.tab_by_surface_mut(surface) {
            Some(tab) => {
                tab.view_mut().bridge_mut().close_surface(process_alive)
            },
            None => {
                engine.free_surface(surface);
            },
        }
        self.process_events(engine);
    }
}

/// Project and worktree names for the recent list. Worktrees created
/// under `<root>/.worktrees/<name>` are attributed to `<root>`.
fn worktree_names(worktree: &Path) -> (String, String) {
    let name = paths::file_name(worktree);
    let project = worktree
        .parent()
        .filter(|parent| {
            parent.file_name().is_some_and(|dir| dir == ".worktrees")
        })
        .and_then(Path::parent)
        .map(paths::file_name);
    match project {
        Some(project) => (project, name),
        None => (name.clone(), name),
    }
}
