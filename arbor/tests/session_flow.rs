#![cfg(unix)]

use std::cell::RefCell;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use arbor::services::RecentWorktreeStore;
use arbor::{
    NotificationError, NotificationTransport, Notifier, SessionStatus,
    TabError, TabId, TabKind, TabManager,
};
use arbor_engine::action::{CloseTabMode, GotoTab, ProgressState};
use arbor_engine::fake::{FakeEngine, FakeProbe, SurfaceEvent};
use arbor_engine::{
    Action, ConfigSources, Engine, EngineHandle, SurfaceId, Target,
};
use arbor_ui_term::{
    AppMenu, EditCommand, NativeKeyEvent, PROGRESS_RESET_TIMEOUT,
    SecureEventInput, SecureInputContext,
};
use tempfile::TempDir;

struct NoMenu;

impl AppMenu for NoMenu {
    fn perform_key_equivalent(&mut self, _event: &NativeKeyEvent) -> bool {
        false
    }

    fn perform_edit(&mut self, _command: EditCommand) {}
}

struct NoSecureInput;

impl SecureEventInput for NoSecureInput {
    fn enable(&mut self) {}

    fn disable(&mut self) {}
}

type Posts = Rc<RefCell<Vec<(String, String)>>>;

struct Recording(Posts);

impl NotificationTransport for Recording {
    fn post(
        &mut self,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        self.0.borrow_mut().push((title.to_string(), body.to_string()));
        Ok(())
    }
}

struct Harness {
    engine: EngineHandle,
    probe: FakeProbe,
    manager: TabManager,
    posts: Posts,
    _bin: TempDir,
}

fn install_tools(bin: &TempDir) {
    for name in ["pi", "lazygit", "lumen"] {
        let path = bin.path().join(name);
        fs::write(&path, "#!/bin/sh\n").expect("write tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("chmod tool");
    }
}

fn harness() -> Harness {
    build(None)
}

fn build(recent: Option<RecentWorktreeStore>) -> Harness {
    let (fake, probe) = FakeEngine::new();
    let engine = EngineHandle::initialize(
        ConfigSources::default(),
        move |_config, _proxy| Ok(Box::new(fake) as Box<dyn Engine>),
    )
    .expect("engine should initialize");

    let bin = TempDir::new().expect("temp dir");
    install_tools(&bin);
    let posts = Posts::default();
    let notifier = Notifier::with_fallback(
        Box::new(Recording(Rc::clone(&posts))),
        Box::new(Recording(Rc::clone(&posts))),
    );
    let mut manager = TabManager::new(
        SecureInputContext::new(Box::new(NoSecureInput)),
        Box::new(NoMenu),
    )
    .with_search_path(Some(bin.path().as_os_str().to_owned()))
    .with_notifier(notifier);
    if let Some(store) = recent {
        manager = manager.with_recent_store(store);
    }

    Harness {
        engine,
        probe,
        manager,
        posts,
        _bin: bin,
    }
}

impl Harness {
    fn select(&mut self, worktree: &str) -> TabId {
        self.manager
            .select_worktree(&mut self.engine, Path::new(worktree))
            .expect("worktree should open")
    }

    fn open(&mut self, kind: TabKind, worktree: &str) -> TabId {
        self.manager
            .create_tab(&mut self.engine, kind, Path::new(worktree))
            .expect("tab should open")
    }

    fn surface(&self, id: TabId) -> SurfaceId {
        self.manager.tab(id).expect("tab should exist").surface()
    }

    /// Deliver `action` from the engine side for `tab`.
    fn engine_action(&mut self, tab: TabId, action: Action) {
        let surface = self.surface(tab);
        self.engine.proxy().action(Target::Surface(surface), action);
        self.engine.drain(&mut self.manager);
    }

    fn focus_changes(&self) -> Vec<(SurfaceId, bool)> {
        self.probe.state().focus_changes.clone()
    }

    fn clear_focus_log(&self) {
        self.probe.state_mut().focus_changes.clear();
    }

    fn assert_selection_consistent(&self) {
        let Some(selected) = self.manager.selected_tab() else {
            return;
        };
        assert_eq!(
            Some(selected.worktree()),
            self.manager.selected_worktree(),
            "selected tab must belong to the selected worktree"
        );
    }
}

#[test]
fn given_new_worktree_when_selected_then_agent_tab_is_opened_there() {
    let mut h = harness();

    let id = h.select("/repo/a/");

    let tab = h.manager.tab(id).expect("tab");
    assert_eq!(tab.kind(), &TabKind::Agent);
    assert_eq!(tab.worktree(), Path::new("/repo/a"));
    assert_eq!(tab.title(), "Agent");
    assert_eq!(h.manager.selected_tab_id(), Some(id));
    assert_eq!(h.manager.selected_worktree(), Some(Path::new("/repo/a")));

    let state = h.probe.state();
    let options = &state.surfaces[&tab.surface()].options;
    assert_eq!(
        options.working_directory.as_deref(),
        Some(Path::new("/repo/a"))
    );
    assert_eq!(options.initial_input.as_deref(), Some("pi\n"));
}

#[test]
fn given_agent_and_shell_worktrees_when_agent_runs_and_closes_then_status_follows()
 {
    let mut h = harness();
    let repo_a = Path::new("/repo/a");
    let repo_b = Path::new("/repo/b");
    let agent = h.select("/repo/a");
    h.probe.state_mut().lifecycle.clear();

    let shell = h.open(TabKind::Shell, "/repo/b");

    assert_eq!(
        h.probe.state().lifecycle,
        vec![
            SurfaceEvent::Focus(h.surface(agent), false),
            SurfaceEvent::Created(h.surface(shell)),
            SurfaceEvent::Focus(h.surface(shell), true),
        ]
    );
    assert_eq!(h.manager.selected_worktree(), Some(repo_b));
    assert_eq!(h.manager.session_status(repo_a), SessionStatus::Idle);
    assert_eq!(h.manager.session_status(repo_b), SessionStatus::TerminalOpen);

    h.engine_action(
        agent,
        Action::ProgressReport {
            state: ProgressState::Set,
            progress: -1,
        },
    );
    assert!(h.manager.tab(agent).is_some_and(|tab| tab.is_running()));
    assert_eq!(h.manager.session_status(repo_a), SessionStatus::Running);

    h.engine_action(
        agent,
        Action::ProgressReport {
            state: ProgressState::Remove,
            progress: -1,
        },
    );
    assert_eq!(h.manager.session_status(repo_a), SessionStatus::Idle);

    h.engine_action(
        agent,
        Action::ProgressReport {
            state: ProgressState::Set,
            progress: 30,
        },
    );
    assert!(h.manager.close_tab(&mut h.engine, agent));
    assert_eq!(h.manager.session_status(repo_a), SessionStatus::Stopped);
    assert_eq!(h.manager.session_status(repo_b), SessionStatus::TerminalOpen);
    assert_eq!(h.manager.selected_tab_id(), Some(shell));
    assert!(h.manager.has_running_terminals());
}

#[test]
fn given_progress_without_followup_when_timers_fire_then_tab_stops_running()
{
    let mut h = harness();
    let id = h.select("/repo/a");
    h.engine_action(
        id,
        Action::ProgressReport {
            state: ProgressState::Indeterminate,
            progress: -1,
        },
    );
    assert!(h.manager.tab(id).is_some_and(|tab| tab.is_running()));
    let deadline = h.manager.next_deadline().expect("reset armed");

    let early = deadline - Duration::from_millis(1);
    h.manager.poll_timers(&mut h.engine, early);
    assert!(h.manager.tab(id).is_some_and(|tab| tab.is_running()));

    let later =
        Instant::now() + PROGRESS_RESET_TIMEOUT + Duration::from_secs(1);
    h.manager.poll_timers(&mut h.engine, later);
    assert!(h.manager.tab(id).is_some_and(|tab| !tab.is_running()));
    assert_eq!(h.manager.next_deadline(), None);
}

#[test]
fn given_two_tabs_when_switching_then_old_tab_loses_focus_first() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let second = h.open(TabKind::Shell, "/repo/a");
    h.clear_focus_log();

    assert!(h.manager.select_tab(&mut h.engine, first));

    assert_eq!(
        h.focus_changes(),
        vec![(h.surface(second), false), (h.surface(first), true)]
    );

    h.clear_focus_log();
    assert!(h.manager.select_tab(&mut h.engine, first));
    assert!(h.focus_changes().is_empty());
}

#[test]
fn given_open_tab_when_creating_another_then_focus_moves_in_order() {
    let mut h = harness();
    let first = h.select("/repo/a");
    h.clear_focus_log();

    let second = h.open(TabKind::Git, "/repo/a");

    assert_eq!(
        h.focus_changes(),
        vec![(h.surface(first), false), (h.surface(second), true)]
    );
    let state = h.probe.state();
    assert_eq!(
        state.surfaces[&h.surface(second)]
            .options
            .initial_input
            .as_deref(),
        Some("lazygit\n")
    );
}

#[test]
fn given_worktree_switches_when_returning_then_last_tab_is_restored() {
    let mut h = harness();
    let first = h.select("/repo/w");
    let second = h.open(TabKind::Shell, "/repo/w");
    assert!(h.manager.select_tab(&mut h.engine, second));
    assert!(h.manager.select_tab(&mut h.engine, first));
    assert!(h.manager.select_tab(&mut h.engine, second));

    let other = h.select("/repo/x");
    assert_ne!(other, second);
    assert_eq!(h.manager.visible_tabs().len(), 1);
    h.assert_selection_consistent();

    let restored = h.select("/repo/w");

    assert_eq!(restored, second);
    assert_eq!(h.manager.selected_tab_id(), Some(second));
    assert_eq!(
        h.manager.last_selected_tab(Path::new("/repo/x")),
        Some(other)
    );
    assert_eq!(h.manager.tabs().len(), 3);
    h.assert_selection_consistent();
}

#[test]
fn given_selected_worktree_when_selected_again_then_nothing_changes() {
    let mut h = harness();
    let first = h.select("/repo/a");
    h.clear_focus_log();

    let again = h.select("/repo/./a");

    assert_eq!(again, first);
    assert_eq!(h.manager.tabs().len(), 1);
    assert!(h.focus_changes().is_empty());
}

#[test]
fn given_closed_tab_when_opening_new_one_then_surface_count_is_stable() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let before = h.engine.surface_count();
    let surface = h.surface(first);

    assert!(h.manager.close_tab(&mut h.engine, first));
    assert_eq!(h.engine.surface_count(), before - 1);
    assert!(h.probe.state().freed.contains(&surface));

    h.open(TabKind::Shell, "/repo/a");
    assert_eq!(h.engine.surface_count(), before);
    assert!(!h.manager.close_tab(&mut h.engine, first));
}

#[test]
fn given_selected_tab_when_closed_then_first_remaining_tab_is_selected() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let second = h.open(TabKind::Shell, "/repo/a");
    let third = h.open(TabKind::Shell, "/repo/a");
    assert!(h.manager.select_tab(&mut h.engine, second));
    h.clear_focus_log();

    assert!(h.manager.close_tab(&mut h.engine, second));

    assert_eq!(h.manager.selected_tab_id(), Some(first));
    assert_eq!(h.focus_changes(), vec![(h.surface(first), true)]);
    h.assert_selection_consistent();

    assert!(h.manager.close_tab(&mut h.engine, first));
    assert!(h.manager.close_tab(&mut h.engine, third));
    assert_eq!(h.manager.selected_tab_id(), None);
    assert_eq!(h.manager.selected_worktree(), None);
}

#[test]
fn given_tab_in_hidden_worktree_when_closed_then_selection_is_kept() {
    let mut h = harness();
    let hidden = h.select("/repo/a");
    let shown = h.select("/repo/b");

    assert!(h.manager.close_tab(&mut h.engine, hidden));

    assert_eq!(h.manager.selected_tab_id(), Some(shown));
    assert_eq!(h.manager.last_selected_tab(Path::new("/repo/a")), None);
    assert_eq!(
        h.manager.active_worktree_paths(),
        vec![PathBuf::from("/repo/b")]
    );
}

#[test]
fn given_engine_close_request_when_drained_then_tab_is_removed() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let second = h.open(TabKind::Shell, "/repo/a");
    let surface = h.surface(second);

    h.engine.proxy().close_surface(surface, false);
    h.engine.drain(&mut h.manager);

    assert!(h.manager.tab(second).is_none());
    assert_eq!(h.manager.selected_tab_id(), Some(first));
    assert!(h.probe.state().freed.contains(&surface));
}

#[test]
fn given_close_tab_action_when_dispatched_then_origin_tab_closes() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let second = h.open(TabKind::Shell, "/repo/a");

    h.engine_action(second, Action::CloseTab(CloseTabMode::This));

    assert!(h.manager.tab(second).is_none());
    assert_eq!(h.manager.selected_tab_id(), Some(first));
}

#[test]
fn given_new_tab_action_when_dispatched_then_shell_opens_beside_origin() {
    let mut h = harness();
    let origin = h.select("/repo/a");

    h.engine_action(origin, Action::NewTab);

    let visible = h.manager.visible_tabs();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[1].kind(), &TabKind::Shell);
    assert_eq!(visible[1].worktree(), Path::new("/repo/a"));
    assert_eq!(h.manager.selected_tab_id(), Some(visible[1].id()));
}

#[test]
fn given_goto_actions_when_dispatched_then_selection_cycles() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let second = h.open(TabKind::Shell, "/repo/a");
    let third = h.open(TabKind::Shell, "/repo/a");

    h.engine_action(third, Action::GotoTab(GotoTab::NEXT));
    assert_eq!(h.manager.selected_tab_id(), Some(first));

    h.engine_action(first, Action::GotoTab(GotoTab::PREVIOUS));
    assert_eq!(h.manager.selected_tab_id(), Some(third));

    h.engine_action(third, Action::GotoTab(GotoTab(1)));
    assert_eq!(h.manager.selected_tab_id(), Some(second));

    h.engine_action(second, Action::GotoTab(GotoTab::LAST));
    assert_eq!(h.manager.selected_tab_id(), Some(third));

    h.engine_action(third, Action::GotoTab(GotoTab(9)));
    assert_eq!(h.manager.selected_tab_id(), Some(third));
}

#[test]
fn given_background_notification_when_dispatched_then_tab_is_badged() {
    let mut h = harness();
    let background = h.select("/repo/a");
    let foreground = h.open(TabKind::Shell, "/repo/a");

    h.engine_action(
        background,
        Action::DesktopNotification {
            title: Some("Agent".into()),
            body: Some("done".into()),
        },
    );
    h.engine_action(
        foreground,
        Action::DesktopNotification {
            title: Some("Shell".into()),
            body: None,
        },
    );

    assert!(
        h.manager
            .tab(background)
            .is_some_and(|tab| tab.has_notification())
    );
    assert!(
        h.manager
            .tab(foreground)
            .is_some_and(|tab| !tab.has_notification())
    );
    assert_eq!(
        *h.posts.borrow(),
        vec![
            ("Agent".to_string(), "done".to_string()),
            ("Shell".to_string(), String::new()),
        ]
    );

    assert!(h.manager.select_tab(&mut h.engine, background));
    assert!(
        h.manager
            .tab(background)
            .is_some_and(|tab| !tab.has_notification())
    );
}

#[test]
fn given_title_action_when_dispatched_then_tab_title_changes() {
    let mut h = harness();
    let id = h.select("/repo/a");

    h.engine_action(
        id,
        Action::SetTitle {
            title: Some("vim notes.md".into()),
        },
    );

    assert_eq!(
        h.manager.tab(id).map(|tab| tab.title()),
        Some("vim notes.md")
    );
}

#[test]
fn given_missing_tool_when_opening_tab_then_error_leaves_state_alone() {
    let mut h = harness();
    let first = h.select("/repo/a");
    let mut tools = h.manager.tools().clone();
    tools.diff = String::from("difftastic --color");
    h.manager.set_tools(tools);
    h.clear_focus_log();

    let err = h
        .manager
        .create_tab(&mut h.engine, TabKind::Diff, Path::new("/repo/a"))
        .expect_err("difftastic is not installed");

    assert!(matches!(
        &err,
        TabError::ToolUnavailable { executable, .. }
            if executable == "difftastic"
    ));
    assert!(err.to_string().contains("'difftastic' was not found"));
    assert_eq!(h.manager.tabs().len(), 1);
    assert_eq!(h.manager.selected_tab_id(), Some(first));
    assert!(h.focus_changes().is_empty());
}

#[test]
fn given_engine_failure_when_opening_tab_then_previous_tab_regains_focus() {
    let mut h = harness();
    let first = h.select("/repo/a");
    h.clear_focus_log();
    h.probe.state_mut().fail_next_surface = true;

    let result = h
        .manager
        .create_tab(&mut h.engine, TabKind::Shell, Path::new("/repo/a"));

    assert!(matches!(result, Err(TabError::Engine(_))));
    assert_eq!(h.manager.selected_tab_id(), Some(first));
    assert_eq!(
        h.focus_changes(),
        vec![(h.surface(first), false), (h.surface(first), true)]
    );
}

#[test]
fn given_active_worktrees_when_selecting_by_index_then_order_is_first_opened()
{
    let mut h = harness();
    let a = h.select("/repo/a");
    let b = h.select("/repo/b");
    h.open(TabKind::Shell, "/repo/a");

    assert_eq!(
        h.manager.active_worktree_paths(),
        vec![PathBuf::from("/repo/a"), PathBuf::from("/repo/b")]
    );
    let picked = h
        .manager
        .select_worktree_by_index(&mut h.engine, 1)
        .expect("select b");
    assert_eq!(picked, Some(b));
    let missing = h
        .manager
        .select_worktree_by_index(&mut h.engine, 5)
        .expect("out of range is not an error");
    assert_eq!(missing, None);
    assert_ne!(h.manager.selected_tab_id(), Some(a));
}

#[test]
fn given_recent_store_when_selecting_worktree_then_open_is_recorded() {
    let dir = TempDir::new().expect("temp dir");
    let (store, _) =
        RecentWorktreeStore::open(dir.path().join("recent.json"))
            .expect("store should open");
    let mut h = build(Some(store));

    h.select("/src/arbor/.worktrees/feature");
    h.select("/src/tools");

    let entries = h.manager.recent_store().expect("store").entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].display_name, "tools");
    assert_eq!(entries[1].display_name, "arbor · feature");
    assert_eq!(
        entries[1].path,
        PathBuf::from("/src/arbor/.worktrees/feature")
    );
}

#[test]
fn given_mixed_operations_when_applied_then_selection_stays_consistent() {
    let mut h = harness();
    let a = h.select("/repo/a");
    h.assert_selection_consistent();
    let a2 = h.open(TabKind::Shell, "/repo/a");
    h.assert_selection_consistent();
    let b = h.select("/repo/b");
    h.assert_selection_consistent();

    assert!(!h.manager.select_tab(&mut h.engine, a2));
    h.assert_selection_consistent();
    assert!(h.manager.close_tab(&mut h.engine, b));
    h.assert_selection_consistent();
    assert_eq!(h.manager.selected_tab_id(), None);

    h.select("/repo/a");
    assert_eq!(h.manager.selected_tab_id(), Some(a2));
    assert!(h.manager.close_tab(&mut h.engine, a2));
    assert_eq!(h.manager.selected_tab_id(), Some(a));
    h.assert_selection_consistent();
}
