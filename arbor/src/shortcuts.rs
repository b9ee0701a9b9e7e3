//! Application shortcuts and the engine arguments that free them.
//!
//! The engine ships default bindings for several of these chords. Each one
//! is unbound on the engine command line so the key reaches the app menu.

use arbor_engine::{EngineHandle, Mods, Trigger, TriggerKey};

use crate::features::tab::{Result, TabKind, TabManager};

/// What an app shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    NewTerminal,
    OpenAgent,
    OpenGit,
    OpenDiff,
    OpenInEditor,
    CloseTab,
    CloseWindow,
    NextTab,
    PreviousTab,
    ToggleSidebar,
    FocusSidebar,
    /// One-based index among worktrees with open tabs.
    SelectWorktree(u8),
    /// One-based index among visible tabs.
    SelectTab(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppShortcut {
    pub action: ShortcutAction,
    pub trigger: Trigger,
}

impl AppShortcut {
    const fn new(action: ShortcutAction, key: char, mods: Mods) -> Self {
        Self {
            action,
            trigger: Trigger {
                key: TriggerKey::Unicode(key),
                mods,
            },
        }
    }

    /// Engine keybind chord, e.g. `ctrl+super+]`.
    pub fn keybind(&self) -> String {
        self.trigger.to_string()
    }

    /// Menu rendering, e.g. `⌘⌥1`.
    pub fn display(&self) -> String {
        self.trigger.display().unwrap_or_default()
    }

    /// Run the tab operation bound to this shortcut. Returns `false` for
    /// shortcuts the tab manager does not own.
    pub fn perform(
        &self,
        manager: &mut TabManager,
        engine: &mut EngineHandle,
    ) -> Result<bool> {
        let open = |kind: TabKind,
                    manager: &mut TabManager,
                    engine: &mut EngineHandle|
         -> Result<bool> {
            let Some(worktree) = manager.selected_worktree() else {
                return Ok(false);
            };
            let worktree = worktree.to_path_buf();
            manager.create_tab(engine, kind, &worktree)?;
            Ok(true)
        };

        match self.action {
            ShortcutAction::NewTerminal => {
                open(TabKind::Shell, manager, engine)
            },
            ShortcutAction::OpenAgent => open(TabKind::Agent, manager, engine),
            ShortcutAction::OpenGit => open(TabKind::Git, manager, engine),
            ShortcutAction::OpenDiff => open(TabKind::Diff, manager, engine),
            ShortcutAction::CloseTab => Ok(manager
                .selected_tab_id()
                .is_some_and(|id| manager.close_tab(engine, id))),
            ShortcutAction::NextTab => Ok(manager.select_next_tab(engine)),
            ShortcutAction::PreviousTab => {
                Ok(manager.select_previous_tab(engine))
            },
            ShortcutAction::SelectWorktree(number) => {
                let Some(index) = usize::from(number).checked_sub(1) else {
                    return Ok(false);
                };
                Ok(manager.select_worktree_by_index(engine, index)?.is_some())
            },
            ShortcutAction::SelectTab(number) => {
                let Some(index) = usize::from(number).checked_sub(1) else {
                    return Ok(false);
                };
                Ok(manager.select_tab_by_index(engine, index))
            },
            ShortcutAction::OpenInEditor
            | ShortcutAction::CloseWindow
            | ShortcutAction::ToggleSidebar
            | ShortcutAction::FocusSidebar => Ok(false),
        }
    }
}

const DIGITS: [char; 9] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Every app shortcut, in menu order.
pub fn app_shortcuts() -> Vec<AppShortcut> {
    use ShortcutAction::*;

    let cmd = Mods::SUPER;
    let mut shortcuts = vec![
        AppShortcut::new(NewTerminal, 't', cmd),
        AppShortcut::new(OpenAgent, 'p', cmd),
        AppShortcut::new(OpenGit, 'l', cmd),
        AppShortcut::new(OpenDiff, 'd', cmd),
        AppShortcut::new(OpenInEditor, 'o', cmd),
        AppShortcut::new(CloseTab, 'w', cmd),
        AppShortcut::new(CloseWindow, 'w', cmd.union(Mods::SHIFT)),
        AppShortcut::new(NextTab, ']', cmd.union(Mods::CTRL)),
        AppShortcut::new(PreviousTab, '[', cmd.union(Mods::CTRL)),
        AppShortcut::new(ToggleSidebar, 'b', cmd),
        AppShortcut::new(FocusSidebar, '0', cmd.union(Mods::CTRL)),
    ];
    for (number, key) in (1..).zip(DIGITS) {
        shortcuts.push(AppShortcut::new(
            SelectWorktree(number),
            key,
            cmd.union(Mods::ALT),
        ));
    }
    for (number, key) in (1..).zip(DIGITS) {
        shortcuts.push(AppShortcut::new(SelectTab(number), key, cmd));
    }
    shortcuts
}

/// Engine command line: `program`, then one unbind per shortcut.
pub fn engine_argv(program: &str, shortcuts: &[AppShortcut]) -> Vec<String> {
    std::iter::once(program.to_string())
        .chain(shortcuts.iter().map(|shortcut| {
            format!("--keybind={}=unbind", shortcut.keybind())
        }))
        .collect()
}
