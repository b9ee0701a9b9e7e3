use serde::{Deserialize, Serialize};

use super::model::{Tab, TabKind};

/// Session state of a worktree, derived from its tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// An agent tab reports work in progress.
    Running,
    /// An agent tab is open and waiting.
    Idle,
    /// Only non-agent tabs are open.
    TerminalOpen,
    Stopped,
}

impl SessionStatus {
    /// Derive the status from `(kind, running)` pairs of one worktree.
    pub fn derive<'a>(
        tabs: impl IntoIterator<Item = (&'a TabKind, bool)>,
    ) -> Self {
        let mut status = Self::Stopped;
        for (kind, running) in tabs {
            match kind {
                TabKind::Agent if running => return Self::Running,
                TabKind::Agent => status = Self::Idle,
                _ if status == Self::Stopped => status = Self::TerminalOpen,
                _ => {},
            }
        }
        status
    }

    pub(crate) fn of_tabs<'a>(
        tabs: impl IntoIterator<Item = &'a Tab>,
    ) -> Self {
        Self::derive(
            tabs.into_iter().map(|tab| (tab.kind(), tab.is_running())),
        )
    }
}
