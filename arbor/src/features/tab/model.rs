use std::fmt;
use std::path::{Path, PathBuf};

use arbor_engine::SurfaceId;
use arbor_ui_term::SurfaceView;
use uuid::Uuid;

/// Stable identity of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a tab runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TabKind {
    /// Plain login shell.
    Shell,
    /// Coding agent session, the kind opened for a fresh worktree.
    #[default]
    Agent,
    /// Git status UI.
    Git,
    /// Diff viewer.
    Diff,
    /// Any other command.
    Tool { name: String, command: String },
}

impl TabKind {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Shell => "Shell",
            Self::Agent => "Agent",
            Self::Git => "Git",
            Self::Diff => "Diff",
            Self::Tool { name, .. } => name.as_str(),
        }
    }
}

/// Open session bound to a worktree, owning exactly one terminal view.
pub struct Tab {
    id: TabId,
    kind: TabKind,
    worktree: PathBuf,
    title: String,
    is_running: bool,
    has_notification: bool,
    view: SurfaceView,
}

impl Tab {
    pub(crate) fn new(
        kind: TabKind,
        worktree: PathBuf,
        view: SurfaceView,
    ) -> Self {
        Self {
            id: TabId::new(),
            title: kind.display_name().to_string(),
            kind,
            worktree,
            is_running: false,
            has_notification: false,
            view,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn kind(&self) -> &TabKind {
        &self.kind
    }

    /// Standardized worktree path.
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the program reports work in progress.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Unseen desktop notification badge.
    pub fn has_notification(&self) -> bool {
        self.has_notification
    }

    pub fn surface(&self) -> SurfaceId {
        self.view.surface()
    }

    pub fn view(&self) -> &SurfaceView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut SurfaceView {
        &mut self.view
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.is_running = running;
    }

    pub(crate) fn set_notification(&mut self, pending: bool) {
        self.has_notification = pending;
    }
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("worktree", &self.worktree)
            .field("title", &self.title)
            .field("surface", &self.view.surface())
            .finish()
    }
}
