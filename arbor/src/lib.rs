//! Worktree-grouped terminal sessions.
//!
//! [`TabManager`] owns the open tabs, each bound to a worktree and backed by
//! one engine surface. It is the [`ActionDispatcher`] the host drains the
//! engine with, so engine requests such as new-tab or desktop notifications
//! land here. The [`services`] module holds the collaborators around it:
//! git, the recent worktree list and tool command settings.
//!
//! [`ActionDispatcher`]: arbor_engine::ActionDispatcher

pub mod features;
mod paths;
pub mod services;
pub mod shortcuts;

use env_logger::Env;

pub use features::notification::{
    NotificationError, NotificationTransport, Notifier, OsascriptTransport,
};
pub use features::tab::{
    SessionStatus, Tab, TabError, TabId, TabKind, TabManager,
};
pub use paths::standardize;
pub use shortcuts::{AppShortcut, ShortcutAction, app_shortcuts, engine_argv};

/// Install the process logger, `info` unless `RUST_LOG` says otherwise.
///
/// Later calls are ignored.
pub fn init_logging() {
    let env = Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
