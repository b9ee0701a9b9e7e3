pub mod errors;
pub mod git;
pub mod recent;
pub mod tools;

pub use errors::{GitError, StoreError};
pub use git::{DiffStats, GitService, Worktree};
pub use recent::{
    MAX_RECENT_ENTRIES, RecentLoadStatus, RecentWorktreeEntry,
    RecentWorktreeStore,
};
pub use tools::{ToolSettings, find_executable};
