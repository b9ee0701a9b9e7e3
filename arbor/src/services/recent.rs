use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::StoreError;
use crate::paths;

/// Entries kept in the recent list.
pub const MAX_RECENT_ENTRIES: usize = 20;

const FILE_NAME: &str = "recent_worktrees.json";

/// A recently opened worktree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentWorktreeEntry {
    pub path: PathBuf,
    /// `project · worktree`, or just the project when both names match.
    pub display_name: String,
    pub project_name: String,
    pub worktree_name: String,
    pub last_opened: DateTime<Utc>,
}

/// How the store contents were read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecentLoadStatus {
    Loaded,
    Missing,
    Invalid(String),
}

/// Most recently opened worktrees, newest first, persisted as JSON.
#[derive(Debug)]
pub struct RecentWorktreeStore {
    path: PathBuf,
    entries: Vec<RecentWorktreeEntry>,
}

impl RecentWorktreeStore {
    /// Open the store in the per-user data directory.
    pub fn open_default() -> Result<(Self, RecentLoadStatus), StoreError> {
        Self::open(paths::data_dir().join(FILE_NAME))
    }

    /// Open the store backed by `path`.
    ///
    /// A missing file yields an empty store. Unparseable contents are
    /// reported through the status and replaced on the next write.
    pub fn open(
        path: impl Into<PathBuf>,
    ) -> Result<(Self, RecentLoadStatus), StoreError> {
        let path = path.into();
        let (entries, status) = load_entries(&path)?;
        if let RecentLoadStatus::Invalid(reason) = &status {
            log::warn!(
                "ignoring recent worktrees at {}: {reason}",
                path.display()
            );
        }
        Ok((Self { path, entries }, status))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[RecentWorktreeEntry] {
        &self.entries
    }

    /// Move `path` to the top of the list, stamped with the current time.
    pub fn record_open(
        &mut self,
        path: &Path,
        project_name: &str,
        worktree_name: &str,
    ) -> Result<(), StoreError> {
        let path = paths::standardize(path);
        let display_name = if project_name == worktree_name {
            project_name.to_string()
        } else {
            format!("{project_name} · {worktree_name}")
        };

        self.entries.retain(|entry| entry.path != path);
        self.entries.insert(
            0,
            RecentWorktreeEntry {
                path,
                display_name,
                project_name: project_name.to_string(),
                worktree_name: worktree_name.to_string(),
                last_opened: Utc::now(),
            },
        );
        self.entries.truncate(MAX_RECENT_ENTRIES);
        self.save()
    }

    pub fn remove_entry(&mut self, path: &Path) -> Result<(), StoreError> {
        let path = paths::standardize(path);
        self.entries.retain(|entry| entry.path != path);
        self.save()
    }

    /// Drop entries whose directory no longer exists. Returns how many
    /// were removed; the file is only rewritten when something changed.
    pub fn prune_invalid_entries(&mut self) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path.exists());
        let removed = before - self.entries.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.save()
    }

    /// Path of `entry` if it still exists on disk.
    pub fn existing_path<'a>(
        &self,
        entry: &'a RecentWorktreeEntry,
    ) -> Option<&'a Path> {
        entry.path.exists().then_some(entry.path.as_path())
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let payload = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, payload.as_bytes())?;
        Ok(())
    }
}

fn load_entries(
    path: &Path,
) -> Result<(Vec<RecentWorktreeEntry>, RecentLoadStatus), StoreError> {
    let data = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok((Vec::new(), RecentLoadStatus::Missing));
        },
        Err(err) => return Err(err.into()),
    };

    match serde_json::from_str::<Vec<RecentWorktreeEntry>>(&data) {
        Ok(entries) => Ok((entries, RecentLoadStatus::Loaded)),
        Err(err) => {
            Ok((Vec::new(), RecentLoadStatus::Invalid(format!("{err}"))))
        },
    }
}

fn write_atomic(path: &Path, payload: &[u8]) -> Result<(), std::io::Error> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, payload)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
