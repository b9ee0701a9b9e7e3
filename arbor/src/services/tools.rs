use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::features::tab::TabKind;

/// Commands launched by the tool tab kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub agent: String,
    pub git: String,
    pub diff: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            agent: String::from("pi"),
            git: String::from("lazygit"),
            diff: String::from("lumen diff"),
        }
    }
}

impl ToolSettings {
    /// Command typed into a new tab of `kind`. Shell tabs run none.
    pub fn command<'a>(&'a self, kind: &'a TabKind) -> Option<&'a str> {
        let command = match kind {
            TabKind::Shell => return None,
            TabKind::Agent => &self.agent,
            TabKind::Git => &self.git,
            TabKind::Diff => &self.diff,
            TabKind::Tool { command, .. } => command,
        };
        let command = command.trim();
        (!command.is_empty()).then_some(command)
    }

    /// Program name of the command for `kind`.
    pub fn executable(
        &self,
        kind: &TabKind,
    ) -> Result<Option<String>, shell_words::ParseError> {
        let Some(command) = self.command(kind) else {
            return Ok(None);
        };
        Ok(shell_words::split(command)?.into_iter().next())
    }

    /// Executable needed by `kind` that cannot be found in `search_path`.
    pub fn missing_executable(
        &self,
        kind: &TabKind,
        search_path: Option<&OsStr>,
    ) -> Result<Option<String>, shell_words::ParseError> {
        let Some(executable) = self.executable(kind)? else {
            return Ok(None);
        };
        if find_executable(&executable, search_path).is_some() {
            return Ok(None);
        }
        Ok(Some(executable))
    }
}

/// Locate `program` like a shell does. Names containing a separator are
/// checked as given, bare names are looked up in `search_path`.
pub fn find_executable(
    program: &str,
    search_path: Option<&OsStr>,
) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return is_executable(path).then(|| path.to_path_buf());
    }
    env::split_paths(search_path?)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata().is_ok_and(|meta| {
        meta.is_file() && meta.permissions().mode() & 0o111 != 0
    })
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
