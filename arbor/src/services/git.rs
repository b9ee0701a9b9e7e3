use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::errors::GitError;

/// A checked-out worktree of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    /// Branch name, or the directory name for a detached head.
    pub name: String,
    pub path: PathBuf,
}

/// Line changes in a worktree relative to `HEAD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

/// Thin async wrapper over the `git` command line.
#[derive(Debug, Clone)]
pub struct GitService {
    program: PathBuf,
}

impl Default for GitService {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `program` instead of the `git` found on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn list_worktrees(
        &self,
        root: &Path,
    ) -> Result<Vec<Worktree>, GitError> {
        let output = self
            .run(&["worktree", "list", "--porcelain"], root)
            .await?;
        Ok(parse_worktrees(&output))
    }

    /// Tracked changes from `diff --shortstat` plus every line of every
    /// untracked file counted as added.
    pub async fn diff_stats(
        &self,
        worktree: &Path,
    ) -> Result<DiffStats, GitError> {
        let shortstat =
            self.run(&["diff", "HEAD", "--shortstat"], worktree).await?;
        let mut stats = parse_shortstat(&shortstat);
        stats.added += self.untracked_lines(worktree).await?;
        Ok(stats)
    }

    pub async fn list_branches(
        &self,
        root: &Path,
    ) -> Result<Vec<String>, GitError> {
        let output = self
            .run(&["branch", "--format=%(refname:short)"], root)
            .await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Add a worktree at `<root>/.worktrees/<name>` from `base_branch`,
    /// on a new branch called `name` when `create_branch` is set.
    pub async fn create_worktree(
        &self,
        root: &Path,
        name: &str,
        base_branch: &str,
        create_branch: bool,
    ) -> Result<PathBuf, GitError> {
        let parent = root.join(".worktrees");
        tokio::fs::create_dir_all(&parent).await?;
        let path = parent.join(name);
        let target = path.to_string_lossy().into_owned();

        let mut args = vec!["worktree", "add"];
        if create_branch {
            args.extend(["-b", name]);
        }
        args.extend([target.as_str(), base_branch]);
        self.run(&args, root).await?;

        log::debug!("created worktree {}", path.display());
        Ok(path)
    }

    /// Remove a worktree, optionally discarding changes and deleting its
    /// branch. Branch deletion is best-effort.
    pub async fn delete_worktree(
        &self,
        root: &Path,
        worktree: &Path,
        force: bool,
        delete_branch: bool,
    ) -> Result<(), GitError> {
        let branch = if delete_branch {
            self.branch_of(root, worktree).await
        } else {
            None
        };

        let target = worktree.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(target.as_str());
        self.run(&args, root).await?;

        if let Some(branch) = branch {
            let args = ["branch", "-D", branch.as_str()];
            if let Err(err) = self.run(&args, root).await {
                log::warn!("keeping branch {branch}: {err}");
            }
        }
        Ok(())
    }

    pub async fn has_uncommitted_changes(
        &self,
        worktree: &Path,
    ) -> Result<bool, GitError> {
        let output = self.run(&["status", "--porcelain"], worktree).await?;
        Ok(!output.trim().is_empty())
    }

    async fn branch_of(&self, root: &Path, worktree: &Path) -> Option<String> {
        let output = self
            .run(&["worktree", "list", "--porcelain"], root)
            .await
            .ok()?;
        let wanted = canonical(worktree);
        output
            .split("\n\n")
            .find(|block| {
                block.lines().any(|line| {
                    line.strip_prefix("worktree ").is_some_and(|path| {
                        canonical(Path::new(path)) == wanted
                    })
                })
            })
            .and_then(|block| {
                block.lines().find_map(|line| {
                    line.strip_prefix("branch ").map(short_branch)
                })
            })
    }

    async fn untracked_lines(
        &self,
        worktree: &Path,
    ) -> Result<usize, GitError> {
        let output = self
            .run(&["ls-files", "--others", "--exclude-standard"], worktree)
            .await?;
        let mut total = 0;
        for file in output.lines().map(str::trim).filter(|f| !f.is_empty()) {
            // Binary or unreadable files do not count.
            let Ok(contents) = tokio::fs::read_to_string(worktree.join(file))
                .await
            else {
                continue;
            };
            total += contents.lines().count();
        }
        Ok(total)
    }

    async fn run(&self, args: &[&str], dir: &Path) -> Result<String, GitError> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                dir: dir.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr)
                    .trim()
                    .to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Git reports resolved paths, callers may hold symlinked ones.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Branch name of a ref: `refs/heads/feature/login` is `feature/login`.
fn short_branch(reference: &str) -> String {
    reference
        .strip_prefix("refs/heads/")
        .unwrap_or(reference)
        .to_string()
}

fn parse_worktrees(output: &str) -> Vec<Worktree> {
    let mut worktrees = Vec::new();
    let mut current: Option<PathBuf> = None;
    let mut branch: Option<String> = None;

    let mut flush = |path: Option<PathBuf>, branch: Option<String>| {
        if let Some(path) = path {
            let name =
                branch.unwrap_or_else(|| crate::paths::file_name(&path));
            worktrees.push(Worktree { name, path });
        }
    };

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            flush(current.take(), branch.take());
            current = Some(PathBuf::from(path));
        } else if let Some(reference) = line.strip_prefix("branch ") {
            branch = Some(short_branch(reference));
        } else if line == "bare" {
            current = None;
            branch = None;
        }
    }
    flush(current, branch);
    worktrees
}

/// Parse ` 3 files changed, 42 insertions(+), 10 deletions(-)`.
fn parse_shortstat(output: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    for part in output.trim().split(',') {
        let mut words = part.split_whitespace();
        let (Some(count), Some(label)) = (words.next(), words.next()) else {
            continue;
        };
        let Ok(count) = count.parse::<usize>() else {
            continue;
        };
        if label.starts_with("insertion") {
            stats.added = count;
        } else if label.starts_with("deletion") {
            stats.removed = count;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::process::Command as StdCommand;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn given_porcelain_output_when_parsing_then_bare_entries_are_skipped() {
        let output = "worktree /repo\nbare\n\n\
                      worktree /repo/.worktrees/login\nHEAD abc\n\
                      branch refs/heads/feature/login\n\n\
                      worktree /repo/.worktrees/detached\nHEAD def\n\
                      detached\n";

        let worktrees = parse_worktrees(output);

        assert_eq!(
            worktrees,
            vec![
                Worktree {
                    name: "feature/login".into(),
                    path: PathBuf::from("/repo/.worktrees/login"),
                },
                Worktree {
                    name: "detached".into(),
                    path: PathBuf::from("/repo/.worktrees/detached"),
                },
            ]
        );
    }

    #[test]
    fn given_shortstat_when_parsing_then_counts_are_extracted() {
        let stats = parse_shortstat(
            " 3 files changed, 42 insertions(+), 10 deletions(-)\n",
        );
        assert_eq!(
            stats,
            DiffStats {
                added: 42,
                removed: 10
            }
        );

        let only_deletions = parse_shortstat(" 1 file changed, 1 deletion(-)");
        assert_eq!(only_deletions.added, 0);
        assert_eq!(only_deletions.removed, 1);
        assert_eq!(parse_shortstat(""), DiffStats::default());
    }

    fn git_available() -> bool {
        StdCommand::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args([
                "-c",
                "user.name=arbor",
                "-c",
                "user.email=arbor@localhost",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .status()
            .expect("git should run");
        assert!(status.success(), "git {args:?} failed");
    }

    fn repository() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        git(dir.path(), &["init", "-q", "-b", "main"]);
        fs::write(dir.path().join("README"), "one\ntwo\n").expect("write");
        git(dir.path(), &["add", "README"]);
        git(dir.path(), &["commit", "-q", "-m", "init"]);
        dir
    }

    #[tokio::test(flavor = "current_thread")]
    async fn given_repository_when_editing_then_diff_stats_include_untracked()
    {
        if !git_available() {
            return;
        }
        let repo = repository();
        let service = GitService::new();
        assert!(!service.has_uncommitted_changes(repo.path()).await.unwrap());

        fs::write(repo.path().join("README"), "one\nthree\nfour\n")
            .expect("write");
        fs::write(repo.path().join("NEW"), "a\nb\nc").expect("write");

        let stats = service.diff_stats(repo.path()).await.unwrap();
        assert_eq!(
            stats,
            DiffStats {
                added: 2 + 3,
                removed: 1
            }
        );
        assert!(service.has_uncommitted_changes(repo.path()).await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn given_new_branch_when_creating_worktree_then_it_is_listed_and_removable()
     {
        if !git_available() {
            return;
        }
        let repo = repository();
        let service = GitService::new();

        let path = service
            .create_worktree(repo.path(), "login", "main", true)
            .await
            .unwrap();
        assert_eq!(path, repo.path().join(".worktrees").join("login"));

        let branches = service.list_branches(repo.path()).await.unwrap();
        assert_eq!(branches, vec!["login".to_string(), "main".to_string()]);
        let names: Vec<String> = service
            .list_worktrees(repo.path())
            .await
            .unwrap()
            .into_iter()
            .map(|worktree| worktree.name)
            .collect();
        assert_eq!(names, vec!["main".to_string(), "login".to_string()]);

        service
            .delete_worktree(repo.path(), &path, false, true)
            .await
            .unwrap();
        assert!(!path.exists());
        let branches = service.list_branches(repo.path()).await.unwrap();
        assert_eq!(branches, vec!["main".to_string()]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn given_slashed_branch_when_deleting_worktree_then_only_it_is_removed()
     {
        if !git_available() {
            return;
        }
        let repo = repository();
        let service = GitService::new();
        git(repo.path(), &["branch", "login"]);
        let path = repo.path().join(".worktrees").join("sign-in");
        let target = path.to_string_lossy().into_owned();
        git(
            repo.path(),
            &[
                "worktree",
                "add",
                "-q",
                "-b",
                "feature/login",
                target.as_str(),
                "main",
            ],
        );

        let worktrees = service.list_worktrees(repo.path()).await.unwrap();
        assert!(
            worktrees
                .iter()
                .any(|worktree| worktree.name == "feature/login")
        );

        service
            .delete_worktree(repo.path(), &path, false, true)
            .await
            .unwrap();

        let branches = service.list_branches(repo.path()).await.unwrap();
        assert_eq!(branches, vec!["login".to_string(), "main".to_string()]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn given_missing_directory_when_running_then_spawn_error_is_returned()
    {
        let service = GitService::new();

        let result = service
            .list_branches(Path::new("/definitely/not/a/dir"))
            .await;

        assert!(matches!(
            result,
            Err(GitError::Spawn { .. } | GitError::CommandFailed { .. })
        ));
    }
}
