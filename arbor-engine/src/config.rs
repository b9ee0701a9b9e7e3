//! Layered engine configuration.
//!
//! Sources are applied in a fixed order, later ones overriding earlier ones:
//! default files, the `config-file` includes they pull in, project-local
//! files, and finally command line `--key=value` arguments.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::trigger::{Trigger, split_keybind};

const CONFIG_FILE_KEY: &str = "config-file";
const KEYBIND_KEY: &str = "keybind";

/// Where configuration is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    pub default_files: Vec<PathBuf>,
    pub project_files: Vec<PathBuf>,
    pub cli_args: Vec<String>,
}

impl ConfigSources {
    /// Standard locations: the user config file and, when a project
    /// directory is given, its `.arbor/config`.
    pub fn discover(project_dir: Option<&Path>, cli_args: Vec<String>) -> Self {
        let mut default_files = Vec::new();
        if let Some(dir) = user_config_dir() {
            default_files.push(dir.join("arbor").join("config"));
        }

        let project_files = project_dir
            .map(|dir| vec![dir.join(".arbor").join("config")])
            .unwrap_or_default();

        Self {
            default_files,
            project_files,
            cli_args,
        }
    }
}

fn user_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir));
    }
    std::env::var_os("HOME").map(|home| Path::new(&home).join(".config"))
}

/// A key binding entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybind {
    pub trigger: Trigger,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Include {
    path: PathBuf,
    optional: bool,
}

/// Loaded configuration. Repeated keys accumulate, lookups return the
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    values: BTreeMap<String, Vec<String>>,
    keybinds: Vec<Keybind>,
    pending_includes: VecDeque<Include>,
    loaded_files: HashSet<PathBuf>,
    diagnostics: Vec<String>,
    finalized: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every source in precedence order and finalize the result.
    pub fn load(sources: &ConfigSources) -> Result<Self> {
        let mut config = Self::new();
        for path in &sources.default_files {
            config.load_file(path, true)?;
        }
        config.load_recursive_files()?;

        for path in &sources.project_files {
            config.load_file(path, true)?;
        }
        config.load_recursive_files()?;

        config.load_cli_args(&sources.cli_args);
        config.load_recursive_files()?;
        config.finalize();

        for diagnostic in &config.diagnostics {
            log::warn!("config: {diagnostic}");
        }
        Ok(config)
    }

    /// Parse one file. A missing optional file is skipped silently.
    pub fn load_file(&mut self, path: &Path, optional: bool) -> Result<()> {
        let identity =
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.loaded_files.insert(identity) {
            self.diagnostics
                .push(format!("{}: already loaded, skipping", path.display()));
            return Ok(());
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if !optional {
                    self.diagnostics
                        .push(format!("{}: file not found", path.display()));
                }
                return Ok(());
            },
            Err(source) => {
                return Err(EngineError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                });
            },
        };

        log::debug!("loading config file {}", path.display());
        let base = path.parent().map(Path::to_path_buf);
        self.load_str(&path.display().to_string(), base.as_deref(), &contents);
        Ok(())
    }

    /// Parse `key = value` lines. `base` resolves relative includes.
    pub fn load_str(
        &mut self,
        origin: &str,
        base: Option<&Path>,
        contents: &str,
    ) {
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                self.diagnostics
                    .push(format!("{origin}:{}: expected `key = value`", idx + 1));
                continue;
            };
            self.set_with_base(key.trim(), unquote(value.trim()), base);
        }
    }

    /// Drain `config-file` includes queued so far, including the ones the
    /// included files add themselves.
    pub fn load_recursive_files(&mut self) -> Result<()> {
        while let Some(include) = self.pending_includes.pop_front() {
            self.load_file(&include.path, include.optional)?;
        }
        Ok(())
    }

    /// Apply `--key=value` arguments. Anything else in argv is ignored.
    pub fn load_cli_args<S: AsRef<str>>(&mut self, args: &[S]) {
        let cwd = std::env::current_dir().ok();
        for arg in args {
            let Some(flag) = arg.as_ref().strip_prefix("--") else {
                continue;
            };
            match flag.split_once('=') {
                Some((key, value)) => {
                    self.set_with_base(key, value, cwd.as_deref())
                },
                None => self.set_with_base(flag, "true", cwd.as_deref()),
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.set_with_base(key, value, None);
    }

    fn set_with_base(&mut self, key: &str, value: &str, base: Option<&Path>) {
        match key {
            CONFIG_FILE_KEY => {
                if value.is_empty() {
                    return;
                }
                let (raw, optional) = match value.strip_prefix('?') {
                    Some(rest) => (rest, true),
                    None => (value, false),
                };
                let path = Path::new(raw);
                let path = match base {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.to_path_buf(),
                };
                self.pending_includes
                    .push_back(Include { path, optional });
            },
            KEYBIND_KEY => self.apply_keybind(value),
            _ if value.is_empty() => {
                self.values.remove(key);
            },
            _ => self
                .values
                .entry(key.to_string())
                .or_default()
                .push(value.to_string()),
        }
    }

    fn apply_keybind(&mut self, value: &str) {
        if value == "clear" || value.is_empty() {
            self.keybinds.clear();
            return;
        }

        let Some((raw_trigger, action)) = split_keybind(value) else {
            self.diagnostics
                .push(format!("keybind `{value}`: missing action"));
            return;
        };
        let trigger = match raw_trigger.parse::<Trigger>() {
            Ok(trigger) => trigger,
            Err(err) => {
                self.diagnostics.push(format!("keybind `{value}`: {err}"));
                return;
            },
        };

        self.keybinds.retain(|bind| bind.trigger != trigger);
        if action != "unbind" {
            self.keybinds.push(Keybind {
                trigger,
                action: action.to_string(),
            });
        }
    }

    /// Fill derived defaults. Further `set` calls are still allowed.
    pub fn finalize(&mut self) {
        self.values
            .entry("scrollbar".to_string())
            .or_insert_with(|| vec!["system".to_string()]);
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Last value set for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Every value set for `key`, in order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keybinds(&self) -> &[Keybind] {
        &self.keybinds
    }

    /// Trigger most recently bound to `action`.
    pub fn trigger(&self, action: &str) -> Option<&Trigger> {
        self.keybinds
            .iter()
            .rev()
            .find(|bind| bind.action == action)
            .map(|bind| &bind.trigger)
    }

    /// Non-fatal problems found while loading.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}
