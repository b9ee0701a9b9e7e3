use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;

use super::errors::NotificationError;

/// Handler run by `osascript`. Title and body arrive as `argv`, never as
/// script text.
const NOTIFY_SCRIPT: [&str; 3] = [
    "on run argv",
    "display notification (item 2 of argv) with title (item 1 of argv)",
    "end run",
];

/// OS notification delivery.
pub trait NotificationTransport {
    fn post(
        &mut self,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}

/// Posts through AppleScript's `display notification`.
#[derive(Debug, Clone)]
pub struct OsascriptTransport {
    program: PathBuf,
}

impl Default for OsascriptTransport {
    fn default() -> Self {
        Self {
            program: PathBuf::from("/usr/bin/osascript"),
        }
    }
}

impl OsascriptTransport {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl NotificationTransport for OsascriptTransport {
    fn post(
        &mut self,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let child = Command::new(&self.program)
            .args(osascript_args(title, body))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        reap(child)?;
        Ok(())
    }
}

/// Command line for `osascript`: the handler lines, then title and body.
pub fn osascript_args(title: &str, body: &str) -> Vec<String> {
    NOTIFY_SCRIPT
        .iter()
        .flat_map(|line| ["-e".to_string(), line.to_string()])
        .chain([title.to_string(), body.to_string()])
        .collect()
}

/// Wait for `child` off the UI thread so it does not linger as a zombie.
fn reap(mut child: Child) -> Result<(), NotificationError> {
    thread::Builder::new()
        .name("notification-reaper".into())
        .spawn(move || {
            if let Err(err) = child.wait() {
                log::debug!("notification helper wait failed: {err}");
            }
        })?;
    Ok(())
}

/// Posts through a primary transport, retrying through a fallback when
/// the user has not granted notification permission.
pub struct Notifier {
    primary: Box<dyn NotificationTransport>,
    fallback: Option<Box<dyn NotificationTransport>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self {
            primary: Box::new(OsascriptTransport::default()),
            fallback: None,
        }
    }
}

impl Notifier {
    /// `primary` with `osascript` as the fallback.
    pub fn new(primary: Box<dyn NotificationTransport>) -> Self {
        Self::with_fallback(primary, Box::new(OsascriptTransport::default()))
    }

    pub fn with_fallback(
        primary: Box<dyn NotificationTransport>,
        fallback: Box<dyn NotificationTransport>,
    ) -> Self {
        Self {
            primary,
            fallback: Some(fallback),
        }
    }

    /// Post a notification. Failures are logged, never returned.
    pub fn post(&mut self, title: &str, body: &str) {
        let result = match (self.primary.post(title, body), &mut self.fallback)
        {
            (Err(NotificationError::PermissionDenied), Some(fallback)) => {
                fallback.post(title, body)
            },
            (result, _) => result,
        };
        if let Err(err) = result {
            log::warn!("dropping notification {title:?}: {err}");
        }
    }
}
