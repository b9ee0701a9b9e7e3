use thiserror::Error;

/// Errors emitted while posting a desktop notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("failed to launch notification helper")]
    Spawn(#[from] std::io::Error),
}
