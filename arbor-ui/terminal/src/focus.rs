use std::time::{Duration, Instant};

use arbor_engine::SurfaceId;

const FIRST_RETRY: Duration = Duration::from_millis(50);
const MAX_RETRY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPoll {
    /// Not due yet.
    Pending,
    /// The target can take focus now.
    Ready(SurfaceId),
    /// The target never got a window.
    Abandoned(SurfaceId),
}

/// Deferred move of keyboard focus to a view that may not sit in a window
/// yet. Retries back off from 50ms, doubling, and give up once the delay
/// would reach 500ms.
#[derive(Debug, Clone)]
pub struct FocusRequest {
    target: SurfaceId,
    due: Instant,
    delay: Option<Duration>,
}

impl FocusRequest {
    /// First attempt is due immediately.
    pub fn new(target: SurfaceId, now: Instant) -> Self {
        Self {
            target,
            due: now,
            delay: None,
        }
    }

    pub fn target(&self) -> SurfaceId {
        self.target
    }

    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn poll(&mut self, now: Instant, attached: bool) -> FocusPoll {
        if now < self.due {
            return FocusPoll::Pending;
        }
        if attached {
            return FocusPoll::Ready(self.target);
        }
        let next = self.delay.map_or(FIRST_RETRY, |delay| delay * 2);
        if next >= MAX_RETRY {
            log::debug!("giving up focus on surface {}", self.target);
            return FocusPoll::Abandoned(self.target);
        }
        self.delay = Some(next);
        self.due = now + next;
        FocusPoll::Pending
    }
}
