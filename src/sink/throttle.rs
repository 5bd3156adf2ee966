use std::time::{Duration, Instant};

/// Gates an action to at most once per `min_interval`.
///
/// Used to keep full-screen redraws independent of the sampling cadence.
#[derive(Debug, Clone)]
pub struct RenderThrottle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RenderThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Returns `true` and records `now` if enough time has passed since the
    /// last accepted call. The first call is always accepted.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
