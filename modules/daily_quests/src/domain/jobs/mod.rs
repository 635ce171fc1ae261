mod daily;
mod email;

pub use daily::DailyAssignmentJob;
pub use email::EmailOnlyJob;

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Spaces out consecutive sends to stay under the provider's rate limit.
/// The first send goes out immediately.
#[derive(Debug)]
pub(crate) struct SendPacer {
    interval: Duration,
    last: Option<Instant>,
}

impl SendPacer {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub(crate) async fn wait_turn(&mut self) {
        if let Some(last) = self.last {
            if !self.interval.is_zero() {
                sleep_until(last + self.interval).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
