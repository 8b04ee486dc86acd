//! Fixed-interval gate for outbound search calls.
//!
//! Search engines start serving bot challenges when queried back to back.
//! [`Pacer`] guarantees a minimum spacing between consecutive calls without
//! sleeping when enough time has already passed (for example while the
//! previous subject was being sent to the LLM).

use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Wait until a call is allowed, then record it as taken.
    ///
    /// The first call never waits.
    pub async fn ready(&mut self) {
        if let Some(last) = self.last {
            let next = last + self.interval;
            if next > Instant::now() {
                debug!(wait_ms = (next - Instant::now()).as_millis() as u64, "Pacing search call");
                sleep_until(next).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
