//! Process-wide limiter for destructive disk calls.
//!
//! # Design
//! - Sliding log of grant instants: a grant happens only while fewer than
//!   `max_count` grants fall inside the trailing `period`.
//! - The async mutex is held across the wait so callers are admitted in FIFO order.

use std::collections::VecDeque;
use std::time::Duration;

use migrator_config::DiskRateLimit;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Sleep used when a window end is not representable as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365);

/// Shared limiter; construct once and hand out behind an `Arc`.
pub struct RateLimiter {
    config: DiskRateLimit,
    window: Mutex<RateLimitWindow>,
}

struct RateLimitWindow {
    grants: VecDeque<Instant>,
}

impl RateLimitWindow {
    fn evict_expired(&mut self, now: Instant, period: Duration) {
        while let Some(&oldest) = self.grants.front() {
            if now.saturating_duration_since(oldest) < period {
                break;
            }
            self.grants.pop_front();
        }
    }
}

impl RateLimiter {
    /// Construct a limiter with an empty window.
    #[must_use]
    pub fn new(config: DiskRateLimit) -> Self {
        Self {
            config,
            window: Mutex::new(RateLimitWindow {
                grants: VecDeque::with_capacity(Self::capacity_for(&config)),
            }),
        }
    }

    /// Limit this limiter enforces.
    #[must_use]
    pub const fn config(&self) -> DiskRateLimit {
        self.config
    }

    fn capacity_for(config: &DiskRateLimit) -> usize {
        usize::try_from(config.max_count.get()).unwrap_or(usize::MAX)
    }

    /// Wait for a slot and claim it.
    ///
    /// Returns the time spent waiting, which is zero when a slot was free and
    /// no other caller was queued ahead.
    pub async fn acquire(&self) -> Duration {
        let requested = Instant::now();
        let (mut window, mut waited) = match self.window.try_lock() {
            Ok(window) => (window, false),
            Err(_) => (self.window.lock().await, true),
        };

        let capacity = Self::capacity_for(&self.config);
        loop {
            let now = Instant::now();
            window.evict_expired(now, self.config.period);
            if window.grants.len() < capacity {
                window.grants.push_back(now);
                break;
            }
            if let Some(&oldest) = window.grants.front() {
                waited = true;
                let reopens = oldest
                    .checked_add(self.config.period)
                    .unwrap_or_else(|| now + FAR_FUTURE);
                sleep_until(reopens).await;
            }
        }

        if waited {
            let elapsed = requested.elapsed();
            debug!(
                waited_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                max_count = self.config.max_count.get(),
                "disk rate limit slot acquired after wait"
            );
            elapsed
        } else {
            Duration::ZERO
        }
    }

    /// Slots that could be granted right now without waiting.
    pub async fn available(&self) -> usize {
        let mut window = self.window.lock().await;
        window.evict_expired(Instant::now(), self.config.period);
        Self::capacity_for(&self.config).saturating_sub(window.grants.len())
    }
}
