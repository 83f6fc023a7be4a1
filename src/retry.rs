//! Bounded waiting for things that appear asynchronously (a global set by a
//! script, DOM nodes rendered by Yew).

use std::future::Future;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// `window.PaymentSession`: 50 × 100 ms.
    pub const HOSTED_WIDGET: RetryPolicy = RetryPolicy {
        max_attempts: 50,
        interval: Duration::from_millis(100),
    };

    /// Hosted field placeholders: 20 × 100 ms.
    pub const DOM_ELEMENTS: RetryPolicy = RetryPolicy {
        max_attempts: 20,
        interval: Duration::from_millis(100),
    };

    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Resolve once `ready()` holds, checking up to `max_attempts + 1` times
/// with `sleep(interval)` in between. Returns `false` when the budget runs out.
pub async fn poll_until<R, S, F>(policy: RetryPolicy, mut ready: R, mut sleep: S) -> bool
where
    R: FnMut() -> bool,
    S: FnMut(Duration) -> F,
    F: Future<Output = ()>,
{
    let mut attempts = 0;
    loop {
        if ready() {
            return true;
        }
        if attempts >= policy.max_attempts {
            return false;
        }
        attempts += 1;
        sleep(policy.interval).await;
    }
}

/// Timer-backed sleep for the browser event loop.
pub async fn browser_sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await
}
