use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Bucket {
    allowance: f64,
    last: Instant,
}

/// Global token-bucket throttle shared by every network worker.
///
/// Grants at most `rate` tokens over any sliding window of length `per`.
/// A waiter that finds the bucket empty sleeps exactly long enough for one
/// token to accrue and consumes it; the mutex is held across that sleep, so
/// waiters drain one at a time. No fairness beyond first-unblocked-by-time.
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    rate: f64,
    per: f64,
}

impl RateLimiter {
    pub fn new(rate: u32, per: Duration) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                allowance: rate as f64,
                last: Instant::now(),
            }),
            rate: rate as f64,
            per: per.as_secs_f64(),
        }
    }

    /// Blocks until one token is available, then consumes it.
    pub async fn wait(&self) {
        let mut bucket = self.bucket.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last).as_secs_f64();
        bucket.allowance = (bucket.allowance + elapsed * (self.rate / self.per)).min(self.rate);
        bucket.last = now;

        if bucket.allowance < 1.0 {
            let to_sleep = (1.0 - bucket.allowance) * (self.per / self.rate);
            tokio::time::sleep(Duration::from_secs_f64(to_sleep)).await;
            // The token that accrued during the sleep is the one being
            // consumed; the refill clock restarts now, or the slept
            // interval would be credited twice.
            bucket.last = Instant::now();
            bucket.allowance = 0.0;
        } else {
            bucket.allowance -= 1.0;
        }
    }
}
