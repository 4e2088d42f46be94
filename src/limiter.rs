//! Token-bucket rate limiter shared by the bulk query layer.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Token bucket with a configurable refill rate and burst capacity.
///
/// One limiter instance is owned per client and shared by reference with
/// every call site; there is no global state. `acquire` is async and
/// cancelable: dropping the future (for example via `tokio::time::timeout`)
/// abandons the wait.
#[derive(Debug)]
pub struct RateLimiter {
    /// Token refill rate per second.
    rate: f64,
    /// Mutable bucket state behind a single lock.
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    /// Current token count, in `[0, burst]`.
    tokens: f64,
    /// Maximum token count.
    burst: f64,
    /// Last refill instant.
    refilled: Instant,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` calls per second with bursts of
    /// up to `burst` immediate calls.
    pub fn new(rate: f64, burst: usize) -> Self {
        assert!(rate > 0.0, "rate must be positive");
        Self {
            rate,
            bucket: Mutex::new(Bucket {
                tokens: burst as f64,
                burst: burst as f64,
                refilled: Instant::now(),
            }),
        }
    }

    /// Take one token, waiting for the bucket to refill if necessary.
    ///
    /// The token is only debited once it is available, so a caller whose
    /// future is dropped mid-wait consumes nothing and later callers are
    /// not delayed by the abandoned attempt.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().expect("limiter lock poisoned");
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.refilled).as_secs_f64();
                bucket.tokens = (bucket.tokens + elapsed * self.rate).min(bucket.burst);
                bucket.refilled = now;
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - bucket.tokens) / self.rate))
                }
            };

            match wait {
                None => return,
                Some(wait) => tokio::time::sleep(wait).await,
            }
        }
    }
}
