use std::time::Duration;
use tokio::time::Instant;

/// Global operations-per-second budget measured from a shared start
#[derive(Clone, Copy, Debug)]
pub struct RateLimiter {
    start: Instant,
    rate: u64,
}

impl RateLimiter {
    /// `rate` of 0 never waits
    pub fn new(start: Instant, rate: u64) -> Self {
        Self { start, rate }
    }

    /// Time to wait so that `completed_ops` does not run ahead of `elapsed * rate`
    pub fn delay(&self, elapsed: Duration, completed_ops: u64) -> Option<Duration> {
        if self.rate == 0 {
            return None;
        }

        let rate = self.rate as f64;
        let target_ops = elapsed.as_secs_f64() * rate;
        let completed_ops = completed_ops as f64;
        if completed_ops <= target_ops {
            return None;
        }

        Some(Duration::from_secs_f64((completed_ops - target_ops) / rate))
    }

    pub async fn wait(&self, completed_ops: u64) {
        if let Some(delay) = self.delay(self.start.elapsed(), completed_ops) {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_the_excess() {
        let limiter = RateLimiter::new(Instant::now(), 10);
        // 2s at 10 ops/s allows 20, 25 completed is 5 ahead
        let delay = limiter.delay(Duration::from_secs(2), 25).unwrap();
        assert!((delay.as_secs_f64() - 0.5).abs() < 1e-9);

        let delay = limiter.delay(Duration::from_millis(500), 10).unwrap();
        assert!((delay.as_secs_f64() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_wait_behind_target() {
        let limiter = RateLimiter::new(Instant::now(), 10);
        assert_eq!(limiter.delay(Duration::from_secs(2), 20), None);
        assert_eq!(limiter.delay(Duration::from_secs(2), 3), None);
        assert_eq!(limiter.delay(Duration::ZERO, 0), None);
    }

    #[test]
    fn zero_rate_is_unlimited() {
        let limiter = RateLimiter::new(Instant::now(), 0);
        assert_eq!(limiter.delay(Duration::ZERO, 1_000_000), None);
    }

    #[tokio::test]
    async fn wait_sleeps_until_target() {
        let start = Instant::now();
        let limiter = RateLimiter::new(start, 20);
        limiter.wait(2).await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
