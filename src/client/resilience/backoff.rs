//! Exponential backoff strategy for retry policies.

use std::time::Duration;

/// Exponential backoff with jitter, clamped to `[min, max]`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    min: Duration,
    max: Duration,
    factor: f64,
    jitter: f64,
}

impl ExponentialBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            factor: 2.0,
            jitter: 0.2,
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base = self.min.as_secs_f64() * self.factor.powi(exponent);
        let clamped = base.min(self.max.as_secs_f64());

        let jittered = if self.jitter > 0.0 {
            let jitter_range = clamped * self.jitter;
            let jitter_offset = rand::random::<f64>() * jitter_range * 2.0 - jitter_range;
            clamped + jitter_offset
        } else {
            clamped
        };

        let secs = jittered.clamp(self.min.as_secs_f64(), self.max.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
            .with_jitter(0.0);

        assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(400));
        assert_eq!(backoff.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn test_exponential_backoff_max() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_millis(500))
                .with_jitter(0.0);

        assert_eq!(backoff.delay_for(10), Duration::from_millis(500));
        assert_eq!(backoff.delay_for(u32::MAX), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let backoff = ExponentialBackoff::default().with_jitter(1.0);
        for attempt in 1..=20 {
            let delay = backoff.delay_for(attempt);
            assert!(delay >= Duration::from_millis(500), "{:?}", delay);
            assert!(delay <= Duration::from_secs(5), "{:?}", delay);
        }
    }

    #[test]
    fn test_max_never_below_min() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(backoff.max(), Duration::from_secs(2));
    }
}
