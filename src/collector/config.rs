use std::fmt;
use std::time::Duration;

use super::jitter::apply_jitter;
use crate::error::{StoreError, StoreResult};

/// When a registered collector runs: every `interval`, +/- `jitter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    jitter: Duration,
}

impl Schedule {
    /// Create a validated schedule. The interval must be positive.
    pub fn new(interval: Duration, jitter: Duration) -> StoreResult<Self> {
        if interval.is_zero() {
            return Err(StoreError::InvalidArgument(
                "collection interval must be positive".to_string(),
            ));
        }

        Ok(Self { interval, jitter })
    }

    /// Get the base collection interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get the half spread applied around the interval
    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Compute the wait before the next run
    pub fn next_delay(&self) -> Duration {
        apply_jitter(self.interval, self.jitter)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.jitter.is_zero() {
            write!(f, "every {:?}", self.interval)
        } else {
            write!(f, "every {:?} +/- {:?}", self.interval, self.jitter)
        }
    }
}

/// Builder for collector schedules
pub struct ScheduleBuilder {
    interval: Duration,
    jitter: Duration,
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            jitter: Duration::ZERO,
        }
    }
}

impl ScheduleBuilder {
    /// Create a new schedule builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the jitter half spread
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Build the schedule
    pub fn build(self) -> StoreResult<Schedule> {
        Schedule::new(self.interval, self.jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        let err = Schedule::new(Duration::ZERO, Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let schedule = ScheduleBuilder::new().build().unwrap();
        assert_eq!(schedule.interval(), Duration::from_secs(60));
        assert_eq!(schedule.jitter(), Duration::ZERO);
        assert_eq!(schedule.next_delay(), Duration::from_secs(60));
        assert_eq!(schedule.to_string(), "every 60s");
    }

    #[test]
    fn test_next_delay_uses_jitter() {
        let schedule = ScheduleBuilder::new()
            .interval(Duration::from_millis(100))
            .jitter(Duration::from_millis(10))
            .build()
            .unwrap();

        for _ in 0..100 {
            let delay = schedule.next_delay();
            assert!(delay >= Duration::from_millis(90) && delay < Duration::from_millis(110));
        }
        assert_eq!(schedule.to_string(), "every 100ms +/- 10ms");
    }
}
