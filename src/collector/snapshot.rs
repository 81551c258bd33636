use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::core::Collector;

/// The recorded result of one collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Id of the collector that ran
    pub collector_id: String,
    /// Wall-clock time the run began
    pub when: DateTime<Utc>,
    /// How long the run took
    pub duration: Duration,
    /// The error reported by the collector, if the run failed
    pub error: Option<String>,
}

impl RunOutcome {
    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Start of the run in milliseconds since the Unix epoch
    pub fn when_ms(&self) -> i64 {
        self.when.timestamp_millis()
    }
}

/// A point-in-time view of one registered collector
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The id the collector is registered under
    pub id: String,
    /// The registered collector
    pub collector: Arc<dyn Collector>,
    /// The most recent run, if the collector has run at all
    pub last_run: Option<RunOutcome>,
    /// False once the collector's activity has been cancelled
    pub active: bool,
}
