use chrono::Utc;
use log::{debug, error, trace, warn};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::config::Schedule;
use super::core::Collector;
use super::snapshot::RunOutcome;
use super::store::StoreInner;

/// The background loop driving one registered collector.
///
/// Armed: waiting on a jittered timer. Running: inside `collect`. Stopped:
/// cancelled, removed, or the store was dropped. Cancellation while armed
/// drops the pending timer immediately; cancellation while running lets the
/// run finish, records it, and stops without rearming.
pub(crate) struct Activity {
    pub(crate) id: String,
    pub(crate) registration: u64,
    pub(crate) collector: Arc<dyn Collector>,
    pub(crate) schedule: Schedule,
    pub(crate) store: Weak<StoreInner>,
    pub(crate) token: CancellationToken,
}

impl Activity {
    pub(crate) async fn run(self, first_delay: Duration) {
        let name = self.collector.name().to_string();
        let mut delay = first_delay;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    debug!("Collector `{}` ({}) cancelled while waiting", name, self.id);
                    break;
                }
                _ = time::sleep(delay) => {}
            }

            if self.token.is_cancelled() {
                debug!("Collector `{}` ({}) cancelled before running", name, self.id);
                break;
            }
            if self.store.strong_count() == 0 {
                debug!("Store dropped, stopping collector `{}` ({})", name, self.id);
                break;
            }

            let outcome = self.collect_once(&name).await;

            let Some(store) = self.store.upgrade() else {
                break;
            };
            match store.record_run(&self.id, self.registration, outcome) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Collector `{}` ({}) was removed, dropping its last run", name, self.id);
                    break;
                }
                Err(e) => error!("Failed to record run of `{}` ({}): {}", name, self.id, e),
            }
            drop(store);

            if self.token.is_cancelled() {
                break;
            }

            delay = self.schedule.next_delay();
            trace!("Next collection of `{}` in {:?}", name, delay);
        }

        debug!("Collector `{}` ({}) stopped", name, self.id);
    }

    /// Run the collector once, turning failures and panics into the outcome's error
    async fn collect_once(&self, name: &str) -> RunOutcome {
        let when = Utc::now();
        let started = Instant::now();

        // a separate task so a panicking collector cannot take the loop down
        let collector = Arc::clone(&self.collector);
        let result = tokio::spawn(async move { collector.collect().await }).await;
        let duration = started.elapsed();

        let error = match result {
            Ok(Ok(())) => {
                trace!("Collected `{}` in {:?}", name, duration);
                None
            }
            Ok(Err(e)) => {
                warn!("Error collecting `{}` ({}): {:#}", name, self.id, e);
                Some(e.to_string())
            }
            Err(e) => {
                error!("Collector `{}` ({}) panicked: {}", name, self.id, e);
                Some(format!("collector panicked: {}", e))
            }
        };

        RunOutcome {
            collector_id: self.id.clone(),
            when,
            duration,
            error,
        }
    }
}
