//! The collector store: registry of collectors and their latest run.
//!
//! Every registered collector gets its own background activity which writes
//! run outcomes back into the store. Readers get consistent copies: the
//! collector and its latest outcome live in the same map entry behind one
//! lock, so a [`Snapshot`] can never pair a collector with another
//! registration's outcome.

use log::{debug, info};
use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use super::config::Schedule;
use super::core::Collector;
use super::periodic::Activity;
use super::snapshot::{RunOutcome, Snapshot};
use crate::error::{StoreError, StoreResult};

/// A registered collector together with its latest run
struct Entry {
    /// Distinguishes this registration from earlier ones under the same id
    registration: u64,
    collector: Arc<dyn Collector>,
    schedule: Schedule,
    token: CancellationToken,
    last_run: Option<RunOutcome>,
}

pub(crate) struct StoreInner {
    entries: RwLock<HashMap<String, Entry>>,
    next_registration: AtomicU64,
    tasks: TaskTracker,
}

impl StoreInner {
    /// Record the outcome of a run.
    ///
    /// Returns `false` without writing when `registration` is no longer the
    /// live registration for `id`, i.e. the collector was removed (and
    /// possibly re-added) while the run was in flight.
    pub(crate) fn record_run(
        &self,
        id: &str,
        registration: u64,
        outcome: RunOutcome,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.write()?;
        match entries.get_mut(id) {
            Some(entry) if entry.registration == registration => {
                entry.last_run = Some(outcome);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Handle returned when a collector is registered.
///
/// Cancelling stops the collector's activity. The registration and its last
/// outcome stay queryable until [`CollectorStore::remove_collector`] is
/// called. Dropping the handle does not cancel anything.
#[derive(Debug)]
pub struct CancelHandle {
    id: String,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl CancelHandle {
    /// Id of the collector this handle controls
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request cancellation. Safe to call repeatedly, and after removal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the activity has stopped, for whatever reason
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the activity to stop.
    ///
    /// Once this returns the collector will not be invoked again and no
    /// further outcome is written for this registration.
    pub async fn stopped(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            log::error!("Collector activity `{}` ended abnormally: {}", self.id, e);
        }
    }
}

/// Shared registry of periodic collectors.
///
/// Cloning is cheap; all clones refer to the same registry. Registration
/// spawns a task, so it must happen inside a Tokio runtime.
#[derive(Clone)]
pub struct CollectorStore {
    inner: Arc<StoreInner>,
}

impl Default for CollectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CollectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorStore")
            .field(
                "collector_count",
                &self.inner.entries.try_read().map(|e| e.len()).unwrap_or(0),
            )
            .finish_non_exhaustive()
    }
}

impl CollectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                entries: RwLock::new(HashMap::new()),
                next_registration: AtomicU64::new(0),
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Register a collector under a freshly generated id and start running it.
    ///
    /// The first run happens one jittered interval after registration.
    pub fn add_collector(
        &self,
        interval: Duration,
        jitter: Duration,
        collector: Arc<dyn Collector>,
    ) -> StoreResult<(String, CancelHandle)> {
        let schedule = Schedule::new(interval, jitter)?;

        loop {
            let id = Uuid::new_v4().to_string();
            match self.register(id.clone(), schedule, Arc::clone(&collector)) {
                Err(StoreError::DuplicateId(_)) => continue,
                result => return result.map(|handle| (id, handle)),
            }
        }
    }

    /// Register a collector under a caller-chosen id and start running it.
    ///
    /// Fails with [`StoreError::DuplicateId`] if the id is taken; the existing
    /// registration is left untouched.
    pub fn add_collector_with_id(
        &self,
        id: impl Into<String>,
        interval: Duration,
        jitter: Duration,
        collector: Arc<dyn Collector>,
    ) -> StoreResult<CancelHandle> {
        let id = id.into();
        if id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "collector id must not be empty".to_string(),
            ));
        }
        if id.contains('/') {
            return Err(StoreError::InvalidArgument(format!(
                "collector id `{}` must not contain '/'",
                id
            )));
        }

        let schedule = Schedule::new(interval, jitter)?;
        self.register(id, schedule, collector)
    }

    fn register(
        &self,
        id: String,
        schedule: Schedule,
        collector: Arc<dyn Collector>,
    ) -> StoreResult<CancelHandle> {
        let token = CancellationToken::new();
        let registration = self.inner.next_registration.fetch_add(1, Ordering::Relaxed);

        {
            let mut entries = self.inner.entries.write()?;
            match entries.entry(id.clone()) {
                MapEntry::Occupied(_) => return Err(StoreError::DuplicateId(id)),
                MapEntry::Vacant(slot) => {
                    slot.insert(Entry {
                        registration,
                        collector: Arc::clone(&collector),
                        schedule,
                        token: token.clone(),
                        last_run: None,
                    });
                }
            }
        }

        let first_delay = schedule.next_delay();
        info!(
            "Starting collector `{}` ({}) {}, initial collection in {:?}",
            collector.name(),
            id,
            schedule,
            first_delay
        );

        let activity = Activity {
            id: id.clone(),
            registration,
            collector,
            schedule,
            store: Arc::downgrade(&self.inner),
            token: token.clone(),
        };
        let task = self.inner.tasks.spawn(activity.run(first_delay));

        Ok(CancelHandle { id, token, task })
    }

    /// Stop and unregister a collector.
    ///
    /// Unknown ids are ignored. Returns whether a registration was removed.
    pub fn remove_collector(&self, id: &str) -> StoreResult<bool> {
        let removed = self.inner.entries.write()?.remove(id);

        match removed {
            Some(entry) => {
                entry.token.cancel();
                info!("Removed collector `{}` ({})", entry.collector.name(), id);
                Ok(true)
            }
            None => {
                debug!("Ignoring removal of unknown collector {}", id);
                Ok(false)
            }
        }
    }

    /// Get a copy of every registered collector, keyed by id
    pub fn get_collectors(&self) -> StoreResult<HashMap<String, Arc<dyn Collector>>> {
        let entries = self.inner.entries.read()?;
        Ok(entries
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(&entry.collector)))
            .collect())
    }

    /// Get a copy of every registered collector of the given type
    pub fn get_collectors_of_type(
        &self,
        collector_type: &str,
    ) -> StoreResult<HashMap<String, Arc<dyn Collector>>> {
        let entries = self.inner.entries.read()?;
        Ok(entries
            .iter()
            .filter(|(_, entry)| entry.collector.collector_type() == collector_type)
            .map(|(id, entry)| (id.clone(), Arc::clone(&entry.collector)))
            .collect())
    }

    /// Get a collector by id
    pub fn get_collector(&self, id: &str) -> StoreResult<Option<Arc<dyn Collector>>> {
        let entries = self.inner.entries.read()?;
        Ok(entries.get(id).map(|entry| Arc::clone(&entry.collector)))
    }

    /// Get the schedule a collector was registered with
    pub fn get_schedule(&self, id: &str) -> StoreResult<Option<Schedule>> {
        let entries = self.inner.entries.read()?;
        Ok(entries.get(id).map(|entry| entry.schedule))
    }

    /// Get a consistent view of a collector and its latest run
    pub fn get_snapshot(&self, id: &str) -> StoreResult<Option<Snapshot>> {
        let entries = self.inner.entries.read()?;
        Ok(entries.get(id).map(|entry| Snapshot {
            id: id.to_string(),
            collector: Arc::clone(&entry.collector),
            last_run: entry.last_run.clone(),
            active: !entry.token.is_cancelled(),
        }))
    }

    /// Number of registered collectors
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.inner.entries.read()?.len())
    }

    /// Whether no collectors are registered
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.inner.entries.read()?.is_empty())
    }

    /// Cancel every collector and wait for their activities to stop.
    ///
    /// Registrations stay queryable. Meant for process exit.
    pub async fn shutdown(&self) {
        let cancelled = {
            let entries = self
                .inner
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for entry in entries.values() {
                entry.token.cancel();
            }
            entries.len()
        };

        info!("Stopping {} collector(s)", cancelled);
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
        info!("All collectors stopped");
    }
}
