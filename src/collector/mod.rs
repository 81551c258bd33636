mod config;
mod core;
pub mod jitter;
mod periodic;
mod snapshot;
mod store;

// Re-export public items
pub use config::{Schedule, ScheduleBuilder};
pub use core::{Collector, FnCollector};
pub use jitter::apply_jitter;
pub use snapshot::{RunOutcome, Snapshot};
pub use store::{CancelHandle, CollectorStore};
