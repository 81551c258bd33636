//! An in-process registry of periodic collectors and their latest status

#[cfg(feature = "api")]
pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::collector::{
        CancelHandle, Collector, CollectorStore, FnCollector, RunOutcome, Schedule, Snapshot,
    };
    pub use crate::error::{ObsError, Result, StoreError, StoreResult};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
