//! Core collector traits and types
use crate::error::Result;
use std::fmt;
use std::future::Future;

/// A pluggable unit of work run periodically by the collector store
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Get the collector name
    fn name(&self) -> &str;

    /// Get the collector type, used to group collectors
    fn collector_type(&self) -> &str;

    /// Run one collection.
    ///
    /// May take arbitrarily long; the store places no timeout on it. A
    /// collector that needs a deadline must enforce it itself.
    async fn collect(&self) -> Result<()>;
}

impl fmt::Debug for dyn Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("name", &self.name())
            .field("type", &self.collector_type())
            .finish()
    }
}

/// A collector backed by a closure
pub struct FnCollector<F> {
    name: String,
    collector_type: String,
    collect_fn: F,
}

impl<F, Fut> FnCollector<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    /// Create a new closure-backed collector
    pub fn new(name: impl Into<String>, collector_type: impl Into<String>, collect_fn: F) -> Self {
        Self {
            name: name.into(),
            collector_type: collector_type.into(),
            collect_fn,
        }
    }
}

#[async_trait::async_trait]
impl<F, Fut> Collector for FnCollector<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn collector_type(&self) -> &str {
        &self.collector_type
    }

    async fn collect(&self) -> Result<()> {
        (self.collect_fn)().await
    }
}
