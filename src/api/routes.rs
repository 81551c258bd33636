use axum::routing::MethodRouter;

use crate::collector::CollectorStore;

/// Path every collector endpoint lives under
pub const COLLECTOR_PREFIX: &str = "/api/collector";

/// Exposes extra API endpoints for one registered collector.
///
/// [`register_endpoints`](Self::register_endpoints) is called once, when the
/// router is built, with the store holding the collector.
pub trait CollectorHandler: Send + Sync {
    /// The id the collector was registered under in the store
    fn id(&self) -> &str;

    /// Attach this collector's endpoints to `routes`
    fn register_endpoints(&self, store: &CollectorStore, routes: &mut CollectorRoutes);
}

/// The two routing scopes handed to a [`CollectorHandler`].
///
/// Shared routes land directly under `/api/collector/`, a namespace common to
/// all collectors, typically used for per-type endpoints. When several
/// handlers register the same path, the first registration wins. Scoped
/// routes land under `/api/collector/<id>/`.
pub struct CollectorRoutes {
    id: String,
    routes: Vec<(String, MethodRouter<CollectorStore>)>,
}

impl CollectorRoutes {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            routes: Vec::new(),
        }
    }

    /// Id of the collector whose routes these are
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Route `/api/collector/<path>`
    pub fn shared_route(&mut self, path: &str, method_router: MethodRouter<CollectorStore>) -> &mut Self {
        let full = format!("{}/{}", COLLECTOR_PREFIX, path.trim_start_matches('/'));
        self.routes.push((full, method_router));
        self
    }

    /// Route `/api/collector/<id>/<path>`
    pub fn scoped_route(&mut self, path: &str, method_router: MethodRouter<CollectorStore>) -> &mut Self {
        let full = format!(
            "{}/{}/{}",
            COLLECTOR_PREFIX,
            self.id,
            path.trim_start_matches('/')
        );
        self.routes.push((full, method_router));
        self
    }

    /// Full paths and their handlers, in registration order
    pub(crate) fn into_routes(self) -> Vec<(String, MethodRouter<CollectorStore>)> {
        self.routes
    }
}
