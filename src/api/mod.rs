//! HTTP API over the collector store.
//!
//! `GET /api/collectors` lists collector ids grouped by type,
//! `GET /api/collector/{id}` describes one collector, and each
//! [`CollectorHandler`] may attach its own endpoints.

mod collectors;
mod envelope;
mod routes;

pub use collectors::{CollectorDescription, get_collector, group_by_type, list_collectors};
pub use envelope::{Envelope, ResponseFormat};
pub use routes::{COLLECTOR_PREFIX, CollectorHandler, CollectorRoutes};

use axum::Router;
use axum::routing::get;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::collector::CollectorStore;

/// Build the API router for `store`, including every handler's endpoints.
///
/// A handler path that is already taken, by a built-in route or an earlier
/// handler, is skipped with a warning.
pub fn router(store: CollectorStore, handlers: &[Arc<dyn CollectorHandler>]) -> Router {
    let describe_path = format!("{}/{{id}}", COLLECTOR_PREFIX);
    let mut app = Router::new()
        .route("/api/collectors", get(list_collectors))
        .route(&describe_path, get(get_collector));
    let mut taken: HashSet<String> = HashSet::from(["/api/collectors".to_string(), describe_path]);

    for handler in handlers {
        debug!("Registering endpoints for collector {}", handler.id());
        let mut routes = CollectorRoutes::new(handler.id());
        handler.register_endpoints(&store, &mut routes);

        for (path, method_router) in routes.into_routes() {
            if !taken.insert(path.clone()) {
                warn!(
                    "Route {} is already registered, ignoring the one from collector {}",
                    path,
                    handler.id()
                );
                continue;
            }
            app = app.route(&path, method_router);
        }
    }

    app.route("/ping", get(ping))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Liveness probe
async fn ping() -> &'static str {
    "pong"
}
