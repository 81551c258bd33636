//! Endpoints describing the registered collectors.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use std::collections::BTreeMap;

use super::envelope::{Envelope, ResponseFormat};
use crate::collector::{CollectorStore, Snapshot};

/// Description of one collector, as served by `GET /api/collector/{id}`
#[derive(Debug, Serialize, PartialEq)]
pub struct CollectorDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub collector_type: String,
    pub last_collection_ms: Option<i64>,
    pub last_collection_error: Option<String>,
    pub last_collection_duration_ms: Option<u64>,
    pub active: bool,
}

impl From<&Snapshot> for CollectorDescription {
    fn from(snapshot: &Snapshot) -> Self {
        let last_run = snapshot.last_run.as_ref();
        Self {
            name: snapshot.collector.name().to_string(),
            collector_type: snapshot.collector.collector_type().to_string(),
            last_collection_ms: last_run.map(|run| run.when_ms()),
            last_collection_error: last_run.and_then(|run| run.error.clone()),
            last_collection_duration_ms: last_run
                .map(|run| u64::try_from(run.duration.as_millis()).unwrap_or(u64::MAX)),
            active: snapshot.active,
        }
    }
}

/// Group collector ids by collector type
pub fn group_by_type(store: &CollectorStore) -> Result<BTreeMap<String, Vec<String>>, Envelope> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (id, collector) in store.get_collectors()? {
        grouped
            .entry(collector.collector_type().to_string())
            .or_default()
            .push(id);
    }

    for ids in grouped.values_mut() {
        ids.sort();
    }
    Ok(grouped)
}

/// `GET /api/collectors`: collector type -> registered ids
pub async fn list_collectors(
    State(store): State<CollectorStore>,
    format: ResponseFormat,
) -> Response {
    let envelope = match group_by_type(&store) {
        Ok(grouped) => Envelope::response(grouped),
        Err(envelope) => envelope,
    };
    format.render(envelope)
}

/// `GET /api/collector/{id}`: the collector's latest state
pub async fn get_collector(
    State(store): State<CollectorStore>,
    Path(id): Path<String>,
    format: ResponseFormat,
) -> Response {
    let envelope = match store.get_snapshot(&id) {
        Ok(Some(snapshot)) => Envelope::response(CollectorDescription::from(&snapshot)),
        Ok(None) => Envelope::error("unknown_collector").with_http_status(StatusCode::NOT_FOUND),
        Err(e) => e.into(),
    };
    format.render(envelope)
}
