//! The response envelope every API endpoint returns.

use axum::extract::FromRequestParts;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::convert::Infallible;

use crate::error::StoreError;

/// `{error, error_code, result}` wrapper around every API result
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Envelope {
    #[serde(skip)]
    http_status: Option<StatusCode>,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl Envelope {
    /// A successful response carrying `data`
    pub fn response<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                http_status: None,
                error: false,
                error_code: None,
                result: Some(value),
            },
            Err(e) => {
                log::error!("Failed to serialize API result: {}", e);
                Self::error("encoding_error")
            }
        }
    }

    /// An error response. An empty code is omitted from the output.
    pub fn error(code: &str) -> Self {
        Self {
            http_status: None,
            error: true,
            error_code: (!code.is_empty()).then(|| code.to_string()),
            result: None,
        }
    }

    /// The standard response for endpoints that do not exist yet
    pub fn not_implemented() -> Self {
        Self::error("not_implemented").with_http_status(StatusCode::NOT_IMPLEMENTED)
    }

    /// Override the HTTP status
    pub fn with_http_status(mut self, status: StatusCode) -> Self {
        self.http_status = Some(status);
        self
    }

    /// The HTTP status: the override if set, else 500 for errors and 200 otherwise
    pub fn http_status(&self) -> StatusCode {
        match self.http_status {
            Some(status) => status,
            None if self.error => StatusCode::INTERNAL_SERVER_ERROR,
            None => StatusCode::OK,
        }
    }

    pub fn encode_json(&self, pretty: bool) -> Vec<u8> {
        let encoded = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        };

        encoded.unwrap_or_else(|e| {
            serde_json::to_vec(&serde_json::json!({ "error": true, "result": e.to_string() }))
                .unwrap_or_default()
        })
    }

    pub fn encode_yaml(&self) -> Vec<u8> {
        match serde_yaml::to_string(self) {
            Ok(encoded) => encoded.into_bytes(),
            Err(e) => format!("error: true\nresult: {:?}\n", e.to_string()).into_bytes(),
        }
    }
}

impl From<StoreError> for Envelope {
    fn from(err: StoreError) -> Self {
        log::error!("Collector store failure: {}", err);
        Self::error("internal_error")
    }
}

/// The encoding a client asked for through its `Accept` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Yaml,
}

impl ResponseFormat {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(accept) = headers.get(ACCEPT).and_then(|v| v.to_str().ok()) else {
            return Self::Json;
        };

        let wants_yaml = accept.split(',').any(|item| {
            let media = item.split(';').next().unwrap_or("").trim();
            matches!(
                media.to_ascii_lowercase().as_str(),
                "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml"
            )
        });

        if wants_yaml { Self::Yaml } else { Self::Json }
    }

    /// Encode the envelope and attach its status
    pub fn render(self, envelope: Envelope) -> Response {
        let (content_type, mut body) = match self {
            Self::Json => ("application/json", envelope.encode_json(true)),
            Self::Yaml => ("application/yaml", envelope.encode_yaml()),
        };
        if body.last() != Some(&b'\n') {
            body.push(b'\n');
        }

        let mut response = (envelope.http_status(), body).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ResponseFormat {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
