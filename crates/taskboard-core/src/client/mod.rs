//! Resource Client
//!
//! Typed wrappers around the remote resources, organized by domain:
//! projects (+ memberships), tasks (+ assignments), users (+ auth).
//!
//! Every call treats 2xx as success and feeds the body through the
//! normalizer. A handful of endpoints answer "nothing here" with an error
//! status; those (endpoint, status) pairs are listed per operation and turn
//! into empty collections instead of errors.

mod project_api;
mod task_api;
mod user_api;


use std::sync::Arc;

use serde_json::Value;

use crate::config::ApiConfig;
use crate::domain::{ClientError, ClientResult};
use crate::normalize;
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

pub use project_api::ProjectDraft;
pub use task_api::TaskDraft;
pub use user_api::{LoginOutcome, Registration};

/// Cheap-to-clone handle on the remote API
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client over HTTP at the configured base URL.
    pub fn from_config(config: ApiConfig) -> Self {
        Self::new(Arc::new(ReqwestTransport::new(config)))
    }

    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        log::debug!("{} {} -> {}", method, path, response.status);
        Ok(response)
    }

    /// Sends and decodes a single JSON document; non-2xx is an error.
    /// A 2xx with an empty or non-JSON body decodes as `{}`.
    async fn fetch_json(&self, request: ApiRequest) -> ClientResult<Value> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(request_error(&response));
        }
        Ok(response
            .json()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// Sends and decodes a list, mapping the `empty_on` statuses to `[]`.
    async fn fetch_list(&self, request: ApiRequest, empty_on: &[u16]) -> ClientResult<Vec<Value>> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        if empty_on.contains(&response.status) {
            log::info!(
                "{}: HTTP {} treated as empty ({})",
                path,
                response.status,
                empty_reason(&response)
            );
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(request_error(&response));
        }
        Ok(response
            .json()
            .map(|body| normalize::items(&body).to_vec())
            .unwrap_or_default())
    }
}

/// Builds the error for a non-2xx response.
///
/// Message priority: JSON `message`, `error`, `detalle`, raw body text,
/// then a generic `HTTP <status>`.
pub(crate) fn request_error(response: &ApiResponse) -> ClientError {
    let from_json = response.json().and_then(|body| {
        ["message", "error", "detalle"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str).map(str::to_string))
            .filter(|msg| !msg.trim().is_empty())
    });
    let from_text = || {
        let text = response.body.trim();
        (!text.is_empty()).then(|| text.to_string())
    };
    let message = from_json
        .or_else(from_text)
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    ClientError::Request {
        status: response.status,
        message,
    }
}

fn empty_reason(response: &ApiResponse) -> String {
    response
        .json()
        .and_then(|body| body.get("detalle").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "no data".to_string())
}

/// Relation writes must point at rows the server actually has.
fn require_persisted(what: &str, provisional: bool) -> ClientResult<()> {
    if provisional {
        return Err(ClientError::Invalid(format!("{what} has not been saved yet")));
    }
    Ok(())
}
