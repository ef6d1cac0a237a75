// HTTP boundary
//
// Bearer-authenticated GET against the management API. A non-2xx status is a normal return
// value; only failures to complete the exchange at all become errors.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{DeployError, DeployResult};
use crate::utils::logging::mask_bearer_token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, bearer_token: &str) -> DeployResult<HttpResponse>;
}

/// Production transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> DeployResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeployError::Transport {
                url: String::new(),
                details: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, bearer_token: &str) -> DeployResult<HttpResponse> {
        let auth = format!("Bearer {}", bearer_token);
        log::debug!(
            "[PHASE: azure] [STEP: http_get] GET {} (Authorization: {})",
            url,
            mask_bearer_token(&auth)
        );

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| DeployError::Transport {
                url: url.to_string(),
                details: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| DeployError::Transport {
            url: url.to_string(),
            details: format!("failed to read response body: {}", e),
        })?;

        log::debug!(
            "[PHASE: azure] [STEP: http_get] HTTP {} ({} bytes)",
            status,
            body.len()
        );
        Ok(HttpResponse { status, body })
    }
}

enum CannedReply {
    Respond(HttpResponse),
    Fail(String),
}

/// Transport that serves fixed replies keyed by URL path (query string ignored) and records
/// every requested URL. Unrouted paths answer 404 with an ARM error body.
#[derive(Default)]
pub struct CannedTransport {
    routes: Mutex<HashMap<String, CannedReply>>,
    requests: Mutex<Vec<String>>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, path: &str, status: u16, body: Value) -> Self {
        self.route_json(path, status, body);
        self
    }

    pub fn route_json(&self, path: &str, status: u16, body: Value) {
        self.lock_routes().insert(
            normalize_path(path),
            CannedReply::Respond(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Requests to `path` fail at the transport level (no status).
    pub fn route_failure(&self, path: &str, details: &str) {
        self.lock_routes()
            .insert(normalize_path(path), CannedReply::Fail(details.to_string()));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Number of recorded requests whose URL contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, CannedReply>> {
        self.routes.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn normalize_path(raw: &str) -> String {
    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw.split('?').next().unwrap_or_default().to_string(),
    };
    path.trim_end_matches('/').to_ascii_lowercase()
}

#[async_trait]
impl HttpTransport for CannedTransport {
    async fn get(&self, url: &str, _bearer_token: &str) -> DeployResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(url.to_string());

        let routes = self.lock_routes();
        match routes.get(&normalize_path(url)) {
            Some(CannedReply::Respond(resp)) => Ok(resp.clone()),
            Some(CannedReply::Fail(details)) => Err(DeployError::Transport {
                url: url.to_string(),
                details: details.clone(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: serde_json::json!({
                    "error": { "code": "ResourceNotFound", "message": "No canned response" }
                })
                .to_string(),
            }),
        }
    }
}
