use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_API_BASE: &str = "https://api.schooldesk.example/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("SCHOOLDESK_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let timeout = std::env::var("SCHOOLDESK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, timeout }
    }

    pub fn with_base(&self, base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout: self.timeout,
        }
    }
}

/// Failure taxonomy for remote calls. Anything else (field validation) is
/// owned by the step forms in the UI, not by this layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token in the session. Raised before any request is built;
    /// the caller must surface it instead of retrying silently.
    #[error("no credential present; sign in before calling the API")]
    MissingCredential,

    /// The request could not complete (connect, timeout, IO).
    #[error("request could not complete: {0}")]
    Network(String),

    /// Non-2xx response; the body is carried through as opaque detail.
    #[error("server rejected the request with status {status}")]
    ServerRejected { status: u16, body: Value },
}

impl ApiError {
    pub fn wire_code(&self) -> &'static str {
        match self {
            ApiError::MissingCredential => "credential_missing",
            ApiError::Network(_) => "network_failure",
            ApiError::ServerRejected { .. } => "server_rejected",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            ApiError::ServerRejected { status, body } => {
                Some(json!({ "status": status, "body": body }))
            }
            _ => None,
        }
    }
}

pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        // Joins resolve relative to the last path segment; a trailing slash
        // keeps "schools" under an "/api/" style base instead of replacing it.
        let mut base_url = config.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)
            .with_context(|| format!("invalid api base url: {}", base_url))?;
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("http client init failed")?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        // Credential check comes first: with no token, no request is built
        // and nothing touches the network.
        let Some(token) = token else {
            return Err(ApiError::MissingCredential);
        };
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();

        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header("x-request-id", &request_id);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().map_err(|e| {
            tracing::warn!(method = %method, path, request_id = %request_id, error = %e, "api request failed");
            ApiError::Network(e.to_string())
        })?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        // The response body stays opaque: JSON when it parses, raw text otherwise.
        let parsed: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text));

        if !status.is_success() {
            tracing::warn!(
                method = %method,
                path,
                status = status.as_u16(),
                request_id = %request_id,
                "api request rejected"
            );
            return Err(ApiError::ServerRejected {
                status: status.as_u16(),
                body: parsed,
            });
        }
        tracing::debug!(
            method = %method,
            path,
            status = status.as_u16(),
            request_id = %request_id,
            "api request completed"
        );
        Ok(parsed)
    }

    pub fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.send(Method::GET, path, query, None, token)
    }

    pub fn post(&self, path: &str, body: &Value, token: Option<&str>) -> Result<Value, ApiError> {
        self.send(Method::POST, path, &[], Some(body), token)
    }

    /// Single-attempt submission of the onboarding aggregate. No retry and no
    /// idempotency key; one POST per explicit user action.
    pub fn submit_school(&self, aggregate: &Value, token: Option<&str>) -> Result<Value, ApiError> {
        self.post("schools", aggregate, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ApiConfig {
            base_url: base.to_string(),
            timeout: Duration::from_secs(5),
        };
        ApiClient::new(&config).expect("client init")
    }

    #[test]
    fn base_url_keeps_path_prefixes() {
        let c = client("http://127.0.0.1:9999/api/v1");
        assert_eq!(c.base_url(), "http://127.0.0.1:9999/api/v1/");
        let url = c.endpoint("schools").expect("join");
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/api/v1/schools");
        let url = c.endpoint("/schools").expect("join");
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/api/v1/schools");
    }

    #[test]
    fn missing_credential_short_circuits() {
        let c = client("http://127.0.0.1:9999");
        let err = c
            .submit_school(&json!({}), None)
            .expect_err("no credential must fail");
        assert!(matches!(err, ApiError::MissingCredential));
        assert_eq!(err.wire_code(), "credential_missing");
        assert!(err.details().is_none());
    }

    #[test]
    fn rejection_detail_carries_status_and_body() {
        let err = ApiError::ServerRejected {
            status: 500,
            body: json!({ "message": "boom" }),
        };
        assert_eq!(err.wire_code(), "server_rejected");
        assert_eq!(
            err.details(),
            Some(json!({ "status": 500, "body": { "message": "boom" } }))
        );
        assert_eq!(
            ApiError::Network("connection refused".to_string()).wire_code(),
            "network_failure"
        );
    }

    #[test]
    fn bad_base_url_is_rejected_at_init() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(ApiClient::new(&config).is_err());
    }
}
