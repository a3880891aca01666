//! Client for the appliance configuration API
//!
//! Implementations of [`ResourceClient`] only move bytes: they send one
//! request and hand back whatever status and body came back. The provided
//! `fetch` and `apply` methods own the success policy, so every transport
//! treats statuses and undecodable bodies the same way.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use nfvis_common::{ConnectionConfig, Error, MediaType, Method, Result};

/// One request against the configuration API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API root, including any query
    pub path: String,
    pub accept: MediaType,
    pub body: Option<Value>,
}

/// Raw answer from the appliance
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// Body parsed as a structured document, when it parses
    pub body: Option<Value>,
    pub raw: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam used by the reconciler
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Send a single request. No retries.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    /// Read a collection or instance. An empty or unparseable body is
    /// "no document", not an error.
    async fn fetch(&self, path: &str, accept: MediaType) -> Result<Option<Value>> {
        let request = ApiRequest {
            method: Method::Get,
            path: path.to_string(),
            accept,
            body: None,
        };
        let response = ensure_success(Method::Get, path, self.send(request).await?)?;
        Ok(response.body)
    }

    /// Issue a create, update or delete
    async fn apply(&self, method: Method, path: &str, patch: Option<&Value>) -> Result<ApiResponse> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            accept: MediaType::Data,
            body: patch.cloned(),
        };
        ensure_success(method, path, self.send(request).await?)
    }
}

/// Turn any non-2xx answer into a protocol error
pub fn ensure_success(method: Method, path: &str, response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        return Ok(response);
    }
    warn!("{} {} returned {}", method, path, response.status);
    Err(Error::Protocol {
        method,
        path: path.to_string(),
        status: response.status,
        body: response.body,
    })
}

/// Parse a response body, treating anything that is not JSON as absent
pub fn decode_body(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Response body is not a structured document: {}", e);
            None
        }
    }
}

/// HTTPS client for one appliance
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    timeout_secs: u64,
}

impl HttpClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.validate_certs)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            user: config.user.clone(),
            password: config.password.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, request: &ApiRequest, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                method: request.method,
                path: request.path.clone(),
                seconds: self.timeout_secs,
            }
        } else {
            Error::Transport {
                method: request.method,
                path: request.path.clone(),
                message: e.to_string(),
            }
        }
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl ResourceClient for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .http
            .request(http_method(request.method), &url)
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, MediaType::Data.as_str())
            .header(ACCEPT, request.accept.as_str());

        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(&request, e))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| self.transport_error(&request, e))?;

        Ok(ApiResponse {
            status,
            body: decode_body(&raw),
            raw,
        })
    }
}
