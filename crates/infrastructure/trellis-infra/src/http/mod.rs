use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde_json::Value;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{url} returned HTTP {status}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("response decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No usable response: connection, timeout or a bad request URL.
    Transport,
    /// 5xx.
    ServerFault,
    /// Any other non-2xx status.
    ClientFault,
    /// 2xx with a body of the wrong shape.
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::InvalidUrl(_) | ApiError::Transport(_) => ApiErrorKind::Transport,
            ApiError::Status { status, .. } if *status >= 500 => ApiErrorKind::ServerFault,
            ApiError::Status { .. } => ApiErrorKind::ClientFault,
            ApiError::Decode(_) => ApiErrorKind::Decode,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a load action re-raises this failure to its caller after
    /// reporting it. Client faults and decode failures are swallowed.
    pub fn should_propagate(&self) -> bool {
        matches!(
            self.kind(),
            ApiErrorKind::ServerFault | ApiErrorKind::Transport
        )
    }
}

/// Request/response contract the store modules talk to.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}

pub fn default_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(
            trellis_config::DEFAULT_REQUEST_TIMEOUT_SECS,
        ))
        .user_agent(concat!("trellis/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// `reqwest` backed client rooted at the backend's base URL.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base: Url,
    csrf_token: Option<String>,
}

impl HttpApiClient {
    pub fn new(client: Client, base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self {
            client,
            base,
            csrf_token: None,
        })
    }

    /// Token echoed in the CSRF header of every mutating request.
    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path} against {}: {e}", self.base)))
    }
}

async fn read_json(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let url = resp.url().to_string();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            url,
            body,
        });
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(format!("{url} body failed: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{url}: {e}")))
}

#[async_trait::async_trait]
impl ApiClient for HttpApiClient {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("GET {url} failed: {e}")))?;
        read_json(resp).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        let mut req = self.client.post(url.clone()).json(body);
        if let Some(token) = &self.csrf_token {
            req = req.header(trellis_config::CSRF_HEADER_NAME, token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("POST {url} failed: {e}")))?;
        read_json(resp).await
    }
}
