//! Authenticated HTTP client shared by every REST adapter.
//!
//! [`HttpClient`] wraps `reqwest::Client` with one upstream base URL, an
//! [`AuthScheme`], and an optional cached session token. All responses are
//! returned as `serde_json::Value` — the tools layer handles formatting for
//! the AI agent, and payload shape is passed through untouched (except the
//! per-client [`normalize`](crate::normalize) hook).
//!
//! ## Re-authentication
//!
//! Login-based upstreams (Catalyst Center) issue short-lived tokens and
//! signal expiry with HTTP 401. On a 401 the client re-authenticates exactly
//! once and replays the identical request, then surfaces whatever comes
//! back. Static schemes (basic auth, bearer keys) cannot be refreshed:
//! their 401 is terminal for the call.
//!
//! ## Error handling
//!
//! Non-2xx responses after the allowed replay become
//! [`ClientError::Upstream`] with status and body. Transport failures are
//! scrubbed through the [`Redactor`] before they leave this module.

use std::time::Duration;

use base64::Engine;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::redact::Redactor;

/// How the client presents credentials to the upstream.
#[derive(Debug)]
pub enum AuthScheme {
    /// POST to a login endpoint with basic auth; the returned token is
    /// cached and replayed in a custom header on every request.
    TokenLogin {
        login_path: String,
        username: String,
        password: String,
        /// Field in the login response body holding the token.
        token_field: String,
        /// Header the token is replayed in (e.g. `X-Auth-Token`).
        token_header: String,
    },
    /// Username/password presented on every request.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>` on every request.
    Bearer { token: String },
    /// `Authorization: Token <token>` on every request (NetBox style).
    Token { token: String },
}

/// Transformation applied to successful response bodies before they are
/// returned. Used by the Meraki adapter for null coercion.
pub type Normalizer = fn(&mut Value);

/// HTTP client for a single upstream API.
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthScheme,
    /// Cached session token. Absent until the first successful
    /// authentication; cleared only by being overwritten.
    token: RwLock<Option<String>>,
    redactor: Redactor,
    normalizer: Option<Normalizer>,
}

/// Builder mirroring the upstream options the adapters actually vary.
pub struct HttpClientBuilder {
    base_url: String,
    auth: AuthScheme,
    verify_ssl: bool,
    timeout: Duration,
    redactor: Redactor,
    normalizer: Option<Normalizer>,
}

impl HttpClientBuilder {
    pub fn new(base_url: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            verify_ssl: true,
            timeout: Duration::from_secs(60),
            redactor: Redactor::default(),
            normalizer: None,
        }
    }

    /// Accept self-signed upstream certificates (lab deployments).
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn build(self) -> HttpClient {
        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .user_agent(concat!("netmcp/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!self.verify_ssl)
            .connect_timeout(Duration::from_secs(10))
            .timeout(self.timeout)
            .build()
            .expect("Failed to build HTTP client");

        HttpClient {
            http,
            // Strip trailing slash for consistent URL construction
            base_url: self.base_url.trim_end_matches('/').to_string(),
            auth: self.auth,
            token: RwLock::new(None),
            redactor: self.redactor,
            normalizer: self.normalizer,
        }
    }
}

impl HttpClient {
    /// The upstream base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        self.execute(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.execute(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.execute(Method::DELETE, path, &[], None).await
    }

    /// Authenticate against the login endpoint and cache the returned token.
    ///
    /// Only meaningful for [`AuthScheme::TokenLogin`]; static schemes have
    /// nothing to fetch. Overwrites any previously cached token.
    async fn authenticate(&self) -> Result<String, ClientError> {
        let AuthScheme::TokenLogin {
            login_path,
            username,
            password,
            token_field,
            ..
        } = &self.auth
        else {
            return Err(ClientError::Auth(
                "client has no login endpoint to re-authenticate against".into(),
            ));
        };

        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));

        let response = self
            .http
            .post(format!("{}{}", self.base_url, login_path))
            .header(reqwest::header::AUTHORIZATION, format!("Basic {credentials}"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "authentication request rejected");
            return Err(ClientError::Auth(format!(
                "login endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let token = body
            .get(token_field.as_str())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::Auth(format!("login response missing '{token_field}' field"))
            })?
            .to_string();

        *self.token.write().await = Some(token.clone());
        debug!("session token refreshed");
        Ok(token)
    }

    /// Return the cached token, authenticating first if none exists.
    /// `None` for static schemes — the credential itself is presented.
    async fn ensure_session(&self) -> Result<Option<String>, ClientError> {
        if !matches!(self.auth, AuthScheme::TokenLogin { .. }) {
            return Ok(None);
        }
        if let Some(token) = self.token.read().await.clone() {
            return Ok(Some(token));
        }
        self.authenticate().await.map(Some)
    }

    /// Attach credentials to a request, using `token` when the scheme is
    /// session-based.
    fn apply_auth(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match &self.auth {
            AuthScheme::TokenLogin { token_header, .. } => {
                request.header(token_header.as_str(), token.unwrap_or_default())
            }
            AuthScheme::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthScheme::Bearer { token } => request.bearer_auth(token),
            AuthScheme::Token { token } => {
                request.header(reqwest::header::AUTHORIZATION, format!("Token {token}"))
            }
        }
    }

    /// Core request path: ensure a session, execute, recover from a single
    /// 401 by re-authenticating and replaying once, then classify the
    /// outcome. Never loops more than one re-authentication + replay cycle.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let token = self.ensure_session().await?;

        let response = self
            .send_once(method.clone(), path, query, body, token.as_deref())
            .await?;

        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return self.handle_response(response).await;
        }

        // Re-presenting an identical static credential cannot succeed
        if !matches!(self.auth, AuthScheme::TokenLogin { .. }) {
            return Err(ClientError::Auth(
                "upstream rejected credentials (HTTP 401)".into(),
            ));
        }

        debug!(%path, "401 from upstream, re-authenticating once");
        let fresh = self.authenticate().await?;
        let replayed = self
            .send_once(method, path, query, body, Some(&fresh))
            .await?;
        if replayed.status() == reqwest::StatusCode::UNAUTHORIZED {
            // A fresh token that is still rejected means the credentials
            // themselves are bad; do not loop.
            return Err(ClientError::Auth(
                "upstream rejected the request after re-authentication (HTTP 401)".into(),
            ));
        }
        self.handle_response(replayed).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, url);
        request = self.apply_auth(request, token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| self.transport_error(&e))
    }

    /// Parse the final (possibly replayed) response: 2xx bodies are returned
    /// as JSON after the optional normalization pass; anything else becomes
    /// an [`ClientError::Upstream`] carrying status and body.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                body: self.redactor.scrub(&body),
            });
        }

        // 204 and other empty bodies have nothing to parse
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let mut value: Value = serde_json::from_str(&body).map_err(|e| {
            ClientError::Transport(format!("invalid JSON from upstream: {e}"))
        })?;
        if let Some(normalize) = self.normalizer {
            normalize(&mut value);
        }
        Ok(value)
    }

    fn transport_error(&self, err: &reqwest::Error) -> ClientError {
        ClientError::Transport(self.redactor.scrub(&err.to_string()))
    }
}
