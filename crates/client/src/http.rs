//! JSON request client for the directory API.
//!
//! Every call goes through the same pipeline: compose headers (JSON content
//! type, bearer token unless suppressed), send, then translate the response
//! with a fixed policy:
//!
//! 1. non-success status -> [`ApiError::Http`], message taken from the body's
//!    `message` field when the body is JSON, else from the status text;
//! 2. success with a JSON content type -> decoded body;
//! 3. success with any other content type -> [`ApiError::Format`] carrying a
//!    short excerpt of the body.
//!
//! There is no retry and no client-side timeout policy.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use userdesk_core::{ApiError, ApiResult};

use crate::session::SessionStore;

/// How many characters of a non-JSON body end up in a [`ApiError::Format`].
pub const EXCERPT_CHARS: usize = 100;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Do not send the stored bearer token (used by login).
    pub skip_auth: bool,
    /// Extra headers, applied after the defaults.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn skip_auth() -> Self {
        Self {
            skip_auth: true,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// HTTP transport for JSON resources with bearer-token injection.
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl RequestClient {
    /// Client for `base_url`. An empty base URL is accepted; requests then use
    /// the bare path and fail at send time.
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("userdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, base_url, session))
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>, session: SessionStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn get<T>(&self, path: &str, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, path, None, options).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.send(Method::POST, path, Some(body), options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.send(Method::PUT, path, Some(body), options).await
    }

    pub async fn delete<T>(&self, path: &str, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(Method::DELETE, path, None, options).await
    }

    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.compose_headers(&options).await?;

        tracing::debug!(%method, %url, skip_auth = options.skip_auth, "sending request");

        let mut req = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%method, %url, "request failed: {e}");
            ApiError::transport(e.to_string())
        })?;

        handle_response(resp).await
    }

    async fn compose_headers(&self, options: &RequestOptions) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.load_token().await {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::transport(format!("invalid bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::transport(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::transport(format!("invalid header value for {name}: {e}")))?;
            headers.insert(name, value);
        }

        if options.skip_auth {
            headers.remove(AUTHORIZATION);
        }

        Ok(headers)
    }
}

fn encode_body<B>(body: &B) -> ApiResult<Vec<u8>>
where
    B: Serialize + ?Sized,
{
    serde_json::to_vec(body)
        .map_err(|e| ApiError::format(format!("failed to encode request body: {e}")))
}

async fn handle_response<T>(resp: reqwest::Response) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    let status = resp.status();

    if !status.is_success() {
        // A body that cannot be read is treated like one that cannot be parsed.
        let body = resp.bytes().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!(status = status.as_u16(), %message, "request rejected");
        return Err(ApiError::http(status.as_u16(), message));
    }

    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let body = resp
        .bytes()
        .await
        .map_err(|e| ApiError::transport(format!("failed to read response body: {e}")))?;

    if !is_json {
        let text = String::from_utf8_lossy(&body);
        return Err(ApiError::format(format!(
            "Expected JSON response but got: {}...",
            excerpt(&text, EXCERPT_CHARS)
        )));
    }

    serde_json::from_slice(&body)
        .map_err(|e| ApiError::format(format!("failed to decode response body: {e}")))
}

/// Message for a rejected request.
///
/// JSON body with a non-empty `message` wins; JSON without one falls back to
/// the generic text; a non-JSON body falls back to the status text.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = format!("HTTP error! status: {}", status.as_u16());

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or(fallback),
    }
}

/// First `max_chars` characters of `text`.
fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
