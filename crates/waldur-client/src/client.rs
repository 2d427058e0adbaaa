//! Authenticated client for the Waldur REST API.
//!
//! One instance is built at startup and shared by every tool call. It owns the connection
//! pool; requests dropped mid-flight (host cancellation) release their connection with the
//! dropped future.

use crate::config::ClientConfig;
use crate::endpoints;
use crate::error::{ClientError, Result};
use crate::params::QueryParams;
use mime::Mime;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Body of `POST /user-invitations/`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InvitationRequest {
    /// Canonical URL of the customer or project.
    pub scope: String,
    /// Role UUID.
    pub role: String,
    pub email: String,
    pub extra_invitation_text: String,
}

#[derive(Clone)]
pub struct WaldurClient {
    inner: Arc<WaldurClientInner>,
}

struct WaldurClientInner {
    base_url: Url,
    http: Client,
}

impl WaldurClient {
    /// Build a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the auth header cannot be encoded, or a transport
    /// error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("{} {}", config.auth_scheme, config.token))
            .map_err(|e| ClientError::Config(format!("Invalid API token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::from)?;

        Ok(Self {
            inner: Arc::new(WaldurClientInner {
                base_url: config.base_url.clone(),
                http,
            }),
        })
    }

    /// Send one request and decode its JSON body.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] if no response arrives (including timeouts)
    /// - [`ClientError::Upstream`] for any non-2xx status, carrying the upstream body
    /// - [`ClientError::Malformed`] if a JSON response cannot be decoded
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = build_url(&self.inner.base_url, path, query)?;
        debug!(method = %method, url = %display_url(&url), "waldur request");

        let mut request = self.inner.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if status.is_success() {
            return decode_success_body(&bytes, content_type.as_deref());
        }

        let body = decode_error_body(&bytes);
        warn!(
            method = %method,
            url = %display_url(&url),
            status = status.as_u16(),
            "waldur request rejected"
        );
        Err(ClientError::Upstream {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET` a collection endpoint and return its elements.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`], plus [`ClientError::Malformed`] if the body is not a JSON
    /// array.
    pub async fn list(&self, path: &str, query: &QueryParams) -> Result<Vec<Value>> {
        match self.request(Method::GET, path, query, None).await? {
            Value::Array(items) => Ok(items),
            other => Err(ClientError::Malformed(format!(
                "expected a JSON array from {path}, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, &QueryParams::new(), Some(body))
            .await
    }

    /// Run a SQL statement through the query endpoint. The text is sent verbatim.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn query(&self, sql: &str) -> Result<Value> {
        self.post(endpoints::QUERY, &serde_json::json!({ "query": sql }))
            .await
    }

    /// Create one user invitation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn create_invitation(&self, invitation: &InvitationRequest) -> Result<Value> {
        let body = serde_json::to_value(invitation)
            .map_err(|e| ClientError::Malformed(format!("cannot encode invitation: {e}")))?;
        self.post(endpoints::USER_INVITATIONS, &body).await
    }
}

/// Join a base URL and a resource path with exactly one slash between them and a trailing
/// slash on the path, then append the query pairs.
///
/// # Errors
///
/// Returns [`ClientError::Config`] if the joined URL does not parse.
pub fn build_url(base_url: &Url, path: &str, query: &QueryParams) -> Result<Url> {
    let base = base_url.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let joined = if path.is_empty() {
        format!("{base}/")
    } else if path.ends_with('/') {
        format!("{base}/{path}")
    } else {
        format!("{base}/{path}/")
    };

    let mut url = Url::parse(&joined)
        .map_err(|e| ClientError::Config(format!("Invalid request URL '{joined}': {e}")))?;

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter());
    }

    Ok(url)
}

fn decode_success_body(bytes: &[u8], content_type: Option<&str>) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(v) => Ok(v),
        Err(e) if is_json_content_type(content_type) => Err(ClientError::Malformed(format!(
            "invalid JSON body: {e}"
        ))),
        Err(_) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

fn decode_error_body(bytes: &[u8]) -> Value {
    serde_json::from_slice::<Value>(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return false;
    };
    let Ok(m) = ct.parse::<Mime>() else {
        return false;
    };
    m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
}

/// URL as it may appear in logs and errors: no credentials or fragment, and every query value
/// masked. Waldur filters carry names and email addresses.
#[must_use]
pub fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    let _ = shown.set_username("");
    let _ = shown.set_password(None);
    shown.set_fragment(None);
    let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    if keys.is_empty() {
        shown.set_query(None);
    } else {
        shown
            .query_pairs_mut()
            .clear()
            .extend_pairs(keys.iter().map(|k| (k.as_str(), "***")));
    }
    shown.to_string()
}

/// Transport failure text with the request URL passed through [`display_url`].
pub(crate) fn describe_transport_error(err: reqwest::Error) -> String {
    match err.url().map(display_url) {
        Some(shown) => format!("{} ({shown})", err.without_url()),
        None => err.to_string(),
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
