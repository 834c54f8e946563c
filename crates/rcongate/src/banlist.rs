use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use serde_json::Value;
use tracing::{debug, warn};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRecord {
    pub username: String,
    pub banned_until: String,
    pub reason: String,
}

/// Each failure site gets its own user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanListError {
    NotConfigured,
    Transport(String),
    Status(u16),
    Envelope(String),
    NoContent,
    Base64(String),
    InnerJson(String),
}

impl std::fmt::Display for BanListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BanListError::NotConfigured => write!(f, "Ban list lookup is not configured."),
            BanListError::Transport(e) => {
                write!(f, "Failed to retrieve data from GitHub API: {e}")
            }
            BanListError::Status(code) => write!(
                f,
                "Failed to retrieve data from GitHub API. Status code: {code}"
            ),
            BanListError::Envelope(e) => write!(f, "Error decoding API response: {e}"),
            BanListError::NoContent => write!(f, "No 'content' field found in data."),
            BanListError::Base64(e) => write!(f, "Error decoding base64 content: {e}"),
            BanListError::InnerJson(e) => write!(f, "Error decoding JSON content: {e}"),
        }
    }
}

impl std::error::Error for BanListError {}

/// Decode a contents-API response: `{"content": "<base64 of JSON>"}` where the
/// inner JSON maps username -> `{"banneduntil": .., "BanReason": ..}`.
pub fn decode_document(
    status: u16,
    body: &[u8],
) -> Result<HashMap<String, BanRecord>, BanListError> {
    if !(200..300).contains(&status) {
        return Err(BanListError::Status(status));
    }

    let envelope: Value =
        serde_json::from_slice(body).map_err(|e| BanListError::Envelope(e.to_string()))?;
    let content = match envelope.get("content") {
        None | Some(Value::Null) => return Err(BanListError::NoContent),
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(BanListError::Base64("'content' is not a string".to_string()));
        }
    };

    // The contents API wraps base64 at 60 columns.
    let compact = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();
    let raw = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| BanListError::Base64(e.to_string()))?;

    let inner: serde_json::Map<String, Value> =
        serde_json::from_slice(&raw).map_err(|e| BanListError::InnerJson(e.to_string()))?;

    Ok(inner
        .into_iter()
        .map(|(username, meta)| {
            let rec = BanRecord {
                banned_until: field_text(&meta, "banneduntil"),
                reason: field_text(&meta, "BanReason"),
                username: username.clone(),
            };
            (username, rec)
        })
        .collect())
}

fn field_text(meta: &Value, key: &str) -> String {
    match meta.get(key) {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Clone)]
pub struct BanListFetcher {
    http: reqwest::Client,
    url: Option<String>,
    token: Option<String>,
    user_agent: String,
}

impl std::fmt::Debug for BanListFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BanListFetcher")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl BanListFetcher {
    /// `timeout` bounds the whole request, body included; expiry surfaces as
    /// `BanListError::Transport`.
    pub fn new(
        url: Option<String>,
        token: Option<String>,
        user_agent: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.filter(|u| !u.trim().is_empty()),
            token: token.filter(|t| !t.trim().is_empty()),
            user_agent,
        })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Fetch the whole list. Nothing is cached.
    pub async fn fetch(&self) -> Result<HashMap<String, BanRecord>, BanListError> {
        let Some(url) = self.url.as_deref() else {
            return Err(BanListError::NotConfigured);
        };

        let mut req = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        if let Some(t) = &self.token {
            req = req.bearer_auth(t);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(err=%e, "ban list fetch failed");
            BanListError::Transport(e.to_string())
        })?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status=%status, "ban list fetch non-2xx");
            return Err(BanListError::Status(status.as_u16()));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| BanListError::Transport(e.to_string()))?;
        let list = decode_document(status.as_u16(), &body)?;
        debug!(entries = list.len(), "ban list fetched");
        Ok(list)
    }

    pub async fn lookup(&self, username: &str) -> Result<Option<BanRecord>, BanListError> {
        let mut list = self.fetch().await?;
        Ok(list.remove(username))
    }
}

/// User-facing answer for one lookup.
pub fn lookup_message(username: &str, res: &Result<Option<BanRecord>, BanListError>) -> String {
    match res {
        Ok(Some(rec)) => format!(
            "User {username} is banned until {} for reason: {}.",
            rec.banned_until, rec.reason
        ),
        Ok(None) => format!("User {username} is not found in the ban list."),
        Err(e) => e.to_string(),
    }
}
