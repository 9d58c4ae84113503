//! Client configuration: site, list and transport timeouts.

use url::Url;

use crate::ClientError;

pub const DEFAULT_LIST: &str = "SkillsLibrary";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Site root, e.g. `https://contoso.example.com/sites/hr`
    pub site_url: String,
    /// List title addressed through `getbytitle`.
    pub list_name: String,
    pub connect_timeout_ms: u64,
    /// Whole-request timeout enforced by the transport.
    pub read_timeout_ms: u64,
    pub bearer_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            list_name: DEFAULT_LIST.to_string(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            bearer_token: None,
        }
    }
}

impl ClientConfig {
    pub fn new(site_url: &str) -> Self {
        Self { site_url: site_url.to_string(), ..Default::default() }
    }

    /// Read `ROSTER_SITE_URL` (required), `ROSTER_LIST`, `ROSTER_CONNECT_TIMEOUT_MS`,
    /// `ROSTER_READ_TIMEOUT_MS` and `ROSTER_TOKEN`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source.
    /// Unparsable timeouts fall back to the defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(var: F) -> Result<Self, ClientError> {
        let site_url = var("ROSTER_SITE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClientError::InvalidEndpoint("ROSTER_SITE_URL is not set".into()))?;
        let d = Self::default();
        Ok(Self {
            site_url,
            list_name: var("ROSTER_LIST").filter(|s| !s.trim().is_empty()).unwrap_or(d.list_name),
            connect_timeout_ms: var("ROSTER_CONNECT_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(d.connect_timeout_ms),
            read_timeout_ms: var("ROSTER_READ_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(d.read_timeout_ms),
            bearer_token: var("ROSTER_TOKEN").filter(|s| !s.is_empty()),
        })
    }

    pub fn with_list(mut self, list_name: &str) -> Self {
        self.list_name = list_name.to_string();
        self
    }

    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|s| !s.is_empty());
        self
    }

    /// `{site}/_api/web/lists/getbytitle('{list}')/items`
    pub fn items_url(&self) -> Result<Url, ClientError> {
        if self.list_name.trim().is_empty() {
            return Err(ClientError::InvalidEndpoint("list name is empty".into()));
        }
        let base = self.site_url.trim_end_matches('/');
        let title = urlencoding::encode(&self.list_name.replace('\'', "''")).into_owned();
        let raw = format!("{}/_api/web/lists/getbytitle('{}')/items", base, title);
        let url = Url::parse(&raw).map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidEndpoint(format!("unsupported scheme {}", other))),
        }
    }
}
