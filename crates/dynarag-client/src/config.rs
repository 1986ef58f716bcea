//! DynaRAG client configuration

use dynarag_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Request paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub add_chunk: String,
    pub similar: String,
    pub query: String,
    pub list_chunks: String,
    pub delete_chunks: String,
    pub stats: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            add_chunk: "/api/chunk".to_string(),
            similar: "/api/similar".to_string(),
            query: "/api/query".to_string(),
            list_chunks: "/api/chunks".to_string(),
            delete_chunks: "/api/chunks".to_string(),
            stats: "/api/stats".to_string(),
        }
    }
}

/// Configuration for the DynaRAG client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynaRagConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Result limit sent with `similar`; the server default applies when unset.
    pub top_k: Option<usize>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl DynaRagConfig {
    /// Create configuration with explicit base URL and defaults for the rest
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout_ms: DEFAULT_TIMEOUT_SECS * 1000,
            top_k: None,
            endpoints: Endpoints::default(),
        }
    }

    /// Create configuration from environment variables, loading `.env` first
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|_| None)
    }

    /// Like [`from_env`](Self::from_env), but keys answered by `overrides`
    /// take precedence over the environment. Validation only sees the
    /// merged values.
    pub fn from_env_with<F>(overrides: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        dotenvy::dotenv().ok();
        Self::from_vars(layered(overrides, |key| env::var(key).ok()))
    }

    /// Read configuration from a dotenv file without touching the process
    /// environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path.as_ref()).map_err(dotenv_error)?;
        let vars = iter
            .collect::<std::result::Result<HashMap<String, String>, _>>()
            .map_err(dotenv_error)?;
        Self::from_vars(|key| vars.get(key).cloned())
    }

    /// Build configuration from a variable lookup.
    ///
    /// Recognized keys: `DYNARAG_BASE_URL`, `DYNARAG_API_TOKEN` (or
    /// `DYNARAG_API_KEY`), `DYNARAG_TIMEOUT_SECS` and `DYNARAG_TOP_K`.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = present("DYNARAG_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_token = present("DYNARAG_API_TOKEN").or_else(|| present("DYNARAG_API_KEY"));

        let timeout_secs = match present("DYNARAG_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("DYNARAG_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let timeout_ms = timeout_secs.checked_mul(1000).ok_or_else(|| {
            Error::Configuration(format!("DYNARAG_TIMEOUT_SECS is too large: {}", timeout_secs))
        })?;

        let top_k = present("DYNARAG_TOP_K")
            .map(|raw| parse_number::<usize>("DYNARAG_TOP_K", &raw))
            .transpose()?;

        let config = Self {
            base_url: base_url.trim().to_string(),
            api_token,
            timeout_ms,
            top_k,
            endpoints: Endpoints::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the per-request timeout. Sub-millisecond remainders round up;
    /// a zero timeout is kept and rejected by [`validate`](Self::validate).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check values that cannot be caught by the type system.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;

        if self.timeout_ms == 0 {
            return Err(Error::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.top_k == Some(0) {
            return Err(Error::Configuration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The base URL with a trailing slash, so endpoint paths join beneath any
    /// path prefix it carries.
    pub(crate) fn parsed_base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            Error::Configuration(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

impl Default for DynaRagConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Lookup that consults `first`, then `fallback`, skipping blank values.
pub(crate) fn layered<A, B>(first: A, fallback: B) -> impl Fn(&str) -> Option<String>
where
    A: Fn(&str) -> Option<String>,
    B: Fn(&str) -> Option<String>,
{
    move |key| {
        first(key)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| fallback(key))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::Configuration(format!("{} must be a non-negative integer, got '{}'", key, raw))
    })
}

fn dotenv_error(err: dotenvy::Error) -> Error {
    match err {
        dotenvy::Error::Io(io) => Error::Io(io),
        other => Error::Configuration(other.to_string()),
    }
}
