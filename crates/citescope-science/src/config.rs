use std::fmt;
use std::time::Duration;

use citescope_core::AppConfig;

use crate::retry::RetryPolicy;

/// Everything the Semantic Scholar client needs, credential included.
///
/// Built once by the caller and handed to [`crate::SemanticScholarSource::new`];
/// nothing here is read from the process environment at request time.
#[derive(Clone)]
pub struct ScholarConfig {
    pub graph_base_url: String,
    pub legacy_base_url: String,
    pub api_key: Option<String>,
    pub search_limit: u32,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl ScholarConfig {
    pub fn from_app(config: &AppConfig, api_key: Option<String>) -> Self {
        Self {
            graph_base_url: config.scholar.graph_base_url.clone(),
            legacy_base_url: config.scholar.legacy_base_url.clone(),
            api_key,
            search_limit: config.scholar.search_limit,
            request_timeout: config.request_timeout(),
            user_agent: default_user_agent(),
            retry: RetryPolicy::new(config.retry.max_attempts, config.backoff()),
        }
    }

    /// Point both endpoints at `base_url` with no back-off, for local mock servers.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            graph_base_url: base_url.to_string(),
            legacy_base_url: base_url.to_string(),
            api_key: None,
            search_limit: 3,
            request_timeout: Duration::from_secs(10),
            user_agent: default_user_agent(),
            retry: RetryPolicy::new(4, Duration::ZERO),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for ScholarConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default(), None)
    }
}

impl fmt::Debug for ScholarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScholarConfig")
            .field("graph_base_url", &self.graph_base_url)
            .field("legacy_base_url", &self.legacy_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("search_limit", &self.search_limit)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

fn default_user_agent() -> String {
    format!("citescope/{}", env!("CARGO_PKG_VERSION"))
}
