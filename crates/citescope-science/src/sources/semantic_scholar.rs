use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use citescope_core::{CitationHistogram, YearWindow};
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ScholarConfig;
use crate::error::{Result, ScienceError};
use crate::http::HttpClient;
use crate::retry::{
    Pause, RetryOutcome, TokioPause, retry_always, retry_on_rate_limit, run_with_retry,
};
use crate::sources::CitationLookup;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct S2PaperId(String);

impl S2PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for S2PaperId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for S2PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct SemanticScholarSource {
    client: HttpClient,
    config: ScholarConfig,
    window: YearWindow,
    pause: Arc<dyn Pause>,
}

impl SemanticScholarSource {
    pub fn new(config: ScholarConfig, window: YearWindow) -> Result<Self> {
        Self::with_pause(config, window, Arc::new(TokioPause))
    }

    pub fn with_pause(
        config: ScholarConfig,
        window: YearWindow,
        pause: Arc<dyn Pause>,
    ) -> Result<Self> {
        if !config.has_api_key() {
            warn!("no Semantic Scholar API key configured, using the shared rate limit");
        }
        Ok(Self {
            client: HttpClient::new(&config)?,
            config,
            window,
            pause,
        })
    }

    /// Search for `title` and return the first match's paper id.
    ///
    /// Only HTTP 429 is retried; any other failure status ends the lookup.
    pub async fn resolve_paper_id(&self, title: &str) -> Result<Option<S2PaperId>> {
        let url = self.search_url(title)?;
        let headers = self.auth_headers()?;

        let outcome = run_with_retry(
            &self.config.retry,
            self.pause.as_ref(),
            title,
            retry_on_rate_limit,
            || self.client.get(&url, headers.clone()),
        )
        .await?;

        let body = match outcome {
            RetryOutcome::Success(body) => body,
            RetryOutcome::Exhausted { attempts, .. } => {
                warn!(title, attempts, "number of tries exceeded while resolving paper id");
                return Ok(None);
            }
            RetryOutcome::Fatal(status) => {
                warn!(title, status = status.as_u16(), "paper id lookup failed");
                return Ok(None);
            }
        };

        match parse_search_response(&body) {
            Ok(Some(id)) => {
                debug!(title, paper_id = %id, "resolved paper id");
                Ok(Some(id))
            }
            Ok(None) => {
                info!(title, "no search match");
                Ok(None)
            }
            Err(err) => {
                warn!(title, error = %err, "unreadable search response");
                Ok(None)
            }
        }
    }

    /// Fetch every citation of `id` and bucket them by publication year.
    ///
    /// Every failure status is retried until the budget runs out.
    pub async fn fetch_citation_histogram(
        &self,
        id: &S2PaperId,
    ) -> Result<Option<CitationHistogram>> {
        let url = self.paper_url(id)?;
        let headers = self.auth_headers()?;

        let outcome = run_with_retry(
            &self.config.retry,
            self.pause.as_ref(),
            id.as_str(),
            retry_always,
            || self.client.get(&url, headers.clone()),
        )
        .await?;

        let body = match outcome {
            RetryOutcome::Success(body) => body,
            RetryOutcome::Exhausted { attempts, .. } => {
                warn!(
                    paper_id = %id,
                    attempts,
                    "number of tries exceeded while fetching citations"
                );
                return Ok(None);
            }
            RetryOutcome::Fatal(status) => {
                warn!(paper_id = %id, status = status.as_u16(), "citation fetch failed");
                return Ok(None);
            }
        };

        match parse_citations_response(&body, &self.window) {
            Ok(histogram) => Ok(Some(histogram)),
            Err(err) => {
                warn!(paper_id = %id, error = %err, "unreadable paper response");
                Ok(None)
            }
        }
    }

    /// `{graph}/paper/search?query="<title>"&limit=<n>`
    fn search_url(&self, title: &str) -> Result<Url> {
        let mut url = parse_base_url(&self.config.graph_base_url)?;
        url.path_segments_mut()
            .map_err(|_| ScienceError::Parse("invalid Semantic Scholar base URL".to_string()))?
            .pop_if_empty()
            .push("paper")
            .push("search");
        url.query_pairs_mut()
            .append_pair("query", &format!("\"{title}\""))
            .append_pair("limit", &self.config.search_limit.to_string());
        Ok(url)
    }

    /// `{legacy}/paper/<id>?include_unknown_references=true`
    fn paper_url(&self, id: &S2PaperId) -> Result<Url> {
        let mut url = parse_base_url(&self.config.legacy_base_url)?;
        url.path_segments_mut()
            .map_err(|_| ScienceError::Parse("invalid Semantic Scholar base URL".to_string()))?
            .pop_if_empty()
            .push("paper")
            .push(id.as_str());
        url.query_pairs_mut()
            .append_pair("include_unknown_references", "true");
        Ok(url)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| ScienceError::Config(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl CitationLookup for SemanticScholarSource {
    async fn resolve_paper_id(&self, title: &str) -> Result<Option<S2PaperId>> {
        SemanticScholarSource::resolve_paper_id(self, title).await
    }

    async fn fetch_histogram(&self, id: &S2PaperId) -> Result<Option<CitationHistogram>> {
        self.fetch_citation_histogram(id).await
    }
}

/// First `data[].paperId` of a search response, if any.
pub fn parse_search_response(body: &str) -> Result<Option<S2PaperId>> {
    let json: Value = serde_json::from_str(body).map_err(|e| ScienceError::Parse(e.to_string()))?;
    let id = json
        .get("data")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("paperId"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(S2PaperId::from);
    Ok(id)
}

/// Histogram of a paper-detail response.
///
/// A `citations` array is counted year by year. A response without a usable
/// `citations` array carries no data, so every year of `window` is unknown.
pub fn parse_citations_response(body: &str, window: &YearWindow) -> Result<CitationHistogram> {
    let json: Value = serde_json::from_str(body).map_err(|e| ScienceError::Parse(e.to_string()))?;
    let Some(citations) = json.get("citations").and_then(Value::as_array) else {
        return Ok(CitationHistogram::unknown(window));
    };

    let years = citations.iter().map(|citation| {
        citation
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok())
    });
    Ok(CitationHistogram::from_years(years))
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| ScienceError::Parse(format!("invalid URL {base_url}: {e}")))
}
