use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};

use crate::config::ScholarConfig;
use crate::error::Result;

/// Single-shot GET client; retrying is left to [`crate::retry::run_with_retry`].
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScholarConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// `Ok(Ok(body))` on HTTP 200, `Ok(Err(status))` on any other status.
    ///
    /// Transport failures (DNS, connect, timeout, body read) are returned as `Err`.
    pub async fn get(
        &self,
        url: &Url,
        headers: HeaderMap,
    ) -> Result<std::result::Result<String, StatusCode>> {
        let resp = self.client.get(url.clone()).headers(headers).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Ok(Err(status));
        }
        Ok(Ok(resp.text().await?))
    }
}
