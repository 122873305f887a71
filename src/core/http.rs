use crate::config::Settings;
use crate::utils::error::{LogoError, Result};
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// A successful response body.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Shared HTTP client used by every logo source.
///
/// 4xx answers mean "nothing here" and come back as `Ok(None)`. Transport
/// errors and 5xx answers are retried up to `max_retries` times.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent_rotation: bool,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(settings.advanced.timeout))
            .connect_timeout(Duration::from_secs(settings.advanced.timeout.min(10)));

        if settings.advanced.proxy_enabled && !settings.advanced.proxy_url.is_empty() {
            let proxy = Proxy::all(&settings.advanced.proxy_url).map_err(|e| {
                LogoError::InvalidConfigValueError {
                    field: "advanced.proxy_url".to_string(),
                    value: settings.advanced.proxy_url.clone(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.proxy(proxy);
            tracing::debug!("Using proxy {}", settings.advanced.proxy_url);
        }

        Ok(Self {
            client: builder.build()?,
            user_agent_rotation: settings.advanced.user_agent_rotation,
            max_retries: settings.advanced.max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn user_agent(&self) -> &'static str {
        if self.user_agent_rotation {
            USER_AGENTS
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(USER_AGENTS[0])
        } else {
            USER_AGENTS[0]
        }
    }

    fn build_headers(&self, extra: &[(&str, &str)]) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent()));
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| LogoError::validation(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| LogoError::validation(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    pub async fn get(&self, url: &str, extra_headers: &[(&str, &str)]) -> Result<Option<Fetched>> {
        let headers = self.build_headers(extra_headers)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!("GET {} (attempt {})", url, attempt);

            let outcome = self.client.get(url).headers(headers.clone()).send().await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let content_type = response
                            .headers()
                            .get(CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let final_url = response.url().to_string();
                        let bytes = response.bytes().await?.to_vec();
                        return Ok(Some(Fetched {
                            url: final_url,
                            content_type,
                            bytes,
                        }));
                    }

                    if !Self::is_retryable(status) {
                        tracing::debug!("GET {} -> {}", url, status);
                        return Ok(None);
                    }

                    if attempt > self.max_retries {
                        return Err(LogoError::HttpStatusError {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    tracing::debug!("GET {} -> {}, retrying", url, status);
                }
                Err(e) => {
                    if attempt > self.max_retries || e.is_builder() {
                        return Err(e.into());
                    }
                    tracing::debug!("GET {} failed: {}, retrying", url, e);
                }
            }

            tokio::time::sleep(self.retry_delay).await;
        }
    }

    fn is_retryable(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get(url, &[]).await?.map(|fetched| fetched.bytes))
    }

    /// Final URL after redirects and the body decoded as UTF-8, invalid
    /// sequences replaced.
    pub async fn get_text(&self, url: &str) -> Result<Option<(String, String)>> {
        Ok(self.get(url, &[]).await?.map(|fetched| {
            let text = String::from_utf8_lossy(&fetched.bytes).into_owned();
            (fetched.url, text)
        }))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<Option<T>> {
        match self.get(url, extra_headers).await? {
            Some(fetched) => Ok(Some(serde_json::from_slice(&fetched.bytes)?)),
            None => Ok(None),
        }
    }
}
