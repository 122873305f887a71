//! Logo sources and the context they search with.

pub mod bing;
pub mod brandfetch;
pub mod clearbit;
pub mod duckduckgo;
pub mod google;
pub mod simpleicons;
pub mod website;
pub mod wikipedia;

use crate::config::Settings;
use crate::core::domains::{generate_company_domains, registrable_domain};
use crate::core::http::HttpFetcher;
use crate::core::processing::ImageProcessor;
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::{LogoSource, SearchEvent};
use crate::utils::error::{LogoError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

pub use bing::BingSource;
pub use brandfetch::BrandfetchSource;
pub use clearbit::ClearbitSource;
pub use duckduckgo::DuckDuckGoSource;
pub use google::GoogleSource;
pub use simpleicons::SimpleIconsSource;
pub use website::CompanyWebsiteSource;
pub use wikipedia::WikipediaSource;

/// Everything a source needs to run one search.
#[derive(Clone)]
pub struct SearchContext {
    pub company_name: String,
    pub domains: Vec<String>,
    pub settings: Arc<Settings>,
    pub fetcher: HttpFetcher,
    events: Option<UnboundedSender<SearchEvent>>,
}

impl SearchContext {
    pub fn new(company_name: impl Into<String>, settings: Arc<Settings>, fetcher: HttpFetcher) -> Self {
        let company_name = company_name.into();
        let domains = generate_company_domains(&company_name);
        Self {
            company_name,
            domains,
            settings,
            fetcher,
            events: None,
        }
    }

    /// Replace the generated candidate domains.
    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<SearchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn progress(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        if let Some(events) = &self.events {
            let _ = events.send(SearchEvent::Progress(message));
        }
    }

    /// PNG covers every raster encoding; SVG is its own switch.
    pub fn wants(&self, format: LogoFormat) -> bool {
        if format.is_vector() {
            self.settings.general.download_svg
        } else {
            self.settings.general.download_png
        }
    }

    /// Candidate domains reduced to `label.suffix`, deduplicated, in order.
    pub fn registrable_domains(&self, limit: Option<usize>) -> Vec<String> {
        let mut seen = HashSet::new();
        let domains = self
            .domains
            .iter()
            .filter_map(|domain| registrable_domain(domain))
            .filter(|domain| seen.insert(domain.clone()));

        match limit {
            Some(limit) => domains.take(limit).collect(),
            None => domains.collect(),
        }
    }

    /// Download `url` and wrap it as a result.
    ///
    /// The payload is sniffed; `hint` is used only when the bytes are not
    /// recognisable but the server said they are an image. Anything else
    /// (HTML error pages served with 200, formats the user turned off) is
    /// skipped with `Ok(None)`.
    pub async fn download(
        &self,
        url: &str,
        source: SourceKind,
        hint: LogoFormat,
        raw_score: i32,
    ) -> Result<Option<LogoResult>> {
        let Some(fetched) = self.fetcher.get(url, &[]).await? else {
            return Ok(None);
        };

        let content_type = fetched.content_type.as_deref().unwrap_or_default();
        let format = match LogoFormat::from_bytes(&fetched.bytes) {
            Some(format) => format,
            None if content_type.starts_with("image/svg") => LogoFormat::Svg,
            None if content_type.starts_with("image/") => hint,
            None => {
                tracing::debug!("{}: {} is not an image ({})", source, url, content_type);
                return Ok(None);
            }
        };

        if !self.wants(format) {
            tracing::debug!("{}: skipping {} result from {}", source, format, url);
            return Ok(None);
        }

        let mut result = LogoResult::new(self.company_name.clone(), source, format, fetched.bytes)
            .with_url(url)
            .with_score(raw_score);
        ImageProcessor::measure(&mut result);
        Ok(Some(result))
    }

    /// Download each URL in turn, logging and skipping failures.
    pub async fn download_all(
        &self,
        urls: &[&str],
        source: SourceKind,
        raw_score: i32,
    ) -> Vec<LogoResult> {
        let mut results = Vec::new();
        for &url in urls {
            match self.download(url, source, LogoFormat::from_url(url), raw_score).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => tracing::debug!("Error downloading image from {}: {}", source, e),
            }
        }
        results
    }
}

/// `base` with extra path segments appended, percent-encoded.
pub(crate) fn join_path(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base).map_err(|e| LogoError::ConfigError {
        message: format!("Invalid endpoint {}: {}", base, e),
    })?;
    url.path_segments_mut()
        .map_err(|_| LogoError::ConfigError {
            message: format!("Endpoint cannot take a path: {}", base),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

/// `base` with query parameters appended.
pub(crate) fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    Url::parse_with_params(base, params)
        .map(|url| url.to_string())
        .map_err(|e| LogoError::ConfigError {
            message: format!("Invalid endpoint {}: {}", base, e),
        })
}

/// Every source, in scheduling order (highest priority first).
pub fn default_sources() -> Vec<Arc<dyn LogoSource>> {
    let mut sources: Vec<Arc<dyn LogoSource>> = vec![
        Arc::new(SimpleIconsSource),
        Arc::new(BrandfetchSource),
        Arc::new(ClearbitSource),
        Arc::new(WikipediaSource),
        Arc::new(CompanyWebsiteSource),
        Arc::new(GoogleSource),
        Arc::new(BingSource),
        Arc::new(DuckDuckGoSource),
    ];
    sources.sort_by_key(|source| std::cmp::Reverse(source.kind().descriptor().priority));
    sources
}
