use super::{with_query, SearchContext};
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const RAW_SCORE: i32 = 5;
const RESULT_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct ImageResults {
    #[serde(default)]
    results: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
struct ImageHit {
    #[serde(default)]
    image: Option<String>,
}

/// DuckDuckGo image search. Unauthenticated and frequently rate limited, so
/// any failure just means no results.
pub struct DuckDuckGoSource;

impl DuckDuckGoSource {
    fn query(ctx: &SearchContext) -> String {
        let filetype = if ctx.wants(LogoFormat::Svg) { "svg" } else { "png" };
        format!("{} official logo filetype:{}", ctx.company_name, filetype)
    }
}

#[async_trait]
impl LogoSource for DuckDuckGoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::DuckDuckGo
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let query = Self::query(ctx);
        let url = with_query(
            &ctx.settings.endpoints.duckduckgo,
            &[("q", query.as_str()), ("o", "json")],
        )?;

        let response: ImageResults = match ctx.fetcher.get_json(&url, &[]).await {
            Ok(Some(response)) => response,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                tracing::debug!("Error with DuckDuckGo: {}", e);
                return Ok(Vec::new());
            }
        };

        let urls: Vec<&str> = response
            .results
            .iter()
            .take(RESULT_LIMIT)
            .filter_map(|hit| hit.image.as_deref())
            .collect();
        let results = ctx.download_all(&urls, self.kind(), RAW_SCORE).await;
        if !results.is_empty() {
            ctx.progress(format!("✅ Found {} logo(s) from DuckDuckGo", results.len()));
        }
        Ok(results)
    }
}
