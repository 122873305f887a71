use super::{with_query, SearchContext};
use crate::domain::model::{LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const RAW_SCORE: i32 = 5;
const RESULT_COUNT: &str = "5";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: Option<String>,
}

/// Google Custom Search (image mode). Needs an API key and a search engine id.
pub struct GoogleSource;

#[async_trait]
impl LogoSource for GoogleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::GoogleSearch
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let keys = &ctx.settings.api_keys;
        if keys.google_api_key.is_empty() || keys.google_cx.is_empty() {
            ctx.progress("⚠️ Google Search API key or CX not configured");
            return Ok(Vec::new());
        }

        let query = format!("{} logo filetype:png OR filetype:svg", ctx.company_name);
        let url = with_query(
            &ctx.settings.endpoints.google,
            &[
                ("q", query.as_str()),
                ("key", keys.google_api_key.as_str()),
                ("cx", keys.google_cx.as_str()),
                ("searchType", "image"),
                ("num", RESULT_COUNT),
            ],
        )?;

        let response: SearchResponse = match ctx.fetcher.get_json(&url, &[]).await {
            Ok(Some(response)) => response,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                tracing::debug!("Error with Google Search: {}", e);
                return Ok(Vec::new());
            }
        };

        let urls: Vec<&str> = response
            .items
            .iter()
            .filter_map(|item| item.link.as_deref())
            .collect();
        let results = ctx.download_all(&urls, self.kind(), RAW_SCORE).await;
        if !results.is_empty() {
            ctx.progress(format!("✅ Found {} logo(s) from Google Search", results.len()));
        }
        Ok(results)
    }
}
