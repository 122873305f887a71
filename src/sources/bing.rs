use super::{with_query, SearchContext};
use crate::domain::model::{LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const RAW_SCORE: i32 = 5;
const SUBSCRIPTION_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    value: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageHit {
    #[serde(default)]
    content_url: Option<String>,
}

/// Bing Image Search v7.
pub struct BingSource;

#[async_trait]
impl LogoSource for BingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::BingSearch
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let api_key = ctx.settings.api_keys.bing_api_key.as_str();
        if api_key.is_empty() {
            ctx.progress("⚠️ Bing Search API key not configured");
            return Ok(Vec::new());
        }

        let query = format!("{} logo filetype:png OR filetype:svg", ctx.company_name);
        let url = with_query(
            &ctx.settings.endpoints.bing,
            &[("q", query.as_str()), ("count", "5")],
        )?;

        let response: ImagesResponse = match ctx
            .fetcher
            .get_json(&url, &[(SUBSCRIPTION_HEADER, api_key)])
            .await
        {
            Ok(Some(response)) => response,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                tracing::debug!("Error with Bing Search: {}", e);
                return Ok(Vec::new());
            }
        };

        let urls: Vec<&str> = response
            .value
            .iter()
            .filter_map(|hit| hit.content_url.as_deref())
            .collect();
        let results = ctx.download_all(&urls, self.kind(), RAW_SCORE).await;
        if !results.is_empty() {
            ctx.progress(format!("✅ Found {} logo(s) from Bing Search", results.len()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::LogoFormat;
    use crate::sources::test_support::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_bing_sends_subscription_key() {
        let server = MockServer::start_async().await;
        let api = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/bing/images/search")
                    .header(SUBSCRIPTION_HEADER, "b-key")
                    .query_param("q", "Acme logo filetype:png OR filetype:svg")
                    .query_param("count", "5");
                then.status(200).json_body(json!({
                    "value": [{"contentUrl": server.url("/img/acme.svg")}]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/img/acme.svg");
                then.status(200)
                    .header("Content-Type", "image/svg+xml")
                    .body(SVG_BYTES);
            })
            .await;

        let mut settings = settings_for(&server);
        settings.api_keys.bing_api_key = "b-key".to_string();
        let results = BingSource.search(&context("Acme", settings)).await.unwrap();

        api.assert_async().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].format, LogoFormat::Svg);
    }

    #[tokio::test]
    async fn test_bing_skips_hits_without_content_url() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bing/images/search");
                then.status(200).json_body(json!({
                    "value": [
                        {"name": "thumbnail only", "thumbnailUrl": server.url("/thumb.png")},
                        {"contentUrl": server.url("/img/acme.png")}
                    ]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/img/acme.png");
                then.status(200).header("Content-Type", "image/png").body(PNG_BYTES);
            })
            .await;

        let mut settings = settings_for(&server);
        settings.api_keys.bing_api_key = "b-key".to_string();
        let results = BingSource.search(&context("Acme", settings)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].format, LogoFormat::Png);
    }

    #[tokio::test]
    async fn test_bing_unauthorized_yields_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bing/images/search");
                then.status(401);
            })
            .await;

        let mut settings = settings_for(&server);
        settings.api_keys.bing_api_key = "bad".to_string();
        let results = BingSource.search(&context("Acme", settings)).await.unwrap();
        assert!(results.is_empty());
    }
}
