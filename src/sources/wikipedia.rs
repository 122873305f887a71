use super::{with_query, SearchContext};
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

const RAW_SCORE: i32 = 10;

/// Wikipedia: article search, then the first page image whose title
/// mentions "logo" or "icon".
pub struct WikipediaSource;

impl WikipediaSource {
    async fn query(ctx: &SearchContext, params: &[(&str, &str)]) -> Result<Option<Value>> {
        let mut all = vec![("action", "query"), ("format", "json")];
        all.extend_from_slice(params);
        let url = with_query(&ctx.settings.endpoints.wikipedia, &all)?;
        ctx.fetcher.get_json(&url, &[]).await
    }

    fn pages(value: &Value) -> impl Iterator<Item = &Value> {
        value
            .pointer("/query/pages")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|pages| pages.values())
    }

    async fn page_title(ctx: &SearchContext) -> Result<Option<String>> {
        let Some(data) = Self::query(
            ctx,
            &[("list", "search"), ("srsearch", ctx.company_name.as_str())],
        )
        .await?
        else {
            return Ok(None);
        };

        Ok(data
            .pointer("/query/search/0/title")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn logo_image_title(ctx: &SearchContext, page_title: &str) -> Result<Option<String>> {
        let Some(data) = Self::query(ctx, &[("prop", "images"), ("titles", page_title)]).await? else {
            return Ok(None);
        };

        let title = Self::pages(&data)
            .filter_map(|page| page.get("images").and_then(Value::as_array))
            .flatten()
            .filter_map(|image| image.get("title").and_then(Value::as_str))
            .find(|title| {
                let lower = title.to_lowercase();
                lower.contains("logo") || lower.contains("icon")
            })
            .map(str::to_string);
        Ok(title)
    }

    async fn image_url(ctx: &SearchContext, image_title: &str) -> Result<Option<String>> {
        let Some(data) = Self::query(
            ctx,
            &[("prop", "imageinfo"), ("iiprop", "url"), ("titles", image_title)],
        )
        .await?
        else {
            return Ok(None);
        };

        let url = Self::pages(&data)
            .find_map(|page| page.pointer("/imageinfo/0/url").and_then(Value::as_str))
            .map(str::to_string);
        Ok(url)
    }

    async fn find(&self, ctx: &SearchContext) -> Result<Option<LogoResult>> {
        let Some(page_title) = Self::page_title(ctx).await? else {
            return Ok(None);
        };
        tracing::debug!("Wikipedia page for {}: {}", ctx.company_name, page_title);

        let Some(image_title) = Self::logo_image_title(ctx, &page_title).await? else {
            return Ok(None);
        };
        let Some(image_url) = Self::image_url(ctx, &image_title).await? else {
            return Ok(None);
        };

        ctx.download(&image_url, self.kind(), LogoFormat::from_url(&image_url), RAW_SCORE)
            .await
    }
}

#[async_trait]
impl LogoSource for WikipediaSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Wikipedia
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        match self.find(ctx).await {
            Ok(Some(result)) => {
                ctx.progress("✅ Found logo from Wikipedia");
                Ok(vec![result])
            }
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                tracing::error!("Error with Wikipedia: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_wikipedia_follows_search_images_imageinfo() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/w/api.php")
                    .query_param("list", "search")
                    .query_param("srsearch", "Acme Corp");
                then.status(200).json_body(serde_json::json!({
                    "query": {"search": [{"title": "Acme Corporation"}, {"title": "Acme (band)"}]}
                }));
            })
            .await;
        let images = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/w/api.php")
                    .query_param("prop", "images")
                    .query_param("titles", "Acme Corporation");
                then.status(200).json_body(serde_json::json!({
                    "query": {"pages": {"123": {"images": [
                        {"title": "File:Headquarters.jpg"},
                        {"title": "File:Acme Logo 2020.svg"}
                    ]}}}
                }));
            })
            .await;
        let file_url = server.url("/upload/Acme_Logo_2020.svg");
        let imageinfo = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/w/api.php")
                    .query_param("prop", "imageinfo")
                    .query_param("titles", "File:Acme Logo 2020.svg");
                then.status(200).json_body(serde_json::json!({
                    "query": {"pages": {"-1": {"imageinfo": [{"url": file_url}]}}}
                }));
            })
            .await;
        let file = server
            .mock_async(|when, then| {
                when.method(GET).path("/upload/Acme_Logo_2020.svg");
                then.status(200)
                    .header("Content-Type", "image/svg+xml")
                    .body(SVG_BYTES);
            })
            .await;

        let ctx = context("Acme Corp", settings_for(&server));
        let results = WikipediaSource.search(&ctx).await.unwrap();

        search.assert_async().await;
        images.assert_async().await;
        imageinfo.assert_async().await;
        file.assert_async().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].format, LogoFormat::Svg);
        assert_eq!(results[0].score, RAW_SCORE);
    }

    #[tokio::test]
    async fn test_wikipedia_without_logo_image() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/api.php").query_param("list", "search");
                then.status(200).json_body(serde_json::json!({
                    "query": {"search": [{"title": "Acme"}]}
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/api.php").query_param("prop", "images");
                then.status(200).json_body(serde_json::json!({
                    "query": {"pages": {"1": {"images": [{"title": "File:Map.png"}]}}}
                }));
            })
            .await;

        let ctx = context("Acme", settings_for(&server));
        assert!(WikipediaSource.search(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wikipedia_error_is_swallowed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/api.php");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let ctx = context("Acme", settings_for(&server));
        assert!(WikipediaSource.search(&ctx).await.unwrap().is_empty());
    }
}
