use super::SearchContext;
use crate::core::domains::simple_icons_slugs;
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;

const RAW_SCORE: i32 = 10;

/// SVG icons from the Simple Icons package on the jsDelivr CDN.
pub struct SimpleIconsSource;

#[async_trait]
impl LogoSource for SimpleIconsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SimpleIcons
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let mut results = Vec::new();
        if !ctx.wants(LogoFormat::Svg) {
            return Ok(results);
        }

        let base = ctx.settings.endpoints.simple_icons.trim_end_matches('/');
        for slug in simple_icons_slugs(&ctx.company_name) {
            let url = format!("{}/{}.svg", base, slug);
            match ctx.download(&url, self.kind(), LogoFormat::Svg, RAW_SCORE).await {
                Ok(Some(result)) => {
                    ctx.progress(format!("✅ Found logo in Simple Icons repository ({})", slug));
                    results.push(result);
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Error with Simple Icons: {}", e),
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_simple_icons_tries_slug_variations() {
        let server = MockServer::start_async().await;
        let hyphenated = server
            .mock_async(|when, then| {
                when.method(GET).path("/simple-icons/hacker-news.svg");
                then.status(200)
                    .header("Content-Type", "image/svg+xml")
                    .body(SVG_BYTES);
            })
            .await;
        let others = server
            .mock_async(|when, then| {
                when.method(GET).path_matches(
                    regex::Regex::new(r"^/simple-icons/(hackernews|hn)\.svg$").unwrap(),
                );
                then.status(404);
            })
            .await;

        let ctx = context("Hacker News", settings_for(&server));
        let results = SimpleIconsSource.search(&ctx).await.unwrap();

        hyphenated.assert_async().await;
        others.assert_hits_async(2).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].format, LogoFormat::Svg);
        assert_eq!(results[0].source, SourceKind::SimpleIcons);
    }

    #[tokio::test]
    async fn test_simple_icons_skipped_without_svg() {
        let server = MockServer::start_async().await;
        let mut settings = settings_for(&server);
        settings.general.download_svg = false;
        let ctx = context("GitHub", settings);
        assert!(SimpleIconsSource.search(&ctx).await.unwrap().is_empty());
    }
}
