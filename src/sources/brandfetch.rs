use super::{join_path, SearchContext};
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const DOMAIN_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
struct Brand {
    #[serde(default)]
    logos: Vec<BrandLogo>,
}

#[derive(Debug, Deserialize)]
struct BrandLogo {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    formats: Vec<BrandFormat>,
}

#[derive(Debug, Deserialize)]
struct BrandFormat {
    #[serde(default)]
    format: String,
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    domain: Option<String>,
}

/// Raw scores for PNG and SVG hits; authenticated lookups rank higher.
#[derive(Debug, Clone, Copy)]
struct Scores {
    png: i32,
    svg: i32,
}

const AUTHENTICATED: Scores = Scores { png: 15, svg: 20 };
const PUBLIC: Scores = Scores { png: 10, svg: 15 };

/// Brandfetch brand API. With an API key brands are fetched directly by
/// domain; without one the public search endpoint resolves the domain first.
pub struct BrandfetchSource;

impl BrandfetchSource {
    /// `(url, format)` of every PNG then every SVG of `type == "logo"` entries.
    fn logo_urls(brand: &Brand) -> Vec<(String, LogoFormat)> {
        let mut urls = Vec::new();
        for logo in brand.logos.iter().filter(|logo| logo.kind == "logo") {
            for wanted in [LogoFormat::Png, LogoFormat::Svg] {
                for format in &logo.formats {
                    if format.format.parse::<LogoFormat>().ok() != Some(wanted) {
                        continue;
                    }
                    if let Some(src) = format.src.as_deref().filter(|src| !src.is_empty()) {
                        urls.push((src.to_string(), wanted));
                    }
                }
            }
        }
        urls
    }

    async fn collect_brand(
        &self,
        ctx: &SearchContext,
        brand: &Brand,
        scores: Scores,
    ) -> Vec<LogoResult> {
        let mut results = Vec::new();
        for (url, format) in Self::logo_urls(brand) {
            if !ctx.wants(format) {
                continue;
            }
            let raw = if format.is_vector() { scores.svg } else { scores.png };
            match ctx.download(&url, self.kind(), format, raw).await {
                Ok(Some(result)) => {
                    ctx.progress(format!("✅ Found {} logo from Brandfetch", format));
                    results.push(result);
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Error with Brandfetch: {}", e),
            }
        }
        results
    }

    async fn search_authenticated(&self, ctx: &SearchContext, api_key: &str) -> Result<Vec<LogoResult>> {
        let base = &ctx.settings.endpoints.brandfetch;
        let auth = format!("Bearer {}", api_key);
        let mut results = Vec::new();

        for domain in ctx.registrable_domains(Some(DOMAIN_LIMIT)) {
            let url = join_path(base, &["brands", domain.as_str()])?;
            match ctx.fetcher.get_json::<Brand>(&url, &[("Authorization", auth.as_str())]).await {
                Ok(Some(brand)) => results.extend(self.collect_brand(ctx, &brand, AUTHENTICATED).await),
                Ok(None) => {}
                Err(e) => tracing::error!("Error with Brandfetch API: {}", e),
            }
        }

        Ok(results)
    }

    async fn search_public(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let base = &ctx.settings.endpoints.brandfetch;
        let mut results = Vec::new();

        for domain in ctx.domains.iter().take(DOMAIN_LIMIT) {
            let search_url = join_path(base, &["search", domain.as_str()])?;
            let hits = match ctx.fetcher.get_json::<Vec<SearchHit>>(&search_url, &[]).await {
                Ok(Some(hits)) => hits,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Error with Brandfetch: {}", e);
                    continue;
                }
            };

            let Some(found_domain) = hits.into_iter().next().and_then(|hit| hit.domain) else {
                continue;
            };

            let brand_url = join_path(base, &["brands", found_domain.as_str()])?;
            match ctx.fetcher.get_json::<Brand>(&brand_url, &[]).await {
                Ok(Some(brand)) => results.extend(self.collect_brand(ctx, &brand, PUBLIC).await),
                Ok(None) => {}
                Err(e) => tracing::error!("Error with Brandfetch: {}", e),
            }
        }

        Ok(results)
    }
}

#[async_trait]
impl LogoSource for BrandfetchSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Brandfetch
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let api_key = ctx.settings.api_keys.brandfetch_api_key.trim();
        if api_key.is_empty() {
            self.search_public(ctx).await
        } else {
            self.search_authenticated(ctx, api_key).await
        }
    }
}
