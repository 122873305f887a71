use super::SearchContext;
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

const DOMAIN_LIMIT: usize = 3;
const CANDIDATE_LIMIT: usize = 3;
const MIN_CANDIDATE_SCORE: i32 = 20;

fn img_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"))
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("valid regex")
    })
}

/// An `<img>` on a company page that looks like a logo.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoCandidate {
    pub src: String,
    pub score: i32,
}

/// Scrapes the company's own home page for logo-looking images.
pub struct CompanyWebsiteSource;

impl CompanyWebsiteSource {
    fn attributes(tag: &str) -> HashMap<String, String> {
        attr_re()
            .captures_iter(tag)
            .map(|caps| {
                let name = caps[1].to_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (name, value)
            })
            .collect()
    }

    fn score_tag(attrs: &HashMap<String, String>) -> i32 {
        let has_logo = |name: &str| {
            attrs
                .get(name)
                .is_some_and(|value| value.to_lowercase().contains("logo"))
        };

        let mut score = 0;
        if has_logo("class") {
            score += 20;
        }
        if has_logo("id") {
            score += 20;
        }
        if has_logo("alt") {
            score += 15;
        }
        if has_logo("src") {
            score += 10;
        }

        let dimension = |name: &str| attrs.get(name).and_then(|v| v.trim().parse::<u32>().ok());
        if let (Some(w), Some(h)) = (dimension("width"), dimension("height")) {
            if (20..=400).contains(&w) && (20..=200).contains(&h) {
                score += 10;
            }
        }
        score
    }

    /// Logo candidates from an HTML page, best first.
    pub fn find_candidates(html: &str) -> Vec<LogoCandidate> {
        let mut candidates: Vec<LogoCandidate> = img_tag_re()
            .find_iter(html)
            .filter_map(|tag| {
                let attrs = Self::attributes(tag.as_str());
                let src = attrs.get("src").filter(|src| !src.trim().is_empty())?.trim().to_string();
                let score = Self::score_tag(&attrs);
                (score >= MIN_CANDIDATE_SCORE).then_some(LogoCandidate { src, score })
            })
            .collect();

        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates
    }

    fn page_url(ctx: &SearchContext, domain: &str) -> Option<Url> {
        let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("{}://{}", ctx.settings.endpoints.website_scheme, domain)
        };
        Url::parse(&raw).ok()
    }

    async fn search_domain(&self, ctx: &SearchContext, domain: &str) -> Result<Vec<LogoResult>> {
        let Some(page_url) = Self::page_url(ctx, domain) else {
            return Ok(Vec::new());
        };
        let Some((final_url, html)) = ctx.fetcher.get_text(page_url.as_str()).await? else {
            return Ok(Vec::new());
        };
        let base = Url::parse(&final_url).unwrap_or(page_url);

        let mut results = Vec::new();
        for candidate in Self::find_candidates(&html).into_iter().take(CANDIDATE_LIMIT) {
            let Ok(image_url) = base.join(&candidate.src) else {
                continue;
            };
            let raw_score = candidate.score / 10;
            match ctx
                .download(
                    image_url.as_str(),
                    self.kind(),
                    LogoFormat::from_url(image_url.as_str()),
                    raw_score,
                )
                .await
            {
                Ok(Some(result)) => {
                    ctx.progress(format!("✅ Found logo on company website ({})", base));
                    results.push(result);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Error downloading image from company website: {}", e),
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl LogoSource for CompanyWebsiteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CompanyWebsite
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let mut results = Vec::new();
        for domain in ctx.domains.iter().take(DOMAIN_LIMIT) {
            match self.search_domain(ctx, domain).await {
                Ok(found) => results.extend(found),
                Err(e) => tracing::debug!("Error with company website {}: {}", domain, e),
            }
        }
        Ok(results)
    }
}
