use super::SearchContext;
use crate::domain::model::{LogoFormat, LogoResult, SourceKind};
use crate::domain::ports::LogoSource;
use crate::utils::error::Result;
use async_trait::async_trait;

const RAW_SCORE: i32 = 5;

/// Clearbit logo API: one PNG per registrable domain.
pub struct ClearbitSource;

impl ClearbitSource {
    pub fn logo_url(base: &str, domain: &str) -> String {
        format!("{}/{}?size=512", base.trim_end_matches('/'), domain)
    }
}

#[async_trait]
impl LogoSource for ClearbitSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Clearbit
    }

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>> {
        let mut results = Vec::new();
        if !ctx.wants(LogoFormat::Png) {
            return Ok(results);
        }

        for domain in ctx.registrable_domains(None) {
            let url = Self::logo_url(&ctx.settings.endpoints.clearbit, &domain);
            match ctx.download(&url, self.kind(), LogoFormat::Png, RAW_SCORE).await {
                Ok(Some(result)) => {
                    ctx.progress(format!("✅ Found logo from Clearbit ({})", domain));
                    results.push(result);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Error with Clearbit for domain {}: {}", domain, e),
            }
        }

        Ok(results)
    }
}
