use crate::domain::model::{LogoResult, SourceKind};
use crate::sources::SearchContext;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// A place logos can be looked up by company name.
///
/// Implementations report what they found; scoring against the source's base
/// quality happens in the search manager.
#[async_trait]
pub trait LogoSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn search(&self, ctx: &SearchContext) -> Result<Vec<LogoResult>>;
}

/// Progress reported while a search runs.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Progress(String),
    Result(Box<LogoResult>),
    SourceComplete { source: SourceKind, success: bool },
}
