use crate::config::Settings;
use crate::core::http::HttpFetcher;
use crate::core::processing::ImageProcessor;
use crate::domain::model::{LogoFormat, LogoResult};
use crate::domain::ports::{LogoSource, SearchEvent};
use crate::sources::SearchContext;
use crate::store::LogoStore;
use crate::utils::error::{LogoError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

const SVG_BONUS: i32 = 10;

/// Everything one search produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub company_name: String,
    /// Best first.
    pub results: Vec<LogoResult>,
    pub from_cache: usize,
    pub success: bool,
    pub stopped_early: bool,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&LogoResult> {
        self.results.first()
    }
}

/// Add the source's base quality and the vector bonus to a source's raw
/// score, and stamp where and when the result was found.
pub fn score_result(result: &mut LogoResult) {
    result.score += result.source.descriptor().base_quality;
    if result.format == LogoFormat::Svg {
        result.score += SVG_BONUS;
    }
    result
        .metadata
        .insert("source".to_string(), result.source.name().to_string());
    result
        .metadata
        .insert("found_time".to_string(), Utc::now().to_rfc3339());
}

/// Runs every enabled source for a company and gathers the results.
pub struct SearchManager {
    settings: Arc<Settings>,
    store: Arc<Mutex<LogoStore>>,
    sources: Vec<Arc<dyn LogoSource>>,
    fetcher: HttpFetcher,
}

impl SearchManager {
    pub fn new(
        settings: Settings,
        store: Arc<Mutex<LogoStore>>,
        mut sources: Vec<Arc<dyn LogoSource>>,
    ) -> Result<Self> {
        let fetcher = HttpFetcher::from_settings(&settings)?;
        // highest priority starts first
        sources.sort_by_key(|source| std::cmp::Reverse(source.kind().descriptor().priority));
        Ok(Self {
            settings: Arc::new(settings),
            store,
            sources,
            fetcher,
        })
    }

    fn emit(events: &Option<UnboundedSender<SearchEvent>>, event: SearchEvent) {
        if let Some(events) = events {
            let _ = events.send(event);
        }
    }

    fn progress(events: &Option<UnboundedSender<SearchEvent>>, message: String) {
        tracing::info!("{}", message);
        Self::emit(events, SearchEvent::Progress(message));
    }

    fn enough(&self, count: usize) -> bool {
        !self.settings.general.search_all_sources && count >= self.settings.general.max_results
    }

    pub async fn search(
        &self,
        company_name: &str,
        events: Option<UnboundedSender<SearchEvent>>,
    ) -> Result<SearchOutcome> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(LogoError::validation("Company name cannot be empty"));
        }
        let general = &self.settings.general;
        if !general.download_png && !general.download_svg {
            return Err(LogoError::validation(
                "Enable at least one of PNG or SVG downloads",
            ));
        }

        let start_time = Instant::now();
        Self::progress(
            &events,
            format!("🔍 Searching for {} logos...", company_name),
        );

        let cached = self
            .store
            .lock()
            .await
            .get_from_cache(company_name, self.settings.advanced.cache_expiry_days);
        let from_cache = cached.len();
        if from_cache > 0 {
            Self::progress(&events, format!("Found {} logos in cache", from_cache));
            for result in &cached {
                Self::emit(&events, SearchEvent::Result(Box::new(result.clone())));
            }
        }

        if self.enough(from_cache) {
            tracing::info!("✅ Cache satisfied the search for {}", company_name);
            return Ok(SearchOutcome {
                company_name: company_name.to_string(),
                results: cached,
                from_cache,
                success: true,
                stopped_early: true,
            });
        }

        let mut cached_ids: HashSet<Uuid> = cached.iter().map(|r| r.id).collect();
        let mut results = cached;
        let mut ctx = SearchContext::new(company_name, self.settings.clone(), self.fetcher.clone());
        if let Some(tx) = &events {
            ctx = ctx.with_events(tx.clone());
        }
        let ctx = Arc::new(ctx);

        let semaphore = Arc::new(Semaphore::new(self.settings.advanced.concurrent_searches.max(1)));
        let mut workers = JoinSet::new();
        for source in self
            .sources
            .iter()
            .filter(|source| source.kind().descriptor().enabled)
        {
            let source = source.clone();
            let ctx = ctx.clone();
            let semaphore = semaphore.clone();
            workers.spawn(async move {
                let kind = source.kind();
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (kind, Err(LogoError::processing(e.to_string()))),
                };
                ctx.progress(format!("Searching {}...", kind));
                (kind, source.search(&ctx).await)
            });
        }

        let mut stopped_early = false;
        while let Some(joined) = workers.join_next().await {
            let (kind, outcome) = match joined {
                Ok(finished) => finished,
                Err(e) => {
                    tracing::error!("❌ Source worker failed: {}", e);
                    continue;
                }
            };

            let found = match outcome {
                Ok(found) => found,
                Err(e) => {
                    tracing::error!("Error searching {}: {}", kind, e);
                    Self::progress(&events, format!("❌ Error searching {}: {}", kind, e));
                    Vec::new()
                }
            };
            let success = !found.is_empty();

            for mut result in found {
                score_result(&mut result);
                self.collect(&mut results, &mut cached_ids, result, &events)
                    .await;
            }
            Self::emit(&events, SearchEvent::SourceComplete { source: kind, success });

            if self.enough(results.len()) {
                workers.abort_all();
                stopped_early = true;
                tracing::info!(
                    "Reached {} results, stopping remaining sources",
                    self.settings.general.max_results
                );
                break;
            }
        }

        if !stopped_early {
            if let Err(e) = self
                .store
                .lock()
                .await
                .add_to_history(company_name, results.len())
            {
                tracing::warn!("⚠️ Failed to record search history: {}", e);
            }
        }

        results.sort_by(|a, b| b.score.cmp(&a.score));
        tracing::info!(
            "✅ Search for {} finished with {} result(s) in {:.2}s",
            company_name,
            results.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(SearchOutcome {
            company_name: company_name.to_string(),
            success: !results.is_empty(),
            results,
            from_cache,
            stopped_early,
        })
    }

    /// Cache and emit a freshly scored result. It replaces a cached result
    /// from the same source in the same format.
    async fn collect(
        &self,
        results: &mut Vec<LogoResult>,
        cached_ids: &mut HashSet<Uuid>,
        result: LogoResult,
        events: &Option<UnboundedSender<SearchEvent>>,
    ) {
        if let Err(e) = self.store.lock().await.add_to_cache(&result) {
            tracing::warn!("⚠️ Failed to cache {} result: {}", result.source, e);
        }
        Self::emit(events, SearchEvent::Result(Box::new(result.clone())));

        let stale = results.iter().position(|existing| {
            cached_ids.contains(&existing.id)
                && existing.source == result.source
                && existing.format == result.format
        });
        match stale {
            Some(index) => {
                cached_ids.remove(&results[index].id);
                results[index] = result;
            }
            None => results.push(result),
        }
    }

    /// Save the best result to the output directory when auto-save is on,
    /// applying background removal and enhancement first if enabled.
    /// Returns the written path.
    pub async fn auto_save(&self, outcome: &SearchOutcome) -> Result<Option<String>> {
        let general = &self.settings.general;
        if !general.auto_save {
            return Ok(None);
        }
        let Some(best) = outcome.best() else {
            tracing::info!("No results to save for {}", outcome.company_name);
            return Ok(None);
        };

        let saved = save_result(
            &general.output_directory,
            best,
            None,
            general.remove_background,
            general.enhance_logo,
        )
        .await?;
        let path = saved.file_path.unwrap_or_default();
        tracing::info!("💾 Saved {} logo to {}", outcome.company_name, path);
        Ok(Some(path))
    }
}

/// Post-process a copy of `result` and write it to `dir`. The returned copy
/// carries the written `file_path`.
pub async fn save_result(
    dir: impl AsRef<Path>,
    result: &LogoResult,
    file_name: Option<&str>,
    remove_background: bool,
    enhance: bool,
) -> Result<LogoResult> {
    let mut result = result.clone();
    if remove_background || enhance {
        let mut image = result.to_image()?;
        if remove_background {
            image = ImageProcessor::remove_background(&image);
        }
        if enhance {
            image = ImageProcessor::enhance(&image);
        }
        result.update_image(&image)?;
    }
    result.save_to_file(dir, file_name).await?;
    Ok(result)
}
