//! On-disk cache, search history and favorites.

use crate::domain::model::{Favorite, HistoryEntry, LogoResult};
use crate::utils::error::{LogoError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const STORE_FILE: &str = "logo_store.json";
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: LogoResult,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn same_key(&self, result: &LogoResult) -> bool {
        self.result.company_name == result.company_name
            && self.result.source == result.source
            && self.result.format == result.format
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    cache: Vec<CacheEntry>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    favorites: Vec<Favorite>,
}

/// JSON-file store. Every mutation is written through to disk.
pub struct LogoStore {
    store_path: PathBuf,
    data: StoreData,
}

impl LogoStore {
    /// Create or load the store in `store_dir`.
    pub fn open(store_dir: impl AsRef<Path>) -> Result<Self> {
        let store_dir = store_dir.as_ref();
        fs::create_dir_all(store_dir)?;
        let store_path = store_dir.join(STORE_FILE);

        let data = if store_path.exists() {
            let reader = BufReader::new(File::open(&store_path)?);
            match serde_json::from_reader(reader) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Store file {} is unreadable ({}), starting empty",
                        store_path.display(),
                        e
                    );
                    StoreData::default()
                }
            }
        } else {
            StoreData::default()
        };

        tracing::debug!(
            "Opened store {} ({} cached, {} history, {} favorites)",
            store_path.display(),
            data.cache.len(),
            data.history.len(),
            data.favorites.len()
        );
        Ok(Self { store_path, data })
    }

    /// `<data_dir>/logo-downloader`, falling back to the working directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("logo-downloader")
    }

    fn save(&self) -> Result<()> {
        let tmp_path = self.store_path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &self.data)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.store_path).map_err(|e| LogoError::StoreError {
            message: format!("Failed to replace {}: {}", self.store_path.display(), e),
        })
    }

    pub fn add_to_cache(&mut self, result: &LogoResult) -> Result<()> {
        self.insert_cache_entry(result, Utc::now());
        self.save()
    }

    fn insert_cache_entry(&mut self, result: &LogoResult, cached_at: DateTime<Utc>) {
        let entry = CacheEntry {
            result: result.clone(),
            cached_at,
        };
        match self.data.cache.iter_mut().find(|e| e.same_key(result)) {
            Some(existing) => *existing = entry,
            None => self.data.cache.push(entry),
        }
    }

    /// Cached results for a company younger than `max_age_days`, best first.
    pub fn get_from_cache(&self, company_name: &str, max_age_days: i64) -> Vec<LogoResult> {
        let cutoff = cutoff(max_age_days);
        let mut results: Vec<LogoResult> = self
            .data
            .cache
            .iter()
            .filter(|e| e.result.company_name == company_name && e.cached_at > cutoff)
            .map(|e| e.result.clone())
            .collect();
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    /// Drop everything, or only entries older than `older_than_days`.
    /// Returns how many entries were removed.
    pub fn clear_cache(&mut self, older_than_days: Option<i64>) -> Result<usize> {
        let before = self.data.cache.len();
        match older_than_days {
            Some(days) => {
                let cutoff = cutoff(days);
                self.data.cache.retain(|e| e.cached_at >= cutoff);
            }
            None => self.data.cache.clear(),
        }
        let removed = before - self.data.cache.len();
        self.save()?;
        tracing::info!("🗑️ Removed {} cached result(s)", removed);
        Ok(removed)
    }

    pub fn add_to_history(&mut self, company_name: &str, results_count: usize) -> Result<()> {
        self.data.history.retain(|h| h.company_name != company_name);
        self.data.history.push(HistoryEntry {
            company_name: company_name.to_string(),
            searched_at: Utc::now(),
            results_count,
        });
        self.save()
    }

    /// Newest first.
    pub fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut history = self.data.history.clone();
        history.sort_by(|a, b| b.searched_at.cmp(&a.searched_at));
        history.truncate(limit);
        history
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.data.history.clear();
        self.save()
    }

    pub fn export_history_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let history = self.get_history(usize::MAX);
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for entry in &history {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(history.len())
    }

    /// Replaces any existing favorite for the same company.
    pub fn add_to_favorites(&mut self, result: &LogoResult) -> Result<()> {
        self.data
            .favorites
            .retain(|f| f.company_name != result.company_name);
        self.data.favorites.push(Favorite::from_result(result));
        self.save()
    }

    /// Newest first.
    pub fn get_favorites(&self) -> Vec<Favorite> {
        let mut favorites = self.data.favorites.clone();
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        favorites
    }

    pub fn get_favorite(&self, company_name: &str) -> Option<Favorite> {
        self.data
            .favorites
            .iter()
            .find(|f| f.company_name == company_name)
            .cloned()
    }

    pub fn remove_from_favorites(&mut self, company_name: &str) -> Result<bool> {
        let before = self.data.favorites.len();
        self.data.favorites.retain(|f| f.company_name != company_name);
        let removed = self.data.favorites.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }
}

/// `now - days`, saturating at the representable range.
fn cutoff(days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|d| Utc::now().checked_sub_signed(d))
        .unwrap_or(if days > 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LogoFormat, SourceKind};
    use tempfile::TempDir;

    fn result(company: &str, source: SourceKind, format: LogoFormat, score: i32) -> LogoResult {
        LogoResult::new(company, source, format, b"logo".to_vec()).with_score(score)
    }

    #[test]
    fn test_cache_is_keyed_by_company_source_format() {
        let dir = TempDir::new().unwrap();
        let mut store = LogoStore::open(dir.path()).unwrap();

        store
            .add_to_cache(&result("Acme", SourceKind::Clearbit, LogoFormat::Png, 80))
            .unwrap();
        store
            .add_to_cache(&result("Acme", SourceKind::Clearbit, LogoFormat::Png, 85))
            .unwrap();
        store
            .add_to_cache(&result("Acme", SourceKind::SimpleIcons, LogoFormat::Svg, 110))
            .unwrap();
        store
            .add_to_cache(&result("Other", SourceKind::Clearbit, LogoFormat::Png, 90))
            .unwrap();

        let cached = store.get_from_cache("Acme", 30);
        let scores: Vec<i32> = cached.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![110, 85]);
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = LogoStore::open(dir.path()).unwrap();
            store
                .add_to_cache(&result("Acme", SourceKind::Wikipedia, LogoFormat::Svg, 95))
                .unwrap();
            store.add_to_history("Acme", 1).unwrap();
        }

        let store = LogoStore::open(dir.path()).unwrap();
        let cached = store.get_from_cache("Acme", 30);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].image_data, b"logo");
        assert_eq!(store.get_history(10)[0].results_count, 1);
        assert!(!dir.path().join("logo_store.json.tmp").exists());
    }

    #[test]
    fn test_expired_entries_are_hidden_and_cleared() {
        let dir = TempDir::new().unwrap();
        let mut store = LogoStore::open(dir.path()).unwrap();
        store.insert_cache_entry(
            &result("Acme", SourceKind::Clearbit, LogoFormat::Png, 80),
            Utc::now() - Duration::days(40),
        );
        store
            .add_to_cache(&result("Acme", SourceKind::SimpleIcons, LogoFormat::Svg, 110))
            .unwrap();

        assert_eq!(store.get_from_cache("Acme", 30).len(), 1);
        assert_eq!(store.get_from_cache("Acme", 60).len(), 2);

        assert_eq!(store.clear_cache(Some(30)).unwrap(), 1);
        assert_eq!(store.get_from_cache("Acme", 60).len(), 1);
        assert_eq!(store.clear_cache(None).unwrap(), 1);
        assert!(store.get_from_cache("Acme", 60).is_empty());
    }

    #[test]
    fn test_out_of_range_day_counts_do_not_panic() {
        let dir = TempDir::new().unwrap();
        let mut store = LogoStore::open(dir.path()).unwrap();
        store.insert_cache_entry(
            &result("Acme", SourceKind::Clearbit, LogoFormat::Png, 80),
            Utc::now() - Duration::days(4000),
        );
        store
            .add_to_cache(&result("Acme", SourceKind::SimpleIcons, LogoFormat::Svg, 110))
            .unwrap();

        assert_eq!(store.get_from_cache("Acme", i64::MAX).len(), 2);
        assert_eq!(store.get_from_cache("Acme", 1_000_000_000_000).len(), 2);
        assert!(store.get_from_cache("Acme", i64::MIN).is_empty());

        // Nothing is older than the earliest representable instant.
        assert_eq!(store.clear_cache(Some(1_000_000_000_000)).unwrap(), 0);
        assert_eq!(store.clear_cache(Some(i64::MAX)).unwrap(), 0);
        assert_eq!(store.clear_cache(Some(-1_000_000_000_000)).unwrap(), 2);
        assert!(store.get_from_cache("Acme", i64::MAX).is_empty());
    }

    #[test]
    fn test_history_is_unique_per_company_and_newest_first() {
        let dir = TempDir::new().unwrap();
        let mut store = LogoStore::open(dir.path()).unwrap();
        store.add_to_history("Acme", 2).unwrap();
        store.add_to_history("Globex", 0).unwrap();
        store.add_to_history("Acme", 5).unwrap();

        let history = store.get_history(DEFAULT_HISTORY_LIMIT);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].company_name, "Acme");
        assert_eq!(history[0].results_count, 5);
        assert_eq!(store.get_history(1).len(), 1);

        store.clear_history().unwrap();
        assert!(store.get_history(10).is_empty());
    }

    #[test]
    fn test_export_history_csv() {
        let dir = TempDir::new().unwrap();
        let mut store = LogoStore::open(dir.path()).unwrap();
        store.add_to_history("Acme Corp", 3).unwrap();

        let csv_path = dir.path().join("history.csv");
        assert_eq!(store.export_history_csv(&csv_path).unwrap(), 1);

        let content = fs::read_to_string(&csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("company_name,searched_at,results_count"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Acme Corp,"));
        assert!(row.ends_with(",3"));
    }

    #[test]
    fn test_favorites_replace_and_remove() {
        let dir = TempDir::new().unwrap();
        let mut store = LogoStore::open(dir.path()).unwrap();
        store
            .add_to_favorites(&result("Acme", SourceKind::Clearbit, LogoFormat::Png, 80))
            .unwrap();
        store
            .add_to_favorites(&result("Acme", SourceKind::SimpleIcons, LogoFormat::Svg, 110))
            .unwrap();

        let favorites = store.get_favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].format, LogoFormat::Svg);
        assert_eq!(favorites[0].source, Some(SourceKind::SimpleIcons));

        assert!(store.remove_from_favorites("Acme").unwrap());
        assert!(!store.remove_from_favorites("Acme").unwrap());
        assert!(store.get_favorite("Acme").is_none());
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STORE_FILE), "{ not json").unwrap();

        let mut store = LogoStore::open(dir.path()).unwrap();
        assert!(store.get_history(10).is_empty());
        store.add_to_history("Acme", 1).unwrap();

        let reopened = LogoStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_history(10).len(), 1);
    }
}
