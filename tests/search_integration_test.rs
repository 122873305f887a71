use anyhow::Result;
use httpmock::prelude::*;
use logo_downloader::domain::ports::{LogoSource, SearchEvent};
use logo_downloader::sources::default_sources;
use logo_downloader::{LogoFormat, LogoStore, SearchManager, Settings, SourceKind};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::{mpsc, Mutex};

const SVG_LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#0a0"/></svg>"##;
const PNG_LOGO: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

fn settings_for(server: &MockServer, temp_dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.general.output_directory = temp_dir.path().join("logos").display().to_string();
    settings.advanced.max_retries = 0;
    settings.advanced.timeout = 5;
    settings.endpoints.clearbit = server.url("/clearbit");
    settings.endpoints.simple_icons = server.url("/simple-icons");
    settings.endpoints.brandfetch = server.url("/brandfetch/v2");
    settings.endpoints.wikipedia = server.url("/w/api.php");
    settings.endpoints.google = server.url("/customsearch/v1");
    settings.endpoints.bing = server.url("/bing/images/search");
    settings.endpoints.duckduckgo = server.url("/i.js");
    settings
}

/// Every source except the website scraper, which would resolve real domains.
fn mocked_sources() -> Vec<Arc<dyn LogoSource>> {
    default_sources()
        .into_iter()
        .filter(|source| source.kind() != SourceKind::CompanyWebsite)
        .collect()
}

#[tokio::test]
async fn test_search_then_cache_then_auto_save() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;

    let simple_icons = server
        .mock_async(|when, then| {
            when.method(GET).path("/simple-icons/acme.svg");
            then.status(200)
                .header("Content-Type", "image/svg+xml")
                .body(SVG_LOGO);
        })
        .await;
    let clearbit = server
        .mock_async(|when, then| {
            when.method(GET).path("/clearbit/acme.com");
            then.status(200).header("Content-Type", "image/png").body(PNG_LOGO);
        })
        .await;

    let mut settings = settings_for(&server, &temp_dir);
    settings.general.max_results = 2;
    settings.general.search_all_sources = false;
    settings.general.auto_save = true;

    let store = Arc::new(Mutex::new(LogoStore::open(temp_dir.path().join("data"))?));
    let manager = SearchManager::new(settings, store.clone(), mocked_sources())?;

    let outcome = manager.search("Acme", None).await?;

    assert!(outcome.success);
    assert_eq!(outcome.from_cache, 0);
    assert_eq!(outcome.results.len(), 2);

    let best = outcome.best().unwrap();
    assert_eq!(best.source, SourceKind::SimpleIcons);
    assert_eq!(best.format, LogoFormat::Svg);
    assert_eq!(best.score, 10 + 80 + 10);
    assert_eq!(best.width, Some(512));
    assert_eq!(best.height, Some(256));
    assert_eq!(outcome.results[1].source, SourceKind::Clearbit);
    assert_eq!(outcome.results[1].score, 5 + 75);

    let saved = manager.auto_save(&outcome).await?.unwrap();
    assert!(saved.ends_with("acme_logo.svg"));
    assert_eq!(std::fs::read_to_string(&saved)?, SVG_LOGO);

    // Second search is answered from the cache alone.
    let again = manager.search("Acme", None).await?;
    assert_eq!(again.from_cache, 2);
    assert_eq!(again.results.len(), 2);
    simple_icons.assert_hits_async(1).await;
    clearbit.assert_hits_async(1).await;

    Ok(())
}

#[tokio::test]
async fn test_search_with_nothing_found_records_history() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    let settings = settings_for(&server, &temp_dir);

    let data_dir = temp_dir.path().join("data");
    let store = Arc::new(Mutex::new(LogoStore::open(&data_dir)?));
    let manager = SearchManager::new(settings, store, mocked_sources())?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = manager.search("  Nobody Knows Inc  ", Some(tx)).await?;
    assert!(!outcome.success);
    assert!(!outcome.stopped_early);

    let mut progress = Vec::new();
    let mut completed = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            SearchEvent::Progress(message) => progress.push(message),
            SearchEvent::SourceComplete { source, success } => completed.push((source, success)),
            SearchEvent::Result(_) => panic!("no result expected"),
        }
    }
    assert_eq!(completed.len(), mocked_sources().len());
    assert!(completed.iter().all(|(_, success)| !success));
    assert!(progress
        .iter()
        .any(|m| m.contains("Google Search API key or CX not configured")));
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.company_name, "Nobody Knows Inc");

    let reopened = LogoStore::open(&data_dir)?;
    let history = reopened.get_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].company_name, "Nobody Knows Inc");
    assert_eq!(history[0].results_count, 0);

    let csv_path = temp_dir.path().join("history.csv");
    reopened.export_history_csv(&csv_path)?;
    let csv = std::fs::read_to_string(&csv_path)?;
    assert!(csv.starts_with("company_name,searched_at,results_count"));

    Ok(())
}

#[tokio::test]
async fn test_settings_file_drives_search() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    let clearbit = server
        .mock_async(|when, then| {
            when.method(GET).path("/clearbit/acme.com");
            then.status(200).header("Content-Type", "image/png").body(PNG_LOGO);
        })
        .await;
    let simple_icons = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/simple-icons/");
            then.status(200)
                .header("Content-Type", "image/svg+xml")
                .body(SVG_LOGO);
        })
        .await;

    let config_path = temp_dir.path().join("config.toml");
    settings_for(&server, &temp_dir).save(&config_path)?;
    let mut settings = Settings::load_or_default(&config_path)?;
    settings.general.download_svg = false;

    let store = Arc::new(Mutex::new(LogoStore::open(temp_dir.path().join("data"))?));
    let manager = SearchManager::new(settings, store, mocked_sources())?;
    let outcome = manager.search("Acme", None).await?;

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].format, LogoFormat::Png);
    clearbit.assert_hits_async(1).await;
    simple_icons.assert_hits_async(0).await;

    Ok(())
}
