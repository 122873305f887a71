use clap::Parser;
use logo_downloader::config::{
    CacheCommand, Command, ConfigCommand, FavoritesCommand, ProcessArgs, SearchArgs,
};
use logo_downloader::core::search::save_result;
use logo_downloader::domain::ports::{SearchEvent, Storage};
use logo_downloader::sources::default_sources;
use logo_downloader::utils::error::ErrorSeverity;
use logo_downloader::utils::{logger, validation::Validate};
use logo_downloader::{
    CliConfig, ImageProcessor, LocalStorage, LogoError, LogoStore, Result, SearchManager, Settings,
    SourceKind,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let settings_path = config.config.clone().unwrap_or_else(Settings::default_path);
    let data_dir = config.data_dir.clone().unwrap_or_else(LogoStore::default_dir);

    match config.command {
        Command::Search(args) => {
            let settings = Settings::load_or_default(&settings_path)?;
            search(settings, data_dir, args).await
        }
        Command::Process(args) => process(args).await,
        Command::Colors { input, count } => colors(input, count).await,
        Command::Favorites(command) => {
            let settings = Settings::load_or_default(&settings_path)?;
            favorites(settings, data_dir, command).await
        }
        Command::History {
            limit,
            export,
            clear,
        } => history(data_dir, limit, export, clear),
        Command::Cache(CacheCommand::Clear { older_than }) => {
            let mut store = LogoStore::open(&data_dir)?;
            let removed = store.clear_cache(older_than)?;
            println!("🗑️ Removed {} cached result(s)", removed);
            Ok(())
        }
        Command::Config(command) => config_command(settings_path, command),
    }
}

async fn search(mut settings: Settings, data_dir: PathBuf, args: SearchArgs) -> Result<()> {
    args.apply_to(&mut settings);
    settings.validate()?;

    let store = Arc::new(Mutex::new(LogoStore::open(&data_dir)?));
    let manager = SearchManager::new(settings, store, default_sources())?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SearchEvent::Result(result) => println!(
                    "  + {:<15} {:<4} {:>9}  score {}",
                    result.source.name(),
                    result.format,
                    result.dimensions_label(),
                    result.score
                ),
                SearchEvent::SourceComplete { source, success } => {
                    tracing::debug!("{} finished (success: {})", source, success)
                }
                SearchEvent::Progress(_) => {}
            }
        }
    });

    let outcome = manager.search(&args.company, Some(tx)).await;
    let _ = printer.await;
    let outcome = outcome?;

    if !outcome.success {
        println!("❌ No logos found for {}", outcome.company_name);
        return Ok(());
    }

    println!(
        "✅ {} logo(s) for {} ({} from cache)",
        outcome.results.len(),
        outcome.company_name,
        outcome.from_cache
    );
    for (rank, result) in outcome.results.iter().enumerate() {
        println!(
            "{:>3}. {:<15} {:<4} {:>9}  score {:<4} {}",
            rank + 1,
            result.source.name(),
            result.format,
            result.dimensions_label(),
            result.score,
            result.image_url.as_deref().unwrap_or("-")
        );
    }

    if let Some(path) = manager.auto_save(&outcome).await? {
        println!("📁 Saved best logo to: {}", path);
    }
    Ok(())
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    let (storage, file_name) = LocalStorage::for_file(path)?;
    storage.read_file(&file_name).await
}

async fn process(args: ProcessArgs) -> Result<()> {
    let data = read_input(&args.input).await?;
    let hint = args
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok());
    let mut image = ImageProcessor::decode_bytes(&data, hint)?;

    if args.remove_background {
        image = ImageProcessor::remove_background(&image);
    }
    if args.enhance {
        image = ImageProcessor::enhance(&image);
    }
    if let Some((width, height)) = args.target_size()? {
        image = ImageProcessor::resize(&image, width, height, !args.exact)?;
    }

    let format = args.target_format()?;
    let encoded = ImageProcessor::convert(&image, format)?;
    let (storage, file_name) = LocalStorage::for_file(&args.output)?;
    let written = storage.write_file(&file_name, &encoded).await?;

    println!(
        "✅ Wrote {}x{} {} to {}",
        image.width(),
        image.height(),
        format,
        written
    );
    Ok(())
}

async fn colors(input: PathBuf, count: usize) -> Result<()> {
    let data = read_input(&input).await?;
    let image = ImageProcessor::decode_bytes(&data, None)?;
    for color in ImageProcessor::dominant_colors(&image, count) {
        println!("{}  {}", color.hex, color.count);
    }
    Ok(())
}

async fn favorites(settings: Settings, data_dir: PathBuf, command: FavoritesCommand) -> Result<()> {
    let mut store = LogoStore::open(&data_dir)?;

    match command {
        FavoritesCommand::List => {
            let favorites = store.get_favorites();
            if favorites.is_empty() {
                println!("No favorites yet");
            }
            for favorite in favorites {
                println!(
                    "{:<30} {:<4} {:<15} {}",
                    favorite.company_name,
                    favorite.format,
                    favorite.source.map(|s| s.name()).unwrap_or("-"),
                    favorite.added_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        FavoritesCommand::Add { company, source } => {
            let source = source
                .map(|s| {
                    s.parse::<SourceKind>()
                        .map_err(|reason| LogoError::InvalidConfigValueError {
                            field: "source".to_string(),
                            value: s.clone(),
                            reason,
                        })
                })
                .transpose()?;
            let cached = store.get_from_cache(&company, settings.advanced.cache_expiry_days);
            let best = cached
                .iter()
                .find(|r| source.map_or(true, |s| r.source == s))
                .ok_or_else(|| {
                    LogoError::not_found(format!(
                        "No cached logo for {}; run a search first",
                        company
                    ))
                })?;
            store.add_to_favorites(best)?;
            println!("⭐ Added {} ({} {}) to favorites", company, best.source, best.format);
        }
        FavoritesCommand::Remove { company } => {
            if store.remove_from_favorites(&company)? {
                println!("Removed {} from favorites", company);
            } else {
                return Err(LogoError::not_found(format!("{} is not a favorite", company)));
            }
        }
        FavoritesCommand::Export {
            company,
            output,
            name,
        } => {
            let favorite = store
                .get_favorite(&company)
                .ok_or_else(|| LogoError::not_found(format!("{} is not a favorite", company)))?;
            let output_dir = output
                .unwrap_or_else(|| PathBuf::from(&settings.general.output_directory));
            let saved = save_result(
                &output_dir,
                &favorite.into_result(),
                name.as_deref(),
                false,
                false,
            )
            .await?;
            println!(
                "📁 Exported {} to {}",
                company,
                saved.file_path.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn history(data_dir: PathBuf, limit: usize, export: Option<PathBuf>, clear: bool) -> Result<()> {
    let mut store = LogoStore::open(&data_dir)?;

    if clear {
        store.clear_history()?;
        println!("🗑️ Search history cleared");
        return Ok(());
    }
    if let Some(path) = export {
        let rows = store.export_history_csv(&path)?;
        println!("📁 Exported {} history row(s) to {}", rows, path.display());
        return Ok(());
    }

    let history = store.get_history(limit);
    if history.is_empty() {
        println!("No searches yet");
    }
    for entry in history {
        println!(
            "{}  {:<30} {} result(s)",
            entry.searched_at.format("%Y-%m-%d %H:%M"),
            entry.company_name,
            entry.results_count
        );
    }
    Ok(())
}

fn config_command(path: PathBuf, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let settings = Settings::load_or_default(&path)?;
            print!("{}", settings.to_toml_string()?);
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init => {
            if path.exists() {
                println!("Settings already exist at {}", path.display());
            } else {
                Settings::default().save(&path)?;
                println!("📝 Wrote default settings to {}", path.display());
            }
        }
    }
    Ok(())
}
