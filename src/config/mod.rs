pub mod cli;
pub mod settings;

pub use settings::Settings;

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use crate::domain::model::LogoFormat;
#[cfg(feature = "cli")]
use crate::utils::error::{LogoError, Result};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "logo-downloader")]
#[command(about = "Search, download and post-process company logos")]
#[command(version)]
pub struct CliConfig {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the cache, history and favorites
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Search every enabled source for a company's logo
    Search(SearchArgs),
    /// Post-process a local image file
    Process(ProcessArgs),
    /// Print the dominant colours of a local image
    Colors {
        input: PathBuf,
        #[arg(long, default_value = "5")]
        count: usize,
    },
    /// Manage favorite logos
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Show, export or clear the search history
    History {
        #[arg(long, default_value = "100")]
        limit: usize,
        /// Write the history as CSV to this file
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long)]
        clear: bool,
    },
    /// Manage the result cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    pub company: String,

    #[arg(long)]
    pub max_results: Option<usize>,

    /// Keep querying sources after max-results is reached
    #[arg(long, overrides_with = "no_all_sources")]
    pub all_sources: bool,
    #[arg(long)]
    pub no_all_sources: bool,

    #[arg(long, overrides_with = "no_png")]
    pub png: bool,
    #[arg(long)]
    pub no_png: bool,

    #[arg(long, overrides_with = "no_svg")]
    pub svg: bool,
    #[arg(long)]
    pub no_svg: bool,

    /// Save the best result to the output directory
    #[arg(long)]
    pub save: bool,

    #[arg(long)]
    pub remove_background: bool,

    #[arg(long)]
    pub enhance: bool,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
impl SearchArgs {
    /// Flags given on the command line win over the settings file.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(max) = self.max_results {
            settings.general.max_results = max;
        }
        if self.all_sources {
            settings.general.search_all_sources = true;
        }
        if self.no_all_sources {
            settings.general.search_all_sources = false;
        }
        if self.png {
            settings.general.download_png = true;
        }
        if self.no_png {
            settings.general.download_png = false;
        }
        if self.svg {
            settings.general.download_svg = true;
        }
        if self.no_svg {
            settings.general.download_svg = false;
        }
        if self.save {
            settings.general.auto_save = true;
        }
        if self.remove_background {
            settings.general.remove_background = true;
        }
        if self.enhance {
            settings.general.enhance_logo = true;
        }
        if let Some(output) = &self.output {
            settings.general.output_directory = output.display().to_string();
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct ProcessArgs {
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long)]
    pub remove_background: bool,

    #[arg(long)]
    pub enhance: bool,

    /// Target size as WIDTHxHEIGHT
    #[arg(long)]
    pub resize: Option<String>,

    /// Resize to exactly the given size instead of fitting inside it
    #[arg(long)]
    pub exact: bool,

    /// png, jpg, webp or ico (defaults to the output file extension)
    #[arg(long)]
    pub format: Option<String>,
}

#[cfg(feature = "cli")]
impl ProcessArgs {
    /// `--resize` parsed as `(width, height)`.
    pub fn target_size(&self) -> Result<Option<(u32, u32)>> {
        let Some(raw) = self.resize.as_deref() else {
            return Ok(None);
        };
        let invalid = || LogoError::InvalidConfigValueError {
            field: "resize".to_string(),
            value: raw.to_string(),
            reason: "expected WIDTHxHEIGHT, e.g. 256x256".to_string(),
        };
        let (width, height) = raw.to_lowercase().split_once('x').ok_or_else(invalid).and_then(
            |(w, h)| match (w.trim().parse::<u32>(), h.trim().parse::<u32>()) {
                (Ok(w), Ok(h)) => Ok((w, h)),
                _ => Err(invalid()),
            },
        )?;
        Ok(Some((width, height)))
    }

    /// `--format`, else the output file extension, else PNG.
    pub fn target_format(&self) -> Result<LogoFormat> {
        match &self.format {
            Some(format) => format.parse().map_err(|reason| LogoError::InvalidConfigValueError {
                field: "format".to_string(),
                value: format.clone(),
                reason,
            }),
            None => Ok(self
                .output
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| ext.parse().ok())
                .unwrap_or(LogoFormat::Png)),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum FavoritesCommand {
    List,
    /// Add the best cached result for a company
    Add {
        company: String,
        /// Pick the cached result from this source
        #[arg(long)]
        source: Option<String>,
    },
    Remove {
        company: String,
    },
    /// Write a favorite to disk
    Export {
        company: String,
        #[arg(long)]
        output: Option<PathBuf>,
        /// File name; defaults to `<company>_logo.<ext>`
        #[arg(long)]
        name: Option<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum CacheCommand {
    Clear {
        /// Only drop entries older than this many days
        #[arg(long)]
        older_than: Option<i64>,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    Show,
    Path,
    /// Write the default settings file if none exists
    Init,
}
