use crate::utils::error::{LogoError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub advanced: AdvancedSettings,
    pub api_keys: ApiKeys,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    pub output_directory: String,
    pub max_results: usize,
    pub search_all_sources: bool,
    pub download_png: bool,
    pub download_svg: bool,
    pub remove_background: bool,
    pub enhance_logo: bool,
    pub auto_save: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        let output_directory = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Logos");

        Self {
            output_directory: output_directory.display().to_string(),
            max_results: 10,
            search_all_sources: true,
            download_png: true,
            download_svg: true,
            remove_background: false,
            enhance_logo: false,
            auto_save: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub max_retries: u32,
    pub concurrent_searches: usize,
    pub cache_expiry_days: i64,
    pub proxy_enabled: bool,
    pub proxy_url: String,
    pub user_agent_rotation: bool,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            timeout: 15,
            max_retries: 3,
            concurrent_searches: 3,
            cache_expiry_days: 30,
            proxy_enabled: false,
            proxy_url: String::new(),
            user_agent_rotation: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiKeys {
    pub google_api_key: String,
    pub google_cx: String,
    pub bing_api_key: String,
    pub brandfetch_api_key: String,
}

impl ApiKeys {
    /// Blank out keys still holding a `${VAR}` placeholder so the sources
    /// treat them as not configured.
    fn clear_unresolved(&mut self) {
        for (name, value) in [
            ("google_api_key", &mut self.google_api_key),
            ("google_cx", &mut self.google_cx),
            ("bing_api_key", &mut self.bing_api_key),
            ("brandfetch_api_key", &mut self.brandfetch_api_key),
        ] {
            if value.contains("${") {
                tracing::warn!("⚠️ api_keys.{} refers to an unset variable: {}", name, value);
                value.clear();
            }
        }
    }
}

/// Base URLs of the logo services. Overridable so the whole search can run
/// against a mirror or a local mock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub clearbit: String,
    pub simple_icons: String,
    pub brandfetch: String,
    pub wikipedia: String,
    pub google: String,
    pub bing: String,
    pub duckduckgo: String,
    /// Scheme used when a company domain is fetched directly.
    pub website_scheme: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            clearbit: "https://logo.clearbit.com".to_string(),
            simple_icons: "https://cdn.jsdelivr.net/npm/simple-icons@v9/icons".to_string(),
            brandfetch: "https://api.brandfetch.io/v2".to_string(),
            wikipedia: "https://en.wikipedia.org/w/api.php".to_string(),
            google: "https://www.googleapis.com/customsearch/v1".to_string(),
            bing: "https://api.bing.microsoft.com/v7.0/images/search".to_string(),
            duckduckgo: "https://duckduckgo.com/i.js".to_string(),
            website_scheme: "https".to_string(),
        }
    }
}

impl Settings {
    /// Default location: `<config dir>/logo-downloader/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("logo-downloader")
            .join("config.toml")
    }

    /// Load from a file, falling back to defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LogoError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut settings: Self =
            toml::from_str(&processed_content).map_err(|e| LogoError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        settings.api_keys.clear_unresolved();
        Ok(settings)
    }

    /// Replace `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LogoError::ConfigError {
            message: format!("TOML serialization error: {}", e),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        tracing::info!("💾 Settings saved to {}", path.display());
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("general.output_directory", &self.general.output_directory)?;
        validation::validate_range("general.max_results", self.general.max_results, 1, 100)?;
        validation::validate_range("advanced.timeout", self.advanced.timeout, 1, 300)?;
        validation::validate_range("advanced.max_retries", self.advanced.max_retries, 0, 10)?;
        validation::validate_range(
            "advanced.concurrent_searches",
            self.advanced.concurrent_searches,
            1,
            16,
        )?;
        validation::validate_range(
            "advanced.cache_expiry_days",
            self.advanced.cache_expiry_days,
            0,
            3650,
        )?;

        if self.advanced.proxy_enabled {
            validation::validate_url("advanced.proxy_url", &self.advanced.proxy_url)?;
        }

        // a search engine id is useless without its key
        if !self.api_keys.google_cx.trim().is_empty() {
            validation::validate_non_empty_string(
                "api_keys.google_api_key",
                &self.api_keys.google_api_key,
            )?;
        }

        if !self.general.download_png && !self.general.download_svg {
            return Err(LogoError::validation(
                "Please select at least one output format (PNG or SVG)",
            ));
        }

        let endpoints = [
            ("endpoints.clearbit", &self.endpoints.clearbit),
            ("endpoints.simple_icons", &self.endpoints.simple_icons),
            ("endpoints.brandfetch", &self.endpoints.brandfetch),
            ("endpoints.wikipedia", &self.endpoints.wikipedia),
            ("endpoints.google", &self.endpoints.google),
            ("endpoints.bing", &self.endpoints.bing),
            ("endpoints.duckduckgo", &self.endpoints.duckduckgo),
        ];
        for (field, url) in endpoints {
            validation::validate_url(field, url)?;
        }

        match self.endpoints.website_scheme.as_str() {
            "http" | "https" => Ok(()),
            other => Err(LogoError::InvalidConfigValueError {
                field: "endpoints.website_scheme".to_string(),
                value: other.to_string(),
                reason: "Must be http or https".to_string(),
            }),
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
