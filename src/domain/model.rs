use crate::config::cli::LocalStorage;
use crate::core::processing::ImageProcessor;
use crate::domain::ports::Storage;
use crate::utils::error::{self, LogoError};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Image encodings a logo can arrive in or be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogoFormat {
    Png,
    Svg,
    Jpg,
    Webp,
    Ico,
}

impl LogoFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
            Self::Ico => "ico",
        }
    }

    /// Guess from the path of a URL; query strings are ignored and PNG is the fallback.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        if path.ends_with(".svg") {
            Self::Svg
        } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
            Self::Jpg
        } else if path.ends_with(".webp") {
            Self::Webp
        } else if path.ends_with(".ico") {
            Self::Ico
        } else {
            Self::Png
        }
    }

    /// Sniff the payload. Returns `None` for anything that isn't a known logo encoding.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(Self::Webp);
        }
        if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            return Some(Self::Ico);
        }
        let head = String::from_utf8_lossy(&data[..data.len().min(512)]).to_lowercase();
        let head = head.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
            return Some(Self::Svg);
        }
        None
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg)
    }
}

impl fmt::Display for LogoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl FromStr for LogoFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            "ico" => Ok(Self::Ico),
            other => Err(format!("Unsupported format: {}", other)),
        }
    }
}

/// Where a logo was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum SourceKind {
    SimpleIcons,
    Brandfetch,
    Clearbit,
    Wikipedia,
    CompanyWebsite,
    GoogleSearch,
    BingSearch,
    DuckDuckGo,
    /// Results loaded from disk rather than a search source.
    Local,
}

impl SourceKind {
    pub const SEARCHABLE: [SourceKind; 8] = [
        SourceKind::SimpleIcons,
        SourceKind::Brandfetch,
        SourceKind::Clearbit,
        SourceKind::Wikipedia,
        SourceKind::CompanyWebsite,
        SourceKind::GoogleSearch,
        SourceKind::BingSearch,
        SourceKind::DuckDuckGo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleIcons => "SimpleIcons",
            Self::Brandfetch => "Brandfetch",
            Self::Clearbit => "Clearbit",
            Self::Wikipedia => "Wikipedia",
            Self::CompanyWebsite => "CompanyWebsite",
            Self::GoogleSearch => "GoogleSearch",
            Self::BingSearch => "BingSearch",
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Local => "Local",
        }
    }

    pub fn descriptor(&self) -> SourceDescriptor {
        let (priority, base_quality) = match self {
            Self::SimpleIcons => (5, 80),
            Self::Brandfetch => (10, 90),
            Self::Clearbit => (8, 75),
            Self::Wikipedia => (7, 85),
            Self::CompanyWebsite => (9, 85),
            Self::GoogleSearch => (3, 65),
            Self::BingSearch => (2, 60),
            Self::DuckDuckGo => (1, 60),
            Self::Local => (0, 0),
        };
        SourceDescriptor {
            kind: *self,
            priority,
            base_quality,
            enabled: !matches!(self, Self::Local),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::SEARCHABLE
            .iter()
            .chain(std::iter::once(&Self::Local))
            .find(|kind| kind.name().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown source: {}", s))
    }
}

/// Scheduling and scoring parameters of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    pub priority: u8,
    pub base_quality: i32,
    pub enabled: bool,
}

/// A single candidate logo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoResult {
    pub id: Uuid,
    pub company_name: String,
    #[serde(with = "base64_bytes")]
    pub image_data: Vec<u8>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub source: SourceKind,
    pub format: LogoFormat,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Higher is better.
    pub score: i32,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl LogoResult {
    pub fn new(
        company_name: impl Into<String>,
        source: SourceKind,
        format: LogoFormat,
        image_data: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            image_data,
            image_url: None,
            source,
            format,
            width: None,
            height: None,
            score: 0,
            file_path: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    pub fn has_image(&self) -> bool {
        !self.image_data.is_empty()
    }

    /// `<company lowercased, spaces as underscores>_logo.<ext>`
    pub fn default_file_name(&self) -> String {
        let clean_name = self.company_name.trim().to_lowercase().replace(' ', "_");
        format!("{}_logo.{}", clean_name, self.format.extension())
    }

    /// Write the image bytes to `dir`, under `file_name` or the default name,
    /// and remember where they went.
    pub async fn save_to_file(
        &mut self,
        dir: impl AsRef<Path>,
        file_name: Option<&str>,
    ) -> error::Result<String> {
        if !self.has_image() {
            return Err(LogoError::processing(format!(
                "No image data to save for {} ({})",
                self.company_name, self.source
            )));
        }

        let file_name = match file_name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.default_file_name(),
        };
        let storage = LocalStorage::new(dir.as_ref());
        let path = storage.write_file(&file_name, &self.image_data).await?;
        self.file_path = Some(path.clone());
        Ok(path)
    }

    /// Decode to a raster image; SVG is rasterized.
    pub fn to_image(&self) -> error::Result<DynamicImage> {
        ImageProcessor::decode(self)
    }

    /// Replace the image with `image`, stored as PNG.
    pub fn update_image(&mut self, image: &DynamicImage) -> error::Result<()> {
        ImageProcessor::update_result(self, image)
    }

    pub fn dimensions_label(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "?".to_string(),
        }
    }
}

/// One row of search history; unique per company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub company_name: String,
    pub searched_at: DateTime<Utc>,
    pub results_count: usize,
}

/// A saved logo, unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub company_name: String,
    #[serde(with = "base64_bytes")]
    pub image_data: Vec<u8>,
    pub format: LogoFormat,
    #[serde(default)]
    pub source: Option<SourceKind>,
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    pub fn from_result(result: &LogoResult) -> Self {
        Self {
            company_name: result.company_name.clone(),
            image_data: result.image_data.clone(),
            format: result.format,
            source: Some(result.source),
            added_at: Utc::now(),
        }
    }

    pub fn into_result(self) -> LogoResult {
        LogoResult::new(
            self.company_name,
            self.source.unwrap_or(SourceKind::Local),
            self.format,
            self.image_data,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DominantColor {
    pub hex: String,
    pub count: usize,
}

/// Binary payloads are stored as base64 text inside JSON.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
