//! Configuration for tarot asset jobs.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI)
//! 2. Environment variables (TAROT_DECKS_DIR, TAROT_IMAGES_DIR, TAROT_ENCODER,
//!    TAROT_THUMBNAILER)
//! 3. Config file (.tarot/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .tarot/config.yaml
//! - Paths in config file are relative to the project root (parent of .tarot/)
//! - Default project paths (decks/, thumbnail trees) also resolve against the
//!   project root once a file is found

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::archive::DEFAULT_BASE_URL;
use crate::adapters::cwebp::DEFAULT_BINARY;
use crate::adapters::imagemagick::DEFAULT_BINARY as DEFAULT_THUMBNAILER;
use crate::domain::{ThumbnailDeck, ThumbnailSize};

pub const ENV_DECKS_DIR: &str = "TAROT_DECKS_DIR";
pub const ENV_IMAGES_DIR: &str = "TAROT_IMAGES_DIR";
pub const ENV_ENCODER: &str = "TAROT_ENCODER";
pub const ENV_THUMBNAILER: &str = "TAROT_THUMBNAILER";

const CONFIG_DIR: &str = ".tarot";
const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_QUALITY: u8 = 85;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DELAY_MS: u64 = 500;
const DEFAULT_DECKS_DIR: &str = "decks";
const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;
const DEFAULT_THUMBNAIL_TIMEOUT_SECONDS: u64 = 60;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertConfig {
    /// Root of the deck images (relative to project root)
    pub decks_dir: Option<String>,
    pub quality: Option<u8>,
    pub timeout_seconds: Option<u64>,
    pub extensions: Option<Vec<String>>,
    pub encoder: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadConfig {
    /// Destination root for downloaded cards (relative to project root)
    pub images_dir: Option<String>,
    pub base_url: Option<String>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailsConfig {
    /// Replaces the default deck list when set
    pub decks: Option<Vec<ThumbnailDeckConfig>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub webp_quality: Option<u8>,
    pub jpeg_quality: Option<u8>,
    pub timeout_seconds: Option<u64>,
    pub extensions: Option<Vec<String>>,
    pub binary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailDeckConfig {
    pub name: String,
    /// Source tree (relative to project root)
    pub source: String,
    /// Output tree (relative to project root)
    pub output: String,
}

/// Settings for the converter
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSettings {
    pub decks_dir: PathBuf,
    pub quality: u8,
    pub timeout_seconds: u64,
    pub extensions: Vec<String>,
    pub encoder: String,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            decks_dir: PathBuf::from(DEFAULT_DECKS_DIR),
            quality: DEFAULT_QUALITY,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            extensions: default_extensions(),
            encoder: DEFAULT_BINARY.to_string(),
        }
    }
}

impl ConvertSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn normalize_extensions(exts: Vec<String>) -> Vec<String> {
    exts.into_iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect()
}

/// Settings for the thumbnail generator
#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailSettings {
    pub decks: Vec<ThumbnailDeck>,
    pub size: ThumbnailSize,
    pub webp_quality: u8,
    pub jpeg_quality: u8,
    pub timeout_seconds: u64,
    pub extensions: Vec<String>,
    pub binary: String,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            decks: default_thumbnail_decks(Path::new("")),
            size: ThumbnailSize::default(),
            webp_quality: DEFAULT_THUMBNAIL_QUALITY,
            jpeg_quality: DEFAULT_THUMBNAIL_QUALITY,
            timeout_seconds: DEFAULT_THUMBNAIL_TIMEOUT_SECONDS,
            extensions: default_extensions(),
            binary: DEFAULT_THUMBNAILER.to_string(),
        }
    }
}

impl ThumbnailSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// The full-size decks that get thumbnails, rooted at `base`
fn default_thumbnail_decks(base: &Path) -> Vec<ThumbnailDeck> {
    let decks = base.join(DEFAULT_DECKS_DIR);
    vec![
        ThumbnailDeck {
            name: "Rider-Waite".to_string(),
            source: decks.join("images"),
            output: decks.join("images-thumbnails"),
        },
        ThumbnailDeck {
            name: "Artistic".to_string(),
            source: decks.join("artistic-tarot-cards"),
            output: decks.join("artistic-tarot-cards-thumbnails"),
        },
    ]
}

/// Settings for the downloader
#[derive(Debug, Clone, Serialize)]
pub struct DownloadSettings {
    pub images_dir: PathBuf,
    pub base_url: String,
    pub delay_ms: u64,
}

impl DownloadSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Default download destination (~/TarotReading/images)
pub fn default_images_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("TarotReading")
        .join("images")
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            base_url: DEFAULT_BASE_URL.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

/// Resolved configuration with absolute or cwd-relative paths
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedConfig {
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub convert: ConvertSettings,
    pub download: DownloadSettings,
    pub thumbnails: ThumbnailSettings,
}

impl ResolvedConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.convert.quality > 100 {
            anyhow::bail!(
                "Invalid quality {}: must be between 0 and 100",
                self.convert.quality
            );
        }
        if self.convert.timeout_seconds == 0 {
            anyhow::bail!("Encoder timeout must be at least 1 second");
        }
        if self.convert.extensions.is_empty() {
            anyhow::bail!("At least one source extension is required");
        }

        let thumbs = &self.thumbnails;
        for quality in [thumbs.webp_quality, thumbs.jpeg_quality] {
            if quality > 100 {
                anyhow::bail!(
                    "Invalid thumbnail quality {}: must be between 0 and 100",
                    quality
                );
            }
        }
        if thumbs.size.width == 0 || thumbs.size.height == 0 {
            anyhow::bail!("Invalid thumbnail size {}", thumbs.size);
        }
        if thumbs.timeout_seconds == 0 {
            anyhow::bail!("Thumbnail timeout must be at least 1 second");
        }
        if thumbs.extensions.is_empty() {
            anyhow::bail!("At least one thumbnail source extension is required");
        }
        Ok(())
    }
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Project root for a config file: the parent of `.tarot/`
fn project_root(config_path: &Path) -> &Path {
    config_path
        .parent() // .tarot/
        .and_then(|p| p.parent()) // project root
        .unwrap_or(Path::new("."))
}

/// Merge an optional config file and environment lookups over the defaults.
///
/// `env` is injected so resolution can be tested without touching the
/// process environment.
pub fn resolve<F>(file: Option<(PathBuf, ConfigFile)>, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved = ResolvedConfig::default();

    if let Some((config_path, config)) = file {
        let base_dir = project_root(&config_path).to_path_buf();

        let convert = config.convert;
        resolved.convert.decks_dir = match convert.decks_dir {
            Some(ref dir) => resolve_path(&base_dir, dir),
            None => base_dir.join(DEFAULT_DECKS_DIR),
        };
        if let Some(quality) = convert.quality {
            resolved.convert.quality = quality;
        }
        if let Some(secs) = convert.timeout_seconds {
            resolved.convert.timeout_seconds = secs;
        }
        if let Some(exts) = convert.extensions {
            resolved.convert.extensions = normalize_extensions(exts);
        }
        if let Some(encoder) = convert.encoder {
            resolved.convert.encoder = encoder;
        }

        let download = config.download;
        if let Some(ref dir) = download.images_dir {
            resolved.download.images_dir = resolve_path(&base_dir, dir);
        }
        if let Some(url) = download.base_url {
            resolved.download.base_url = url;
        }
        if let Some(delay) = download.delay_ms {
            resolved.download.delay_ms = delay;
        }

        let thumbs = config.thumbnails;
        resolved.thumbnails.decks = match thumbs.decks {
            Some(decks) => decks
                .into_iter()
                .map(|d| ThumbnailDeck {
                    name: d.name,
                    source: resolve_path(&base_dir, &d.source),
                    output: resolve_path(&base_dir, &d.output),
                })
                .collect(),
            None => default_thumbnail_decks(&base_dir),
        };
        if let Some(width) = thumbs.width {
            resolved.thumbnails.size.width = width;
        }
        if let Some(height) = thumbs.height {
            resolved.thumbnails.size.height = height;
        }
        if let Some(quality) = thumbs.webp_quality {
            resolved.thumbnails.webp_quality = quality;
        }
        if let Some(quality) = thumbs.jpeg_quality {
            resolved.thumbnails.jpeg_quality = quality;
        }
        if let Some(secs) = thumbs.timeout_seconds {
            resolved.thumbnails.timeout_seconds = secs;
        }
        if let Some(exts) = thumbs.extensions {
            resolved.thumbnails.extensions = normalize_extensions(exts);
        }
        if let Some(binary) = thumbs.binary {
            resolved.thumbnails.binary = binary;
        }

        resolved.config_file = Some(config_path);
    }

    if let Some(dir) = env(ENV_DECKS_DIR) {
        resolved.convert.decks_dir = PathBuf::from(dir);
    }
    if let Some(dir) = env(ENV_IMAGES_DIR) {
        resolved.download.images_dir = PathBuf::from(dir);
    }
    if let Some(encoder) = env(ENV_ENCODER) {
        resolved.convert.encoder = encoder;
    }
    if let Some(binary) = env(ENV_THUMBNAILER) {
        resolved.thumbnails.binary = binary;
    }

    resolved.validate()?;
    Ok(resolved)
}

/// Load configuration from all sources.
///
/// An explicit path skips discovery and must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().context("Failed to determine current directory")?;
            find_config_file(&cwd)
        }
    };

    let file = match config_path {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    resolve(file, |key| std::env::var(key).ok())
}
