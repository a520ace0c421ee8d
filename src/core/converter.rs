//! Batch WebP conversion.
//!
//! Finds raster images under a root directory, skips any that already have a
//! `.webp` sibling, and runs the encoder on the rest one at a time. Per-file
//! failures are recorded and never stop the batch.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glob::Pattern;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::adapters::Encoder;
use crate::domain::{reduction_percent, ConversionOutcome, ConversionStatus, ImageFile};

/// Path segment marker for generated thumbnails, which are never converted
pub const EXCLUDED_SEGMENT: &str = "thumbnails";

const BYTES_PER_KB: u64 = 1024;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
pub(crate) const RULE_WIDTH: usize = 60;

/// Whether any component of `path` below `root` marks it as a thumbnail
pub fn is_excluded(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().contains(EXCLUDED_SEGMENT))
}

/// Find convertible images under `root`.
///
/// Results are grouped by extension in the order given, each group sorted by
/// path. Thumbnail paths are dropped.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover_images(root: &Path, extensions: &[String]) -> Result<Vec<ImageFile>> {
    if !root.is_dir() {
        anyhow::bail!("Image directory does not exist: {}", root.display());
    }

    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let mut images = Vec::new();

    for ext in extensions {
        let ext = ext.trim_start_matches('.');
        let pattern = format!("{}/**/*.{}", escaped_root, Pattern::escape(ext));

        let paths = glob::glob(&pattern)
            .with_context(|| format!("Invalid image glob pattern: {}", pattern))?;

        for entry in paths {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if !path.is_file() || is_excluded(root, &path) {
                continue;
            }

            match ImageFile::from_path(&path) {
                Ok(image) => images.push(image),
                Err(e) => warn!("{:#}", e),
            }
        }
    }

    debug!(count = images.len(), "Discovered images");
    Ok(images)
}

/// Running totals for a conversion batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,

    /// Sum of original sizes of converted files
    pub original_bytes: u64,

    /// Sum of WebP sizes of converted files
    pub converted_bytes: u64,
}

impl ConversionSummary {
    /// Fold one outcome into the totals
    pub fn record(&mut self, status: &ConversionStatus) {
        match status {
            ConversionStatus::Converted {
                original_bytes,
                converted_bytes,
            } => {
                self.converted += 1;
                self.original_bytes += original_bytes;
                self.converted_bytes += converted_bytes;
            }
            ConversionStatus::Skipped => self.skipped += 1,
            ConversionStatus::Failed { .. } => self.failed += 1,
        }
    }

    /// Bytes saved across converted files (negative if WebP came out larger)
    pub fn saved_bytes(&self) -> i64 {
        self.original_bytes as i64 - self.converted_bytes as i64
    }

    /// Overall reduction, or `None` if nothing was converted
    pub fn average_reduction_percent(&self) -> Option<f64> {
        if self.converted == 0 {
            return None;
        }
        Some(reduction_percent(self.original_bytes, self.converted_bytes))
    }

    /// Human-readable summary block
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "WebP Conversion Summary");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Total files processed:    {}", self.total);
        let _ = writeln!(out, "Successfully converted:   {}", self.converted);
        let _ = writeln!(out, "Skipped (already exist):  {}", self.skipped);
        let _ = write!(out, "Failed:                   {}", self.failed);

        if let Some(reduction) = self.average_reduction_percent() {
            let _ = writeln!(out);
            let _ = writeln!(out);
            let _ = writeln!(out, "Total original size:      {:.1} MB", to_mb(self.original_bytes as f64));
            let _ = writeln!(out, "Total WebP size:          {:.1} MB", to_mb(self.converted_bytes as f64));
            let _ = writeln!(out, "Total space saved:        {:.1} MB", to_mb(self.saved_bytes() as f64));
            let _ = write!(out, "Average reduction:        {:.1}%", reduction);
        }

        out
    }
}

pub(crate) fn to_mb(bytes: f64) -> f64 {
    bytes / BYTES_PER_MB
}

/// One progress line (or two, for converted files) for an outcome
pub fn format_outcome(index: usize, total: usize, outcome: &ConversionOutcome) -> String {
    let name = outcome.image.file_name();
    match &outcome.status {
        ConversionStatus::Converted {
            original_bytes,
            converted_bytes,
        } => format!(
            "[{}/{}] ✅ {}\n        {}KB → {}KB ({:.1}% smaller)",
            index,
            total,
            name,
            original_bytes / BYTES_PER_KB,
            converted_bytes / BYTES_PER_KB,
            reduction_percent(*original_bytes, *converted_bytes)
        ),
        ConversionStatus::Skipped => format!("[{}/{}] ⏭️  {} (already exists)", index, total, name),
        ConversionStatus::Failed { .. } => format!("[{}/{}] ❌ {} (failed)", index, total, name),
    }
}

/// Sequential batch converter
pub struct Converter {
    encoder: Arc<dyn Encoder>,
    quality: u8,
    timeout: Duration,
}

impl Converter {
    /// Create a converter with the given encoder and settings
    pub fn new(encoder: Arc<dyn Encoder>, quality: u8, timeout: Duration) -> Self {
        Self {
            encoder,
            quality,
            timeout,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert a single image; never fails, the outcome carries the status
    pub async fn convert_one(&self, image: &ImageFile) -> ConversionOutcome {
        let target = image.target_path();
        let status = self.convert_to(image, &target).await;
        ConversionOutcome {
            image: image.clone(),
            target,
            status,
        }
    }

    async fn convert_to(&self, image: &ImageFile, target: &Path) -> ConversionStatus {
        if target.exists() {
            debug!(target = %target.display(), "WebP already exists, skipping");
            return ConversionStatus::Skipped;
        }

        if let Err(e) = self
            .encoder
            .encode(&image.path, target, self.quality, self.timeout)
            .await
        {
            warn!("Error converting {}: {}", image.path.display(), e);
            discard_partial(target).await;
            return ConversionStatus::Failed {
                reason: e.to_string(),
            };
        }

        match measure(&image.path, target).await {
            Ok((original_bytes, converted_bytes)) => ConversionStatus::Converted {
                original_bytes,
                converted_bytes,
            },
            Err(e) => {
                warn!("Error converting {}: {:#}", image.path.display(), e);
                discard_partial(target).await;
                ConversionStatus::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    /// Convert every image in order, reporting each outcome through `on_outcome`
    /// as `(1-based index, total, outcome)`.
    #[instrument(skip_all, fields(encoder = self.encoder.name(), count = images.len()))]
    pub async fn run<F>(&self, images: &[ImageFile], mut on_outcome: F) -> ConversionSummary
    where
        F: FnMut(usize, usize, &ConversionOutcome),
    {
        let total = images.len();
        let mut summary = ConversionSummary {
            total,
            ..Default::default()
        };

        for (i, image) in images.iter().enumerate() {
            let outcome = self.convert_one(image).await;
            summary.record(&outcome.status);
            on_outcome(i + 1, total, &outcome);
        }

        info!(
            converted = summary.converted,
            skipped = summary.skipped,
            failed = summary.failed,
            "Conversion batch finished"
        );
        summary
    }
}

/// Remove whatever a failed encoder left at `path`.
///
/// Only called after the existence check, so a file that predates this run is
/// never removed. A leftover would otherwise be skipped as done on the next run.
pub(crate) async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

/// Sizes of the original and converted files
async fn measure(original: &Path, converted: &Path) -> Result<(u64, u64)> {
    let original_bytes = fs::metadata(original)
        .await
        .with_context(|| format!("Failed to stat {}", original.display()))?
        .len();
    let converted_bytes = fs::metadata(converted)
        .await
        .with_context(|| format!("Encoder produced no output at {}", converted.display()))?
        .len();
    Ok((original_bytes, converted_bytes))
}

/// Images that still need converting, paired with their target path
pub fn pending(images: &[ImageFile]) -> Vec<(&ImageFile, PathBuf)> {
    images
        .iter()
        .map(|img| (img, img.target_path()))
        .filter(|(_, target)| !target.exists())
        .collect()
}
