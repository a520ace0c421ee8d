//! Batch thumbnail generation.
//!
//! Every image under a deck's source tree gets a WebP and a JPEG thumbnail at
//! the same relative path under the deck's output tree. Thumbnails are always
//! regenerated. Per-file failures are recorded and never stop the batch.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::{info, instrument, warn};

use super::converter::{discard_partial, to_mb, RULE_WIDTH};
use crate::adapters::Thumbnailer;
use crate::domain::{
    reduction_percent, ImageFile, ThumbnailDeck, ThumbnailFormat, ThumbnailOutcome,
    ThumbnailSize, ThumbnailStatus,
};

const BYTES_PER_KB: f64 = 1024.0;

/// Where the thumbnail of `image` lands for `format`, mirroring its place
/// under `deck.source` into `deck.output`
pub fn thumbnail_path(deck: &ThumbnailDeck, image: &Path, format: ThumbnailFormat) -> PathBuf {
    let relative = image.strip_prefix(&deck.source).unwrap_or(image);
    deck.output
        .join(relative)
        .with_extension(format.extension())
}

/// Running totals for one or more decks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThumbnailSummary {
    pub total: usize,
    pub generated: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub webp_bytes: u64,
    pub jpeg_bytes: u64,
}

impl ThumbnailSummary {
    pub fn record(&mut self, status: &ThumbnailStatus) {
        self.total += 1;
        match status {
            ThumbnailStatus::Generated {
                original_bytes,
                webp_bytes,
                jpeg_bytes,
            } => {
                self.generated += 1;
                self.original_bytes += original_bytes;
                self.webp_bytes += webp_bytes;
                self.jpeg_bytes += jpeg_bytes;
            }
            ThumbnailStatus::Failed { .. } => self.failed += 1,
        }
    }

    /// Fold another deck's totals into this one
    pub fn merge(&mut self, other: &ThumbnailSummary) {
        self.total += other.total;
        self.generated += other.generated;
        self.failed += other.failed;
        self.original_bytes += other.original_bytes;
        self.webp_bytes += other.webp_bytes;
        self.jpeg_bytes += other.jpeg_bytes;
    }

    /// WebP reduction over generated thumbnails (0 when nothing was generated)
    pub fn average_reduction_percent(&self) -> f64 {
        reduction_percent(self.original_bytes, self.webp_bytes)
    }

    /// Two-line summary printed after each deck
    pub fn render_deck(&self, name: &str, elapsed: Duration) -> String {
        format!(
            "✓ {}: {}/{} processed in {:.1}s\n  Reduction: {:.1}MB → {:.1}MB ({:.1}%)",
            name,
            self.generated,
            self.total,
            elapsed.as_secs_f64(),
            to_mb(self.original_bytes as f64),
            to_mb(self.webp_bytes as f64),
            self.average_reduction_percent()
        )
    }

    /// Summary block printed after all decks
    pub fn render(&self, elapsed: Duration) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "📊 Global Summary");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "✓ Successful: {}", self.generated);
        let _ = writeln!(out, "✗ Failed: {}", self.failed);
        let _ = writeln!(out, "⏱  Total Duration: {:.1}s", elapsed.as_secs_f64());
        let _ = writeln!(out, "💾 Original size: {:.1}MB", to_mb(self.original_bytes as f64));
        let _ = writeln!(out, "💾 WebP size: {:.1}MB", to_mb(self.webp_bytes as f64));
        let _ = writeln!(out, "💾 JPEG size: {:.1}MB", to_mb(self.jpeg_bytes as f64));
        let _ = writeln!(out, "📉 Average reduction: {:.1}%", self.average_reduction_percent());
        let _ = write!(out, "{}", rule);

        out
    }
}

/// Progress lines for one processed image
pub fn format_thumbnail(index: usize, total: usize, outcome: &ThumbnailOutcome) -> String {
    let header = format!("[{}/{}] Processing: {}", index, total, outcome.relative.display());
    match &outcome.status {
        ThumbnailStatus::Generated {
            original_bytes,
            webp_bytes,
            jpeg_bytes,
        } => format!(
            "{}\n  ✓ WebP: {:.1}KB | JPEG: {:.1}KB | Reduction: {:.1}%",
            header,
            *webp_bytes as f64 / BYTES_PER_KB,
            *jpeg_bytes as f64 / BYTES_PER_KB,
            reduction_percent(*original_bytes, *webp_bytes)
        ),
        ThumbnailStatus::Failed { reason } => format!("{}\n  ✗ Error: {}", header, reason),
    }
}

/// Sequential thumbnail generator
pub struct ThumbnailGenerator {
    tool: Arc<dyn Thumbnailer>,
    size: ThumbnailSize,
    webp_quality: u8,
    jpeg_quality: u8,
    timeout: Duration,
}

impl ThumbnailGenerator {
    pub fn new(tool: Arc<dyn Thumbnailer>, size: ThumbnailSize, timeout: Duration) -> Self {
        Self {
            tool,
            size,
            webp_quality: 80,
            jpeg_quality: 80,
            timeout,
        }
    }

    pub fn with_quality(mut self, webp_quality: u8, jpeg_quality: u8) -> Self {
        self.webp_quality = webp_quality;
        self.jpeg_quality = jpeg_quality;
        self
    }

    fn quality(&self, format: ThumbnailFormat) -> u8 {
        match format {
            ThumbnailFormat::Webp => self.webp_quality,
            ThumbnailFormat::Jpeg => self.jpeg_quality,
        }
    }

    /// Generate both thumbnails for one image; the outcome carries the status
    pub async fn generate_one(&self, deck: &ThumbnailDeck, image: &ImageFile) -> ThumbnailOutcome {
        let relative = image
            .path
            .strip_prefix(&deck.source)
            .unwrap_or(&image.path)
            .to_path_buf();

        let status = match self.generate(deck, image).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Error generating thumbnails for {}: {:#}", image.path.display(), e);
                ThumbnailStatus::Failed {
                    reason: format!("{:#}", e),
                }
            }
        };

        ThumbnailOutcome {
            image: image.clone(),
            relative,
            status,
        }
    }

    async fn generate(&self, deck: &ThumbnailDeck, image: &ImageFile) -> Result<ThumbnailStatus> {
        let mut sizes = [0u64; 2];

        for (slot, format) in ThumbnailFormat::ALL.into_iter().enumerate() {
            let output = thumbnail_path(deck, &image.path, format);
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }

            if let Err(e) = self
                .tool
                .thumbnail(&image.path, &output, self.size, self.quality(format), self.timeout)
                .await
            {
                discard_partial(&output).await;
                return Err(e).with_context(|| {
                    format!("Failed to generate {} thumbnail", format.extension())
                });
            }

            sizes[slot] = fs::metadata(&output)
                .await
                .with_context(|| format!("Tool produced no output at {}", output.display()))?
                .len();
        }

        let original_bytes = fs::metadata(&image.path)
            .await
            .with_context(|| format!("Failed to stat {}", image.path.display()))?
            .len();

        Ok(ThumbnailStatus::Generated {
            original_bytes,
            webp_bytes: sizes[0],
            jpeg_bytes: sizes[1],
        })
    }

    /// Process every image of one deck in order, reporting each outcome through
    /// `on_outcome` as `(1-based index, total, outcome)`.
    #[instrument(skip_all, fields(deck = %deck.name, tool = self.tool.name(), count = images.len()))]
    pub async fn run<F>(
        &self,
        deck: &ThumbnailDeck,
        images: &[ImageFile],
        mut on_outcome: F,
    ) -> ThumbnailSummary
    where
        F: FnMut(usize, usize, &ThumbnailOutcome),
    {
        let total = images.len();
        let mut summary = ThumbnailSummary::default();

        for (i, image) in images.iter().enumerate() {
            let outcome = self.generate_one(deck, image).await;
            summary.record(&outcome.status);
            on_outcome(i + 1, total, &outcome);
        }

        info!(
            generated = summary.generated,
            failed = summary.failed,
            "Thumbnail batch finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck() -> ThumbnailDeck {
        ThumbnailDeck {
            name: "Rider-Waite".to_string(),
            source: PathBuf::from("decks/images"),
            output: PathBuf::from("decks/images-thumbnails"),
        }
    }

    #[test]
    fn test_thumbnail_path_mirrors_source_tree() {
        let deck = deck();
        let image = Path::new("decks/images/minor_arcana/cups/ace.png");
        assert_eq!(
            thumbnail_path(&deck, image, ThumbnailFormat::Webp),
            PathBuf::from("decks/images-thumbnails/minor_arcana/cups/ace.webp")
        );
        assert_eq!(
            thumbnail_path(&deck, image, ThumbnailFormat::Jpeg),
            PathBuf::from("decks/images-thumbnails/minor_arcana/cups/ace.jpg")
        );
    }

    #[test]
    fn test_summary_record_and_merge() {
        let mut first = ThumbnailSummary::default();
        first.record(&ThumbnailStatus::Generated {
            original_bytes: 1000,
            webp_bytes: 100,
            jpeg_bytes: 150,
        });
        first.record(&ThumbnailStatus::Failed {
            reason: "boom".to_string(),
        });

        let mut second = ThumbnailSummary::default();
        second.record(&ThumbnailStatus::Generated {
            original_bytes: 3000,
            webp_bytes: 300,
            jpeg_bytes: 450,
        });

        first.merge(&second);
        assert_eq!(first.total, 3);
        assert_eq!(first.generated, 2);
        assert_eq!(first.failed, 1);
        assert_eq!(first.jpeg_bytes, 600);
        assert_eq!(first.average_reduction_percent(), 90.0);
    }

    #[test]
    fn test_empty_summary_has_zero_reduction() {
        let summary = ThumbnailSummary::default();
        assert_eq!(summary.average_reduction_percent(), 0.0);
        assert!(summary.render(Duration::ZERO).contains("📉 Average reduction: 0.0%"));
    }

    #[test]
    fn test_deck_summary_line() {
        let summary = ThumbnailSummary {
            total: 2,
            generated: 2,
            original_bytes: 10 * 1024 * 1024,
            webp_bytes: 1024 * 1024,
            ..Default::default()
        };
        assert_eq!(
            summary.render_deck("Artistic", Duration::from_millis(1500)),
            "✓ Artistic: 2/2 processed in 1.5s\n  Reduction: 10.0MB → 1.0MB (90.0%)"
        );
    }

    #[test]
    fn test_format_lines() {
        let mut outcome = ThumbnailOutcome {
            image: ImageFile {
                path: PathBuf::from("decks/images/fool.png"),
                extension: "png".to_string(),
                size_bytes: 0,
            },
            relative: PathBuf::from("fool.png"),
            status: ThumbnailStatus::Generated {
                original_bytes: 100 * 1024,
                webp_bytes: 10 * 1024,
                jpeg_bytes: 15 * 1024,
            },
        };
        assert_eq!(
            format_thumbnail(1, 78, &outcome),
            "[1/78] Processing: fool.png\n  ✓ WebP: 10.0KB | JPEG: 15.0KB | Reduction: 90.0%"
        );

        outcome.status = ThumbnailStatus::Failed {
            reason: "exit 1".to_string(),
        };
        assert_eq!(
            format_thumbnail(2, 78, &outcome),
            "[2/78] Processing: fool.png\n  ✗ Error: exit 1"
        );
    }
}
