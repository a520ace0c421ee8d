//! Command-line interface for tarot-assets.
//!
//! Provides commands for converting deck images to WebP, generating gallery
//! thumbnails, downloading the Rider-Waite catalog, and inspecting the catalog
//! and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{ArchiveClient, CwebpEncoder, ImageMagick, Thumbnailer};
use crate::config::{
    load_config, ConvertSettings, DownloadSettings, ResolvedConfig, ThumbnailSettings,
};
use crate::core::{
    discover_images, format_outcome, format_thumbnail, pending, Converter, DownloadProgress,
    Downloader, ThumbnailGenerator, ThumbnailSummary,
};
use crate::domain::{CardGroup, Catalog};

/// tarot-assets - Image tooling for tarot decks
#[derive(Parser, Debug)]
#[command(name = "tarot-assets")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .tarot/config.yaml in this or a parent directory)
    #[arg(long, global = true, env = "TAROT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert deck images to WebP
    Convert {
        /// Root directory to scan
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// WebP quality (0-100)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: Option<u8>,

        /// Per-file encoder timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,

        /// Encoder binary
        #[arg(long)]
        encoder: Option<String>,

        /// List what would be converted without running the encoder
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate WebP and JPEG gallery thumbnails for each configured deck
    Thumbnails {
        /// ImageMagick binary
        #[arg(long)]
        binary: Option<String>,

        /// Per-file timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,
    },

    /// Download the Rider-Waite card images
    Download {
        /// Destination root directory
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Archive base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Pause after each successful download, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// List catalog entries
    Catalog {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Convert {
                dir,
                quality,
                timeout_secs,
                encoder,
                dry_run,
            } => {
                let mut settings = config.convert;
                if let Some(dir) = dir {
                    settings.decks_dir = dir;
                }
                if let Some(quality) = quality {
                    settings.quality = quality;
                }
                if let Some(secs) = timeout_secs {
                    settings.timeout_seconds = secs;
                }
                if let Some(encoder) = encoder {
                    settings.encoder = encoder;
                }

                run_convert(settings, dry_run).await
            }
            Commands::Thumbnails {
                binary,
                timeout_secs,
            } => {
                let mut settings = config.thumbnails;
                if let Some(binary) = binary {
                    settings.binary = binary;
                }
                if let Some(secs) = timeout_secs {
                    settings.timeout_seconds = secs;
                }

                run_thumbnails(settings).await
            }
            Commands::Download {
                dest,
                base_url,
                delay_ms,
            } => {
                let mut settings = config.download;
                if let Some(dest) = dest {
                    settings.images_dir = dest;
                }
                if let Some(url) = base_url {
                    settings.base_url = url;
                }
                if let Some(delay) = delay_ms {
                    settings.delay_ms = delay;
                }

                run_download(settings).await
            }
            Commands::Catalog { json } => show_catalog(json),
            Commands::Config => show_config(&config),
        }
    }
}

/// Convert every image under the configured root
async fn run_convert(settings: ConvertSettings, dry_run: bool) -> Result<()> {
    let images = discover_images(&settings.decks_dir, &settings.extensions)?;
    let total = images.len();

    println!("Found {} images to process", total);
    println!("{}", "=".repeat(60));

    if dry_run {
        let todo = pending(&images);
        for (image, target) in &todo {
            println!("  {} → {}", image.path.display(), target.display());
        }
        println!(
            "\n{} would be converted, {} already have a WebP copy",
            todo.len(),
            total - todo.len()
        );
        return Ok(());
    }

    let encoder = Arc::new(CwebpEncoder::with_binary_path(settings.encoder.clone()));
    let converter = Converter::new(encoder, settings.quality, settings.timeout());

    let summary = converter
        .run(&images, |index, total, outcome| {
            println!("{}", format_outcome(index, total, outcome));
        })
        .await;

    println!();
    println!("{}", summary.render());

    // Per-file failures are reported above, not through the exit code
    Ok(())
}

/// Generate thumbnails for every configured deck
async fn run_thumbnails(settings: ThumbnailSettings) -> Result<()> {
    println!("🎴 Tarot Card Thumbnail Generator\n");
    println!("Configuration:");
    println!("  Size: {}px", settings.size);
    println!(
        "  Quality: WebP {}%, JPEG {}%\n",
        settings.webp_quality, settings.jpeg_quality
    );

    let tool = Arc::new(ImageMagick::with_binary_path(settings.binary.clone()));
    tool.health_check().await.with_context(|| {
        format!(
            "ImageMagick not found ('{}'). Install it with `brew install imagemagick` \
             or `sudo apt-get install imagemagick`",
            settings.binary
        )
    })?;

    let generator = ThumbnailGenerator::new(tool, settings.size, settings.timeout())
        .with_quality(settings.webp_quality, settings.jpeg_quality);

    let rule = "=".repeat(60);
    let started = Instant::now();
    let mut overall = ThumbnailSummary::default();

    for deck in &settings.decks {
        println!("{}", rule);
        println!("📦 Processing: {}", deck.name);
        println!("  Source: {}", deck.source.display());
        println!("  Output: {}", deck.output.display());
        println!("{}\n", rule);

        if !deck.source.is_dir() {
            println!("⚠️  Skipping: Directory not found\n");
            continue;
        }

        let images = discover_images(&deck.source, &settings.extensions)?;
        println!("Found {} images\n", images.len());
        if images.is_empty() {
            println!("⚠️  No images found, skipping\n");
            continue;
        }

        let deck_started = Instant::now();
        let summary = generator
            .run(deck, &images, |index, total, outcome| {
                println!("{}", format_thumbnail(index, total, outcome));
            })
            .await;

        println!("\n{}\n", summary.render_deck(&deck.name, deck_started.elapsed()));
        overall.merge(&summary);
    }

    println!("{}", overall.render(started.elapsed()));
    Ok(())
}

/// Download the full catalog into the configured tree
async fn run_download(settings: DownloadSettings) -> Result<()> {
    let catalog = Catalog::rider_waite();
    let minor_count = catalog.len() - catalog.major().count();

    let downloader = Downloader::new(
        Arc::new(ArchiveClient::new()),
        settings.base_url.clone(),
        settings.images_dir.clone(),
    )
    .with_delay(settings.delay());

    let mut current_group: Option<CardGroup> = None;

    let report = downloader
        .run(&catalog, |progress| match progress {
            DownloadProgress::Started { entry, path } => {
                if current_group != Some(entry.group) {
                    match entry.group {
                        CardGroup::Major => {
                            println!(
                                "\n=== Downloading Major Arcana ({} cards) ===",
                                catalog.major().count()
                            );
                        }
                        CardGroup::Minor(suit) => {
                            if !matches!(current_group, Some(CardGroup::Minor(_))) {
                                println!(
                                    "\n=== Downloading Minor Arcana ({} cards) ===",
                                    minor_count
                                );
                            }
                            println!("\n--- {} ---", suit.title());
                        }
                    }
                    current_group = Some(entry.group);
                }
                let name = path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy();
                println!("Downloading: {}", name);
            }
            // Failures are logged by the downloader itself
            DownloadProgress::Finished { .. } | DownloadProgress::Failed { .. } => {}
        })
        .await;

    println!("\n=== Download Complete! ===");
    println!(
        "{} of {} cards downloaded to: {}",
        report.succeeded,
        report.attempted,
        settings.images_dir.display()
    );
    if report.failed() > 0 {
        println!("{} failed:", report.failed());
        for failure in &report.failures {
            println!("  {}", failure.remote_name);
        }
    }

    Ok(())
}

/// Print the catalog
fn show_catalog(json: bool) -> Result<()> {
    let catalog = Catalog::rider_waite();

    if json {
        let out = serde_json::to_string_pretty(&catalog).context("Failed to serialize catalog")?;
        println!("{}", out);
        return Ok(());
    }

    for entry in &catalog.entries {
        println!("{:<36} → {}", entry.remote_name, entry.relative_path().display());
    }
    println!("\n{} entries", catalog.len());
    Ok(())
}

/// Print the resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!();
    println!("Convert:");
    println!("  Decks dir:  {}", config.convert.decks_dir.display());
    println!("  Extensions: {}", config.convert.extensions.join(", "));
    println!("  Quality:    {}", config.convert.quality);
    println!(
        "  Timeout:    {:?}",
        Duration::from_secs(config.convert.timeout_seconds)
    );
    println!("  Encoder:    {}", config.convert.encoder);
    println!();
    println!("Download:");
    println!("  Images dir: {}", config.download.images_dir.display());
    println!("  Base URL:   {}", config.download.base_url);
    println!("  Delay:      {}ms", config.download.delay_ms);
    println!();
    println!("Thumbnails:");
    println!("  Size:       {}", config.thumbnails.size);
    println!(
        "  Quality:    WebP {}, JPEG {}",
        config.thumbnails.webp_quality, config.thumbnails.jpeg_quality
    );
    println!("  Binary:     {}", config.thumbnails.binary);
    for deck in &config.thumbnails.decks {
        println!(
            "  {}: {} → {}",
            deck.name,
            deck.source.display(),
            deck.output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Cli::try_parse_from(["tarot-assets", "convert", "--timeout-secs", "0"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["tarot-assets", "thumbnails", "--timeout-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_flag_parses() {
        let cli = Cli::try_parse_from(["tarot-assets", "convert", "--timeout-secs", "5"]).unwrap();
        match cli.command {
            Commands::Convert { timeout_secs, .. } => assert_eq!(timeout_secs, Some(5)),
            other => panic!("Expected convert, got {:?}", other),
        }
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let result = Cli::try_parse_from(["tarot-assets", "convert", "--quality", "101"]);
        assert!(result.is_err());
    }
}
