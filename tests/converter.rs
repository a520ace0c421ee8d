//! Converter Integration Tests
//!
//! Tests for image discovery, skip-existing behavior, failure handling,
//! and summary totals using an in-process fake encoder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tarot_assets::core::{discover_images, format_outcome, pending, ConversionSummary, Converter};
use tarot_assets::{ConversionStatus, EncodeError, Encoder};
use tempfile::TempDir;

/// Fake encoder that writes a fixed fraction of the input size
struct ShrinkingEncoder {
    /// Output size as a percentage of input size
    percent: u64,
    /// File names that should fail
    failing: Vec<String>,
    /// Inputs the encoder was asked to convert
    calls: Mutex<Vec<PathBuf>>,
}

impl ShrinkingEncoder {
    fn new(percent: u64) -> Self {
        Self {
            percent,
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encoder for ShrinkingEncoder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        _quality: u8,
        _timeout: Duration,
    ) -> Result<(), EncodeError> {
        self.calls.lock().unwrap().push(input.to_path_buf());

        let name = input.file_name().unwrap().to_string_lossy().to_string();
        if self.failing.contains(&name) {
            return Err(EncodeError::ExitStatus {
                code: 1,
                stderr: "unsupported image".to_string(),
            });
        }

        let len = std::fs::metadata(input)?.len();
        std::fs::write(output, vec![0u8; (len * self.percent / 100) as usize])?;
        Ok(())
    }
}

fn write_file(root: &Path, relative: &str, size: usize) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, vec![1u8; size]).unwrap();
    path
}

fn extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn converter(encoder: Arc<ShrinkingEncoder>) -> Converter {
    Converter::new(encoder, 85, Duration::from_secs(30))
}

#[test]
fn test_discovery_finds_extensions_and_skips_thumbnails() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write_file(root, "images/major/00-the-fool.png", 10);
    write_file(root, "images/minor/cups/ace-of-cups.jpg", 10);
    write_file(root, "artistic/star.jpeg", 10);
    write_file(root, "images-thumbnails/00-the-fool.png", 10);
    write_file(root, "images/thumbnails/tower.jpg", 10);
    write_file(root, "images/readme.txt", 10);
    write_file(root, "images/already.webp", 10);

    let images = discover_images(root, &extensions()).unwrap();
    let names: Vec<String> = images.iter().map(|i| i.file_name()).collect();

    // Grouped by extension order: png, jpg, jpeg
    assert_eq!(names, vec!["00-the-fool.png", "ace-of-cups.jpg", "star.jpeg"]);
    assert_eq!(images[0].extension, "png");
    assert_eq!(images[0].size_bytes, 10);
}

#[test]
fn test_discovery_missing_root_is_error() {
    let temp = TempDir::new().unwrap();
    let result = discover_images(&temp.path().join("nope"), &extensions());
    assert!(result.is_err());
}

#[tokio::test]
async fn test_existing_webp_is_skipped_and_not_overwritten() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let source = write_file(root, "card.png", 2048);
    std::fs::write(root.join("card.webp"), b"original webp").unwrap();

    let encoder = Arc::new(ShrinkingEncoder::new(40));
    let images = discover_images(root, &extensions()).unwrap();
    let summary = converter(encoder.clone()).run(&images, |_, _, _| {}).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.converted, 0);
    assert!(encoder.calls().is_empty());
    assert_eq!(std::fs::read(root.join("card.webp")).unwrap(), b"original webp");
    assert!(source.exists());
}

#[tokio::test]
async fn test_card_reduction_example() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "card.png", 100 * 1024);

    let encoder = Arc::new(ShrinkingEncoder::new(40));
    let images = discover_images(temp.path(), &extensions()).unwrap();

    let mut lines = Vec::new();
    let summary = converter(encoder)
        .run(&images, |i, total, outcome| lines.push(format_outcome(i, total, outcome)))
        .await;

    assert_eq!(summary.converted, 1);
    assert_eq!(summary.original_bytes, 100 * 1024);
    assert_eq!(summary.converted_bytes, 40 * 1024);
    assert_eq!(summary.average_reduction_percent(), Some(60.0));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("100KB → 40KB (60.0% smaller)"));
    assert!(temp.path().join("card.webp").exists());
}

#[tokio::test]
async fn test_failures_are_counted_and_batch_continues() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.png", 1000);
    write_file(temp.path(), "b.png", 2000);
    write_file(temp.path(), "c.png", 3000);

    let encoder = Arc::new(ShrinkingEncoder::new(50).failing_on("b.png"));
    let images = discover_images(temp.path(), &extensions()).unwrap();

    let mut statuses = Vec::new();
    let summary = converter(encoder.clone())
        .run(&images, |_, _, outcome| statuses.push(outcome.status.clone()))
        .await;

    assert_eq!(encoder.calls().len(), 3);
    assert_eq!(summary.converted, 2);
    assert_eq!(summary.failed, 1);
    assert!(matches!(statuses[1], ConversionStatus::Failed { .. }));
    assert!(!temp.path().join("b.webp").exists());
}

#[tokio::test]
async fn test_summary_totals_equal_per_file_sums() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "one.png", 4096);
    write_file(temp.path(), "two.jpg", 10_000);
    write_file(temp.path(), "three.jpeg", 777);
    write_file(temp.path(), "skip.png", 500);
    std::fs::write(temp.path().join("skip.webp"), b"x").unwrap();

    let encoder = Arc::new(ShrinkingEncoder::new(30));
    let images = discover_images(temp.path(), &extensions()).unwrap();

    let mut original_sum = 0;
    let mut converted_sum = 0;
    let mut indices = Vec::new();
    let summary = converter(encoder)
        .run(&images, |i, total, outcome| {
            indices.push((i, total));
            if let ConversionStatus::Converted {
                original_bytes,
                converted_bytes,
            } = outcome.status
            {
                original_sum += original_bytes;
                converted_sum += converted_bytes;
            }
        })
        .await;

    assert_eq!(indices, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.converted + summary.skipped + summary.failed, summary.total);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.original_bytes, original_sum);
    assert_eq!(summary.converted_bytes, converted_sum);
    assert_eq!(original_sum, 4096 + 10_000 + 777);
}

#[test]
fn test_empty_summary_renders_counts() {
    let summary = ConversionSummary::default();
    let rendered = summary.render();
    assert!(rendered.contains("WebP Conversion Summary"));
    assert!(rendered.contains("Total files processed:    0"));
    assert!(rendered.contains("Failed:                   0"));
}

/// Fake encoder that writes a truncated file and then gives up
struct TruncatingEncoder {
    calls: Mutex<usize>,
}

#[async_trait]
impl Encoder for TruncatingEncoder {
    fn name(&self) -> &str {
        "truncating"
    }

    async fn encode(
        &self,
        _input: &Path,
        output: &Path,
        _quality: u8,
        timeout: Duration,
    ) -> Result<(), EncodeError> {
        *self.calls.lock().unwrap() += 1;
        std::fs::write(output, b"RIFF")?;
        Err(EncodeError::Timeout(timeout))
    }
}

#[tokio::test]
async fn test_failed_encode_leaves_no_partial_webp() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "card.png", 2048);
    let target = temp.path().join("card.webp");

    let encoder = Arc::new(TruncatingEncoder {
        calls: Mutex::new(0),
    });
    let converter = Converter::new(encoder.clone(), 85, Duration::from_millis(300));
    let images = discover_images(temp.path(), &extensions()).unwrap();

    let first = converter.run(&images, |_, _, _| {}).await;
    assert_eq!(first.failed, 1);
    assert!(!target.exists());

    // A retry runs the encoder again instead of skipping the leftover
    let second = converter.run(&images, |_, _, _| {}).await;
    assert_eq!(second.failed, 1);
    assert_eq!(second.skipped, 0);
    assert_eq!(*encoder.calls.lock().unwrap(), 2);
}

#[test]
fn test_pending_lists_only_images_without_webp() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "done.png", 10);
    std::fs::write(temp.path().join("done.webp"), b"webp").unwrap();
    write_file(temp.path(), "todo.jpg", 10);

    let images = discover_images(temp.path(), &extensions()).unwrap();
    let todo = pending(&images);

    assert_eq!(todo.len(), 1);
    assert_eq!(todo[0].0.file_name(), "todo.jpg");
    assert_eq!(todo[0].1, temp.path().join("todo.webp"));

    // Planning writes nothing
    assert!(!temp.path().join("todo.webp").exists());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 3);
}
