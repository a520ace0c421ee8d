//! Image files and per-file conversion outcomes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Extension given to converted files
pub const WEBP_EXTENSION: &str = "webp";

/// A source image discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFile {
    /// Path to the image
    pub path: PathBuf,

    /// Lowercased extension without the dot
    pub extension: String,

    /// Size in bytes at discovery time
    pub size_bytes: u64,
}

impl ImageFile {
    /// Build an image record from a path, reading its size from the filesystem
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to stat image: {}", path.display()))?;

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path,
            extension,
            size_bytes: metadata.len(),
        })
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// Where the converted copy of this image lives
    pub fn target_path(&self) -> PathBuf {
        webp_target(&self.path)
    }
}

/// Same path with the extension swapped for `.webp`
pub fn webp_target(path: &Path) -> PathBuf {
    path.with_extension(WEBP_EXTENSION)
}

/// Result of processing one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Encoder succeeded
    Converted {
        original_bytes: u64,
        converted_bytes: u64,
    },

    /// Target already existed, encoder not invoked
    Skipped,

    /// Encoder failed, timed out, or could not be launched
    Failed { reason: String },
}

impl ConversionStatus {
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    /// Percent saved for a converted file
    pub fn reduction_percent(&self) -> Option<f64> {
        match self {
            Self::Converted {
                original_bytes,
                converted_bytes,
            } => Some(reduction_percent(*original_bytes, *converted_bytes)),
            _ => None,
        }
    }
}

/// Percentage by which `converted` is smaller than `original`.
///
/// Zero-byte originals report 0%.
pub fn reduction_percent(original: u64, converted: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - converted as f64) * 100.0 / original as f64
}

/// An image paired with what happened to it
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    pub image: ImageFile,
    pub target: PathBuf,
    pub status: ConversionStatus,
}
