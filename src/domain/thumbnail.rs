//! Thumbnail sizes, formats and per-image outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::image::{reduction_percent, ImageFile};

/// Bounding box a thumbnail is resized to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self {
            width: 300,
            height: 520,
        }
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Output formats written for every thumbnail, WebP first with a JPEG fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    Webp,
    Jpeg,
}

impl ThumbnailFormat {
    pub const ALL: [ThumbnailFormat; 2] = [ThumbnailFormat::Webp, ThumbnailFormat::Jpeg];

    pub fn extension(&self) -> &'static str {
        match self {
            ThumbnailFormat::Webp => "webp",
            ThumbnailFormat::Jpeg => "jpg",
        }
    }
}

/// One deck's source tree and the tree its thumbnails mirror into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailDeck {
    pub name: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThumbnailStatus {
    Generated {
        original_bytes: u64,
        webp_bytes: u64,
        jpeg_bytes: u64,
    },
    Failed { reason: String },
}

impl ThumbnailStatus {
    /// WebP size reduction against the original
    pub fn reduction_percent(&self) -> Option<f64> {
        match self {
            Self::Generated {
                original_bytes,
                webp_bytes,
                ..
            } => Some(reduction_percent(*original_bytes, *webp_bytes)),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailOutcome {
    pub image: ImageFile,

    /// Image path relative to the deck source
    pub relative: PathBuf,

    pub status: ThumbnailStatus,
}
