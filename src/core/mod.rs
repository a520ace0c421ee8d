//! Core job logic.
//!
//! This module contains:
//! - Converter: batch WebP conversion over a directory tree
//! - Thumbnails: WebP and JPEG thumbnails mirrored into per-deck trees
//! - Downloader: sequential download of the card catalog

pub mod converter;
pub mod downloader;
pub mod thumbnails;

// Re-export commonly used types
pub use converter::{
    discover_images, format_outcome, is_excluded, pending, ConversionSummary, Converter,
    EXCLUDED_SEGMENT,
};
pub use downloader::{
    DownloadFailure, DownloadProgress, DownloadReport, Downloader, DEFAULT_DELAY,
};
pub use thumbnails::{format_thumbnail, thumbnail_path, ThumbnailGenerator, ThumbnailSummary};
