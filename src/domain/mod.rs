//! Domain types for tarot asset tooling.
//!
//! This module contains the core data structures:
//! - Image: source images and conversion outcomes
//! - Thumbnail: thumbnail sizes, formats and outcomes
//! - Catalog: the static Rider-Waite card catalog

pub mod catalog;
pub mod image;
pub mod thumbnail;

// Re-export commonly used types
pub use catalog::{CardGroup, Catalog, CatalogEntry, Suit, MAJOR_ARCANA, RANKS, SUITS};
pub use image::{
    reduction_percent, webp_target, ConversionOutcome, ConversionStatus, ImageFile,
    WEBP_EXTENSION,
};
pub use thumbnail::{
    ThumbnailDeck, ThumbnailFormat, ThumbnailOutcome, ThumbnailSize, ThumbnailStatus,
};
