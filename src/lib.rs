//! tarot-assets - Image tooling for tarot decks
//!
//! Independent batch jobs over deck images:
//! - Converting PNG/JPEG card art to WebP with an external encoder
//! - Generating small WebP and JPEG gallery thumbnails with ImageMagick
//! - Downloading the 78-card Rider-Waite set from a remote archive
//!
//! All run sequentially and treat per-item failures as data, not errors:
//! a failed card is counted and reported, and the batch moves on.
//!
//! # Modules
//!
//! - `adapters`: External tools and services (cwebp, ImageMagick, archive HTTP)
//! - `core`: Batch jobs (Converter, ThumbnailGenerator, Downloader)
//! - `domain`: Data structures (ImageFile, ThumbnailDeck, Catalog)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Convert ./decks to WebP
//! tarot-assets convert
//!
//! # Regenerate gallery thumbnails
//! tarot-assets thumbnails
//!
//! # Download the Rider-Waite set
//! tarot-assets download --dest ./images
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{
    ArchiveClient, CwebpEncoder, EncodeError, Encoder, FetchError, Fetcher, ImageMagick,
    Thumbnailer,
};
pub use self::core::{
    ConversionSummary, Converter, DownloadReport, Downloader, ThumbnailGenerator,
    ThumbnailSummary,
};
pub use domain::{
    Catalog, CatalogEntry, ConversionOutcome, ConversionStatus, ImageFile, ThumbnailDeck,
    ThumbnailSize, ThumbnailStatus,
};
