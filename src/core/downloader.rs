//! Sequential catalog downloader.
//!
//! Walks the catalog in its fixed order, fetching and writing one card at a
//! time with a short pause after each success. A failed card is logged and
//! the next card is attempted regardless.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::adapters::Fetcher;
use crate::domain::{Catalog, CatalogEntry};

/// Default pause between successful requests
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Progress notifications emitted while downloading
#[derive(Debug)]
pub enum DownloadProgress<'a> {
    /// About to fetch an entry
    Started {
        entry: &'a CatalogEntry,
        path: &'a Path,
    },

    /// Entry fetched and written
    Finished { entry: &'a CatalogEntry, bytes: u64 },

    /// Fetch or write failed; the batch continues
    Failed {
        entry: &'a CatalogEntry,
        url: &'a str,
        error: &'a anyhow::Error,
    },
}

/// A card that could not be downloaded
#[derive(Debug, Clone, Serialize)]
pub struct DownloadFailure {
    pub remote_name: String,
    pub url: String,
    pub error: String,
}

/// Totals for a download batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub bytes_written: u64,
    pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Downloads catalog entries into a destination tree
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    dest: PathBuf,
    delay: Duration,
}

impl Downloader {
    /// Create a downloader writing under `dest`
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            dest: dest.into(),
            delay: DEFAULT_DELAY,
        }
    }

    /// Set the pause after each successful download
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Local path an entry is written to
    pub fn output_path(&self, entry: &CatalogEntry) -> PathBuf {
        self.dest.join(entry.relative_path())
    }

    /// Fetch one entry and write it to disk, returning the byte count
    pub async fn download_one(&self, entry: &CatalogEntry, path: &Path) -> Result<u64> {
        let url = entry.url(&self.base_url);

        let bytes = self
            .fetcher
            .fetch(&url)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Card written");
        Ok(bytes.len() as u64)
    }

    /// Download every catalog entry in order.
    ///
    /// Exactly one attempt is made per entry; failures are collected in the
    /// report and never abort the run.
    #[instrument(skip_all, fields(entries = catalog.len(), dest = %self.dest.display()))]
    pub async fn run<F>(&self, catalog: &Catalog, mut on_progress: F) -> DownloadReport
    where
        F: FnMut(DownloadProgress<'_>),
    {
        let mut report = DownloadReport::default();

        for entry in &catalog.entries {
            let path = self.output_path(entry);
            on_progress(DownloadProgress::Started { entry, path: &path });
            report.attempted += 1;

            match self.download_one(entry, &path).await {
                Ok(bytes) => {
                    report.succeeded += 1;
                    report.bytes_written += bytes;
                    on_progress(DownloadProgress::Finished { entry, bytes });

                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(error) => {
                    let url = entry.url(&self.base_url);
                    warn!("Error downloading {}: {:#}", url, error);
                    on_progress(DownloadProgress::Failed {
                        entry,
                        url: &url,
                        error: &error,
                    });
                    report.failures.push(DownloadFailure {
                        remote_name: entry.remote_name.clone(),
                        url,
                        error: format!("{:#}", error),
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed(),
            "Download batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FetchError;
    use async_trait::async_trait;

    struct StaticFetcher;

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(b"card".to_vec())
        }
    }

    #[test]
    fn test_output_path_mirrors_taxonomy() {
        let downloader = Downloader::new(Arc::new(StaticFetcher), "http://x", "/data/images");
        let catalog = Catalog::rider_waite();

        assert_eq!(
            downloader.output_path(&catalog.entries[0]),
            PathBuf::from("/data/images/major_arcana/00-the-fool.png")
        );
        assert_eq!(
            downloader.output_path(&catalog.entries[77]),
            PathBuf::from("/data/images/minor_arcana/wands/king-of-wands.png")
        );
    }

    #[test]
    fn test_default_delay() {
        let downloader = Downloader::new(Arc::new(StaticFetcher), "http://x", "/tmp");
        assert_eq!(downloader.delay, Duration::from_millis(500));

        let downloader = downloader.with_delay(Duration::ZERO);
        assert!(downloader.delay.is_zero());
    }

    #[tokio::test]
    async fn test_download_one_creates_parent_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let downloader = Downloader::new(Arc::new(StaticFetcher), "http://x", temp.path());
        let entry = &Catalog::rider_waite().entries[30];
        let path = downloader.output_path(entry);

        let bytes = downloader.download_one(entry, &path).await.unwrap();

        assert_eq!(bytes, 4);
        assert_eq!(std::fs::read(&path).unwrap(), b"card");
    }
}
