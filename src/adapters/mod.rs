//! Adapter interfaces for external systems.
//!
//! Adapters wrap the things these jobs talk to: image tool binaries
//! (cwebp, ImageMagick) and the remote card archive.

pub mod archive;
pub mod cwebp;
pub mod imagemagick;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::domain::ThumbnailSize;

pub use archive::ArchiveClient;
pub use cwebp::CwebpEncoder;
pub use imagemagick::ImageMagick;

/// Errors from running an encoder
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to spawn encoder '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoder timed out after {0:?}")]
    Timeout(Duration),

    #[error("Encoder exited with code {code}: {stderr}")]
    ExitStatus { code: i32, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from fetching a remote file
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// Converts one image file into another format
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Human-readable encoder name
    fn name(&self) -> &str;

    /// Encode `input` into `output`, giving up after `timeout`
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        quality: u8,
        timeout: Duration,
    ) -> Result<(), EncodeError>;
}

/// Resizes one image into a bounded thumbnail
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    fn name(&self) -> &str;

    /// Check the tool is installed and runnable
    async fn health_check(&self) -> Result<(), EncodeError>;

    /// Resize `input` to fit `size` and write it to `output`; the output
    /// extension selects the format
    async fn thumbnail(
        &self,
        input: &Path,
        output: &Path,
        size: ThumbnailSize,
        quality: u8,
        timeout: Duration,
    ) -> Result<(), EncodeError>;
}

/// Fetches raw bytes from a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Run a prepared tool command to completion within `limit`.
///
/// The child is killed if the deadline passes. A non-zero exit becomes
/// [`EncodeError::ExitStatus`] carrying the trimmed stderr.
pub(crate) async fn run_bounded(
    command: &mut Command,
    binary: &str,
    limit: Duration,
) -> Result<(), EncodeError> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| EncodeError::Spawn {
            binary: binary.to_string(),
            source,
        })?;

    // Dropping the wait future on timeout drops the child, which kills it
    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| EncodeError::Timeout(limit))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EncodeError::ExitStatus {
            code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

/// File name of a binary path, for display
pub(crate) fn binary_name(binary_path: &str) -> &str {
    Path::new(binary_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(binary_path)
}
