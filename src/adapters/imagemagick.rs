//! ImageMagick adapter for thumbnail generation.
//!
//! Spawns `convert <input> -resize <W>x<H> -quality <Q> <output>`. ImageMagick
//! picks the output format from the extension and keeps the aspect ratio
//! inside the bounding box.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{binary_name, run_bounded, EncodeError, Thumbnailer};
use crate::domain::ThumbnailSize;

/// Default ImageMagick binary name
pub const DEFAULT_BINARY: &str = "convert";

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ImageMagick {
    binary_path: String,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageMagick {
    pub fn new() -> Self {
        Self::with_binary_path(DEFAULT_BINARY)
    }

    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &str {
        &self.binary_path
    }
}

#[async_trait]
impl Thumbnailer for ImageMagick {
    fn name(&self) -> &str {
        binary_name(&self.binary_path)
    }

    async fn health_check(&self) -> Result<(), EncodeError> {
        let mut command = Command::new(&self.binary_path);
        command.arg("-version");
        run_bounded(&mut command, &self.binary_path, HEALTH_CHECK_TIMEOUT).await
    }

    async fn thumbnail(
        &self,
        input: &Path,
        output: &Path,
        size: ThumbnailSize,
        quality: u8,
        limit: Duration,
    ) -> Result<(), EncodeError> {
        debug!(input = %input.display(), output = %output.display(), %size, "Running convert");

        let mut command = Command::new(&self.binary_path);
        command
            .arg(input)
            .arg("-resize")
            .arg(size.to_string())
            .arg("-quality")
            .arg(quality.to_string())
            .arg(output);

        run_bounded(&mut command, &self.binary_path, limit).await
    }
}
