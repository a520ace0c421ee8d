//! cwebp adapter for WebP encoding.
//!
//! Spawns `cwebp -q <quality> <input> -o <output>` and waits for it with a
//! deadline. The child is killed if the deadline passes.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{binary_name, run_bounded, EncodeError, Encoder};

/// Default encoder binary name
pub const DEFAULT_BINARY: &str = "cwebp";

/// WebP encoder using the `cwebp` command-line tool
pub struct CwebpEncoder {
    /// Path to the cwebp binary (default: "cwebp")
    binary_path: String,
}

impl Default for CwebpEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CwebpEncoder {
    /// Create an encoder that resolves `cwebp` from PATH
    pub fn new() -> Self {
        Self::with_binary_path(DEFAULT_BINARY)
    }

    /// Create an encoder with a custom binary path
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
impl Encoder for CwebpEncoder {
    fn name(&self) -> &str {
        binary_name(&self.binary_path)
    }

    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        quality: u8,
        limit: Duration,
    ) -> Result<(), EncodeError> {
        debug!(input = %input.display(), quality, "Running cwebp");

        let mut command = Command::new(&self.binary_path);
        command
            .arg("-q")
            .arg(quality.to_string())
            .arg(input)
            .arg("-o")
            .arg(output);

        run_bounded(&mut command, &self.binary_path, limit).await
    }
}
