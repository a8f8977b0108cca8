//! A result sink writing **one JSON document per probe** into a directory.
//!
//! Files are named `<destination-ip>-<unix-millis>.json`. Files are only
//! ever created, never truncated: when two probes of the same address land
//! in the same millisecond, the later one gets a `-<n>` suffix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracr_protocols::payload::TraceroutePayload;

use super::ResultSink;
use crate::error::PublishError;

#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    /// Creates the output directory if needed.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, PublishError> {
        let dir: PathBuf = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_stem(&self, payload: &TraceroutePayload) -> String {
        let millis: u128 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{}-{millis}", sanitize(&payload.dst_ip))
    }

    async fn create_unique(&self, stem: &str) -> Result<(PathBuf, File), PublishError> {
        let mut suffix: u32 = 0;
        loop {
            let name: String = match suffix {
                0 => format!("{stem}.json"),
                n => format!("{stem}-{n}.json"),
            };
            let path: PathBuf = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn submit(&self, payload: &TraceroutePayload) -> Result<(), PublishError> {
        let bytes: Vec<u8> = payload.to_json()?;
        let stem: String = self.file_stem(payload);
        let (path, mut file) = self.create_unique(&stem).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// IPv6 colons are not valid in file names everywhere.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
