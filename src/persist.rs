//! Cover image downloads.

use crate::config::AssetConfig;
use crate::error::PersistError;
use crate::utils::{image_filename, seconds};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

/// Bytes handed to each file write
pub const CHUNK_SIZE: usize = 1024;

/// What happened to one image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// No image reference; nothing was touched
    Skipped,
    Saved { path: PathBuf, bytes: u64 },
}

/// Downloads images into a single output directory, named by URL
pub struct AssetPersister {
    client: reqwest::Client,
    output_dir: PathBuf,
}

impl AssetPersister {
    pub fn new(config: &AssetConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(seconds(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            output_dir: PathBuf::from(&config.output_dir),
        })
    }

    /// Write into `name` under the configured directory instead
    pub fn with_subdir(mut self, name: &str) -> Self {
        self.output_dir = self.output_dir.join(name);
        self
    }

    /// Create the output directory if needed
    pub async fn ensure_dir(&self) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| PersistError::CreateDir {
                path: self.output_dir.clone(),
                source,
            })
    }

    /// Download `image_url` into the output directory.
    ///
    /// Files are named by the URL's last path segment without its query, so
    /// two URLs with the same name overwrite each other. The body lands in a
    /// temporary sibling first and only replaces the target once complete.
    pub async fn persist(&self, image_url: Option<&str>) -> Result<PersistOutcome, PersistError> {
        let Some(url) = image_url else {
            return Ok(PersistOutcome::Skipped);
        };

        self.ensure_dir().await?;

        let name = image_filename(url).ok_or_else(|| PersistError::InvalidName(url.to_string()))?;
        let path = self.output_dir.join(name);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| PersistError::Request {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(PersistError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let partial = partial_path(&path);
        let bytes = match stream_to(&mut response, url, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                discard(&partial).await;
                return Err(e);
            }
        };

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            ::log::warn!("Overwriting existing image {}", path.display());
        }
        if let Err(source) = tokio::fs::rename(&partial, &path).await {
            discard(&partial).await;
            return Err(PersistError::Write { path, source });
        }

        ::log::info!("Image saved: {} ({} bytes)", path.display(), bytes);
        Ok(PersistOutcome::Saved { path, bytes })
    }
}

/// Sibling file the body is streamed into before it replaces the target.
///
/// Unique per process and call, so concurrent downloads of the same name never
/// share a file.
fn partial_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = NEXT.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}-{}.part", name, std::process::id(), id))
}

async fn stream_to(
    response: &mut reqwest::Response,
    url: &str,
    partial: &Path,
) -> Result<u64, PersistError> {
    let write_err = |source: std::io::Error| PersistError::Write {
        path: partial.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(partial).await.map_err(write_err)?;
    let mut bytes = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| PersistError::Request {
            url: url.to_string(),
            source,
        })?
    {
        for piece in chunk.chunks(CHUNK_SIZE) {
            file.write_all(piece).await.map_err(write_err)?;
            bytes += piece.len() as u64;
        }
    }
    file.flush().await.map_err(write_err)?;
    Ok(bytes)
}

async fn discard(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            ::log::warn!("Could not remove partial download {}: {}", partial.display(), e);
        }
    }
}
