//! Startup: make sure the artifacts are on disk, then load them.
//!
//! The similarity artifact is too large to ship with the catalog, so it may
//! have to be downloaded on first run. Once written it is reused; nothing is
//! re-fetched while the file exists.

use anyhow::{Context, Result};
use data_loader::Artifacts;
use reqwest::Client as HttpClient;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::Config;

/// Errors that can occur while fetching an artifact
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Artifact {path} is missing and no download URL is configured")]
    NoSource { path: String },

    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What `ensure_artifact` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    /// The file was already on disk
    AlreadyPresent,
    /// The file was downloaded
    Downloaded { bytes: u64 },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BootstrapError + '_ {
    move |source| BootstrapError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Sibling path the download is streamed into before the final rename
fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Download `url` to `path` unless `path` already exists.
///
/// The body is streamed to `<path>.part` and renamed into place only after
/// the whole body arrived, so an interrupted download never leaves a file
/// that looks complete.
pub async fn ensure_artifact(
    http_client: &HttpClient,
    path: &Path,
    url: Option<&str>,
) -> Result<Fetched, BootstrapError> {
    let exists = tokio::fs::try_exists(path).await.map_err(io_error(path))?;
    if exists {
        info!("Artifact {} already present, skipping download", path.display());
        return Ok(Fetched::AlreadyPresent);
    }

    let url = url.ok_or_else(|| BootstrapError::NoSource {
        path: path.display().to_string(),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error(parent))?;
    }

    let partial = partial_path(path);
    info!("Downloading {} to {}", url, path.display());
    let start = Instant::now();

    match download(http_client, url, &partial).await {
        Ok(bytes) => {
            tokio::fs::rename(&partial, path).await.map_err(io_error(path))?;
            info!(
                "Downloaded {} bytes to {} in {:.2?}",
                bytes,
                path.display(),
                start.elapsed()
            );
            Ok(Fetched::Downloaded { bytes })
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", partial.display(), cleanup);
                }
            }
            Err(e)
        }
    }
}

async fn download(http_client: &HttpClient, url: &str, target: &Path) -> Result<u64, BootstrapError> {
    let mut response = http_client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(BootstrapError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(target).await.map_err(io_error(target))?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(io_error(target))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_error(target))?;

    Ok(written)
}

/// Fetch anything missing and load both artifacts.
///
/// Any failure here is fatal: the caller should exit rather than run on
/// partial data.
pub async fn load_artifacts(
    catalog_path: &Path,
    similarity_path: &Path,
    similarity_url: Option<&str>,
    timeout: Duration,
) -> Result<Arc<Artifacts>> {
    // No overall timeout on the artifact download, only on connecting.
    let http_client = HttpClient::builder()
        .connect_timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    ensure_artifact(&http_client, similarity_path, similarity_url)
        .await
        .context("Failed to fetch similarity artifact")?;

    let catalog_path = catalog_path.to_path_buf();
    let similarity_path = similarity_path.to_path_buf();
    let artifacts = tokio::task::spawn_blocking(move || {
        Artifacts::load_from_files(&catalog_path, &similarity_path)
    })
    .await
    .context("Artifact loading task panicked")?
    .context("Failed to load artifacts")?;

    Ok(Arc::new(artifacts))
}

/// `load_artifacts` driven by `Config`
pub async fn load_from_config(config: &Config) -> Result<Arc<Artifacts>> {
    load_artifacts(
        &config.catalog_path,
        &config.similarity_path,
        config.similarity_url.as_deref(),
        config.http_timeout(),
    )
    .await
}
