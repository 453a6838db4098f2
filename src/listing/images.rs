//! Concurrent product image download
//!
//! Each row gets its own tokio task. A task retries its download with a
//! per-attempt timeout and a linearly growing pause, and the join of each
//! task is itself bounded. Any failure degrades to [`IMAGE_UNAVAILABLE`];
//! a missing image never fails the row.

use crate::config::ImageConfig;
use crate::ScoutError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Image path written when a download gives up
pub const IMAGE_UNAVAILABLE: &str = "N/A";

const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

/// One row's image
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub url: Option<String>,
    /// File name without extension, unique within the download directory
    pub file_stem: String,
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub directory: PathBuf,
    pub attempt_timeout: Duration,
    pub retries: u32,
    pub join_timeout: Duration,
    /// Pause after the first failed attempt; attempt `n` waits `n` times this
    pub backoff: Duration,
}

impl From<&ImageConfig> for DownloadOptions {
    fn from(config: &ImageConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            retries: config.retries,
            join_timeout: Duration::from_secs(config.join_timeout_secs),
            backoff: Duration::from_secs(1),
        }
    }
}

/// Downloads every requested image
///
/// # Returns
///
/// One entry per request, in request order: the saved file path, or
/// [`IMAGE_UNAVAILABLE`].
pub async fn download_images(
    client: &Client,
    requests: Vec<ImageRequest>,
    options: &DownloadOptions,
) -> Vec<String> {
    let mut paths = vec![IMAGE_UNAVAILABLE.to_string(); requests.len()];

    let handles: Vec<(usize, JoinHandle<Option<PathBuf>>)> = requests
        .into_iter()
        .enumerate()
        .filter_map(|(index, request)| {
            let url = request.url?;
            let file_stem = request.file_stem;
            let client = client.clone();
            let options = options.clone();
            let handle = tokio::spawn(async move {
                download_with_retries(&client, &url, &file_stem, &options).await
            });
            Some((index, handle))
        })
        .collect();

    for (index, mut handle) in handles {
        match tokio::time::timeout(options.join_timeout, &mut handle).await {
            Ok(Ok(Some(path))) => paths[index] = path.display().to_string(),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::warn!("Image task for row {} failed: {}", index, e),
            Err(_) => {
                tracing::warn!("Image task for row {} did not finish in time", index);
                handle.abort();
            }
        }
    }

    paths
}

async fn download_with_retries(
    client: &Client,
    url: &str,
    file_stem: &str,
    options: &DownloadOptions,
) -> Option<PathBuf> {
    let attempts = options.retries.max(1);
    let path = options
        .directory
        .join(format!("{}.{}", file_stem, image_extension(url)));
    let partial = partial_path(&path);

    for attempt in 1..=attempts {
        match tokio::time::timeout(
            options.attempt_timeout,
            download_once(client, url, &options.directory, &partial, &path),
        )
        .await
        {
            Ok(Ok(())) => {
                tracing::debug!("Saved image {} to {}", url, path.display());
                return Some(path);
            }
            Ok(Err(e)) => {
                tracing::debug!("Image attempt {}/{} for {} failed: {}", attempt, attempts, url, e)
            }
            Err(_) => tracing::debug!("Image attempt {}/{} for {} timed out", attempt, attempts, url),
        }

        // An interrupted write leaves its bytes behind
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Removing {} failed: {}", partial.display(), e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(options.backoff * attempt).await;
        }
    }

    tracing::warn!("Giving up on image {} after {} attempts", url, attempts);
    None
}

/// Writes to `partial` and renames, so `path` only ever holds a whole image
async fn download_once(
    client: &Client,
    url: &str,
    directory: &Path,
    partial: &Path,
    path: &Path,
) -> Result<(), ScoutError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    tokio::fs::create_dir_all(directory).await?;
    tokio::fs::write(partial, &bytes).await?;
    tokio::fs::rename(partial, path).await?;

    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Extension taken from the URL path, `jpg` when unknown
fn image_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path()
                .rsplit('/')
                .next()
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
        })
        .filter(|ext| KNOWN_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "jpg".to_string())
}
