//! Asset materialization: cache the remote audio file locally, then stage it
//! into the archive output directory.
//!
//! The cache is write-once and content-addressed by the asset URL's path. A
//! download lands in a uniquely named `.tmp` sibling first and is renamed
//! into place only after the body is fully written, so the canonical cache
//! path never holds a partial file; a crash mid-download leaves only the
//! temp file behind. Concurrent downloads of the same asset each write their
//! own temp file, and the renames replace one complete copy with another.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::pipeline::records::StagingDescriptor;

/// What became of one record's asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Asset cached (or already present) and copied into the output dir.
    Completed,
    /// Asset storage answered 403: the file is gone upstream. The record is
    /// dropped from the rest of the pipeline without failing it.
    AssetForbidden,
}

pub struct Materializer {
    client: reqwest::Client,
}

impl Materializer {
    pub fn new(timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create asset HTTP client")?;
        Ok(Self { client })
    }

    /// Ensure the output directory and cached asset exist, then copy the
    /// asset into the output location under its archive base name.
    pub async fn materialize(&self, staging: &StagingDescriptor) -> Result<MaterializeOutcome> {
        fs::create_dir_all(&staging.output_dir)
            .await
            .with_context(|| {
                format!("Failed to create output directory {:?}", staging.output_dir)
            })?;

        if !self.ensure_cached_asset(staging).await? {
            return Ok(MaterializeOutcome::AssetForbidden);
        }

        self.copy_into_output(staging).await?;
        Ok(MaterializeOutcome::Completed)
    }

    /// Download the asset into the cache unless a copy is already there.
    /// Returns false when asset storage refuses with a 403.
    async fn ensure_cached_asset(&self, staging: &StagingDescriptor) -> Result<bool> {
        let cached = fs::try_exists(&staging.cache_file)
            .await
            .with_context(|| format!("Failed to probe cache file {:?}", staging.cache_file))?;
        if cached {
            debug!(
                cache_file = %staging.cache_file.display(),
                url = %staging.asset_url,
                "Cached file exists"
            );
            return Ok(true);
        }

        if let Some(parent) = staging.cache_file.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
        }

        debug!(
            url = %staging.asset_url,
            cache_file = %staging.cache_file.display(),
            "Downloading asset"
        );

        let response = self
            .client
            .get(&staging.asset_url)
            .send()
            .await
            .with_context(|| format!("Failed to connect for {}", staging.asset_url))?;

        let status = response.status();
        if status.as_u16() == 403 {
            warn!(url = %staging.asset_url, "Asset forbidden, skipping record");
            return Ok(false);
        }
        if !status.is_success() {
            bail!("Download of {} failed with status {}", staging.asset_url, status);
        }

        // Stream to a temp sibling, rename into place once fully written.
        let tmp_file = tmp_path(&staging.cache_file);
        let mut file = fs::File::create(&tmp_file)
            .await
            .with_context(|| format!("Failed to create temp file {:?}", tmp_file))?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.with_context(|| {
                format!("Failed reading download body from {}", staging.asset_url)
            })?;
            file.write_all(&chunk).await.context("Failed to write to temp file")?;
        }
        file.flush().await.context("Failed to flush temp file")?;
        drop(file);

        fs::rename(&tmp_file, &staging.cache_file)
            .await
            .with_context(|| {
                format!("Failed to move {:?} into cache as {:?}", tmp_file, staging.cache_file)
            })?;

        Ok(true)
    }

    /// Copy the cached asset to `output_dir/base_name.ext`, keeping the
    /// cache file's extension.
    async fn copy_into_output(&self, staging: &StagingDescriptor) -> Result<()> {
        let output_path = output_asset_path(staging);
        fs::copy(&staging.cache_file, &output_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to copy {:?} to {:?}",
                    staging.cache_file, output_path
                )
            })?;
        Ok(())
    }
}

/// The staged asset's final path: archive base name plus the cache file's
/// original extension.
pub fn output_asset_path(staging: &StagingDescriptor) -> PathBuf {
    let mut name = staging.base_name.clone();
    if let Some(ext) = staging.cache_file.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    staging.output_dir.join(name)
}

/// A temp sibling of the cache file, unique per download so that concurrent
/// downloads of the same asset never share a temp path.
fn tmp_path(cache_file: &std::path::Path) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let mut os_string = cache_file.as_os_str().to_os_string();
    os_string.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    PathBuf::from(os_string)
}
