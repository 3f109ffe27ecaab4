use super::types::{DownloadOptions, FetchOutcome, ResourceRequest};
use crate::decompress::decompressed_file_name;
use crate::error::DbFetchError;
use crate::manifest::{FetchManifest, LocalFile};
use crate::verification::{ContentDigestHasher, HashIndex};
use eyre::{Result, WrapErr};
use futures::stream::{FuturesUnordered, StreamExt};
use itertools::Itertools;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Where a request ended up on disk.
#[derive(Debug)]
struct Resolved {
    path: PathBuf,
    hash: String,
    downloaded: bool,
}

/// Downloads resources that are not already present with an approved hash.
pub struct Fetcher {
    client: reqwest::Client,
    index: Arc<HashIndex>,
    options: DownloadOptions,
    extracted_dir: Option<PathBuf>,
}

impl Fetcher {
    pub fn new(index: HashIndex, options: DownloadOptions) -> Result<Self, DbFetchError> {
        // Stall timeouts only: a large file may take far longer than
        // `options.timeout` as long as bytes keep arriving.
        let client = reqwest::Client::builder()
            .connect_timeout(options.timeout)
            .read_timeout(options.timeout)
            .user_agent(concat!("dbfetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self {
            client,
            index: Arc::new(index),
            options,
            extracted_dir: None,
        })
    }

    /// Directory holding previously decompressed copies. A valid copy there
    /// satisfies an archive request without downloading it again.
    pub fn with_extracted_dir(mut self, extracted_dir: impl Into<PathBuf>) -> Self {
        self.extracted_dir = Some(extracted_dir.into());
        self
    }

    pub fn index(&self) -> &HashIndex {
        &self.index
    }

    /// Resolves every request to a local file, downloading the ones that are
    /// missing or stale.
    ///
    /// Per-request failures are collected in the outcome; only failing to
    /// create `staging_dir` aborts the run.
    pub async fn fetch(
        &self,
        requests: &[ResourceRequest],
        staging_dir: &Path,
    ) -> Result<FetchOutcome, DbFetchError> {
        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| DbFetchError::DirectoryCreateFailed {
                path: staging_dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut slots: Vec<Option<Result<Resolved, DbFetchError>>> =
            requests.iter().map(|_| None).collect();

        // Requests sharing a file name write the same staging path, so each
        // group runs sequentially in request order.
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        let mut host_limits: HashMap<String, Arc<Semaphore>> = HashMap::new();
        for (idx, request) in requests.iter().enumerate() {
            let target = request
                .parse_url()
                .and_then(|url| request.file_name().map(|name| (host_key(&url), name)));
            match target {
                Ok((host, file_name)) => {
                    host_limits.entry(host).or_insert_with(|| {
                        Arc::new(Semaphore::new(self.options.max_concurrency_per_host.max(1)))
                    });
                    groups.entry(file_name).or_default().push(idx);
                }
                Err(err) => {
                    warn!(url = %request.url(), "Skipping request: {}", err);
                    slots[idx] = Some(Err(DbFetchError::DownloadFailed {
                        url: request.url().to_string(),
                        reason: err.to_string(),
                    }));
                }
            }
        }

        info!(
            requests = requests.len(),
            targets = groups.len(),
            staging = %staging_dir.display(),
            "Resolving resources"
        );

        let download_limit = Semaphore::new(self.options.download_parallelism.max(1));
        let mut futs = FuturesUnordered::new();
        for (file_name, indices) in groups.into_iter().sorted_by_key(|(_, indices)| indices[0]) {
            let download_limit = &download_limit;
            let host_limits = &host_limits;
            futs.push(async move {
                let mut results = Vec::with_capacity(indices.len());
                for idx in indices {
                    let request = &requests[idx];
                    let result = self
                        .resolve(request, &file_name, staging_dir, download_limit, host_limits)
                        .await
                        .map_err(|err| {
                            warn!(url = %request.url(), "Download failed: {:#}", err);
                            DbFetchError::DownloadFailed {
                                url: request.url().to_string(),
                                reason: format!("{:#}", err),
                            }
                        });
                    results.push((idx, result));
                }
                results
            });
        }

        while let Some(results) = futs.next().await {
            for (idx, result) in results {
                slots[idx] = Some(result);
            }
        }

        let mut outcome = FetchOutcome::default();
        let mut manifest = FetchManifest::new();
        for slot in slots.into_iter().flatten() {
            match slot {
                Ok(resolved) => {
                    if resolved.downloaded {
                        outcome.downloaded_count += 1;
                    }
                    manifest.push(LocalFile::with_hash(resolved.path, resolved.hash));
                }
                Err(err) => outcome.errors.push(err),
            }
        }
        outcome.manifest = manifest;

        info!(
            resolved = outcome.manifest.len(),
            downloaded = outcome.downloaded_count,
            failed = outcome.errors.len(),
            "Fetch finished"
        );
        Ok(outcome)
    }

    async fn resolve(
        &self,
        request: &ResourceRequest,
        file_name: &str,
        staging_dir: &Path,
        download_limit: &Semaphore,
        host_limits: &HashMap<String, Arc<Semaphore>>,
    ) -> Result<Resolved> {
        if let Some(extracted) = self.extracted_copy(file_name)
            && let Some(hash) = self.approved_hash(&extracted).await?
        {
            tracing::debug!(url = %request.url(), output = %extracted.display(), "Extracted copy is valid, skipping download");
            return Ok(Resolved {
                path: extracted,
                hash,
                downloaded: false,
            });
        }

        let target = staging_dir.join(file_name);
        if let Some(hash) = self.approved_hash(&target).await? {
            tracing::debug!(url = %request.url(), output = %target.display(), "File exists with approved digest, skipping download");
            return Ok(Resolved {
                path: target,
                hash,
                downloaded: false,
            });
        }

        let url = request.parse_url()?;
        let host_limit = host_limits
            .get(&host_key(&url))
            .ok_or_else(|| eyre::eyre!("No concurrency limit registered for {}", url))?;
        let _permit = download_limit.acquire().await?;
        let _host_permit = host_limit.acquire().await?;

        let hash = self.download_with_retries(request, &target).await?;
        if !self.index.is_empty() && !self.index.contains(&hash) {
            warn!(url = %request.url(), md5 = %hash, "Downloaded file does not match any approved hash");
        }
        Ok(Resolved {
            path: target,
            hash,
            downloaded: true,
        })
    }

    fn extracted_copy(&self, file_name: &str) -> Option<PathBuf> {
        let extracted_dir = self.extracted_dir.as_ref()?;
        decompressed_file_name(Path::new(file_name)).map(|name| extracted_dir.join(name))
    }

    async fn approved_hash(&self, path: &Path) -> Result<Option<String>> {
        let index = self.index.clone();
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || index.approved_hash(&owned))
            .await?
            .wrap_err_with(|| format!("Failed to check existing file: {}", path.display()))
    }

    async fn download_with_retries(&self, request: &ResourceRequest, target: &Path) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.download(request, target).await {
                Ok(hash) => return Ok(hash),
                Err(err) if attempt < self.options.max_retries && is_transient(&err) => {
                    let delay = retry_delay(attempt);
                    warn!(url = %request.url(), attempt = attempt + 1, "Retrying in {:?}: {:#}", delay, err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Streams one download into `<target>.part`, renaming it over `target`
    /// once the body is complete. Returns the MD5 of the written bytes.
    async fn download(&self, request: &ResourceRequest, target: &Path) -> Result<String> {
        let url = request.url();
        let part_path = part_path(target);
        info!(url = %url, output = %target.display(), "Downloading");

        let result = async {
            let mut response = self
                .client
                .get(url)
                .send()
                .await
                .wrap_err_with(|| format!("Request to {} failed", url))?
                .error_for_status()
                .wrap_err_with(|| format!("Server rejected request for {}", url))?;

            let file = tokio::fs::File::create(&part_path)
                .await
                .wrap_err_with(|| format!("Failed to create output file: {}", part_path.display()))?;
            let mut writer = tokio::io::BufWriter::new(file);
            let mut hasher = ContentDigestHasher::new();

            while let Some(chunk) = response
                .chunk()
                .await
                .wrap_err_with(|| format!("Failed to read from {}", url))?
            {
                hasher.update(&chunk);
                writer
                    .write_all(&chunk)
                    .await
                    .wrap_err_with(|| format!("Failed to write to {}", part_path.display()))?;
            }

            writer
                .flush()
                .await
                .wrap_err_with(|| format!("Failed to flush {}", part_path.display()))?;
            drop(writer);

            tokio::fs::rename(&part_path, target)
                .await
                .wrap_err_with(|| format!("Failed to move download into {}", target.display()))?;
            Ok::<_, eyre::Report>(hasher.finalize_hex())
        }
        .await;

        match result {
            Ok(hash) => {
                info!(url = %url, output = %target.display(), md5 = %hash, "Downloaded");
                Ok(hash)
            }
            Err(err) => {
                if let Err(remove_err) = tokio::fs::remove_file(&part_path).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(output = %part_path.display(), "Failed to remove partial download: {}", remove_err);
                    }
                }
                Err(err)
            }
        }
    }
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Exponential backoff from [`RETRY_BASE_DELAY`], capped at [`RETRY_MAX_DELAY`].
fn retry_delay(attempt: usize) -> Duration {
    let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
    RETRY_BASE_DELAY
        .checked_mul(factor)
        .map_or(RETRY_MAX_DELAY, |delay| delay.min(RETRY_MAX_DELAY))
}

fn host_key(url: &url::Url) -> String {
    url.origin().ascii_serialization()
}

fn is_transient(err: &eyre::Report) -> bool {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .is_some_and(|err| {
            err.is_timeout()
                || err.is_connect()
                || err.is_body()
                || err.status().is_some_and(|status| {
                    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                })
        })
}
