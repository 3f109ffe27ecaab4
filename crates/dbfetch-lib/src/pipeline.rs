//! Fetch, verify and decompress in one call.
//!
//! The pipeline keeps no state between runs: everything a caller needs is in
//! the returned [`PipelineReport`], and the only thing that persists is what
//! was written to the staging and output directories.

use crate::decompress::decompress;
use crate::download::{DownloadOptions, Fetcher, ResourceRequest, hash_index_for};
use crate::error::DbFetchError;
use crate::verification::HashIndex;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Capability used by the caller to start a run and by the pipeline to
/// disarm it again once the run is over.
pub trait Trigger {
    fn is_armed(&self) -> bool;
    fn reset(&self);
}

/// In-process trigger backed by an atomic flag.
#[derive(Debug, Default)]
pub struct OneShotTrigger {
    armed: AtomicBool,
}

impl OneShotTrigger {
    pub fn new(armed: bool) -> Self {
        Self {
            armed: AtomicBool::new(armed),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl Trigger for OneShotTrigger {
    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
pub struct PipelineParams {
    pub requests: Vec<ResourceRequest>,
    pub allowed_hashes: Vec<String>,
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
    pub options: DownloadOptions,
}

impl PipelineParams {
    /// Approved hashes: every request's expected hash plus the extra ones.
    pub fn hash_index(&self) -> HashIndex {
        hash_index_for(&self.requests, &self.allowed_hashes)
    }
}

/// Summary of one pipeline run. `hashes[i]` is the MD5 of `paths[i]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineReport {
    pub paths: Vec<PathBuf>,
    pub hashes: Vec<String>,
    pub errors: Vec<String>,
    pub downloaded_count: usize,
    pub decompressed_count: usize,
    pub status: String,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the pipeline if `trigger` is armed, resetting it afterwards whether or
/// not the run succeeded. Returns `None` when the trigger was not armed.
pub async fn run_pipeline(
    params: &PipelineParams,
    trigger: &dyn Trigger,
) -> Result<Option<PipelineReport>, DbFetchError> {
    if !trigger.is_armed() {
        tracing::debug!("Trigger not armed, nothing to do");
        return Ok(None);
    }

    let result = run(params).await;
    trigger.reset();
    result.map(Some)
}

async fn run(params: &PipelineParams) -> Result<PipelineReport, DbFetchError> {
    let fetcher = Fetcher::new(params.hash_index(), params.options)?
        .with_extracted_dir(&params.output_dir);

    tracing::info!(
        requests = params.requests.len(),
        approved_hashes = fetcher.index().len(),
        "Fetching resources"
    );
    let fetched = fetcher.fetch(&params.requests, &params.staging_dir).await?;
    let errors = fetched.error_messages();

    let manifest = fetched.manifest;
    let output_dir = params.output_dir.clone();
    let (decompressed, hashes) = tokio::task::spawn_blocking(move || {
        let outcome = decompress(&manifest, &output_dir)?;
        let hashes = outcome.manifest.hashes()?;
        Ok::<_, DbFetchError>((outcome, hashes))
    })
    .await
    .wrap_err("Decompression task failed")??;

    let report = PipelineReport {
        paths: decompressed.manifest.paths(),
        hashes,
        errors,
        downloaded_count: fetched.downloaded_count,
        decompressed_count: decompressed.decompressed_count,
        status: decompressed.status(),
    };

    if report.is_complete() {
        tracing::info!(status = %report.status, "Pipeline finished");
    } else {
        tracing::warn!(
            status = %report.status,
            failed = report.errors.len(),
            "Pipeline finished with failures"
        );
    }
    Ok(report)
}
