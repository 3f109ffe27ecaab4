use crate::download::{DownloadOptions, ResourceRequest};
use crate::pipeline::PipelineParams;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub requests: Vec<ResourceRequest>,
    pub allowed_hashes: Vec<String>,
    pub staging_dir: PathBuf,
    pub extracted_dir: PathBuf,
    pub options: DownloadOptions,
}

#[derive(Debug, Clone)]
pub struct SyncParams {
    pub pipeline: PipelineParams,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DecompressParams {
    pub paths: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ColumnParams {
    pub csv_path: PathBuf,
    pub pattern: String,
}

#[derive(Debug, Clone)]
pub struct HashParams {
    pub paths: Vec<PathBuf>,
}
