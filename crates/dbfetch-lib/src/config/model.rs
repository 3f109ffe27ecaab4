use crate::download::{DownloadOptions, ResourceRequest};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourceDef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
}

impl From<&ResourceDef> for ResourceRequest {
    fn from(def: &ResourceDef) -> Self {
        let request = ResourceRequest::new(def.url.clone());
        match &def.expected_hash {
            Some(hash) => request.with_expected_hash(hash.clone()),
            None => request,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    #[serde(default)]
    pub allowed_hashes: Vec<String>,
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
    #[serde(default)]
    pub extracted_dir: Option<PathBuf>,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DownloadConfig {
    pub max_concurrency_per_host: usize,
    pub max_retries: usize,
    pub download_parallelism: usize,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        let options = DownloadOptions::default();
        Self {
            max_concurrency_per_host: options.max_concurrency_per_host,
            max_retries: options.max_retries,
            download_parallelism: options.download_parallelism,
            timeout_secs: options.timeout.as_secs(),
        }
    }
}

impl From<&DownloadConfig> for DownloadOptions {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            max_concurrency_per_host: config.max_concurrency_per_host,
            max_retries: config.max_retries,
            download_parallelism: config.download_parallelism,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}
