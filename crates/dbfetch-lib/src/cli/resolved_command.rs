use crate::cli::args::{Command, SourceSpec};
use crate::cli::params::{ColumnParams, DecompressParams, FetchParams, HashParams, SyncParams};
use crate::config::{Config, load_config};
use crate::download::{DownloadOptions, ResourceRequest};
use crate::error::DbFetchError;
use crate::pipeline::PipelineParams;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used for decompressed files when none is configured.
pub const DEFAULT_EXTRACTED_DIR_NAME: &str = "unzipped";

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Fetch(FetchParams),
    Sync(SyncParams),
    Decompress(DecompressParams),
    Column(ColumnParams),
    Hash(HashParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, DbFetchError> {
    match command {
        Command::Fetch { source } => Ok(ResolvedCommand::Fetch(resolve_source(source)?)),
        Command::Sync {
            source,
            report_path,
        } => {
            let FetchParams {
                requests,
                allowed_hashes,
                staging_dir,
                extracted_dir,
                options,
            } = resolve_source(source)?;

            Ok(ResolvedCommand::Sync(SyncParams {
                pipeline: PipelineParams {
                    requests,
                    allowed_hashes,
                    staging_dir,
                    output_dir: extracted_dir,
                    options,
                },
                report_path: report_path.map(PathBuf::from),
            }))
        }
        Command::Decompress { paths, output_dir } => {
            let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
            let output_dir = match output_dir {
                Some(output_dir) => PathBuf::from(output_dir),
                None => {
                    let first = paths.first().ok_or_else(|| DbFetchError::CliArgumentValidation {
                        details: "No files to decompress. Pass at least one --path.".to_string(),
                    })?;
                    first
                        .parent()
                        .unwrap_or_else(|| Path::new("."))
                        .join(DEFAULT_EXTRACTED_DIR_NAME)
                }
            };

            Ok(ResolvedCommand::Decompress(DecompressParams { paths, output_dir }))
        }
        Command::Column { csv_path, pattern } => {
            if pattern.is_empty() {
                return Err(DbFetchError::CliArgumentValidation {
                    details: "Column pattern must not be empty.".to_string(),
                });
            }
            Ok(ResolvedCommand::Column(ColumnParams {
                csv_path: PathBuf::from(csv_path),
                pattern,
            }))
        }
        Command::Hash { paths } => Ok(ResolvedCommand::Hash(HashParams {
            paths: paths.into_iter().map(PathBuf::from).collect(),
        })),
    }
}

/// Merges command line sources over the optional config file.
fn resolve_source(source: SourceSpec) -> Result<FetchParams, DbFetchError> {
    let config = match &source.config_path {
        Some(config_path) => {
            tracing::info!("Loading configuration from {}", config_path);
            load_config(config_path)?
        }
        None => Config::default(),
    };

    let mut requests = config.requests();
    requests.extend(source.urls.into_iter().map(ResourceRequest::new));
    if requests.is_empty() {
        return Err(DbFetchError::CliArgumentValidation {
            details: "No resources to fetch. List them under resources in the config or pass --url."
                .to_string(),
        });
    }

    let mut allowed_hashes = config.allowed_hashes.clone();
    allowed_hashes.extend(source.hashes);

    let staging_dir = source
        .staging_dir
        .map(PathBuf::from)
        .or_else(|| config.staging_dir.clone())
        .ok_or_else(|| DbFetchError::CliArgumentValidation {
            details: "No staging directory provided. Configure staging_dir or pass --staging-dir."
                .to_string(),
        })?;

    let extracted_dir = source
        .extracted_dir
        .map(PathBuf::from)
        .or_else(|| config.extracted_dir.clone())
        .unwrap_or_else(|| staging_dir.join(DEFAULT_EXTRACTED_DIR_NAME));

    let defaults = DownloadOptions::from(&config.download);
    let options = DownloadOptions {
        max_concurrency_per_host: source
            .max_concurrency_per_host
            .unwrap_or(defaults.max_concurrency_per_host),
        max_retries: source.max_retries.unwrap_or(defaults.max_retries),
        download_parallelism: source
            .download_parallelism
            .unwrap_or(defaults.download_parallelism),
        timeout: source
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
    };

    if options.max_concurrency_per_host == 0 || options.download_parallelism == 0 {
        return Err(DbFetchError::CliArgumentValidation {
            details: "Concurrency limits must be at least 1.".to_string(),
        });
    }

    Ok(FetchParams {
        requests,
        allowed_hashes,
        staging_dir,
        extracted_dir,
        options,
    })
}
