use crate::cli::FetchParams;
use crate::cli::output::write_hash_lines;
use crate::download::{FetchOutcome, Fetcher, hash_index_for};
use crate::error::DbFetchError;

pub async fn run_fetch(params: FetchParams) -> Result<FetchOutcome, DbFetchError> {
    let FetchParams {
        requests,
        allowed_hashes,
        staging_dir,
        extracted_dir,
        options,
    } = params;

    let index = hash_index_for(&requests, &allowed_hashes);
    let fetcher = Fetcher::new(index, options)?.with_extracted_dir(extracted_dir);

    tracing::info!("Fetching {} resources into {}", requests.len(), staging_dir.display());
    let outcome = fetcher.fetch(&requests, &staging_dir).await?;

    let hashes = outcome.manifest.hashes()?;
    write_hash_lines(
        std::io::stdout().lock(),
        hashes
            .iter()
            .map(String::as_str)
            .zip(outcome.manifest.iter().map(|file| file.path())),
    )?;

    if !outcome.is_complete() {
        for message in outcome.error_messages() {
            tracing::error!("{}", message);
        }
        return Err(DbFetchError::DownloadsFailed {
            count: outcome.errors.len(),
        });
    }

    tracing::info!(
        "Fetched {} resources, downloaded {}",
        outcome.manifest.len(),
        outcome.downloaded_count
    );
    Ok(outcome)
}
