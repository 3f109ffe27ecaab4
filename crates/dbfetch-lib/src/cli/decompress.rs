use crate::cli::DecompressParams;
use crate::decompress::{DecompressOutcome, decompress};
use crate::error::DbFetchError;
use crate::manifest::{FetchManifest, LocalFile};
use eyre::WrapErr;

pub async fn run_decompress(params: DecompressParams) -> Result<DecompressOutcome, DbFetchError> {
    let DecompressParams { paths, output_dir } = params;

    let manifest: FetchManifest = paths.into_iter().map(LocalFile::new).collect();
    tracing::info!(
        "Decompressing {} files into {}",
        manifest.len(),
        output_dir.display()
    );

    let outcome = tokio::task::spawn_blocking(move || decompress(&manifest, &output_dir))
        .await
        .wrap_err("Decompression task failed")??;

    for file in &outcome.manifest {
        println!("{}", file.path().display());
    }
    tracing::info!("{}", outcome.status());
    Ok(outcome)
}
