use crate::cli::HashParams;
use crate::cli::output::write_hash_lines;
use crate::error::DbFetchError;
use crate::manifest::{FetchManifest, LocalFile};
use eyre::WrapErr;

pub async fn run_hash(params: HashParams) -> Result<Vec<String>, DbFetchError> {
    let HashParams { paths } = params;

    let manifest: FetchManifest = paths.into_iter().map(LocalFile::new).collect();
    let (manifest, hashes) = tokio::task::spawn_blocking(move || {
        let hashes = manifest.hashes();
        (manifest, hashes)
    })
    .await
    .wrap_err("Hashing task failed")?;
    let hashes = hashes?;

    write_hash_lines(
        std::io::stdout().lock(),
        hashes
            .iter()
            .map(String::as_str)
            .zip(manifest.iter().map(|file| file.path())),
    )?;
    Ok(hashes)
}
