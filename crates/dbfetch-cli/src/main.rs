use dbfetch_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_column, run_decompress, run_fetch, run_hash,
    run_sync,
};
use dbfetch_lib::error::DbFetchError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), DbFetchError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Fetch(params) => {
            run_fetch(params).await?;
        }
        ResolvedCommand::Sync(params) => {
            run_sync(params).await?;
        }
        ResolvedCommand::Decompress(params) => {
            run_decompress(params).await?;
        }
        ResolvedCommand::Column(params) => {
            run_column(params).await?;
        }
        ResolvedCommand::Hash(params) => {
            run_hash(params).await?;
        }
    }

    Ok(())
}
