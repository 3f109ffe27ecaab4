use crate::cli::SyncParams;
use crate::cli::output::write_hash_lines;
use crate::error::DbFetchError;
use crate::pipeline::{OneShotTrigger, PipelineReport, run_pipeline};
use eyre::eyre;

pub async fn run_sync(params: SyncParams) -> Result<PipelineReport, DbFetchError> {
    let SyncParams {
        pipeline,
        report_path,
    } = params;

    let trigger = OneShotTrigger::new(true);
    let report = run_pipeline(&pipeline, &trigger)
        .await?
        .ok_or_else(|| eyre!("Pipeline did not run"))?;

    write_hash_lines(
        std::io::stdout().lock(),
        report
            .hashes
            .iter()
            .map(String::as_str)
            .zip(report.paths.iter().map(|path| path.as_path())),
    )?;

    if let Some(report_path) = &report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(report_path, json)?;
        tracing::info!("Report written to {}", report_path.display());
    }

    tracing::info!("{}", report.status);
    if !report.is_complete() {
        for message in &report.errors {
            tracing::error!("{}", message);
        }
        return Err(DbFetchError::DownloadsFailed {
            count: report.errors.len(),
        });
    }
    Ok(report)
}
