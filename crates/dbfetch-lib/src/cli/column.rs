use crate::cli::ColumnParams;
use crate::csv_scan::search_csv_column;
use crate::error::DbFetchError;
use std::io::Write;

pub async fn run_column(params: ColumnParams) -> Result<Vec<String>, DbFetchError> {
    let ColumnParams { csv_path, pattern } = params;

    let values = search_csv_column(&csv_path, &pattern)?;

    let mut stdout = std::io::stdout().lock();
    for value in &values {
        writeln!(stdout, "{}", value)?;
    }
    stdout.flush()?;

    tracing::info!("Read {} values from {}", values.len(), csv_path.display());
    Ok(values)
}
