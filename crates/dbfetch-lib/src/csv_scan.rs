use crate::error::DbFetchError;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Reads the column of the CSV file at `path` whose header starts with
/// `pattern`.
pub fn search_csv_column(path: &Path, pattern: &str) -> Result<Vec<String>, DbFetchError> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DbFetchError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => DbFetchError::Io(e),
    })?;
    let values = read_csv_column(file, pattern)?;
    tracing::debug!(path = %path.display(), pattern, rows = values.len(), "Scanned CSV column");
    Ok(values)
}

/// Same as [`search_csv_column`] over an arbitrary reader.
///
/// The first header cell starting with `pattern` selects the column. Rows too
/// short to contain that column are skipped. Without a matching header the
/// first data row fails with [`DbFetchError::ColumnNotFound`]; a file with no
/// data rows yields no values.
pub fn read_csv_column(reader: impl Read, pattern: &str) -> Result<Vec<String>, DbFetchError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let column = reader
        .headers()?
        .iter()
        .position(|header| header.starts_with(pattern));

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        let column = column.ok_or_else(|| DbFetchError::ColumnNotFound {
            pattern: pattern.to_string(),
        })?;
        if let Some(value) = record.get(column) {
            values.push(value.to_string());
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,value\na,1\nb,2\n";

    #[test]
    fn test_column_selected_by_header_prefix() {
        let values = read_csv_column(SAMPLE.as_bytes(), "val").unwrap();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let err = read_csv_column(SAMPLE.as_bytes(), "zzz").unwrap_err();
        assert!(matches!(err, DbFetchError::ColumnNotFound { pattern } if pattern == "zzz"));
    }

    #[test]
    fn test_first_matching_header_wins() {
        let csv = "id,value_a,value_b\n1,x,y\n2,z,w\n";
        assert_eq!(read_csv_column(csv.as_bytes(), "value").unwrap(), vec!["x", "z"]);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let csv = "name,value\na,1\nb\nc,3\n";
        assert_eq!(read_csv_column(csv.as_bytes(), "value").unwrap(), vec!["1", "3"]);
    }

    #[test]
    fn test_empty_input_yields_no_values() {
        assert!(read_csv_column("".as_bytes(), "name").unwrap().is_empty());
    }

    #[test]
    fn test_header_only_yields_no_values() {
        assert!(read_csv_column("name,value\n".as_bytes(), "name").unwrap().is_empty());
    }

    #[test]
    fn test_unmatched_header_without_rows_yields_no_values() {
        assert!(read_csv_column("name,value\n".as_bytes(), "zzz").unwrap().is_empty());
    }

    #[test]
    fn test_search_csv_column_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specs.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        assert_eq!(search_csv_column(&path, "name").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_search_csv_column_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = search_csv_column(&dir.path().join("missing.csv"), "name").unwrap_err();
        assert!(matches!(err, DbFetchError::FileNotFound { .. }));
    }
}
