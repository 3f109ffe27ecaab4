use crate::error::DbFetchError;
use crate::manifest::{FetchManifest, LocalFile};
use flate2::read::MultiGzDecoder;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

/// Archive containers recognised by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Gzip,
}

impl ArchiveFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        extension.eq_ignore_ascii_case("gz").then_some(Self::Gzip)
    }
}

/// Name the decompressed copy of `path` gets, or `None` for non-archives.
pub fn decompressed_file_name(path: &Path) -> Option<OsString> {
    ArchiveFormat::detect(path)?;
    path.file_stem().map(ToOwned::to_owned)
}

#[derive(Debug)]
pub struct DecompressOutcome {
    pub manifest: FetchManifest,
    pub decompressed_count: usize,
    pub total: usize,
}

impl DecompressOutcome {
    /// Short human readable summary for status displays.
    pub fn status(&self) -> String {
        if self.decompressed_count == 0 {
            format!("No gz file found in {} entries", self.total)
        } else {
            format!("Decompressed {} of {}", self.decompressed_count, self.total)
        }
    }
}

/// Decompresses every archive in `manifest` into `output_dir`.
///
/// Non-archive entries are passed through with their original path. The first
/// archive that fails to decode aborts the whole call, as does an archive whose
/// output would replace a file already produced by this call.
pub fn decompress(
    manifest: &FetchManifest,
    output_dir: &Path,
) -> Result<DecompressOutcome, DbFetchError> {
    std::fs::create_dir_all(output_dir).map_err(|e| DbFetchError::DirectoryCreateFailed {
        path: output_dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut output = FetchManifest::new();
    let mut decompressed_count = 0;

    for file in manifest {
        let Some(name) = decompressed_file_name(file.path()) else {
            tracing::trace!(path = %file.path().display(), "Not an archive, passing through");
            output.push(file.clone());
            continue;
        };

        let target = output_dir.join(name);
        if output.contains(&target) {
            return Err(DbFetchError::DecompressionFailed {
                path: file.path().to_path_buf(),
                reason: format!("output {} is already taken by another entry", target.display()),
            });
        }
        decompress_file(file.path(), &target)?;
        tracing::info!(
            source = %file.path().display(),
            output = %target.display(),
            "Decompressed"
        );
        output.push(LocalFile::new(target));
        decompressed_count += 1;
    }

    let outcome = DecompressOutcome {
        manifest: output,
        decompressed_count,
        total: manifest.len(),
    };
    tracing::info!("{}", outcome.status());
    Ok(outcome)
}

/// Streams the gzip payload at `source` into `target`.
pub fn decompress_file(source: &Path, target: &Path) -> Result<(), DbFetchError> {
    let input = match File::open(source) {
        Ok(input) => input,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DbFetchError::FileNotFound {
                path: source.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(DbFetchError::DecompressionFailed {
                path: source.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let result = File::create(target).and_then(|output| {
        let mut decoder = MultiGzDecoder::new(BufReader::new(input));
        let mut writer = BufWriter::new(output);
        io::copy(&mut decoder, &mut writer)?;
        writer.flush()
    });

    result.map_err(|e| {
        if let Err(remove_err) = std::fs::remove_file(target) {
            if remove_err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(output = %target.display(), "Failed to remove partial output: {}", remove_err);
            }
        }
        DbFetchError::DecompressionFailed {
            path: source.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::path::PathBuf;

    fn write_gzip(path: &Path, content: &[u8]) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
    }

    fn manifest_of(paths: &[PathBuf]) -> FetchManifest {
        paths.iter().map(LocalFile::new).collect()
    }

    #[test]
    fn test_detect_archive_format() {
        assert_eq!(
            ArchiveFormat::detect(Path::new("model.3dm.gz")),
            Some(ArchiveFormat::Gzip)
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("MODEL.GZ")),
            Some(ArchiveFormat::Gzip)
        );
        assert_eq!(ArchiveFormat::detect(Path::new("model.3dm")), None);
        assert_eq!(ArchiveFormat::detect(Path::new("gz")), None);
    }

    #[test]
    fn test_decompressed_file_name_strips_one_suffix() {
        assert_eq!(
            decompressed_file_name(Path::new("/tmp/scan.tar.gz")),
            Some(OsString::from("scan.tar"))
        );
        assert_eq!(decompressed_file_name(Path::new("/tmp/scan.obj")), None);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let archive = dir.path().join("model.3dm.gz");
        write_gzip(&archive, &content);

        let out_dir = dir.path().join("unzipped");
        let outcome = decompress(&manifest_of(&[archive]), &out_dir).unwrap();

        let expected = out_dir.join("model.3dm");
        assert_eq!(outcome.manifest.paths(), vec![expected.clone()]);
        assert_eq!(std::fs::read(expected).unwrap(), content);
        assert_eq!(outcome.decompressed_count, 1);
    }

    #[test]
    fn test_non_archives_pass_through_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("data.csv");
        std::fs::write(&plain, b"a,b\n").unwrap();
        let archive = dir.path().join("mesh.obj.gz");
        write_gzip(&archive, b"v 0 0 0\n");
        let other = dir.path().join("photo.webp");
        std::fs::write(&other, b"RIFF").unwrap();

        let out_dir = dir.path().join("out");
        let outcome = decompress(
            &manifest_of(&[plain.clone(), archive, other.clone()]),
            &out_dir,
        )
        .unwrap();

        assert_eq!(
            outcome.manifest.paths(),
            vec![plain, out_dir.join("mesh.obj"), other]
        );
        assert_eq!(outcome.status(), "Decompressed 1 of 3");
        assert!(!out_dir.join("data.csv").exists());
    }

    #[test]
    fn test_status_without_archives() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("a.obj");
        std::fs::write(&plain, b"o").unwrap();

        let outcome = decompress(&manifest_of(&[plain]), &dir.path().join("out")).unwrap();
        assert_eq!(outcome.decompressed_count, 0);
        assert_eq!(outcome.status(), "No gz file found in 1 entries");
    }

    #[test]
    fn test_truncated_archive_fails_whole_call() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.obj.gz");
        write_gzip(&good, b"fine");

        let full = dir.path().join("full.gz");
        write_gzip(&full, &vec![7u8; 100_000]);
        let bytes = std::fs::read(&full).unwrap();
        let truncated = dir.path().join("broken.obj.gz");
        std::fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

        let out_dir = dir.path().join("out");
        let err = decompress(&manifest_of(&[good, truncated.clone()]), &out_dir).unwrap_err();

        match err {
            DbFetchError::DecompressionFailed { path, .. } => assert_eq!(path, truncated),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out_dir.join("broken.obj").exists());
    }

    #[test]
    fn test_colliding_archive_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a").join("m.obj.gz");
        let second = dir.path().join("b").join("m.obj.gz");
        for (archive, content) in [(&first, &b"first"[..]), (&second, &b"second"[..])] {
            std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
            write_gzip(archive, content);
        }

        let out_dir = dir.path().join("out");
        let err = decompress(&manifest_of(&[first, second.clone()]), &out_dir).unwrap_err();

        match err {
            DbFetchError::DecompressionFailed { path, .. } => assert_eq!(path, second),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read(out_dir.join("m.obj")).unwrap(), b"first");
    }

    #[test]
    fn test_plain_text_with_gz_suffix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("notes.txt.gz");
        std::fs::write(&fake, b"this is not gzip data").unwrap();

        let err = decompress(&manifest_of(&[fake]), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, DbFetchError::DecompressionFailed { .. }));
    }

    #[test]
    fn test_missing_archive_reports_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.gz");

        let err = decompress(&manifest_of(&[missing]), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, DbFetchError::FileNotFound { .. }));
    }

    #[test]
    fn test_output_dir_creation_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not dir").unwrap();

        let err = decompress(&FetchManifest::new(), &blocker.join("out")).unwrap_err();
        assert!(matches!(err, DbFetchError::DirectoryCreateFailed { .. }));
    }
}
