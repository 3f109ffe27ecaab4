use digest::Digest;
use md5::Md5;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Size of the chunks read from disk while hashing.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental MD5 over a byte stream, finalised as lowercase hex.
#[derive(Default)]
pub struct ContentDigestHasher {
    hasher: Md5,
}

impl ContentDigestHasher {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        Digest::update(&mut self.hasher, data.as_ref());
    }

    pub fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Streams `reader` to the end and returns its MD5 as lowercase hex.
pub fn reader_md5(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = ContentDigestHasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize_hex())
}

/// MD5 of the file at `path`, read in bounded chunks.
pub fn file_md5(path: &Path) -> io::Result<String> {
    reader_md5(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_of_empty_input() {
        assert_eq!(
            reader_md5(io::empty()).unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_md5_matches_known_digest() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(
            reader_md5(&data[..]).unwrap(),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn test_md5_spans_multiple_chunks() {
        let data = vec![b'x'; READ_BUFFER_SIZE * 3 + 17];
        let mut hasher = ContentDigestHasher::new();
        hasher.update(&data);
        assert_eq!(reader_md5(&data[..]).unwrap(), hasher.finalize_hex());
    }

    #[test]
    fn test_file_md5_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_md5(&dir.path().join("absent.bin")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
