use crate::verification::file_md5;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A file that landed on local disk, with its MD5 computed on first use.
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    hash: OnceLock<String>,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            hash: OnceLock::new(),
        }
    }

    /// Creates an entry whose hash is already known, e.g. because it was just
    /// compared against the approved set.
    pub fn with_hash(path: impl Into<PathBuf>, hash: String) -> Self {
        let file = Self::new(path);
        let _ = file.hash.set(hash);
        file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cached_hash(&self) -> Option<&str> {
        self.hash.get().map(String::as_str)
    }

    /// Lowercase hex MD5 of the file contents. Computed once per entry.
    pub fn hash(&self) -> io::Result<&str> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let computed = file_md5(&self.path)?;
        Ok(self.hash.get_or_init(|| computed))
    }
}

impl Clone for LocalFile {
    fn clone(&self) -> Self {
        let hash = OnceLock::new();
        if let Some(known) = self.hash.get() {
            let _ = hash.set(known.clone());
        }
        Self {
            path: self.path.clone(),
            hash,
        }
    }
}

impl PartialEq for LocalFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for LocalFile {}

/// Ordered list of local files without duplicate paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchManifest {
    files: Vec<LocalFile>,
    seen: HashSet<PathBuf>,
}

impl FetchManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `file` unless its path is already listed. Returns whether the
    /// entry was added.
    pub fn push(&mut self, file: LocalFile) -> bool {
        if !self.seen.insert(file.path.clone()) {
            tracing::debug!(path = %file.path.display(), "Path already in manifest, keeping first entry");
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalFile> {
        self.files.iter()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|file| file.path.clone()).collect()
    }

    /// Hashes aligned with [`FetchManifest::paths`].
    pub fn hashes(&self) -> io::Result<Vec<String>> {
        self.files
            .iter()
            .map(|file| file.hash().map(str::to_owned))
            .collect()
    }
}

impl FromIterator<LocalFile> for FetchManifest {
    fn from_iter<T: IntoIterator<Item = LocalFile>>(iter: T) -> Self {
        let mut manifest = Self::new();
        for file in iter {
            manifest.push(file);
        }
        manifest
    }
}

impl IntoIterator for FetchManifest {
    type Item = LocalFile;
    type IntoIter = std::vec::IntoIter<LocalFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl<'a> IntoIterator for &'a FetchManifest {
    type Item = &'a LocalFile;
    type IntoIter = std::slice::Iter<'a, LocalFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_ignores_duplicate_paths() {
        let mut manifest = FetchManifest::new();
        assert!(manifest.push(LocalFile::new("/tmp/a.obj")));
        assert!(manifest.push(LocalFile::new("/tmp/b.obj")));
        assert!(!manifest.push(LocalFile::new("/tmp/a.obj")));
        assert!(manifest.contains(Path::new("/tmp/b.obj")));
        assert!(!manifest.contains(Path::new("/tmp/c.obj")));

        assert_eq!(
            manifest.paths(),
            vec![PathBuf::from("/tmp/a.obj"), PathBuf::from("/tmp/b.obj")]
        );
    }

    #[test]
    fn test_hash_is_computed_lazily_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"first").unwrap();

        let file = LocalFile::new(&path);
        assert_eq!(file.cached_hash(), None);
        let first = file.hash().unwrap().to_string();

        std::fs::write(&path, b"second").unwrap();
        assert_eq!(file.hash().unwrap(), first);
        assert_eq!(file.clone().cached_hash(), Some(first.as_str()));
    }

    #[test]
    fn test_hashes_fail_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest: FetchManifest = [LocalFile::new(dir.path().join("gone"))]
            .into_iter()
            .collect();

        assert!(manifest.hashes().is_err());
    }

    #[test]
    fn test_known_hash_is_not_recomputed() {
        let file = LocalFile::with_hash("/does/not/exist", "abc".to_string());
        assert_eq!(file.hash().unwrap(), "abc");
    }
}
