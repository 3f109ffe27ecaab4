use super::content_digest_hasher::file_md5;
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Set of approved content hashes used to decide whether a local copy can be
/// reused.
///
/// A file is considered valid when its MD5 is a member of the whole set, not
/// when it matches one hash aligned with a particular URL.
#[derive(Clone, Debug, Default)]
pub struct HashIndex {
    allowed: HashSet<String>,
}

impl HashIndex {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .filter_map(|hash| normalize_hash(hash.as_ref()))
            .collect();
        Self { allowed }
    }

    pub fn contains(&self, hash: &str) -> bool {
        normalize_hash(hash).is_some_and(|hash| self.allowed.contains(&hash))
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Returns `true` when `path` is missing or its content hash is not approved.
    pub fn should_fetch(&self, path: &Path) -> io::Result<bool> {
        Ok(self.approved_hash(path)?.is_none())
    }

    /// Returns the hash of `path` when the file exists and is approved.
    pub fn approved_hash(&self, path: &Path) -> io::Result<Option<String>> {
        match file_md5(path) {
            Ok(actual) => {
                let approved = self.allowed.contains(&actual);
                tracing::trace!(path = %path.display(), md5 = %actual, approved, "Checked local copy");
                Ok(approved.then_some(actual))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn normalize_hash(hash: &str) -> Option<String> {
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_ascii_lowercase())
}
