use crate::error::DbFetchError;
use crate::manifest::FetchManifest;
use crate::verification::HashIndex;
use std::time::Duration;
use url::Url;

/// A remote resource the caller wants available locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRequest {
    url: String,
    expected_hash: Option<String>,
}

impl ResourceRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expected_hash: None,
        }
    }

    pub fn with_expected_hash(mut self, hash: impl Into<String>) -> Self {
        self.expected_hash = Some(hash.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expected_hash(&self) -> Option<&str> {
        self.expected_hash.as_deref()
    }

    pub fn parse_url(&self) -> Result<Url, DbFetchError> {
        Url::parse(&self.url).map_err(|e| DbFetchError::InvalidRequest {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    /// Last `/`-separated segment of the URL path, used as the local file name.
    pub fn file_name(&self) -> Result<String, DbFetchError> {
        let url = self.parse_url()?;
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| DbFetchError::InvalidRequest {
                url: self.url.clone(),
                reason: "URL path has no file name".to_string(),
            })
    }
}

/// Approved hashes for a batch: each request's expected hash plus `extra`.
pub fn hash_index_for(requests: &[ResourceRequest], extra: &[String]) -> HashIndex {
    HashIndex::new(
        requests
            .iter()
            .filter_map(ResourceRequest::expected_hash)
            .chain(extra.iter().map(String::as_str)),
    )
}

/// `timeout` bounds connecting and each wait for more bytes, not the whole
/// transfer.
#[derive(Clone, Copy, Debug)]
pub struct DownloadOptions {
    pub max_concurrency_per_host: usize,
    pub max_retries: usize,
    pub download_parallelism: usize,
    pub timeout: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_concurrency_per_host: 4,
            max_retries: 3,
            download_parallelism: 8,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one [`Fetcher::fetch`](super::Fetcher::fetch) run.
///
/// `errors` holds the per-request failures in request order; the manifest
/// lists every request that could be resolved.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub manifest: FetchManifest,
    pub errors: Vec<DbFetchError>,
    pub downloaded_count: usize,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_last_path_segment() {
        let request = ResourceRequest::new("https://storage.example.com/bucket/uid/model.3dm.gz");
        assert_eq!(request.file_name().unwrap(), "model.3dm.gz");
    }

    #[test]
    fn test_file_name_ignores_query_and_fragment() {
        let request = ResourceRequest::new("https://example.com/a/b/data.csv?token=abc#top");
        assert_eq!(request.file_name().unwrap(), "data.csv");
    }

    #[test]
    fn test_file_name_rejects_directory_url() {
        let request = ResourceRequest::new("https://example.com/a/b/");
        assert!(matches!(
            request.file_name(),
            Err(DbFetchError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_file_name_rejects_unparseable_url() {
        let request = ResourceRequest::new("not a url");
        assert!(matches!(
            request.file_name(),
            Err(DbFetchError::InvalidRequest { .. })
        ));
    }
}
