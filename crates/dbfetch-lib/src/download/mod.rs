#[allow(clippy::module_inception)]
mod download;
mod types;

pub use download::Fetcher;
pub use types::{DownloadOptions, FetchOutcome, ResourceRequest, hash_index_for};
