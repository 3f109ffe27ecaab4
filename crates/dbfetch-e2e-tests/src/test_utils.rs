use dbfetch_lib::download::DownloadOptions;
use dbfetch_lib::verification::reader_md5;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .with_test_writer()
        .try_init();
}

/// Download options that fail fast instead of retrying.
pub fn test_options() -> DownloadOptions {
    DownloadOptions {
        max_concurrency_per_host: 4,
        max_retries: 0,
        download_parallelism: 4,
        timeout: Duration::from_secs(5),
    }
}

pub fn md5_hex(content: &[u8]) -> String {
    reader_md5(content).expect("hashing an in-memory buffer cannot fail")
}

pub fn gzip_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(content)
        .expect("writing to an in-memory encoder cannot fail");
    encoder
        .finish()
        .expect("finishing an in-memory encoder cannot fail")
}

/// Serves `body` at `route` with a 200 response.
pub async fn serve_file(server: &MockServer, route: &str, body: impl Into<Vec<u8>>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into()))
        .mount(server)
        .await;
}

/// Serves an empty response with `status` at `route`.
pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of GET requests the server has seen for `route`.
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

pub fn setup_test_environment() -> eyre::Result<TempDir> {
    Ok(tempfile::tempdir()?)
}
