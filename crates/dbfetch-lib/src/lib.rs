pub mod cli;
pub mod config;
pub mod csv_scan;
pub mod decompress;
pub mod download;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod verification;

pub use config::Config;
pub use error::DbFetchError;
