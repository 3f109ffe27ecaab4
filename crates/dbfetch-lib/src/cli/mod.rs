mod args;
mod column;
mod decompress;
mod fetch;
mod hash;
mod output;
mod params;
mod resolved_command;
mod sync;

pub use args::{Command, SourceSpec, parse_args};
pub use column::run_column;
pub use decompress::run_decompress;
pub use fetch::run_fetch;
pub use hash::run_hash;
pub use params::{ColumnParams, DecompressParams, FetchParams, HashParams, SyncParams};
pub use resolved_command::{DEFAULT_EXTRACTED_DIR_NAME, ResolvedCommand, resolve_command};
pub use sync::run_sync;
