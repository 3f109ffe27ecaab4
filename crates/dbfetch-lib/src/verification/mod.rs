mod content_digest_hasher;
mod hash_index;

pub use content_digest_hasher::{ContentDigestHasher, file_md5, reader_md5};
pub use hash_index::HashIndex;
