//! Content hashing for sprite file names.
//!
//! Only used to make output names unique per content. The sprite cache is
//! keyed by the resolved output path, never by the hash.

pub const DEFAULT_HASH_LENGTH: usize = 8;

/// Longest digest blake3 can yield as hex.
pub const MAX_HASH_LENGTH: usize = 64;

/// Hex blake3 digest of `data`, truncated to `length` chars.
pub fn content_hash(data: &[u8], length: usize) -> String {
    let mut hex = hex::encode(blake3::hash(data).as_bytes());
    hex.truncate(length.min(MAX_HASH_LENGTH));
    hex
}
