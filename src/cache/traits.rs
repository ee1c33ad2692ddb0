//! Cache key abstraction.

use sha2::{Digest, Sha256};

/// A cacheable read query.
///
/// Implementors must embed every parameter of the query in the hash input,
/// so distinct parameter combinations never share an entry.
pub trait QueryKey {
  /// Stable, fixed-length cache key.
  fn cache_hash(&self) -> String;

  /// Human-readable form, used for logging only.
  fn description(&self) -> String;
}

/// SHA256 hash for stable, fixed-length keys.
pub fn hash_key(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}
