//! HTTP client, transport middleware and cache keys for the backend API.

pub mod client;
pub mod keys;
pub mod transport;
pub mod types;
