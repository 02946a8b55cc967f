//! In-memory authoritative store.

/// Authoritative question/reply/notification store.
pub mod store;
