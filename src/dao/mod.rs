/// Durable key-value backends.
pub mod kv_store;
/// REST collaborator holding authoritative rounds.
pub mod match_api;
/// Scoring cache adapter built on a key-value store.
pub mod persistence;
/// Storage error types shared by the backends.
pub mod storage;
