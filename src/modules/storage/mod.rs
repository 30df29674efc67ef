//! Storage module for attachment bytes
//!
//! Provides a local filesystem store addressed only by
//! `{case_id}/{attachment_id}` keys.

mod local_storage;

pub use local_storage::LocalStorage;
