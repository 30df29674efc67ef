//! User directory.
//!
//! Users are owned by the surrounding HR platform; this feature only reads
//! them to resolve the case manager and to show identified reporters.

pub mod models;
pub mod services;

pub use models::DirectoryUser;
pub use services::{PgUserDirectory, UserDirectory};

#[cfg(test)]
pub use services::StaticUserDirectory;
