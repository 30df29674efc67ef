mod user_directory;

pub use user_directory::{PgUserDirectory, UserDirectory};

#[cfg(test)]
pub use user_directory::StaticUserDirectory;
