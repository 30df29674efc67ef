pub mod auth;
pub mod categories;
pub mod rate_limits;
pub mod users;
pub mod whistleblowing;
