use sqlx::FromRow;

/// Identity of a platform user as seen by the case subsystem
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DirectoryUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}
