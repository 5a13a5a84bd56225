use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `users` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Stored lowercase; lookups are case-insensitive.
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

fn default_active() -> bool {
    true
}

/// One row of the `roles` table. Names are unique.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: u64,
    pub name: String,
}

/// Association row linking a user to a role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRoleRecord {
    pub id: u64,
    pub user_id: u64,
    pub role_id: u64,
}
