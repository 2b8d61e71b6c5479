use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub is_paid_member: bool,
    pub paid_member_since: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Auxiliary profile, created together with its user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub username_kana: String,
    pub postal_code: String,
    pub address: String,
    pub phone_number: String,
    pub birthday: Option<Date>,
    pub job: String,
}

/// Validated signup data, password already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}
