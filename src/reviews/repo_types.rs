use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub shop_id: i64,
    pub user_id: Uuid,
    pub score: i32, // 1..=5
    pub comment: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Review joined with its author and shop names, for listings.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewListing {
    pub id: i64,
    pub shop_id: i64,
    pub shop_name: String,
    pub user_id: Uuid,
    pub username: String,
    pub score: i32,
    pub comment: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
