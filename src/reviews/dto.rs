use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Review, ReviewListing};

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub score: i32,
    pub comment: String,
}

/// Score as a percentage of five stars, for star-bar widths.
pub fn score_percent(score: i32) -> i32 {
    (f64::from(score) / 5.0 * 100.0).round() as i32
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: i64,
    pub shop_id: i64,
    pub user_id: Uuid,
    pub score: i32,
    pub percent: i32,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Review> for ReviewView {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            shop_id: r.shop_id,
            user_id: r.user_id,
            score: r.score,
            percent: score_percent(r.score),
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewListItem {
    pub id: i64,
    pub shop_id: i64,
    pub shop_name: String,
    pub user_id: Uuid,
    pub username: String,
    pub score: i32,
    pub percent: i32,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ReviewListing> for ReviewListItem {
    fn from(r: ReviewListing) -> Self {
        Self {
            id: r.id,
            shop_id: r.shop_id,
            shop_name: r.shop_name,
            user_id: r.user_id,
            username: r.username,
            score: r.score,
            percent: score_percent(r.score),
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewPosted {
    pub notice: &'static str,
    pub review: ReviewView,
}
