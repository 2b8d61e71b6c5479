use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub category_l: String, // group label, used for ordering
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub pr_long: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<i32>, // budget in yen
    pub address: Option<String>,
    pub region: Option<String>,
    pub tel: Option<String>,
    pub opening_hours: Option<String>,
    pub regular_holiday: Option<String>,
    pub category_id: i64,
    pub rating: f64,
}

/// Review count and mean score for one shop.
#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct RatingStats {
    pub review_count: i64,
    pub average: Option<f64>,
}
