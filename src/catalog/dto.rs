use serde::Serialize;

use super::repo_types::{Category, Shop};
use crate::reviews::dto::ReviewListItem;

/// Mean score as a percentage of five stars; 0 for an unreviewed shop.
pub fn average_rate(average: Option<f64>) -> f64 {
    match average {
        Some(avg) if avg > 0.0 => avg / 5.0 * 100.0,
        _ => 0.0,
    }
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub pickup_shops: Vec<Shop>,
    pub latest_reviews: Vec<ReviewListItem>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total_hit_count: i64,
    pub shops: Vec<Shop>,
}

#[derive(Debug, Serialize)]
pub struct ShopDetail {
    pub shop: Shop,
    pub category: Option<Category>,
    pub review_count: i64,
    pub average: Option<f64>,
    pub average_rate: f64,
    pub reviews: Vec<ReviewListItem>,
    pub is_favorite: bool,
}
