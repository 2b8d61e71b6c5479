use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Favorite {
    pub id: i64,
    pub shop_id: i64,
    pub user_id: Uuid,
}

/// A favorite with the shop summary the mypage list shows.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FavoriteShop {
    pub id: i64,
    pub shop_id: i64,
    pub shop_name: String,
    pub region: Option<String>,
    pub price_range: Option<i32>,
    pub rating: f64,
}
