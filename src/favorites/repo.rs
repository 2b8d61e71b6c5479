use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Favorite, FavoriteShop};

/// Favorites are not unique per (shop, user); removal clears every row.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn add_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<Favorite>;
    /// Returns the number of rows removed.
    async fn remove_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<u64>;
    async fn is_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<bool>;
    async fn shop_exists(&self, shop_id: i64) -> anyhow::Result<bool>;
}

#[async_trait]
impl FavoriteStore for PgPool {
    async fn add_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<Favorite> {
        let row = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (shop_id, user_id)
            VALUES ($1, $2)
            RETURNING id, shop_id, user_id
            "#,
        )
        .bind(shop_id)
        .bind(user_id)
        .fetch_one(self)
        .await
        .context("insert favorite")?;
        Ok(row)
    }

    async fn remove_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM favorites WHERE shop_id = $1 AND user_id = $2"#)
            .bind(shop_id)
            .bind(user_id)
            .execute(self)
            .await
            .context("delete favorites")?;
        Ok(res.rows_affected())
    }

    async fn is_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM favorites WHERE shop_id = $1 AND user_id = $2)"#,
        )
        .bind(shop_id)
        .bind(user_id)
        .fetch_one(self)
        .await
        .context("check favorite")?;
        Ok(exists)
    }

    async fn shop_exists(&self, shop_id: i64) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM shops WHERE id = $1)"#)
                .bind(shop_id)
                .fetch_one(self)
                .await
                .context("check shop exists")?;
        Ok(exists)
    }
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<FavoriteShop>> {
    let rows = sqlx::query_as::<_, FavoriteShop>(
        r#"
        SELECT f.id, f.shop_id, s.name AS shop_name, s.region, s.price_range, s.rating
          FROM favorites f
          JOIN shops s ON s.id = f.shop_id
         WHERE f.user_id = $1
         ORDER BY f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list favorites")?;
    Ok(rows)
}
