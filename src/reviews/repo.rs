use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Review, ReviewListing};
use crate::catalog::repo::refresh_rating_tx;

const REVIEW_COLUMNS: &str = "id, shop_id, user_id, score, comment, created_at, updated_at";

/// Review persistence. Every write also refreshes the shop's rating.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_review(&self, id: i64) -> anyhow::Result<Option<Review>>;
    async fn find_review_by_author(
        &self,
        shop_id: i64,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Review>>;
    async fn insert_review(
        &self,
        shop_id: i64,
        user_id: Uuid,
        score: i32,
        comment: &str,
    ) -> anyhow::Result<Review>;
    async fn update_review(&self, id: i64, score: i32, comment: &str) -> anyhow::Result<Review>;
    async fn delete_review(&self, id: i64) -> anyhow::Result<()>;
}

#[async_trait]
impl ReviewStore for PgPool {
    async fn find_review(&self, id: i64) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self)
        .await
        .context("find review")?;
        Ok(row)
    }

    async fn find_review_by_author(
        &self,
        shop_id: i64,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE shop_id = $1 AND user_id = $2"
        ))
        .bind(shop_id)
        .bind(user_id)
        .fetch_optional(self)
        .await
        .context("find review by author")?;
        Ok(row)
    }

    async fn insert_review(
        &self,
        shop_id: i64,
        user_id: Uuid,
        score: i32,
        comment: &str,
    ) -> anyhow::Result<Review> {
        let mut tx = self.begin().await.context("begin tx")?;
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (shop_id, user_id, score, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(shop_id)
        .bind(user_id)
        .bind(score)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .context("insert review")?;
        refresh_rating_tx(&mut tx, shop_id).await?;
        tx.commit().await.context("commit tx")?;
        Ok(review)
    }

    async fn update_review(&self, id: i64, score: i32, comment: &str) -> anyhow::Result<Review> {
        let mut tx = self.begin().await.context("begin tx")?;
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
               SET score = $2, comment = $3, updated_at = now()
             WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(score)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .context("update review")?;
        refresh_rating_tx(&mut tx, review.shop_id).await?;
        tx.commit().await.context("commit tx")?;
        Ok(review)
    }

    async fn delete_review(&self, id: i64) -> anyhow::Result<()> {
        let mut tx = self.begin().await.context("begin tx")?;
        let shop_id: Option<i64> =
            sqlx::query_scalar(r#"DELETE FROM reviews WHERE id = $1 RETURNING shop_id"#)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("delete review")?;
        if let Some(shop_id) = shop_id {
            refresh_rating_tx(&mut tx, shop_id).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }
}

const LISTING_SELECT: &str = r#"
    SELECT r.id, r.shop_id, s.name AS shop_name, r.user_id, u.username,
           r.score, r.comment, r.created_at, r.updated_at
      FROM reviews r
      JOIN shops s ON s.id = r.shop_id
      JOIN users u ON u.id = r.user_id
"#;

pub async fn list_for_shop(db: &PgPool, shop_id: i64) -> anyhow::Result<Vec<ReviewListing>> {
    let rows = sqlx::query_as::<_, ReviewListing>(&format!(
        "{LISTING_SELECT} WHERE r.shop_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(shop_id)
    .fetch_all(db)
    .await
    .context("list reviews for shop")?;
    Ok(rows)
}

pub async fn latest(db: &PgPool, limit: i64) -> anyhow::Result<Vec<ReviewListing>> {
    let rows = sqlx::query_as::<_, ReviewListing>(&format!(
        "{LISTING_SELECT} ORDER BY r.created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await
    .context("latest reviews")?;
    Ok(rows)
}
