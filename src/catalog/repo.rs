use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{Category, RatingStats, Shop};

pub(crate) const SHOP_COLUMNS: &str = "s.id, s.name, s.pr_long, s.description, s.price_range, \
     s.address, s.region, s.tel, s.opening_hours, s.regular_holiday, s.category_id, s.rating";

pub async fn list_categories(db: &PgPool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, category_l, name
          FROM categories
         ORDER BY category_l, id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list categories")?;
    Ok(rows)
}

pub async fn find_category(db: &PgPool, id: i64) -> anyhow::Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(
        r#"SELECT id, category_l, name FROM categories WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find category")?;
    Ok(row)
}

pub async fn find_shop(db: &PgPool, id: i64) -> anyhow::Result<Option<Shop>> {
    let row = sqlx::query_as::<_, Shop>(&format!("SELECT {SHOP_COLUMNS} FROM shops s WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find shop")?;
    Ok(row)
}

/// Shops featured on the index page.
pub async fn pickup_shops(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Shop>> {
    let rows = sqlx::query_as::<_, Shop>(&format!(
        "SELECT {SHOP_COLUMNS} FROM shops s ORDER BY s.id LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await
    .context("pickup shops")?;
    Ok(rows)
}

pub async fn rating_stats(db: &PgPool, shop_id: i64) -> anyhow::Result<RatingStats> {
    let stats = sqlx::query_as::<_, RatingStats>(
        r#"
        SELECT COUNT(*) AS review_count, AVG(score)::float8 AS average
          FROM reviews
         WHERE shop_id = $1
        "#,
    )
    .bind(shop_id)
    .fetch_one(db)
    .await
    .context("rating stats")?;
    Ok(stats)
}

/// Recompute the denormalised shop rating from its reviews. A shop whose
/// last review was removed keeps its previous rating.
pub async fn refresh_rating_tx(
    tx: &mut Transaction<'_, Postgres>,
    shop_id: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE shops
           SET rating = agg.avg_score
          FROM (SELECT AVG(score)::float8 AS avg_score FROM reviews WHERE shop_id = $1) agg
         WHERE shops.id = $1
           AND agg.avg_score IS NOT NULL
        "#,
    )
    .bind(shop_id)
    .execute(&mut **tx)
    .await
    .context("refresh shop rating")?;
    Ok(())
}
