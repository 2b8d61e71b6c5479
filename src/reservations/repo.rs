use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Reservation, ReservationListing};

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert_reservation(
        &self,
        shop_id: i64,
        user_id: Uuid,
        date_time: OffsetDateTime,
        num_people: i32,
    ) -> anyhow::Result<Reservation>;
    async fn find_reservation(&self, id: i64) -> anyhow::Result<Option<Reservation>>;
    async fn delete_reservation(&self, id: i64) -> anyhow::Result<()>;
}

#[async_trait]
impl ReservationStore for PgPool {
    async fn insert_reservation(
        &self,
        shop_id: i64,
        user_id: Uuid,
        date_time: OffsetDateTime,
        num_people: i32,
    ) -> anyhow::Result<Reservation> {
        let row = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (shop_id, user_id, date_time, num_people)
            VALUES ($1, $2, $3, $4)
            RETURNING id, shop_id, user_id, date_time, num_people
            "#,
        )
        .bind(shop_id)
        .bind(user_id)
        .bind(date_time)
        .bind(num_people)
        .fetch_one(self)
        .await
        .context("insert reservation")?;
        Ok(row)
    }

    async fn find_reservation(&self, id: i64) -> anyhow::Result<Option<Reservation>> {
        let row = sqlx::query_as::<_, Reservation>(
            r#"SELECT id, shop_id, user_id, date_time, num_people FROM reservations WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(self)
        .await
        .context("find reservation")?;
        Ok(row)
    }

    async fn delete_reservation(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM reservations WHERE id = $1"#)
            .bind(id)
            .execute(self)
            .await
            .context("delete reservation")?;
        Ok(())
    }
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ReservationListing>> {
    let rows = sqlx::query_as::<_, ReservationListing>(
        r#"
        SELECT r.id, r.shop_id, s.name AS shop_name, r.date_time, r.num_people
          FROM reservations r
          JOIN shops s ON s.id = r.shop_id
         WHERE r.user_id = $1
         ORDER BY r.date_time
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list reservations")?;
    Ok(rows)
}
