use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::Subscription;

/// Persistence for the local subscription record.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>>;

    /// Create or overwrite the user's record with live provider ids and
    /// mark it active.
    async fn activate(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
    ) -> anyhow::Result<Subscription>;

    /// Flip `active` off, keeping the row and its provider ids.
    async fn deactivate(&self, user_id: Uuid) -> anyhow::Result<Subscription>;
}

/// Insert the inactive placeholder written at signup.
pub async fn insert_placeholder_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (user_id, stripe_customer_id, stripe_subscription_id, active)
        VALUES ($1, '', '', FALSE)
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .context("insert placeholder subscription")?;

    Ok(())
}

#[async_trait]
impl SubscriptionStore for PgPool {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, stripe_customer_id, stripe_subscription_id, active
              FROM subscriptions
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self)
        .await
        .context("find subscription by user")?;
        Ok(row)
    }

    async fn activate(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
    ) -> anyhow::Result<Subscription> {
        let mut tx = self.begin().await.context("begin tx")?;

        let row = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, stripe_customer_id, stripe_subscription_id, active)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (user_id) DO UPDATE
               SET stripe_customer_id = EXCLUDED.stripe_customer_id,
                   stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                   active = TRUE
            RETURNING id, user_id, stripe_customer_id, stripe_subscription_id, active
            "#,
        )
        .bind(user_id)
        .bind(customer_id)
        .bind(subscription_id)
        .fetch_one(&mut *tx)
        .await
        .context("upsert active subscription")?;

        sqlx::query(r#"UPDATE users SET is_paid_member = TRUE, paid_member_since = now() WHERE id = $1"#)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("mark paid member")?;

        tx.commit().await.context("commit tx")?;
        Ok(row)
    }

    async fn deactivate(&self, user_id: Uuid) -> anyhow::Result<Subscription> {
        let mut tx = self.begin().await.context("begin tx")?;

        let row = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
               SET active = FALSE
             WHERE user_id = $1
            RETURNING id, user_id, stripe_customer_id, stripe_subscription_id, active
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context("deactivate subscription")?;

        sqlx::query(r#"UPDATE users SET is_paid_member = FALSE, paid_member_since = NULL WHERE id = $1"#)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("clear paid member")?;

        tx.commit().await.context("commit tx")?;
        Ok(row)
    }
}
