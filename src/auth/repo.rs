use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewAccount, Profile, User};
use crate::billing::repo::insert_placeholder_tx;

const USER_COLUMNS: &str =
    "id, email, username, password_hash, is_paid_member, paid_member_since, created_at";

/// Account persistence used by signup and login.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Create the user, its profile and the inactive subscription
    /// placeholder as one atomic step.
    async fn create_account(&self, account: &NewAccount) -> anyhow::Result<User>;
}

#[async_trait]
impl AccountStore for PgPool {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    async fn create_account(&self, account: &NewAccount) -> anyhow::Result<User> {
        let mut tx = self.begin().await.context("begin tx")?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;

        sqlx::query(r#"INSERT INTO profiles (user_id) VALUES ($1)"#)
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .context("insert profile")?;

        insert_placeholder_tx(&mut tx, user.id).await?;

        tx.commit().await.context("commit tx")?;
        Ok(user)
    }
}

// ---- Profile ----

pub async fn get_profile(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT user_id, username_kana, postal_code, address, phone_number, birthday, job
          FROM profiles
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get profile")?;
    Ok(profile)
}

/// Update identity fields on the user and the rest on the profile, together.
pub async fn update_profile(
    db: &PgPool,
    user_id: Uuid,
    username: &str,
    email: &str,
    profile: &Profile,
) -> anyhow::Result<(User, Profile)> {
    let mut tx = db.begin().await.context("begin tx")?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET username = $2, email = $3
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(username)
    .bind(email)
    .fetch_one(&mut *tx)
    .await
    .context("update user")?;

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
           SET username_kana = $2, postal_code = $3, address = $4,
               phone_number = $5, birthday = $6, job = $7
         WHERE user_id = $1
        RETURNING user_id, username_kana, postal_code, address, phone_number, birthday, job
        "#,
    )
    .bind(user_id)
    .bind(&profile.username_kana)
    .bind(&profile.postal_code)
    .bind(&profile.address)
    .bind(&profile.phone_number)
    .bind(profile.birthday)
    .bind(&profile.job)
    .fetch_one(&mut *tx)
    .await
    .context("update profile")?;

    tx.commit().await.context("commit tx")?;
    Ok((user, profile))
}
