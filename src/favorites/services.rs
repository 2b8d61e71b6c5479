use tracing::info;
use uuid::Uuid;

use super::{repo::FavoriteStore, repo_types::Favorite};
use crate::{
    billing::{gate::require_paid_member, repo::SubscriptionStore},
    error::AppError,
};

pub async fn add<S>(store: &S, user_id: Uuid, shop_id: i64) -> Result<Favorite, AppError>
where
    S: FavoriteStore + SubscriptionStore + ?Sized,
{
    let member = require_paid_member(store, user_id).await?;
    let favorite = store.add_favorite(shop_id, member.user_id()).await?;
    info!(shop_id, %user_id, "favorite added");
    Ok(favorite)
}

/// Unfavorite from the shop page, which is a paid-only action.
pub async fn remove_from_shop<S>(store: &S, user_id: Uuid, shop_id: i64) -> Result<u64, AppError>
where
    S: FavoriteStore + SubscriptionStore + ?Sized,
{
    let member = require_paid_member(store, user_id).await?;
    remove(store, member.user_id(), shop_id).await
}

/// Unfavorite from the mypage list; any signed-in user may do this.
/// An unknown shop is 404, a known shop with nothing to remove is not.
pub async fn remove<S>(store: &S, user_id: Uuid, shop_id: i64) -> Result<u64, AppError>
where
    S: FavoriteStore + ?Sized,
{
    if !store.shop_exists(shop_id).await? {
        return Err(AppError::NotFound("shop"));
    }
    let removed = store.remove_favorite(shop_id, user_id).await?;
    info!(shop_id, %user_id, removed, "favorite removed");
    Ok(removed)
}
