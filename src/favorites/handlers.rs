use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use super::{repo, repo_types::FavoriteShop, services};
use crate::{
    auth::extractors::AuthUser, billing::dto::Notice, catalog::repo::find_shop, error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops/:id/favorite", post(add_favorite).delete(remove_favorite))
        .route("/mypage/favorites", get(list_favorites))
        .route("/mypage/favorites/:shop_id", delete(unfavorite))
}

#[derive(Debug, Serialize)]
pub struct FavoriteList {
    pub favorites: Vec<FavoriteShop>,
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(shop_id): Path<i64>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    find_shop(&state.db, shop_id)
        .await?
        .ok_or(AppError::NotFound("shop"))?;
    services::add(&state.db, user_id, shop_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice {
            notice: "Added to favorites.",
        }),
    ))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(shop_id): Path<i64>,
) -> Result<Json<Notice>, AppError> {
    find_shop(&state.db, shop_id)
        .await?
        .ok_or(AppError::NotFound("shop"))?;
    services::remove_from_shop(&state.db, user_id, shop_id).await?;
    Ok(Json(Notice {
        notice: "Removed from favorites.",
    }))
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<FavoriteList>, AppError> {
    let favorites = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(FavoriteList { favorites }))
}

#[instrument(skip(state))]
pub async fn unfavorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(shop_id): Path<i64>,
) -> Result<Json<Notice>, AppError> {
    services::remove(&state.db, user_id, shop_id).await?;
    Ok(Json(Notice {
        notice: "Removed from favorites.",
    }))
}
