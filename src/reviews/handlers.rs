use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ReviewPosted, ReviewRequest, ReviewView},
    services,
};
use crate::{auth::extractors::AuthUser, catalog::repo::find_shop, error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops/:id/reviews", post(create_review))
        .route("/reviews/:id", put(edit_review).delete(delete_review))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(shop_id): Path<i64>,
    Json(payload): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewPosted>), AppError> {
    find_shop(&state.db, shop_id)
        .await?
        .ok_or(AppError::NotFound("shop"))?;

    let review = services::create_review(&state.db, user_id, shop_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewPosted {
            notice: "Your review has been posted.",
            review: review.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn edit_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<i64>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewView>, AppError> {
    let review = services::edit_review(&state.db, user_id, review_id, &payload).await?;
    Ok(Json(review.into()))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_review(&state.db, user_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
