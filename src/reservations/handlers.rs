use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ReservationCreated, ReservationList, ReservationRequest},
    repo, services,
};
use crate::{
    auth::extractors::AuthUser, catalog::repo::find_shop, error::AppError, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops/:id/reservations", post(create_reservation))
        .route("/mypage/reservations", get(list_reservations))
        .route("/mypage/reservations/:id", delete(cancel_reservation))
}

#[instrument(skip(state, payload))]
pub async fn create_reservation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(shop_id): Path<i64>,
    Json(payload): Json<ReservationRequest>,
) -> Result<(StatusCode, Json<ReservationCreated>), AppError> {
    find_shop(&state.db, shop_id)
        .await?
        .ok_or(AppError::NotFound("shop"))?;

    let reservation = services::create(&state.db, user_id, shop_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationCreated {
            notice: "Your reservation is complete.",
            reservation,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_reservations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ReservationList>, AppError> {
    let reservations = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(ReservationList { reservations }))
}

#[instrument(skip(state))]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(reservation_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::cancel(&state.db, user_id, reservation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
