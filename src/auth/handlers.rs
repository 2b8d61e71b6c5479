use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{
        AuthResponse, LoginRequest, MyPageResponse, ProfileEditRequest, ProfileResponse,
        RefreshRequest, SignupRequest, SignupResponse,
    },
    extractors::AuthUser,
    jwt::JwtKeys,
    repo::{self, AccountStore},
    repo_types::Profile,
    services,
};
use crate::{
    billing::repo::SubscriptionStore,
    error::{is_unique_violation, AppError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn mypage_routes() -> Router<AppState> {
    Router::new()
        .route("/mypage", get(mypage))
        .route("/mypage/profile", get(get_profile).put(edit_profile))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let (user, checkout_url) =
        services::signup(&state.db, state.payments.as_ref(), &state.config, payload).await?;

    let keys = JwtKeys::from_ref(&state);
    let auth = services::issue_tokens(&keys, user)?;
    Ok((StatusCode::CREATED, Json(SignupResponse { auth, checkout_url })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = services::login(&state.db, &payload.login, &payload.password).await?;
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(services::issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = state
        .db
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(services::issue_tokens(&keys, user)?))
}

/// Tokens are stateless; the client discards them.
#[instrument(skip_all)]
pub async fn logout(AuthUser(user_id): AuthUser) -> StatusCode {
    info!(%user_id, "user logged out");
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn mypage(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MyPageResponse>, AppError> {
    let user = state
        .db
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    let subscription = state.db.find_by_user(user_id).await?;

    Ok(Json(MyPageResponse {
        user: user.into(),
        subscription: subscription.map(Into::into),
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .db
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    let profile = repo::get_profile(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    Ok(Json(ProfileResponse::new(user, profile)))
}

#[instrument(skip(state, payload))]
pub async fn edit_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<ProfileEditRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    services::validate_profile_edit(&mut payload)?;

    let profile = Profile {
        user_id,
        username_kana: payload.username_kana,
        postal_code: payload.postal_code,
        address: payload.address,
        phone_number: payload.phone_number,
        birthday: payload.birthday,
        job: payload.job,
    };
    let (user, profile) = match repo::update_profile(
        &state.db,
        user_id,
        &payload.username,
        &payload.email,
        &profile,
    )
    .await
    {
        Ok(pair) => pair,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("Email or username already in use".into()))
        }
        Err(e) => return Err(e.into()),
    };

    info!(%user_id, "profile updated");
    Ok(Json(ProfileResponse::new(user, profile)))
}
