use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        CheckoutSessionResponse, Notice, ProviderConfig, SubscribeRequest, SubscriptionChanged,
        SubscriptionPage,
    },
    repo::SubscriptionStore,
    services,
};
use crate::{
    auth::{extractors::AuthUser, repo::AccountStore},
    error::AppError,
    state::AppState,
};

pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscription", get(subscription_page))
        .route("/subscribe", post(subscribe))
        .route("/subscription/config", get(provider_config))
        .route("/subscription/checkout-session", post(create_checkout_session))
        .route("/subscription/success", get(checkout_success))
        .route("/subscription/cancel", get(checkout_cancelled))
}

pub fn mypage_routes() -> Router<AppState> {
    Router::new()
        .route("/mypage/payment-method", get(subscription_page))
        .route("/mypage/cancel-subscription", post(cancel_subscription))
}

/// Serves both the subscription page and the payment-method page.
#[instrument(skip(state))]
pub async fn subscription_page(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscriptionPage>, AppError> {
    let subscription = state.db.find_by_user(user_id).await?;
    let notice = subscription
        .is_none()
        .then_some("A paid membership is required to use this feature.");

    Ok(Json(SubscriptionPage {
        subscription: subscription.map(Into::into),
        notice,
        stripe_publishable_key: state.config.stripe.publishable_key.clone(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscriptionChanged>), AppError> {
    let user = state
        .db
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    let subscription = services::subscribe(
        &state.db,
        state.payments.as_ref(),
        user_id,
        &user.email,
        payload.token.as_deref(),
        payload.name.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionChanged {
            status: "success",
            notice: "Your subscription has been registered.",
            subscription: subscription.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscriptionChanged>, AppError> {
    let subscription = services::cancel(&state.db, state.payments.as_ref(), user_id).await?;
    Ok(Json(SubscriptionChanged {
        status: "success",
        notice: "Your paid membership has been cancelled.",
        subscription: subscription.into(),
    }))
}

pub async fn provider_config(State(state): State<AppState>) -> Json<ProviderConfig> {
    Json(ProviderConfig {
        public_key: state.config.stripe.publishable_key.clone(),
    })
}

#[instrument(skip(state))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
) -> Result<Json<CheckoutSessionResponse>, AppError> {
    let link = services::start_checkout(state.payments.as_ref(), &state.config, None).await?;
    Ok(Json(CheckoutSessionResponse {
        session_id: link.session_id,
        url: link.url,
    }))
}

pub async fn checkout_success() -> Json<Notice> {
    Json(Notice {
        notice: "Payment succeeded.",
    })
}

pub async fn checkout_cancelled() -> Json<Notice> {
    Json(Notice {
        notice: "Payment was cancelled.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn provider_config_exposes_publishable_key() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(Request::get("/api/v1/subscription/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["publicKey"], "pk_test_fake");
    }

    #[tokio::test]
    async fn checkout_session_returns_provider_session() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(
                Request::post("/api/v1/subscription/checkout-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["sessionId"], "cs_test_1");
    }

    #[tokio::test]
    async fn cancel_requires_authentication() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(
                Request::post("/api/v1/mypage/cancel-subscription")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
