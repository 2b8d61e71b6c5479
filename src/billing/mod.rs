use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod gate;
pub mod handlers;
pub mod provider;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::subscription_routes())
        .merge(handlers::mypage_routes())
}
