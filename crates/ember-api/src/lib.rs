pub mod auth;
pub mod error;
pub mod friends;
pub mod middleware;
pub mod pins;
pub mod users;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;

/// All REST routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/me", get(users::get_me))
        .route("/users/{user_id}", get(users::get_user))
        .route("/friends", get(friends::list_friends))
        .route("/friends/{friend_id}", delete(friends::delete_friend))
        .route("/friends/requests", get(friends::list_requests))
        .route(
            "/friends/requests/{friend_id}",
            post(friends::send_request).patch(friends::update_request),
        )
        .route("/pins", post(pins::create_pin))
        .route("/pins/me", get(pins::my_pins))
        .route("/pins/friends", get(pins::friend_pins))
        .route("/pins/nearby", get(pins::nearby_pins))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Run blocking store work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal("blocking task failed".into())
    })?
}
