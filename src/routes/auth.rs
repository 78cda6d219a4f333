use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::auth;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(axum::middleware::from_fn(require_auth))
        // Open routes - registration and login issue the token
        .route("/auth/register", post(auth::register_user))
        .route("/auth/login", post(auth::login_user))
}
