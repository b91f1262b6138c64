//! REST API endpoints for the gateway.

pub mod auth;
pub mod health;
pub mod roles;
pub mod users;

use crate::state::GatewayState;
use axum::Router;

/// Routes that require an authenticated session.
pub fn create_protected_routes() -> Router<GatewayState> {
    Router::new()
        .merge(auth::create_auth_routes())
        .merge(users::create_user_routes())
        .merge(roles::create_role_routes())
}

/// Routes reachable without a session.
pub fn create_public_routes() -> Router<GatewayState> {
    Router::new()
        .merge(auth::create_login_route())
        .route("/health", axum::routing::get(health::health_check))
}
