//! HTTP boundary for the gym back office.
//!
//! Exposes the REST API and wraps every authenticated route in the session
//! guard: bearer token validation plus a live check of the session row, so a
//! logged-out, expired, or stale session is rejected per request.

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;

pub use error::{GatewayError, GatewayResult};
pub use middleware::{session_guard, AuthContext};
pub use state::GatewayState;

use axum::{http::Method, middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router: public routes, guarded routes, CORS, and
/// request tracing.
pub fn create_router(state: GatewayState) -> Router {
    let protected = rest::create_protected_routes().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::session_guard),
    );

    Router::new()
        .merge(rest::create_public_routes())
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
