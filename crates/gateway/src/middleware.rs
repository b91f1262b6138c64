//! Session-authorization middleware and client-context extraction.

use crate::error::GatewayError;
use crate::state::GatewayState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use gymops_identity::{Device, IpAddress};
use std::net::SocketAddr;
use tracing::debug;
use uuid::Uuid;

/// Identity attached to the request after the session guard passes.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

/// The caller's IP address and device. The `IP-Address` and `Device` headers
/// override the connection-derived values when present; the device falls back
/// to the `User-Agent` header.
pub fn resolve_client(
    headers: &axum::http::HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<(IpAddress, Device), GatewayError> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let ip_text = header_value("IP-Address").or_else(|| peer.map(|addr| addr.ip().to_string()));
    let ip_address = IpAddress::new(&ip_text.unwrap_or_default())
        .map_err(|err| GatewayError::BadRequest(err.to_string()))?;

    let device_text = header_value("Device")
        .or_else(|| header_value(header::USER_AGENT.as_str()))
        .unwrap_or_else(|| "unknown".to_string());
    let device =
        Device::new(&device_text).map_err(|err| GatewayError::BadRequest(err.to_string()))?;

    Ok((ip_address, device))
}

fn client_context(request: &Request) -> Result<(IpAddress, Device), GatewayError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    resolve_client(request.headers(), peer)
}

/// Validates the bearer token and the live session state on every
/// authenticated request, then attaches an [`AuthContext`].
///
/// Token expiry is fed into the session validation so an expired token
/// expires its session as a side effect.
pub async fn session_guard(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| GatewayError::Unauthorized("Missing bearer token.".to_string()))?;

    let validated = state.token_issuer.validate(token)?;
    let user_id = validated.user_id()?;
    let session_id = validated.session_id()?;

    let (ip_address, device) = client_context(&request)?;
    state
        .auth_service
        .validate_and_update_session(user_id, session_id, validated.expired, ip_address, device)
        .await?;

    debug!(user = %user_id, session = %session_id, "request authorized");
    request
        .extensions_mut()
        .insert(AuthContext { user_id, session_id });
    Ok(next.run(request).await)
}
