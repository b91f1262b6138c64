//! Authentication endpoints: login, logout, profile, sessions, avatar.

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::{resolve_client, AuthContext};
use crate::state::GatewayState;
use axum::{
    extract::{ConnectInfo, Multipart, State},
    http::HeaderMap,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use gymops_identity::{Session, User};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use uuid::Uuid;

pub fn create_auth_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/profile", get(profile).put(update_profile))
        .route("/api/auth/sessions", get(sessions))
        .route("/api/auth/avatar", post(upload_avatar))
}

/// The login route is anonymous and mounted outside the session guard.
pub fn create_login_route() -> Router<GatewayState> {
    Router::new().route("/api/auth/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub ip_address: String,
    pub device: String,
    pub status: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub national_code: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub avatar_web_path: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub national_code: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub ip_address: String,
    pub device: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub is_current_session: bool,
}

fn profile_response(user: &User, roles: Vec<String>) -> ProfileResponse {
    ProfileResponse {
        id: user.id(),
        phone_number: user.phone_number().to_string(),
        national_code: user.national_code().to_string(),
        first_name: user.first_name().to_string(),
        last_name: user.last_name().to_string(),
        status: user.status().name().to_string(),
        avatar_web_path: user
            .avatar()
            .map(|m| m.web_path().to_string())
            .unwrap_or_else(|| gymops_identity::Media::default_avatar().web_path().to_string()),
        roles,
    }
}

fn session_response(session: &Session, current_session_id: Uuid) -> SessionResponse {
    SessionResponse {
        session_id: session.id(),
        ip_address: session.ip_address().to_string(),
        device: session.device().to_string(),
        status: session.status().name().to_string(),
        created_at: session.created_at(),
        last_activity_at: session.last_activity_at(),
        is_current_session: session.id() == current_session_id,
    }
}

async fn login(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(body): Json<LoginRequest>,
) -> GatewayResult<Json<LoginResponse>> {
    let (ip_address, device) = resolve_client(&headers, peer.map(|info| info.0))?;

    let outcome = state
        .auth_service
        .login(&body.phone_number, &body.password, ip_address, device)
        .await?;
    let roles = state.user_service.get_roles(&outcome.user).await?;
    let (access_token, expires_at) = state.token_issuer.issue(
        outcome.user.id(),
        &outcome.user.full_name(),
        outcome.session.id(),
        roles,
    )?;

    Ok(Json(LoginResponse {
        session_id: outcome.session.id(),
        user_id: outcome.user.id(),
        ip_address: outcome.session.ip_address().to_string(),
        device: outcome.session.device().to_string(),
        status: outcome.session.status().name().to_string(),
        access_token,
        expires_at,
    }))
}

async fn logout(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
) -> GatewayResult<Json<Value>> {
    state
        .auth_service
        .logout(auth.user_id, auth.session_id)
        .await?;
    Ok(Json(json!({ "message": "Logged out." })))
}

async fn logout_all(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
) -> GatewayResult<Json<Value>> {
    state.auth_service.logout_all_sessions(auth.user_id).await?;
    Ok(Json(json!({ "message": "All sessions ended." })))
}

async fn profile(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
) -> GatewayResult<Json<ProfileResponse>> {
    let user = state
        .user_service
        .get(auth.user_id)
        .await
        .map_err(|_| GatewayError::NotFound("User not found.".to_string()))?;
    let roles = state.user_service.get_roles(&user).await?;
    Ok(Json(profile_response(&user, roles)))
}

async fn update_profile(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<UpdateProfileRequest>,
) -> GatewayResult<Json<ProfileResponse>> {
    let user = state
        .user_service
        .update_profile(
            auth.user_id,
            &body.first_name,
            &body.last_name,
            &body.national_code,
        )
        .await?;
    let roles = state.user_service.get_roles(&user).await?;
    Ok(Json(profile_response(&user, roles)))
}

async fn sessions(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
) -> GatewayResult<Json<Vec<SessionResponse>>> {
    let user = state.user_service.get(auth.user_id).await?;
    let sessions = user
        .sessions()
        .iter()
        .map(|session| session_response(session, auth.session_id))
        .collect();
    Ok(Json(sessions))
}

async fn upload_avatar(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> GatewayResult<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| GatewayError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::BadRequest("Missing file name.".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| GatewayError::BadRequest(err.to_string()))?;

        let media = state
            .user_service
            .update_avatar(auth.user_id, &file_name, &bytes)
            .await?;
        return Ok(Json(json!({
            "web_path": media.web_path(),
            "size": media.size(),
        })));
    }
    Err(GatewayError::BadRequest(
        "Missing 'file' field in upload.".to_string(),
    ))
}
