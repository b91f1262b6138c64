//! Administrative user management endpoints.

use crate::error::GatewayResult;
use crate::state::GatewayState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use gymops_identity::{CreateUser, User};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub fn create_user_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user).delete(delete_user))
        .route(
            "/api/users/:id/roles",
            post(assign_roles)
                .put(update_roles)
                .delete(unassign_roles),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub phone_number: String,
    pub national_code: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleNamesRequest {
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub national_code: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub role_ids: Vec<Uuid>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            phone_number: user.phone_number().to_string(),
            national_code: user.national_code().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            status: user.status().name().to_string(),
            role_ids: user.role_ids().to_vec(),
        }
    }
}

async fn create_user(
    State(state): State<GatewayState>,
    Json(body): Json<CreateUserRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .user_service
        .create(CreateUser {
            phone_number: body.phone_number,
            national_code: body.national_code,
            first_name: body.first_name,
            last_name: body.last_name,
            password: body.password,
        })
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn get_user(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.user_service.get(id).await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn delete_user(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> GatewayResult<Json<Value>> {
    state.user_service.delete(id).await?;
    Ok(Json(json!({ "message": "User deleted." })))
}

async fn assign_roles(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleNamesRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.user_service.assign_roles(id, &body.roles).await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn update_roles(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleNamesRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.user_service.update_roles(id, &body.roles).await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn unassign_roles(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleNamesRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.user_service.unassign_roles(id, &body.roles).await?;
    Ok(Json(UserResponse::from(&user)))
}
