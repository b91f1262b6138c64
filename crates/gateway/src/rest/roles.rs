//! Role and permission catalog endpoints.

use crate::error::GatewayResult;
use crate::state::GatewayState;
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use gymops_identity::{Permission, Role};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub fn create_role_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/roles", get(list_roles).post(create_role))
        .route("/api/roles/:id", put(update_role).delete(delete_role))
        .route("/api/roles/:id/permissions", put(update_permissions))
        .route(
            "/api/roles/:id/permissions/:permission_id",
            put(add_permission).delete(remove_permission),
        )
        .route("/api/permissions", get(list_permissions).post(create_permission))
        .route(
            "/api/permissions/:id",
            put(update_permission).delete(delete_permission),
        )
}

#[derive(Debug, Deserialize)]
pub struct NameTitleRequest {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionIdsRequest {
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub permission_ids: Vec<Uuid>,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id(),
            name: role.name().to_string(),
            title: role.title().to_string(),
            permission_ids: role.permission_ids().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
    pub title: String,
}

impl From<&Permission> for PermissionResponse {
    fn from(permission: &Permission) -> Self {
        Self {
            id: permission.id(),
            name: permission.name().to_string(),
            title: permission.title().to_string(),
        }
    }
}

async fn list_roles(State(state): State<GatewayState>) -> GatewayResult<Json<Vec<RoleResponse>>> {
    let roles = state.role_service.list_roles().await?;
    Ok(Json(roles.iter().map(RoleResponse::from).collect()))
}

async fn create_role(
    State(state): State<GatewayState>,
    Json(body): Json<NameTitleRequest>,
) -> GatewayResult<Json<RoleResponse>> {
    let role = state.role_service.create_role(&body.name, &body.title).await?;
    Ok(Json(RoleResponse::from(&role)))
}

async fn update_role(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NameTitleRequest>,
) -> GatewayResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .update_role(id, &body.name, &body.title)
        .await?;
    Ok(Json(RoleResponse::from(&role)))
}

async fn delete_role(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> GatewayResult<Json<Value>> {
    state.role_service.delete_role(id).await?;
    Ok(Json(json!({ "message": "Role deleted." })))
}

async fn add_permission(
    State(state): State<GatewayState>,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> GatewayResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .add_permission_to_role(id, permission_id)
        .await?;
    Ok(Json(RoleResponse::from(&role)))
}

async fn remove_permission(
    State(state): State<GatewayState>,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> GatewayResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .remove_permission_from_role(id, permission_id)
        .await?;
    Ok(Json(RoleResponse::from(&role)))
}

async fn update_permissions(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PermissionIdsRequest>,
) -> GatewayResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .update_permissions(id, &body.permission_ids)
        .await?;
    Ok(Json(RoleResponse::from(&role)))
}

async fn list_permissions(
    State(state): State<GatewayState>,
) -> GatewayResult<Json<Vec<PermissionResponse>>> {
    let permissions = state.role_service.list_permissions().await?;
    Ok(Json(permissions.iter().map(PermissionResponse::from).collect()))
}

async fn create_permission(
    State(state): State<GatewayState>,
    Json(body): Json<NameTitleRequest>,
) -> GatewayResult<Json<PermissionResponse>> {
    let permission = state
        .role_service
        .create_permission(&body.name, &body.title)
        .await?;
    Ok(Json(PermissionResponse::from(&permission)))
}

async fn update_permission(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NameTitleRequest>,
) -> GatewayResult<Json<PermissionResponse>> {
    let permission = state
        .role_service
        .update_permission(id, &body.name, &body.title)
        .await?;
    Ok(Json(PermissionResponse::from(&permission)))
}

async fn delete_permission(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> GatewayResult<Json<Value>> {
    state.role_service.delete_permission(id).await?;
    Ok(Json(json!({ "message": "Permission deleted." })))
}
