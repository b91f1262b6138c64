//! Shared application state for the gateway.

use chrono::Duration;
use gymops_config::AppConfig;
use gymops_identity::{
    AuthService, AvatarStorage, PermissionRepository, RoleRepository, RoleService, TokenIssuer,
    UserRepository, UserService,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared state holding the domain services and the token issuer.
#[derive(Clone)]
pub struct GatewayState {
    pub pool: SqlitePool,
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub role_service: Arc<RoleService>,
    pub token_issuer: Arc<TokenIssuer>,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        let user_service = UserService::new(
            UserRepository::new(pool.clone()),
            RoleRepository::new(pool.clone()),
            AvatarStorage::new(config.storage.media_root.clone()),
        );
        let auth_service = AuthService::new(UserRepository::new(pool.clone()));
        let role_service = RoleService::new(
            RoleRepository::new(pool.clone()),
            PermissionRepository::new(pool.clone()),
        );
        let token_issuer = TokenIssuer::new(
            &config.auth.jwt_secret,
            config.auth.jwt_issuer.clone(),
            config.auth.jwt_audience.clone(),
            Duration::seconds(config.auth.token_ttl_seconds as i64),
        );

        Self {
            pool,
            user_service: Arc::new(user_service),
            auth_service: Arc::new(auth_service),
            role_service: Arc::new(role_service),
            token_issuer: Arc::new(token_issuer),
        }
    }
}
