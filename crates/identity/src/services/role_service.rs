//! Role and permission catalog management.

use crate::entities::{Permission, Role};
use crate::repositories::{PermissionRepository, RoleRepository};
use crate::types::{UserError, UserResult};
use crate::utils::normalize::normalize_text;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

pub struct RoleService {
    roles: RoleRepository,
    permissions: PermissionRepository,
}

impl RoleService {
    pub fn new(roles: RoleRepository, permissions: PermissionRepository) -> Self {
        Self { roles, permissions }
    }

    // --- roles ---

    pub async fn create_role(&self, name: &str, title: &str) -> UserResult<Role> {
        let name = normalize_text(name);
        let title = normalize_text(title);
        if name.is_empty() {
            return Err(UserError::Validation(
                "Role name cannot be empty.".to_string(),
            ));
        }
        if self.roles.find_by_name(&name).await?.is_some() {
            return Err(UserError::RoleNameTaken);
        }
        let mut role = Role::new(name, title);
        self.roles.save(&mut role).await?;
        info!(role = %role.id(), name = role.name(), "role created");
        Ok(role)
    }

    pub async fn update_role(&self, role_id: Uuid, name: &str, title: &str) -> UserResult<Role> {
        let name = normalize_text(name);
        let title = normalize_text(title);
        if name.is_empty() {
            return Err(UserError::Validation(
                "Role name cannot be empty.".to_string(),
            ));
        }
        let mut role = self.get_role(role_id).await?;
        if let Some(existing) = self.roles.find_by_name(&name).await? {
            if existing.id() != role_id {
                return Err(UserError::RoleNameTaken);
            }
        }
        role.update(name, title);
        self.roles.save(&mut role).await?;
        Ok(role)
    }

    pub async fn delete_role(&self, role_id: Uuid) -> UserResult<()> {
        self.roles.delete(role_id).await?;
        info!(role = %role_id, "role deleted");
        Ok(())
    }

    pub async fn get_role(&self, role_id: Uuid) -> UserResult<Role> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or(UserError::RoleNotFound)
    }

    pub async fn list_roles(&self) -> UserResult<Vec<Role>> {
        self.roles.find_all().await
    }

    pub async fn add_permission_to_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> UserResult<Role> {
        let mut role = self.get_role(role_id).await?;
        if self.permissions.find_by_id(permission_id).await?.is_none() {
            return Err(UserError::PermissionNotFound);
        }
        role.add_permission(permission_id)?;
        self.roles.save(&mut role).await?;
        Ok(role)
    }

    pub async fn remove_permission_from_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> UserResult<Role> {
        let mut role = self.get_role(role_id).await?;
        role.remove_permission(permission_id)?;
        self.roles.save(&mut role).await?;
        Ok(role)
    }

    /// Full-set sync: after this call the role's permission set equals the
    /// deduplicated input. Every id must exist in the permission catalog;
    /// the first unknown id fails the whole call.
    pub async fn update_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> UserResult<Role> {
        let mut role = self.get_role(role_id).await?;
        let catalog: HashSet<Uuid> = self
            .permissions
            .find_all()
            .await?
            .iter()
            .map(|p| p.id())
            .collect();
        for id in permission_ids {
            if !catalog.contains(id) {
                return Err(UserError::UnknownPermissionId(*id));
            }
        }

        let desired: HashSet<Uuid> = permission_ids.iter().copied().collect();
        let current: HashSet<Uuid> = role.permission_ids().iter().copied().collect();

        for id in current.difference(&desired) {
            role.remove_permission(*id)?;
        }
        for id in desired.difference(&current) {
            role.add_permission(*id)?;
        }
        self.roles.save(&mut role).await?;
        Ok(role)
    }

    // --- permissions ---

    pub async fn create_permission(&self, name: &str, title: &str) -> UserResult<Permission> {
        let name = normalize_text(name);
        let title = normalize_text(title);
        if name.is_empty() {
            return Err(UserError::Validation(
                "Permission name cannot be empty.".to_string(),
            ));
        }
        if self.permissions.find_by_name(&name).await?.is_some() {
            return Err(UserError::PermissionNameTaken);
        }
        let mut permission = Permission::new(name, title);
        self.permissions.save(&mut permission).await?;
        Ok(permission)
    }

    pub async fn update_permission(
        &self,
        permission_id: Uuid,
        name: &str,
        title: &str,
    ) -> UserResult<Permission> {
        let name = normalize_text(name);
        let title = normalize_text(title);
        if name.is_empty() {
            return Err(UserError::Validation(
                "Permission name cannot be empty.".to_string(),
            ));
        }
        let mut permission = self
            .permissions
            .find_by_id(permission_id)
            .await?
            .ok_or(UserError::PermissionNotFound)?;
        if let Some(existing) = self.permissions.find_by_name(&name).await? {
            if existing.id() != permission_id {
                return Err(UserError::PermissionNameTaken);
            }
        }
        permission.update(name, title);
        self.permissions.save(&mut permission).await?;
        Ok(permission)
    }

    pub async fn delete_permission(&self, permission_id: Uuid) -> UserResult<()> {
        let mut permission = self
            .permissions
            .find_by_id(permission_id)
            .await?
            .ok_or(UserError::PermissionNotFound)?;
        self.permissions.delete(&mut permission).await?;
        Ok(())
    }

    pub async fn list_permissions(&self) -> UserResult<Vec<Permission>> {
        self.permissions.find_all().await
    }
}
