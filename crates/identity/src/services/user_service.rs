//! User management: creation, profile updates, role assignment, deletion.

use crate::entities::{Media, User};
use crate::repositories::{RoleRepository, UserRepository};
use crate::types::{UserError, UserResult};
use crate::utils::normalize::{
    is_valid_name, is_valid_phone_number, normalize_phone_number, normalize_text,
};
use crate::utils::{password, AvatarStorage};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub phone_number: String,
    pub national_code: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub struct UserService {
    users: UserRepository,
    roles: RoleRepository,
    storage: AvatarStorage,
}

impl UserService {
    pub fn new(users: UserRepository, roles: RoleRepository, storage: AvatarStorage) -> Self {
        Self {
            users,
            roles,
            storage,
        }
    }

    /// Create a user: normalize names and phone, validate, reject duplicate
    /// phone numbers, hash the password, persist.
    pub async fn create(&self, input: CreateUser) -> UserResult<User> {
        let first_name = normalize_text(&input.first_name);
        let last_name = normalize_text(&input.last_name);
        if first_name.is_empty() || last_name.is_empty() {
            return Err(UserError::Validation(
                "First and last name cannot be empty.".to_string(),
            ));
        }
        if !is_valid_name(&first_name) || !is_valid_name(&last_name) {
            return Err(UserError::Validation(
                "Name contains invalid characters.".to_string(),
            ));
        }

        let phone_number = normalize_phone_number(&input.phone_number);
        if !is_valid_phone_number(&phone_number) {
            return Err(UserError::Validation(
                "Phone number must be 10 to 15 digits.".to_string(),
            ));
        }
        if self.users.exists_by_phone_number(&phone_number).await? {
            return Err(UserError::PhoneNumberTaken);
        }

        let password_hash = password::hash_password(&input.password)?;
        let mut user = User::new(
            phone_number,
            input.national_code.trim().to_string(),
            first_name,
            last_name,
            password_hash,
        );
        self.users.save(&mut user).await?;
        info!(user = %user.id(), "user created");
        Ok(user)
    }

    pub async fn get(&self, user_id: Uuid) -> UserResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    /// Update name and national code on an existing user.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        first_name: &str,
        last_name: &str,
        national_code: &str,
    ) -> UserResult<User> {
        let first_name = normalize_text(first_name);
        let last_name = normalize_text(last_name);
        if first_name.is_empty() || last_name.is_empty() {
            return Err(UserError::Validation(
                "First and last name cannot be empty.".to_string(),
            ));
        }
        if !is_valid_name(&first_name) || !is_valid_name(&last_name) {
            return Err(UserError::Validation(
                "Name contains invalid characters.".to_string(),
            ));
        }

        let mut user = self.get(user_id).await?;
        user.update_profile(first_name, last_name, national_code.trim().to_string())?;
        self.users.save(&mut user).await?;
        Ok(user)
    }

    /// Store an uploaded avatar and attach it to the user.
    pub async fn update_avatar(
        &self,
        user_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> UserResult<Media> {
        let mut user = self.get(user_id).await?;
        let media = self
            .storage
            .save_avatar(user_id, file_name, bytes)
            .await
            .map_err(|err| UserError::Validation(err.to_string()))?;
        user.update_avatar(media.clone());
        self.users.save(&mut user).await?;
        Ok(media)
    }

    /// Assign roles by name. Names are normalized and resolved against the
    /// role catalog case-insensitively; the first unresolvable name fails the
    /// whole call. Roles already held are skipped.
    pub async fn assign_roles(&self, user_id: Uuid, role_names: &[String]) -> UserResult<User> {
        let mut user = self.get(user_id).await?;
        let resolved = self.resolve_role_names(role_names).await?;
        for (_, role_id) in resolved {
            if !user.has_role(role_id) {
                user.assign_role(role_id)?;
            }
        }
        self.users.save(&mut user).await?;
        Ok(user)
    }

    /// Remove roles by name. Removing a role the user does not hold is a
    /// silent no-op per name, but unresolvable names still fail the call.
    pub async fn unassign_roles(&self, user_id: Uuid, role_names: &[String]) -> UserResult<User> {
        let mut user = self.get(user_id).await?;
        let resolved = self.resolve_role_names(role_names).await?;
        for (_, role_id) in resolved {
            if user.has_role(role_id) {
                user.unassign_role(role_id)?;
            }
        }
        self.users.save(&mut user).await?;
        Ok(user)
    }

    /// Replace the user's role set with exactly the named roles.
    pub async fn update_roles(&self, user_id: Uuid, role_names: &[String]) -> UserResult<User> {
        if role_names.is_empty() {
            return Err(UserError::Validation(
                "Role list cannot be empty.".to_string(),
            ));
        }
        let mut user = self.get(user_id).await?;
        let resolved = self.resolve_role_names(role_names).await?;
        let desired: HashSet<Uuid> = resolved.iter().map(|(_, id)| *id).collect();
        let current: HashSet<Uuid> = user.role_ids().iter().copied().collect();

        for role_id in current.difference(&desired) {
            user.unassign_role(*role_id)?;
        }
        for role_id in desired.difference(&current) {
            user.assign_role(*role_id)?;
        }
        self.users.save(&mut user).await?;
        Ok(user)
    }

    /// Project the user's role-assignments to role names via the catalog,
    /// deduplicated case-insensitively.
    pub async fn get_roles(&self, user: &User) -> UserResult<Vec<String>> {
        let catalog = self.roles.find_all().await?;
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for role_id in user.role_ids() {
            if let Some(role) = catalog.iter().find(|r| r.id() == *role_id) {
                if seen.insert(role.name().to_lowercase()) {
                    names.push(role.name().to_string());
                }
            }
        }
        Ok(names)
    }

    /// Delete a user. Refused while the user still holds role assignments.
    pub async fn delete(&self, user_id: Uuid) -> UserResult<()> {
        let user = self.get(user_id).await?;
        if !user.role_ids().is_empty() {
            return Err(UserError::UserHasRoles);
        }
        self.users.delete(user_id).await?;
        info!(user = %user_id, "user deleted");
        Ok(())
    }

    async fn resolve_role_names(&self, role_names: &[String]) -> UserResult<Vec<(String, Uuid)>> {
        let catalog = self.roles.find_all().await?;
        let mut resolved = Vec::with_capacity(role_names.len());
        for raw in role_names {
            let name = normalize_text(raw);
            let role = catalog
                .iter()
                .find(|r| r.name().eq_ignore_ascii_case(&name))
                .ok_or_else(|| UserError::UnknownRoleName(name.clone()))?;
            resolved.push((name, role.id()));
        }
        Ok(resolved)
    }
}
