//! Role aggregate: a named role owning a set of permission links.

use crate::entities::events::DomainEvent;
use crate::types::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    id: Uuid,
    name: String,
    title: String,
    permission_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Role {
    pub fn new(name: String, title: String) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut role = Self {
            id,
            name: name.clone(),
            title,
            permission_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        };
        role.record(DomainEvent::RoleCreated {
            role_id: id,
            name,
            timestamp: now,
        });
        role
    }

    pub fn from_persistence(
        id: Uuid,
        name: String,
        title: String,
        permission_ids: Vec<Uuid>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            title,
            permission_ids,
            created_at,
            updated_at,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn permission_ids(&self) -> &[Uuid] {
        &self.permission_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn update(&mut self, name: String, title: String) {
        if self.name != name || self.title != title {
            self.name = name.clone();
            self.title = title;
            self.record(DomainEvent::RoleUpdated {
                role_id: self.id,
                name,
                timestamp: Utc::now(),
            });
            self.touch();
        }
    }

    pub fn has_permission(&self, permission_id: Uuid) -> bool {
        self.permission_ids.contains(&permission_id)
    }

    pub fn add_permission(&mut self, permission_id: Uuid) -> Result<(), DomainError> {
        if self.has_permission(permission_id) {
            return Err(DomainError::PermissionAlreadyAssigned);
        }
        self.permission_ids.push(permission_id);
        self.record(DomainEvent::RolePermissionAdded {
            role_id: self.id,
            permission_id,
            timestamp: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    pub fn remove_permission(&mut self, permission_id: Uuid) -> Result<(), DomainError> {
        let before = self.permission_ids.len();
        self.permission_ids.retain(|id| *id != permission_id);
        if self.permission_ids.len() == before {
            return Err(DomainError::PermissionNotInRole);
        }
        self.record(DomainEvent::RolePermissionRemoved {
            role_id: self.id,
            permission_id,
            timestamp: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
