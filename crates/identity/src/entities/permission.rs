//! Permission aggregate: a named capability referenced by roles.

use crate::entities::events::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    id: Uuid,
    name: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Permission {
    pub fn new(name: String, title: String) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut permission = Self {
            id,
            name: name.clone(),
            title,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        };
        permission.record(DomainEvent::PermissionCreated {
            permission_id: id,
            name,
            timestamp: now,
        });
        permission
    }

    pub fn from_persistence(
        id: Uuid,
        name: String,
        title: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            title,
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
            self.record(DomainEvent::PermissionUpdated {
                permission_id: self.id,
                name,
                timestamp: Utc::now(),
            });
            self.updated_at = Utc::now();
        }
    }

    /// Record the deletion event before the repository removes the row.
    pub fn mark_deleted(&mut self) {
        self.record(DomainEvent::PermissionDeleted {
            permission_id: self.id,
            timestamp: Utc::now(),
        });
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_events_are_collected_then_drained() {
        let mut p = Permission::new("users.read".to_string(), "Read users".to_string());
        p.update("users.read".to_string(), "Read user records".to_string());
        p.mark_deleted();
        let names: Vec<&str> = p.events().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["PermissionCreated", "PermissionUpdated", "PermissionDeleted"]
        );
        assert_eq!(p.take_events().len(), 3);
        assert!(p.events().is_empty());
    }
}
