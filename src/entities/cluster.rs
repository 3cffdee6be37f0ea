//! Cluster entity type - administrative grouping of self-help groups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{now, Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// A cluster of self-help groups under one manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique identifier
    pub id: EntityId,

    pub name: String,

    #[serde(default)]
    pub status: Status,

    /// Free-text location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Managing staff member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        let ts = now();
        Self {
            id: EntityId::new(EntityPrefix::Clu),
            name: name.into(),
            status: Status::default(),
            location: None,
            manager: None,
            description: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Cluster name is required.".to_string());
        }
        if let Some(manager) = &self.manager {
            if manager.prefix() != EntityPrefix::Stf {
                errors.push(format!("Cluster manager must be a staff id, got {}", manager));
            }
        }
        errors
    }
}

impl Entity for Cluster {
    const PREFIX: &'static str = "CLU";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_creation() {
        let cluster = Cluster::new("Adama North");
        assert!(cluster.id.to_string().starts_with("CLU-"));
        assert_eq!(cluster.status, Status::Active);
        assert_eq!(cluster.created_at, cluster.updated_at);
    }

    #[test]
    fn test_manager_must_be_staff() {
        let mut cluster = Cluster::new("Adama North");
        cluster.manager = Some(EntityId::new(EntityPrefix::Mem));
        let errors = cluster.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("staff id"));
    }
}
