//! Staff entity type - facilitators, cluster managers and group leaders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{now, Entity, Gender};
use crate::core::identity::{EntityId, EntityPrefix};

crate::text_enum! {
    /// Program role of a staff member
    pub enum StaffRole as "staff role" {
        SuperAdmin => "super_admin",
        Facilitator => "facilitator",
        ClusterManager => "cluster_manager",
        ShgLead => "shg_lead",
    }
}

/// A person working for the program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    /// Unique identifier
    pub id: EntityId,

    /// Full name
    pub name: String,

    pub role: StaffRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    pub fn new(name: impl Into<String>, role: StaffRole) -> Self {
        let ts = now();
        Self {
            id: EntityId::new(EntityPrefix::Stf),
            name: name.into(),
            role,
            phone: None,
            gender: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Staff name is required.".to_string());
        }
        errors
    }
}

impl Entity for Staff {
    const PREFIX: &'static str = "STF";

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
    fn test_staff_creation() {
        let staff = Staff::new("Almaz Tesfaye", StaffRole::Facilitator);
        assert!(staff.id.to_string().starts_with("STF-"));
        assert_eq!(staff.role, StaffRole::Facilitator);
        assert!(staff.validate().is_empty());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(
            "cluster-manager".parse::<StaffRole>().unwrap(),
            StaffRole::ClusterManager
        );
        assert!("janitor".parse::<StaffRole>().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let staff = Staff::new("  ", StaffRole::ShgLead);
        assert_eq!(staff.validate(), vec!["Staff name is required.".to_string()]);
    }
}
