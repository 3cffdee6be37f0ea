//! Member entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{now, Entity, Gender, MaritalStatus, Status};
use crate::core::identity::{EntityId, EntityPrefix};

crate::text_enum! {
    pub enum Religion as "religion" {
        Christianity => "christianity",
        Islam => "islam",
        Traditional => "traditional",
        Other => "other",
    }
}

/// A member of a self-help group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier
    pub id: EntityId,

    /// Group this member belongs to
    pub group: EntityId,

    pub first_name: String,
    pub last_name: String,

    pub gender: Gender,

    pub age: u32,

    /// Household size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<MaritalStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion: Option<Religion>,

    #[serde(default)]
    pub other_shg_member_in_house: bool,

    /// How many other SHG members live in the same house
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_shg_members: Option<u32>,

    #[serde(default)]
    pub responsible_for_children: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_details: Option<String>,

    #[serde(default)]
    pub status: Status,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        group: EntityId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        gender: Gender,
        age: u32,
    ) -> Self {
        let ts = now();
        Self {
            id: EntityId::new(EntityPrefix::Mem),
            group,
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender,
            age,
            household_size: None,
            marital_status: None,
            religion: None,
            other_shg_member_in_house: false,
            other_shg_members: None,
            responsible_for_children: false,
            contact_details: None,
            status: Status::default(),
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push("First name is required.".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("Last name is required.".to_string());
        }
        if self.group.prefix() != EntityPrefix::Shg {
            errors.push(format!("Member group must be a SHG id, got {}", self.group));
        }
        if self.other_shg_members.is_some() && !self.other_shg_member_in_house {
            errors.push(
                "Other SHG member count given but no other SHG member is in the house.".to_string(),
            );
        }
        errors
    }
}

impl Entity for Member {
    const PREFIX: &'static str = "MEM";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        self.full_name()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
