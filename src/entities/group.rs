//! Self-help group entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::entity::{now, Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// The owner of a group: exactly one cluster or one facilitator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sponsor {
    Cluster(EntityId),
    Facilitator(EntityId),
}

impl Sponsor {
    /// Build a sponsor from the two nullable columns of a stored group
    pub fn from_columns(
        cluster: Option<EntityId>,
        facilitator: Option<EntityId>,
    ) -> Result<Self, String> {
        match (cluster, facilitator) {
            (Some(c), None) => Ok(Sponsor::Cluster(c)),
            (None, Some(f)) => Ok(Sponsor::Facilitator(f)),
            (None, None) => Err(
                "A group must be associated with either a cluster or a facilitator.".to_string(),
            ),
            (Some(_), Some(_)) => Err(
                "A group cannot be associated with both a cluster and a facilitator at the same time."
                    .to_string(),
            ),
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Sponsor::Cluster(id) | Sponsor::Facilitator(id) => id,
        }
    }

    pub fn cluster(&self) -> Option<&EntityId> {
        match self {
            Sponsor::Cluster(id) => Some(id),
            Sponsor::Facilitator(_) => None,
        }
    }

    pub fn facilitator(&self) -> Option<&EntityId> {
        match self {
            Sponsor::Facilitator(id) => Some(id),
            Sponsor::Cluster(_) => None,
        }
    }

    /// Prefix the sponsor id is expected to carry
    pub fn expected_prefix(&self) -> EntityPrefix {
        match self {
            Sponsor::Cluster(_) => EntityPrefix::Clu,
            Sponsor::Facilitator(_) => EntityPrefix::Stf,
        }
    }
}

impl fmt::Display for Sponsor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sponsor::Cluster(id) => write!(f, "cluster {}", id),
            Sponsor::Facilitator(id) => write!(f, "facilitator {}", id),
        }
    }
}

/// Which side of a [`Sponsor`] is meant, without an id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SponsorKind {
    Cluster,
    Facilitator,
}

impl SponsorKind {
    pub fn prefix(&self) -> EntityPrefix {
        match self {
            SponsorKind::Cluster => EntityPrefix::Clu,
            SponsorKind::Facilitator => EntityPrefix::Stf,
        }
    }

    pub fn with_id(self, id: EntityId) -> Sponsor {
        match self {
            SponsorKind::Cluster => Sponsor::Cluster(id),
            SponsorKind::Facilitator => Sponsor::Facilitator(id),
        }
    }
}

impl std::str::FromStr for SponsorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cluster" => Ok(SponsorKind::Cluster),
            "facilitator" => Ok(SponsorKind::Facilitator),
            _ => Err("Invalid source_type. Must be 'facilitator' or 'cluster'.".to_string()),
        }
    }
}

/// A self-help group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfHelpGroup {
    /// Unique identifier
    pub id: EntityId,

    pub name: String,

    /// Owning cluster or facilitator
    #[serde(flatten)]
    pub sponsor: Sponsor,

    /// Group leader (staff)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<EntityId>,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woreda: Option<String>,

    /// Free-text location (village, kebele, landmark)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SelfHelpGroup {
    pub fn new(name: impl Into<String>, sponsor: Sponsor) -> Self {
        let ts = now();
        Self {
            id: EntityId::new(EntityPrefix::Shg),
            name: name.into(),
            sponsor,
            leader: None,
            status: Status::default(),
            region: None,
            zone: None,
            woreda: None,
            location: None,
            latitude: None,
            longitude: None,
            description: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Group name is required.".to_string());
        }
        let expected = self.sponsor.expected_prefix();
        if self.sponsor.id().prefix() != expected {
            errors.push(format!(
                "Sponsor {} must be a {} id",
                self.sponsor.id(),
                expected
            ));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                errors.push(format!("Latitude out of range: {}", lat));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                errors.push(format!("Longitude out of range: {}", lon));
            }
        }
        errors
    }
}

impl Entity for SelfHelpGroup {
    const PREFIX: &'static str = "SHG";

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
    fn test_sponsor_from_columns() {
        let c = EntityId::new(EntityPrefix::Clu);
        let f = EntityId::new(EntityPrefix::Stf);

        assert_eq!(
            Sponsor::from_columns(Some(c.clone()), None).unwrap(),
            Sponsor::Cluster(c.clone())
        );
        assert_eq!(
            Sponsor::from_columns(None, Some(f.clone())).unwrap(),
            Sponsor::Facilitator(f.clone())
        );
        assert!(Sponsor::from_columns(None, None)
            .unwrap_err()
            .contains("either a cluster or a facilitator"));
        assert!(Sponsor::from_columns(Some(c), Some(f))
            .unwrap_err()
            .contains("both"));
    }

    #[test]
    fn test_sponsor_kind_parse() {
        assert_eq!("cluster".parse::<SponsorKind>().unwrap(), SponsorKind::Cluster);
        let err = "region".parse::<SponsorKind>().unwrap_err();
        assert_eq!(err, "Invalid source_type. Must be 'facilitator' or 'cluster'.");
        let id = EntityId::new(EntityPrefix::Stf);
        assert_eq!(
            SponsorKind::Facilitator.with_id(id.clone()),
            Sponsor::Facilitator(id)
        );
    }

    #[test]
    fn test_group_serializes_sponsor_inline() {
        let cluster = EntityId::new(EntityPrefix::Clu);
        let group = SelfHelpGroup::new("Tesfa", Sponsor::Cluster(cluster.clone()));
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["cluster"], cluster.to_string());
        assert!(json.get("facilitator").is_none());

        let back: SelfHelpGroup = serde_json::from_value(json).unwrap();
        assert_eq!(back.sponsor, Sponsor::Cluster(cluster));
    }

    #[test]
    fn test_validate_sponsor_prefix() {
        let group = SelfHelpGroup::new(
            "Tesfa",
            Sponsor::Facilitator(EntityId::new(EntityPrefix::Clu)),
        );
        let errors = group.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must be a STF id"));
    }

    #[test]
    fn test_validate_coordinates() {
        let mut group = SelfHelpGroup::new(
            "Tesfa",
            Sponsor::Cluster(EntityId::new(EntityPrefix::Clu)),
        );
        group.latitude = Some(91.0);
        assert_eq!(group.validate().len(), 1);
        group.latitude = Some(8.54);
        group.longitude = Some(39.27);
        assert!(group.validate().is_empty());
    }
}
