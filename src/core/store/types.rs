//! Store type definitions
//!
//! Filters for list queries and the read-side views that carry derived counters.

use serde::Serialize;

use crate::core::entity::{Gender, Status};
use crate::core::identity::EntityId;
use crate::entities::{Cluster, Member, SelfHelpGroup, StaffRole};

/// Filter for listing staff
#[derive(Debug, Default, Clone)]
pub struct StaffFilter {
    pub role: Option<StaffRole>,
    pub search: Option<String>,
}

/// Filter for listing clusters
#[derive(Debug, Default, Clone)]
pub struct ClusterFilter {
    pub status: Option<Status>,
    pub search: Option<String>,
}

/// Filter for listing groups
#[derive(Debug, Default, Clone)]
pub struct GroupFilter {
    pub status: Option<Status>,
    pub cluster: Option<EntityId>,
    pub facilitator: Option<EntityId>,
    /// Exact match on the free-text location
    pub location: Option<String>,
    pub region: Option<String>,
    /// Substring match on the group name
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// Filter for listing members
#[derive(Debug, Default, Clone)]
pub struct MemberFilter {
    pub group: Option<EntityId>,
    pub cluster: Option<EntityId>,
    pub gender: Option<Gender>,
    pub status: Option<Status>,
    /// Substring match on first or last name
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// A cluster with its derived counters
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOverview {
    #[serde(flatten)]
    pub cluster: Cluster,
    pub total_groups: i64,
    pub total_members: i64,
}

/// A group with its derived member count
#[derive(Debug, Clone, Serialize)]
pub struct GroupOverview {
    #[serde(flatten)]
    pub group: SelfHelpGroup,
    pub total_members: i64,
}

/// Attended and missed members of one meeting
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSheet {
    pub meeting: EntityId,
    pub attended: Vec<Member>,
    pub missed: Vec<Member>,
}

/// Filter for listing survey records
#[derive(Debug, Default, Clone)]
pub struct SurveyFilter {
    /// Records of one member (member surveys only)
    pub member: Option<EntityId>,
    /// Records of one group, or of its members
    pub group: Option<EntityId>,
    pub limit: Option<usize>,
}
