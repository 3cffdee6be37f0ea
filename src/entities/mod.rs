//! Entity type definitions
//!
//! The ledger tracks the following entity types:
//!
//! **Program structure:**
//! - [`Staff`] - Facilitators, cluster managers and group leaders
//! - [`Cluster`] - Administrative grouping of self-help groups
//! - [`SelfHelpGroup`] - A self-help group, sponsored by a cluster or a facilitator
//! - [`Member`] - A member of a self-help group
//!
//! **Surveys:**
//! - [`SixMonthData`] - Six-month member survey (IGA, loans, nutrition, health)
//! - [`AnnualData`] - Annual member survey (household, savings, assets)
//! - [`AnnualChildrenStatus`] - Annual children and schooling survey
//! - [`AnnualSelfHelpGroupData`] - Annual group survey (capital, loans, social support)
//!
//! **Meetings:**
//! - [`Meeting`] - A group meeting
//! - [`Attendance`] - Attendance of a member at a meeting

pub mod cluster;
pub mod group;
pub mod meeting;
pub mod member;
pub mod staff;
pub mod survey;

pub use cluster::Cluster;
pub use group::{SelfHelpGroup, Sponsor, SponsorKind};
pub use meeting::{Attendance, Meeting};
pub use member::{Member, Religion};
pub use staff::{Staff, StaffRole};
pub use survey::{
    AnnualChildrenStatus, AnnualData, AnnualSelfHelpGroupData, ChildEntry, SixMonthData,
};
