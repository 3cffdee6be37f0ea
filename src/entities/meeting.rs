//! Meeting and attendance entity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{now, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// A group meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: EntityId,
    pub group: EntityId,
    pub agenda: String,

    #[serde(default)]
    pub notes: String,

    /// When the meeting took place
    pub meeting_date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(group: EntityId, agenda: impl Into<String>, meeting_date: DateTime<Utc>) -> Self {
        let ts = now();
        Self {
            id: EntityId::new(EntityPrefix::Mtg),
            group,
            agenda: agenda.into(),
            notes: String::new(),
            meeting_date,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.agenda.trim().is_empty() {
            errors.push("Meeting agenda is required.".to_string());
        }
        errors
    }
}

impl Entity for Meeting {
    const PREFIX: &'static str = "MTG";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.agenda, self.meeting_date.format("%Y-%m-%d"))
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Attendance of one member at one meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: EntityId,
    pub meeting: EntityId,
    pub member: EntityId,
    pub attended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    pub fn new(meeting: EntityId, member: EntityId, attended: bool) -> Self {
        let ts = now();
        Self {
            id: EntityId::new(EntityPrefix::Att),
            meeting,
            member,
            attended,
            created_at: ts,
            updated_at: ts,
        }
    }
}

impl Entity for Attendance {
    const PREFIX: &'static str = "ATT";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> String {
        let state = if self.attended { "Attended" } else { "Absent" };
        format!("{} - {}", self.member, state)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meeting_label() {
        let when = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let meeting = Meeting::new(EntityId::new(EntityPrefix::Shg), "Loan review", when);
        assert_eq!(meeting.label(), "Loan review (2024-05-02)");
        assert!(meeting.validate().is_empty());
    }

    #[test]
    fn test_attendance_label() {
        let att = Attendance::new(
            EntityId::new(EntityPrefix::Mtg),
            EntityId::new(EntityPrefix::Mem),
            false,
        );
        assert!(att.label().ends_with(" - Absent"));
    }
}
