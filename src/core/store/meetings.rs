//! Meeting and attendance storage

use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::queries::{member_from_row, MEMBER_COLUMNS};
use super::{AttendanceSheet, Store};
use crate::core::entity::{format_timestamp, now, parse_timestamp};
use crate::core::error::{Result, ShgError};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::{Attendance, Meeting};

const MEETING_COLUMNS: &str =
    "t.id, t.group_id, t.agenda, t.notes, t.meeting_date, t.created_at, t.updated_at";

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: row.get(0)?,
        group: row.get(1)?,
        agenda: row.get(2)?,
        notes: row.get(3)?,
        meeting_date: parse_timestamp(&row.get::<_, String>(4)?),
        created_at: parse_timestamp(&row.get::<_, String>(5)?),
        updated_at: parse_timestamp(&row.get::<_, String>(6)?),
    })
}

impl Store {
    pub fn insert_meeting(&self, meeting: &Meeting) -> Result<String> {
        let errors = meeting.validate();
        if !errors.is_empty() {
            return Err(ShgError::from_field_errors(errors));
        }
        self.require(&meeting.group)?;
        self.conn.execute(
            "INSERT INTO meetings (id, group_id, agenda, notes, meeting_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                meeting.id,
                meeting.group,
                meeting.agenda,
                meeting.notes,
                format_timestamp(&meeting.meeting_date),
                format_timestamp(&meeting.created_at),
                format_timestamp(&meeting.updated_at),
            ],
        )?;
        tracing::info!(id = %meeting.id, group = %meeting.group, "created meeting");
        self.ensure_short_id(&meeting.id)
    }

    pub fn get_meeting(&self, id: &EntityId) -> Result<Meeting> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM meetings t WHERE t.id = ?1", MEETING_COLUMNS),
                params![id],
                meeting_from_row,
            )
            .optional()?
            .ok_or_else(|| ShgError::not_found(EntityPrefix::Mtg))
    }

    /// Meetings, newest first, optionally for one group and matching a search term
    pub fn list_meetings(
        &self,
        group: Option<&EntityId>,
        search: Option<&str>,
    ) -> Result<Vec<Meeting>> {
        let mut sql = format!("SELECT {} FROM meetings t WHERE 1=1", MEETING_COLUMNS);
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        if let Some(group) = group {
            sql.push_str(" AND t.group_id = ?");
            params_vec.push(Box::new(group.clone()));
        }

        if let Some(search) = search {
            sql.push_str(" AND (t.agenda LIKE ? OR t.notes LIKE ?)");
            let pattern = format!("%{}%", search);
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }

        sql.push_str(" ORDER BY t.meeting_date DESC");
        self.query_list(&sql, &params_vec, meeting_from_row)
    }

    /// Record attendance; a second call for the same member overwrites the first
    pub fn record_attendance(
        &self,
        meeting: &EntityId,
        member: &EntityId,
        attended: bool,
    ) -> Result<Attendance> {
        let mtg = self.get_meeting(meeting)?;
        let mem = self.get_member(member)?;
        if mem.group != mtg.group {
            return Err(ShgError::validation(format!(
                "Member {} does not belong to the group of meeting {}",
                member, meeting
            )));
        }

        let fresh = Attendance::new(meeting.clone(), member.clone(), attended);
        let ts = format_timestamp(&now());
        self.conn.execute(
            "INSERT INTO attendance (id, meeting_id, member_id, attended, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (meeting_id, member_id)
             DO UPDATE SET attended = excluded.attended, updated_at = excluded.updated_at",
            params![fresh.id, meeting, member, attended, ts],
        )?;

        let stored = self.conn.query_row(
            "SELECT id, meeting_id, member_id, attended, created_at, updated_at
             FROM attendance WHERE meeting_id = ?1 AND member_id = ?2",
            params![meeting, member],
            |row| {
                Ok(Attendance {
                    id: row.get(0)?,
                    meeting: row.get(1)?,
                    member: row.get(2)?,
                    attended: row.get(3)?,
                    created_at: parse_timestamp(&row.get::<_, String>(4)?),
                    updated_at: parse_timestamp(&row.get::<_, String>(5)?),
                })
            },
        )?;
        tracing::info!(%meeting, %member, attended, "recorded attendance");
        Ok(stored)
    }

    /// Members who attended and who missed a meeting, by recorded attendance
    pub fn attendance_sheet(&self, meeting: &EntityId) -> Result<AttendanceSheet> {
        self.get_meeting(meeting)?;

        let sql = format!(
            "SELECT {} FROM attendance a JOIN members m ON m.id = a.member_id
             WHERE a.meeting_id = ? AND a.attended = ?
             ORDER BY m.last_name, m.first_name",
            MEMBER_COLUMNS
        );
        let attended_params: Vec<Box<dyn ToSql>> =
            vec![Box::new(meeting.clone()), Box::new(true)];
        let missed_params: Vec<Box<dyn ToSql>> = vec![Box::new(meeting.clone()), Box::new(false)];

        Ok(AttendanceSheet {
            meeting: meeting.clone(),
            attended: self.query_list(&sql, &attended_params, member_from_row)?,
            missed: self.query_list(&sql, &missed_params, member_from_row)?,
        })
    }
}
