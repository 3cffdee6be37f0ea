//! Query methods for programme entities
//!
//! Lookups and filtered listings for staff, clusters, groups and members.
//! Derived counters are computed here, never stored.

use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::{
    ClusterFilter, ClusterOverview, GroupFilter, GroupOverview, MemberFilter, StaffFilter, Store,
};
use crate::core::entity::parse_timestamp;
use crate::core::error::{Result, ShgError};
use crate::core::identity::EntityId;
use crate::entities::{Cluster, Member, SelfHelpGroup, Sponsor, Staff};

pub(super) const STAFF_COLUMNS: &str = "s.id, s.name, s.role, s.phone, s.gender, s.created_at, s.updated_at";

pub(super) const CLUSTER_COLUMNS: &str =
    "c.id, c.name, c.status, c.location, c.manager_id, c.description, c.created_at, c.updated_at";

pub(super) const GROUP_COLUMNS: &str = "g.id, g.name, g.cluster_id, g.facilitator_id, g.leader_id, g.status, \
     g.region, g.zone, g.woreda, g.location, g.latitude, g.longitude, g.description, \
     g.created_at, g.updated_at";

pub(super) const MEMBER_COLUMNS: &str = "m.id, m.group_id, m.first_name, m.last_name, m.gender, m.age, \
     m.household_size, m.marital_status, m.religion, m.other_shg_member_in_house, \
     m.other_shg_members, m.responsible_for_children, m.contact_details, m.status, \
     m.created_at, m.updated_at";

pub(super) fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        phone: row.get(3)?,
        gender: row.get(4)?,
        created_at: parse_timestamp(&row.get::<_, String>(5)?),
        updated_at: parse_timestamp(&row.get::<_, String>(6)?),
    })
}

pub(super) fn cluster_from_row(row: &Row<'_>) -> rusqlite::Result<Cluster> {
    Ok(Cluster {
        id: row.get(0)?,
        name: row.get(1)?,
        status: row.get(2)?,
        location: row.get(3)?,
        manager: row.get(4)?,
        description: row.get(5)?,
        created_at: parse_timestamp(&row.get::<_, String>(6)?),
        updated_at: parse_timestamp(&row.get::<_, String>(7)?),
    })
}

pub(super) fn group_from_row(row: &Row<'_>) -> rusqlite::Result<SelfHelpGroup> {
    let sponsor = Sponsor::from_columns(row.get(2)?, row.get(3)?)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
    Ok(SelfHelpGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        sponsor,
        leader: row.get(4)?,
        status: row.get(5)?,
        region: row.get(6)?,
        zone: row.get(7)?,
        woreda: row.get(8)?,
        location: row.get(9)?,
        latitude: row.get(10)?,
        longitude: row.get(11)?,
        description: row.get(12)?,
        created_at: parse_timestamp(&row.get::<_, String>(13)?),
        updated_at: parse_timestamp(&row.get::<_, String>(14)?),
    })
}

pub(super) fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        group: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        gender: row.get(4)?,
        age: row.get(5)?,
        household_size: row.get(6)?,
        marital_status: row.get(7)?,
        religion: row.get(8)?,
        other_shg_member_in_house: row.get(9)?,
        other_shg_members: row.get(10)?,
        responsible_for_children: row.get(11)?,
        contact_details: row.get(12)?,
        status: row.get(13)?,
        created_at: parse_timestamp(&row.get::<_, String>(14)?),
        updated_at: parse_timestamp(&row.get::<_, String>(15)?),
    })
}

impl Store {
    /// Run a query with boxed parameters and map every row
    pub(super) fn query_list<T>(
        &self,
        sql: &str,
        params_vec: &[Box<dyn ToSql>],
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        tracing::debug!(sql, "query");
        let mut stmt = self.conn.prepare(sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), map)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn get_staff(&self, id: &EntityId) -> Result<Staff> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM staff s WHERE s.id = ?1", STAFF_COLUMNS),
                params![id],
                staff_from_row,
            )
            .optional()?
            .ok_or_else(|| ShgError::not_found_id(id))
    }

    pub fn list_staff(&self, filter: &StaffFilter) -> Result<Vec<Staff>> {
        let mut sql = format!("SELECT {} FROM staff s WHERE 1=1", STAFF_COLUMNS);
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        if let Some(role) = filter.role {
            sql.push_str(" AND s.role = ?");
            params_vec.push(Box::new(role));
        }

        if let Some(ref search) = filter.search {
            sql.push_str(" AND s.name LIKE ?");
            params_vec.push(Box::new(format!("%{}%", search)));
        }

        sql.push_str(" ORDER BY s.name");
        self.query_list(&sql, &params_vec, staff_from_row)
    }

    pub fn get_cluster(&self, id: &EntityId) -> Result<Cluster> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM clusters c WHERE c.id = ?1", CLUSTER_COLUMNS),
                params![id],
                cluster_from_row,
            )
            .optional()?
            .ok_or_else(|| ShgError::not_found_id(id))
    }

    /// List clusters with their group and member counts
    pub fn list_clusters(&self, filter: &ClusterFilter) -> Result<Vec<ClusterOverview>> {
        let mut sql = format!(
            "SELECT {}, \
                (SELECT COUNT(*) FROM shg_groups g WHERE g.cluster_id = c.id), \
                (SELECT COUNT(*) FROM members m JOIN shg_groups g ON g.id = m.group_id \
                 WHERE g.cluster_id = c.id) \
             FROM clusters c WHERE 1=1",
            CLUSTER_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        if let Some(status) = filter.status {
            sql.push_str(" AND c.status = ?");
            params_vec.push(Box::new(status));
        }

        if let Some(ref search) = filter.search {
            sql.push_str(" AND c.name LIKE ?");
            params_vec.push(Box::new(format!("%{}%", search)));
        }

        sql.push_str(" ORDER BY c.name");
        self.query_list(&sql, &params_vec, |row| {
            Ok(ClusterOverview {
                cluster: cluster_from_row(row)?,
                total_groups: row.get(8)?,
                total_members: row.get(9)?,
            })
        })
    }

    /// One cluster with its derived counters
    pub fn cluster_overview(&self, id: &EntityId) -> Result<ClusterOverview> {
        let cluster = self.get_cluster(id)?;
        let total_groups: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shg_groups WHERE cluster_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let total_members: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM members m JOIN shg_groups g ON g.id = m.group_id \
             WHERE g.cluster_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(ClusterOverview {
            cluster,
            total_groups,
            total_members,
        })
    }

    pub fn get_group(&self, id: &EntityId) -> Result<SelfHelpGroup> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM shg_groups g WHERE g.id = ?1", GROUP_COLUMNS),
                params![id],
                group_from_row,
            )
            .optional()?
            .ok_or_else(|| ShgError::not_found_id(id))
    }

    /// One group with its member count
    pub fn group_overview(&self, id: &EntityId) -> Result<GroupOverview> {
        let group = self.get_group(id)?;
        let total_members: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM members WHERE group_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(GroupOverview {
            group,
            total_members,
        })
    }

    /// List groups with their member counts
    pub fn list_groups(&self, filter: &GroupFilter) -> Result<Vec<GroupOverview>> {
        let mut sql = format!(
            "SELECT {}, (SELECT COUNT(*) FROM members m WHERE m.group_id = g.id) \
             FROM shg_groups g WHERE 1=1",
            GROUP_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        if let Some(status) = filter.status {
            sql.push_str(" AND g.status = ?");
            params_vec.push(Box::new(status));
        }

        if let Some(ref cluster) = filter.cluster {
            sql.push_str(" AND g.cluster_id = ?");
            params_vec.push(Box::new(cluster.clone()));
        }

        if let Some(ref facilitator) = filter.facilitator {
            sql.push_str(" AND g.facilitator_id = ?");
            params_vec.push(Box::new(facilitator.clone()));
        }

        if let Some(ref location) = filter.location {
            sql.push_str(" AND g.location = ?");
            params_vec.push(Box::new(location.clone()));
        }

        if let Some(ref region) = filter.region {
            sql.push_str(" AND g.region = ?");
            params_vec.push(Box::new(region.clone()));
        }

        if let Some(ref search) = filter.search {
            sql.push_str(" AND g.name LIKE ?");
            params_vec.push(Box::new(format!("%{}%", search)));
        }

        sql.push_str(" ORDER BY g.created_at, g.name");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        self.query_list(&sql, &params_vec, |row| {
            Ok(GroupOverview {
                group: group_from_row(row)?,
                total_members: row.get(15)?,
            })
        })
    }

    /// Sorted distinct non-empty free-text locations of groups
    pub fn distinct_locations(&self) -> Result<Vec<String>> {
        self.query_list(
            "SELECT DISTINCT location FROM shg_groups \
             WHERE location IS NOT NULL AND TRIM(location) <> '' ORDER BY location",
            &[],
            |row| row.get(0),
        )
    }

    pub fn get_member(&self, id: &EntityId) -> Result<Member> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM members m WHERE m.id = ?1", MEMBER_COLUMNS),
                params![id],
                member_from_row,
            )
            .optional()?
            .ok_or_else(|| ShgError::not_found_id(id))
    }

    pub fn list_members(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        let mut sql = format!(
            "SELECT {} FROM members m JOIN shg_groups g ON g.id = m.group_id WHERE 1=1",
            MEMBER_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        if let Some(ref group) = filter.group {
            sql.push_str(" AND m.group_id = ?");
            params_vec.push(Box::new(group.clone()));
        }

        if let Some(ref cluster) = filter.cluster {
            sql.push_str(" AND g.cluster_id = ?");
            params_vec.push(Box::new(cluster.clone()));
        }

        if let Some(gender) = filter.gender {
            sql.push_str(" AND m.gender = ?");
            params_vec.push(Box::new(gender));
        }

        if let Some(status) = filter.status {
            sql.push_str(" AND m.status = ?");
            params_vec.push(Box::new(status));
        }

        if let Some(ref search) = filter.search {
            sql.push_str(" AND (m.first_name LIKE ? OR m.last_name LIKE ?)");
            let pattern = format!("%{}%", search);
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }

        sql.push_str(" ORDER BY m.last_name, m.first_name");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        self.query_list(&sql, &params_vec, member_from_row)
    }
}
