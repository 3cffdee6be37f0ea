//! Mutations on programme entities
//!
//! Every write validates the entity and its references first, then touches the
//! database. Multi-row changes run inside a transaction.

use rusqlite::params;

use super::{prune_short_ids, Store};
use crate::core::entity::{format_timestamp, now};
use crate::core::error::{Result, ShgError};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::{Cluster, Member, SelfHelpGroup, Sponsor, Staff};

impl Store {
    fn check_valid(errors: Vec<String>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ShgError::from_field_errors(errors))
        }
    }

    /// Optional references must point at existing rows
    fn check_reference(&self, id: Option<&EntityId>) -> Result<()> {
        match id {
            Some(id) => self.require(id),
            None => Ok(()),
        }
    }

    fn check_sponsor(&self, sponsor: &Sponsor) -> Result<()> {
        if !self.exists(sponsor.id())? {
            return Err(ShgError::not_found_id(sponsor.id()));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Staff
    // ---------------------------------------------------------------------

    pub fn insert_staff(&self, staff: &Staff) -> Result<String> {
        Self::check_valid(staff.validate())?;
        self.conn.execute(
            "INSERT INTO staff (id, name, role, phone, gender, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                staff.id,
                staff.name,
                staff.role,
                staff.phone,
                staff.gender,
                format_timestamp(&staff.created_at),
                format_timestamp(&staff.updated_at),
            ],
        )?;
        tracing::info!(id = %staff.id, role = %staff.role, "created staff member");
        self.ensure_short_id(&staff.id)
    }

    /// Delete a staff member; refused while they still facilitate groups
    pub fn delete_staff(&mut self, id: &EntityId) -> Result<()> {
        self.require(id)?;

        let facilitated: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shg_groups WHERE facilitator_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if facilitated > 0 {
            return Err(ShgError::validation(format!(
                "Staff member still facilitates {} group(s); transfer them first.",
                facilitated
            )));
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
        prune_short_ids(&tx)?;
        tx.commit()?;
        tracing::info!(%id, "deleted staff member");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Clusters
    // ---------------------------------------------------------------------

    pub fn insert_cluster(&self, cluster: &Cluster) -> Result<String> {
        Self::check_valid(cluster.validate())?;
        self.check_reference(cluster.manager.as_ref())?;
        self.conn.execute(
            "INSERT INTO clusters (id, name, status, location, manager_id, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                cluster.id,
                cluster.name,
                cluster.status,
                cluster.location,
                cluster.manager,
                cluster.description,
                format_timestamp(&cluster.created_at),
                format_timestamp(&cluster.updated_at),
            ],
        )?;
        tracing::info!(id = %cluster.id, name = %cluster.name, "created cluster");
        self.ensure_short_id(&cluster.id)
    }

    pub fn update_cluster(&self, cluster: &mut Cluster) -> Result<()> {
        Self::check_valid(cluster.validate())?;
        self.check_reference(cluster.manager.as_ref())?;
        cluster.updated_at = now();
        let changed = self.conn.execute(
            "UPDATE clusters SET name = ?2, status = ?3, location = ?4, manager_id = ?5,
                description = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                cluster.id,
                cluster.name,
                cluster.status,
                cluster.location,
                cluster.manager,
                cluster.description,
                format_timestamp(&cluster.updated_at),
            ],
        )?;
        if changed == 0 {
            return Err(ShgError::not_found_id(&cluster.id));
        }
        tracing::info!(id = %cluster.id, "updated cluster");
        Ok(())
    }

    /// Delete a cluster together with its groups and everything below them
    pub fn delete_cluster(&mut self, id: &EntityId) -> Result<()> {
        self.require(id)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM clusters WHERE id = ?1", params![id])?;
        let pruned = prune_short_ids(&tx)?;
        tx.commit()?;
        tracing::info!(%id, pruned, "deleted cluster");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------------

    pub fn insert_group(&self, group: &SelfHelpGroup) -> Result<String> {
        Self::check_valid(group.validate())?;
        self.check_sponsor(&group.sponsor)?;
        self.check_reference(group.leader.as_ref())?;
        self.conn.execute(
            "INSERT INTO shg_groups (id, name, cluster_id, facilitator_id, leader_id, status,
                region, zone, woreda, location, latitude, longitude, description,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                group.id,
                group.name,
                group.sponsor.cluster(),
                group.sponsor.facilitator(),
                group.leader,
                group.status,
                group.region,
                group.zone,
                group.woreda,
                group.location,
                group.latitude,
                group.longitude,
                group.description,
                format_timestamp(&group.created_at),
                format_timestamp(&group.updated_at),
            ],
        )?;
        tracing::info!(id = %group.id, sponsor = %group.sponsor, "created group");
        self.ensure_short_id(&group.id)
    }

    pub fn update_group(&self, group: &mut SelfHelpGroup) -> Result<()> {
        Self::check_valid(group.validate())?;
        self.check_sponsor(&group.sponsor)?;
        self.check_reference(group.leader.as_ref())?;
        group.updated_at = now();
        let changed = self.conn.execute(
            "UPDATE shg_groups SET name = ?2, cluster_id = ?3, facilitator_id = ?4,
                leader_id = ?5, status = ?6, region = ?7, zone = ?8, woreda = ?9,
                location = ?10, latitude = ?11, longitude = ?12, description = ?13,
                updated_at = ?14
             WHERE id = ?1",
            params![
                group.id,
                group.name,
                group.sponsor.cluster(),
                group.sponsor.facilitator(),
                group.leader,
                group.status,
                group.region,
                group.zone,
                group.woreda,
                group.location,
                group.latitude,
                group.longitude,
                group.description,
                format_timestamp(&group.updated_at),
            ],
        )?;
        if changed == 0 {
            return Err(ShgError::not_found_id(&group.id));
        }
        tracing::info!(id = %group.id, "updated group");
        Ok(())
    }

    /// Delete a group with its members, surveys, meetings and attendance
    pub fn delete_group(&mut self, id: &EntityId) -> Result<()> {
        self.require(id)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM shg_groups WHERE id = ?1", params![id])?;
        let pruned = prune_short_ids(&tx)?;
        tx.commit()?;
        tracing::info!(%id, pruned, "deleted group");
        Ok(())
    }

    /// Move every group under `source` to the `target` cluster.
    ///
    /// Facilitator references are cleared. Returns the number of groups moved.
    pub fn transfer_groups(&mut self, source: &Sponsor, target: &EntityId) -> Result<usize> {
        if target.prefix() != EntityPrefix::Clu || !self.exists(target)? {
            return Err(ShgError::NotFound("Target cluster not found.".to_string()));
        }

        let column = match source {
            Sponsor::Cluster(_) => "cluster_id",
            Sponsor::Facilitator(_) => "facilitator_id",
        };

        let tx = self.conn.transaction()?;
        let count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM shg_groups WHERE {} = ?1", column),
            params![source.id()],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(ShgError::NotFound(
                "No groups found for the specified source.".to_string(),
            ));
        }

        let moved = tx.execute(
            &format!(
                "UPDATE shg_groups SET cluster_id = ?2, facilitator_id = NULL, updated_at = ?3
                 WHERE {} = ?1",
                column
            ),
            params![source.id(), target, format_timestamp(&now())],
        )?;
        tx.commit()?;

        tracing::info!(source = %source, %target, moved, "transferred groups");
        Ok(moved)
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    pub fn insert_member(&self, member: &Member) -> Result<String> {
        Self::check_valid(member.validate())?;
        self.require(&member.group)?;
        self.conn.execute(
            "INSERT INTO members (id, group_id, first_name, last_name, gender, age,
                household_size, marital_status, religion, other_shg_member_in_house,
                other_shg_members, responsible_for_children, contact_details, status,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                member.id,
                member.group,
                member.first_name,
                member.last_name,
                member.gender,
                member.age,
                member.household_size,
                member.marital_status,
                member.religion,
                member.other_shg_member_in_house,
                member.other_shg_members,
                member.responsible_for_children,
                member.contact_details,
                member.status,
                format_timestamp(&member.created_at),
                format_timestamp(&member.updated_at),
            ],
        )?;
        tracing::info!(id = %member.id, group = %member.group, "created member");
        self.ensure_short_id(&member.id)
    }

    pub fn update_member(&self, member: &mut Member) -> Result<()> {
        Self::check_valid(member.validate())?;
        self.require(&member.group)?;
        member.updated_at = now();
        let changed = self.conn.execute(
            "UPDATE members SET group_id = ?2, first_name = ?3, last_name = ?4, gender = ?5,
                age = ?6, household_size = ?7, marital_status = ?8, religion = ?9,
                other_shg_member_in_house = ?10, other_shg_members = ?11,
                responsible_for_children = ?12, contact_details = ?13, status = ?14,
                updated_at = ?15
             WHERE id = ?1",
            params![
                member.id,
                member.group,
                member.first_name,
                member.last_name,
                member.gender,
                member.age,
                member.household_size,
                member.marital_status,
                member.religion,
                member.other_shg_member_in_house,
                member.other_shg_members,
                member.responsible_for_children,
                member.contact_details,
                member.status,
                format_timestamp(&member.updated_at),
            ],
        )?;
        if changed == 0 {
            return Err(ShgError::not_found_id(&member.id));
        }
        tracing::info!(id = %member.id, "updated member");
        Ok(())
    }

    /// Delete a member with their survey and attendance rows
    pub fn delete_member(&mut self, id: &EntityId) -> Result<()> {
        self.require(id)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM members WHERE id = ?1", params![id])?;
        let pruned = prune_short_ids(&tx)?;
        tx.commit()?;
        tracing::info!(%id, pruned, "deleted member");
        Ok(())
    }
}
