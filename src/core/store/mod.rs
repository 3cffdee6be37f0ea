//! SQLite-backed entity store
//!
//! This module owns the workspace database:
//! - Programme structure (staff, clusters, groups, members)
//! - Append-only survey records and meetings
//! - Short IDs (PREFIX@N) mapped to full entity IDs
//!
//! Foreign keys are enforced, so deletes cascade the way the schema declares.

mod meetings;
mod mutations;
mod queries;
mod schema;
mod surveys;
mod types;

pub use types::*;

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::core::error::{Result, ShgError};
use crate::core::identity::{EntityId, EntityPrefix};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// The ledger database
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        store.check_schema_version()?;

        tracing::debug!("opened store at {}", path.display());
        Ok(store)
    }

    /// Open a throwaway in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    /// Path of the database file, if it is file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Table holding rows of the given entity kind
    pub(crate) fn table_for(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Stf => "staff",
            EntityPrefix::Clu => "clusters",
            EntityPrefix::Shg => "shg_groups",
            EntityPrefix::Mem => "members",
            EntityPrefix::Six => "six_month_data",
            EntityPrefix::Ann => "annual_data",
            EntityPrefix::Chs => "children_status",
            EntityPrefix::Agd => "group_annual_data",
            EntityPrefix::Mtg => "meetings",
            EntityPrefix::Att => "attendance",
        }
    }

    /// Check whether an entity row exists
    pub fn exists(&self, id: &EntityId) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE id = ?1",
            Self::table_for(id.prefix())
        );
        let found: Option<i64> = self
            .conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Fail with NotFound unless the entity exists
    pub fn require(&self, id: &EntityId) -> Result<()> {
        if self.exists(id)? {
            Ok(())
        } else {
            Err(ShgError::not_found_id(id))
        }
    }

    /// Assign a short ID to an entity, reusing an existing one
    pub fn ensure_short_id(&self, id: &EntityId) -> Result<String> {
        let entity_id = id.to_string();
        if let Some(short_id) = self.short_id(id) {
            return Ok(short_id);
        }

        let prefix = id.prefix().as_str();
        let next_id: i64 = self
            .conn
            .query_row(
                "SELECT next_id FROM short_id_counters WHERE prefix = ?1",
                params![prefix],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(1);

        let short_id = format!("{}@{}", prefix, next_id);

        self.conn.execute(
            "INSERT INTO short_ids (short_id, entity_id, prefix) VALUES (?1, ?2, ?3)",
            params![short_id, entity_id, prefix],
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO short_id_counters (prefix, next_id) VALUES (?1, ?2)",
            params![prefix, next_id + 1],
        )?;

        Ok(short_id)
    }

    /// Resolve a short ID to a full entity ID
    pub fn resolve_short_id(&self, short_id: &str) -> Option<EntityId> {
        let (prefix, num) = short_id.trim().split_once('@')?;
        let normalized = format!("{}@{}", prefix.to_ascii_uppercase(), num);

        self.conn
            .query_row(
                "SELECT entity_id FROM short_ids WHERE short_id = ?1",
                params![normalized],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    /// Get the short ID of an entity
    pub fn short_id(&self, id: &EntityId) -> Option<String> {
        self.conn
            .query_row(
                "SELECT short_id FROM short_ids WHERE entity_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    /// Short ID if assigned, otherwise the full ID
    pub fn display_id(&self, id: &EntityId) -> String {
        self.short_id(id).unwrap_or_else(|| id.to_string())
    }

    /// Resolve user input (full ID or PREFIX@N) to an ID of the expected kind
    pub fn resolve_id(&self, input: &str, expected: EntityPrefix) -> Result<EntityId> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ShgError::validation(format!(
                "{} id is required.",
                expected.noun()
            )));
        }

        if input.contains('@') {
            let id = self.resolve_short_id(input).ok_or_else(|| {
                ShgError::NotFound(format!("{} not found: {}", expected.noun(), input))
            })?;
            if id.prefix() != expected {
                return Err(ShgError::validation(format!(
                    "expected a {} id, got {}",
                    expected, input
                )));
            }
            return Ok(id);
        }

        Ok(EntityId::parse_as(input, expected)?)
    }

}

/// Tables whose rows are given short ids
const SHORT_ID_TABLES: &[&str] = &[
    "staff",
    "clusters",
    "shg_groups",
    "members",
    "six_month_data",
    "annual_data",
    "children_status",
    "group_annual_data",
    "meetings",
];

/// Drop short ids whose entity is gone, including rows removed by cascades.
///
/// Counters are left alone so a short id is never handed out twice.
fn prune_short_ids(conn: &Connection) -> Result<usize> {
    let live = SHORT_ID_TABLES
        .iter()
        .map(|table| format!("SELECT id FROM {}", table))
        .collect::<Vec<_>>()
        .join(" UNION ALL ");
    let removed = conn.execute(
        &format!("DELETE FROM short_ids WHERE entity_id NOT IN ({})", live),
        [],
    )?;
    Ok(removed)
}

#[cfg(test)]
mod tests;
