//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::{Store, SCHEMA_VERSION};
use crate::core::error::{Result, ShgError};

impl Store {
    /// Initialize database schema
    pub(super) fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Short ID mappings
            CREATE TABLE IF NOT EXISTS short_ids (
                short_id TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL UNIQUE,
                prefix TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_short_ids_prefix ON short_ids(prefix);

            -- Next available short ID per prefix
            CREATE TABLE IF NOT EXISTS short_id_counters (
                prefix TEXT PRIMARY KEY,
                next_id INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS staff (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                phone TEXT,
                gender TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_staff_role ON staff(role);

            CREATE TABLE IF NOT EXISTS clusters (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                location TEXT,
                manager_id TEXT REFERENCES staff(id) ON DELETE SET NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- A group has exactly one sponsor: a cluster or a facilitator
            CREATE TABLE IF NOT EXISTS shg_groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                cluster_id TEXT REFERENCES clusters(id) ON DELETE CASCADE,
                facilitator_id TEXT REFERENCES staff(id) ON DELETE RESTRICT,
                leader_id TEXT REFERENCES staff(id) ON DELETE SET NULL,
                status TEXT NOT NULL,
                region TEXT,
                zone TEXT,
                woreda TEXT,
                location TEXT,
                latitude REAL,
                longitude REAL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK ((cluster_id IS NULL) <> (facilitator_id IS NULL))
            );
            CREATE INDEX IF NOT EXISTS idx_groups_cluster ON shg_groups(cluster_id);
            CREATE INDEX IF NOT EXISTS idx_groups_facilitator ON shg_groups(facilitator_id);
            CREATE INDEX IF NOT EXISTS idx_groups_region ON shg_groups(region);
            CREATE INDEX IF NOT EXISTS idx_groups_created ON shg_groups(created_at);

            CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL REFERENCES shg_groups(id) ON DELETE CASCADE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                gender TEXT NOT NULL,
                age INTEGER NOT NULL,
                household_size INTEGER,
                marital_status TEXT,
                religion TEXT,
                other_shg_member_in_house INTEGER NOT NULL DEFAULT 0,
                other_shg_members INTEGER,
                responsible_for_children INTEGER NOT NULL DEFAULT 0,
                contact_details TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_members_group ON members(group_id);

            CREATE TABLE IF NOT EXISTS six_month_data (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
                active_iga INTEGER NOT NULL DEFAULT 0,
                iga_activity TEXT,
                iga_capital REAL,
                loan_from_shg REAL,
                loan_source TEXT,
                loan_from_other_sources REAL,
                purpose_of_loan TEXT NOT NULL,
                monthly_personal_income REAL NOT NULL,
                monthly_household_income REAL NOT NULL,
                meals_children INTEGER NOT NULL,
                meals_adults INTEGER NOT NULL,
                diarrhea_days_children INTEGER NOT NULL,
                illness_days_children INTEGER NOT NULL,
                diarrhea_days_others INTEGER NOT NULL,
                illness_days_others INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_six_month_member ON six_month_data(member_id);
            CREATE INDEX IF NOT EXISTS idx_six_month_created ON six_month_data(created_at);

            CREATE TABLE IF NOT EXISTS annual_data (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                education_level TEXT NOT NULL,
                marital_status TEXT NOT NULL,
                family_size INTEGER NOT NULL,
                household_size INTEGER NOT NULL,
                total_savings REAL NOT NULL,
                loan_rounds INTEGER NOT NULL,
                asset_value REAL NOT NULL,
                household_decision TEXT NOT NULL,
                community_decision TEXT NOT NULL,
                mortality_under_5 INTEGER NOT NULL,
                mortality_other INTEGER NOT NULL,
                housing TEXT NOT NULL,
                has_latrine INTEGER NOT NULL DEFAULT 0,
                has_electricity INTEGER NOT NULL DEFAULT 0,
                drinking_water TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_annual_member ON annual_data(member_id);
            CREATE INDEX IF NOT EXISTS idx_annual_created ON annual_data(created_at);

            CREATE TABLE IF NOT EXISTS children_status (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
                number_of_children INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_children_member ON children_status(member_id);

            -- Up to five children per status record, slot 1..5
            CREATE TABLE IF NOT EXISTS child_entries (
                status_id TEXT NOT NULL REFERENCES children_status(id) ON DELETE CASCADE,
                slot INTEGER NOT NULL CHECK (slot BETWEEN 1 AND 5),
                name TEXT,
                gender TEXT,
                age INTEGER,
                school_status TEXT,
                PRIMARY KEY (status_id, slot)
            );

            CREATE TABLE IF NOT EXISTS group_annual_data (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL REFERENCES shg_groups(id) ON DELETE CASCADE,
                regular_saving REAL NOT NULL,
                shg_capital REAL NOT NULL,
                members_with_loans INTEGER NOT NULL,
                smallest_loan REAL,
                largest_loan REAL,
                loans_written_off REAL NOT NULL DEFAULT 0,
                invested_in_group_iga REAL NOT NULL DEFAULT 0,
                group_iga_code TEXT,
                description TEXT,
                social_savings_income REAL NOT NULL DEFAULT 0,
                social_savings_expenditure REAL NOT NULL DEFAULT 0,
                members_social_support INTEGER NOT NULL DEFAULT 0,
                outsiders_social_support INTEGER NOT NULL DEFAULT 0,
                supporting_institutions INTEGER NOT NULL DEFAULT 0,
                min_monthly_personal REAL,
                trainings_per_year INTEGER NOT NULL DEFAULT 0,
                member_health_support REAL,
                other_health_support REAL,
                other_insurance_need REAL,
                other_social_need REAL,
                others REAL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_group_annual_group ON group_annual_data(group_id);

            CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL REFERENCES shg_groups(id) ON DELETE CASCADE,
                agenda TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                meeting_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_meetings_group ON meetings(group_id);

            CREATE TABLE IF NOT EXISTS attendance (
                id TEXT PRIMARY KEY,
                meeting_id TEXT NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
                attended INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (meeting_id, member_id)
            );
            "#,
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Refuse to work on a database written by a different schema version
    pub(super) fn check_schema_version(&self) -> Result<()> {
        let version: Option<i32> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        match version {
            Some(v) if v != SCHEMA_VERSION => Err(ShgError::Internal(format!(
                "database schema version {} does not match expected version {}",
                v, SCHEMA_VERSION
            ))),
            _ => Ok(()),
        }
    }
}
