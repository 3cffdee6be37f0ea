//! Survey record storage
//!
//! Survey rows are append-only. There is no update path; they disappear only
//! through the cascade when their member or group is deleted.

use rusqlite::{params, Row, ToSql};

use super::{Store, SurveyFilter};
use crate::core::entity::{format_timestamp, parse_timestamp};
use crate::core::error::{Result, ShgError};
use crate::core::identity::EntityId;
use crate::entities::{
    AnnualChildrenStatus, AnnualData, AnnualSelfHelpGroupData, ChildEntry, SixMonthData,
};

const SIX_MONTH_COLUMNS: &str = "s.id, s.member_id, s.active_iga, s.iga_activity, s.iga_capital, \
     s.loan_from_shg, s.loan_source, s.loan_from_other_sources, s.purpose_of_loan, \
     s.monthly_personal_income, s.monthly_household_income, s.meals_children, s.meals_adults, \
     s.diarrhea_days_children, s.illness_days_children, s.diarrhea_days_others, \
     s.illness_days_others, s.created_at";

const ANNUAL_COLUMNS: &str = "s.id, s.member_id, s.age, s.gender, s.education_level, \
     s.marital_status, s.family_size, s.household_size, s.total_savings, s.loan_rounds, \
     s.asset_value, s.household_decision, s.community_decision, s.mortality_under_5, \
     s.mortality_other, s.housing, s.has_latrine, s.has_electricity, s.drinking_water, \
     s.created_at";

const GROUP_ANNUAL_COLUMNS: &str = "s.id, s.group_id, s.regular_saving, s.shg_capital, \
     s.members_with_loans, s.smallest_loan, s.largest_loan, s.loans_written_off, \
     s.invested_in_group_iga, s.group_iga_code, s.description, s.social_savings_income, \
     s.social_savings_expenditure, s.members_social_support, s.outsiders_social_support, \
     s.supporting_institutions, s.min_monthly_personal, s.trainings_per_year, \
     s.member_health_support, s.other_health_support, s.other_insurance_need, \
     s.other_social_need, s.others, s.created_at";

fn six_month_from_row(row: &Row<'_>) -> rusqlite::Result<SixMonthData> {
    Ok(SixMonthData {
        id: row.get(0)?,
        member: row.get(1)?,
        active_iga: row.get(2)?,
        iga_activity: row.get(3)?,
        iga_capital: row.get(4)?,
        loan_from_shg: row.get(5)?,
        loan_source: row.get(6)?,
        loan_from_other_sources: row.get(7)?,
        purpose_of_loan: row.get(8)?,
        monthly_personal_income: row.get(9)?,
        monthly_household_income: row.get(10)?,
        meals_children: row.get(11)?,
        meals_adults: row.get(12)?,
        diarrhea_days_children: row.get(13)?,
        illness_days_children: row.get(14)?,
        diarrhea_days_others: row.get(15)?,
        illness_days_others: row.get(16)?,
        created_at: parse_timestamp(&row.get::<_, String>(17)?),
    })
}

fn annual_from_row(row: &Row<'_>) -> rusqlite::Result<AnnualData> {
    Ok(AnnualData {
        id: row.get(0)?,
        member: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        education_level: row.get(4)?,
        marital_status: row.get(5)?,
        family_size: row.get(6)?,
        household_size: row.get(7)?,
        total_savings: row.get(8)?,
        loan_rounds: row.get(9)?,
        asset_value: row.get(10)?,
        household_decision: row.get(11)?,
        community_decision: row.get(12)?,
        mortality_under_5: row.get(13)?,
        mortality_other: row.get(14)?,
        housing: row.get(15)?,
        has_latrine: row.get(16)?,
        has_electricity: row.get(17)?,
        drinking_water: row.get(18)?,
        created_at: parse_timestamp(&row.get::<_, String>(19)?),
    })
}

fn group_annual_from_row(row: &Row<'_>) -> rusqlite::Result<AnnualSelfHelpGroupData> {
    Ok(AnnualSelfHelpGroupData {
        id: row.get(0)?,
        group: row.get(1)?,
        regular_saving: row.get(2)?,
        shg_capital: row.get(3)?,
        members_with_loans: row.get(4)?,
        smallest_loan: row.get(5)?,
        largest_loan: row.get(6)?,
        loans_written_off: row.get(7)?,
        invested_in_group_iga: row.get(8)?,
        group_iga_code: row.get(9)?,
        description: row.get(10)?,
        social_savings_income: row.get(11)?,
        social_savings_expenditure: row.get(12)?,
        members_social_support: row.get(13)?,
        outsiders_social_support: row.get(14)?,
        supporting_institutions: row.get(15)?,
        min_monthly_personal: row.get(16)?,
        trainings_per_year: row.get(17)?,
        member_health_support: row.get(18)?,
        other_health_support: row.get(19)?,
        other_insurance_need: row.get(20)?,
        other_social_need: row.get(21)?,
        others: row.get(22)?,
        created_at: parse_timestamp(&row.get::<_, String>(23)?),
    })
}

/// Append the member/group restrictions shared by the member survey listings
fn member_survey_where(
    filter: &SurveyFilter,
    sql: &mut String,
    params_vec: &mut Vec<Box<dyn ToSql>>,
) {
    if let Some(ref member) = filter.member {
        sql.push_str(" AND s.member_id = ?");
        params_vec.push(Box::new(member.clone()));
    }
    if let Some(ref group) = filter.group {
        sql.push_str(" AND m.group_id = ?");
        params_vec.push(Box::new(group.clone()));
    }
}

fn finish(sql: &mut String, limit: Option<usize>) {
    sql.push_str(" ORDER BY s.created_at DESC");
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
}

impl Store {
    fn check_survey(errors: Vec<String>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ShgError::from_field_errors(errors))
        }
    }

    pub fn insert_six_month(&self, rec: &SixMonthData) -> Result<String> {
        Self::check_survey(rec.validate())?;
        self.require(&rec.member)?;
        self.conn.execute(
            "INSERT INTO six_month_data (id, member_id, active_iga, iga_activity, iga_capital,
                loan_from_shg, loan_source, loan_from_other_sources, purpose_of_loan,
                monthly_personal_income, monthly_household_income, meals_children, meals_adults,
                diarrhea_days_children, illness_days_children, diarrhea_days_others,
                illness_days_others, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                rec.id,
                rec.member,
                rec.active_iga,
                rec.iga_activity,
                rec.iga_capital,
                rec.loan_from_shg,
                rec.loan_source,
                rec.loan_from_other_sources,
                rec.purpose_of_loan,
                rec.monthly_personal_income,
                rec.monthly_household_income,
                rec.meals_children,
                rec.meals_adults,
                rec.diarrhea_days_children,
                rec.illness_days_children,
                rec.diarrhea_days_others,
                rec.illness_days_others,
                format_timestamp(&rec.created_at),
            ],
        )?;
        tracing::info!(id = %rec.id, member = %rec.member, "recorded six-month data");
        self.ensure_short_id(&rec.id)
    }

    pub fn list_six_month(&self, filter: &SurveyFilter) -> Result<Vec<SixMonthData>> {
        let mut sql = format!(
            "SELECT {} FROM six_month_data s JOIN members m ON m.id = s.member_id WHERE 1=1",
            SIX_MONTH_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];
        member_survey_where(filter, &mut sql, &mut params_vec);
        finish(&mut sql, filter.limit);
        self.query_list(&sql, &params_vec, six_month_from_row)
    }

    pub fn insert_annual(&self, rec: &AnnualData) -> Result<String> {
        Self::check_survey(rec.validate())?;
        self.require(&rec.member)?;
        self.conn.execute(
            "INSERT INTO annual_data (id, member_id, age, gender, education_level, marital_status,
                family_size, household_size, total_savings, loan_rounds, asset_value,
                household_decision, community_decision, mortality_under_5, mortality_other,
                housing, has_latrine, has_electricity, drinking_water, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20)",
            params![
                rec.id,
                rec.member,
                rec.age,
                rec.gender,
                rec.education_level,
                rec.marital_status,
                rec.family_size,
                rec.household_size,
                rec.total_savings,
                rec.loan_rounds,
                rec.asset_value,
                rec.household_decision,
                rec.community_decision,
                rec.mortality_under_5,
                rec.mortality_other,
                rec.housing,
                rec.has_latrine,
                rec.has_electricity,
                rec.drinking_water,
                format_timestamp(&rec.created_at),
            ],
        )?;
        tracing::info!(id = %rec.id, member = %rec.member, "recorded annual data");
        self.ensure_short_id(&rec.id)
    }

    pub fn list_annual(&self, filter: &SurveyFilter) -> Result<Vec<AnnualData>> {
        let mut sql = format!(
            "SELECT {} FROM annual_data s JOIN members m ON m.id = s.member_id WHERE 1=1",
            ANNUAL_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];
        member_survey_where(filter, &mut sql, &mut params_vec);
        finish(&mut sql, filter.limit);
        self.query_list(&sql, &params_vec, annual_from_row)
    }

    /// Store a children status record and its child entries in one transaction
    pub fn insert_children_status(&mut self, rec: &AnnualChildrenStatus) -> Result<String> {
        Self::check_survey(rec.validate())?;
        self.require(&rec.member)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO children_status (id, member_id, number_of_children, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                rec.id,
                rec.member,
                rec.number_of_children,
                format_timestamp(&rec.created_at),
            ],
        )?;
        for (idx, child) in rec.children.iter().enumerate() {
            tx.execute(
                "INSERT INTO child_entries (status_id, slot, name, gender, age, school_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rec.id,
                    (idx + 1) as i64,
                    child.name,
                    child.gender,
                    child.age,
                    child.school_status,
                ],
            )?;
        }
        tx.commit()?;

        tracing::info!(id = %rec.id, children = rec.children.len(), "recorded children status");
        self.ensure_short_id(&rec.id)
    }

    pub fn list_children_status(&self, filter: &SurveyFilter) -> Result<Vec<AnnualChildrenStatus>> {
        let mut sql = String::from(
            "SELECT s.id, s.member_id, s.number_of_children, s.created_at
             FROM children_status s JOIN members m ON m.id = s.member_id WHERE 1=1",
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];
        member_survey_where(filter, &mut sql, &mut params_vec);
        finish(&mut sql, filter.limit);

        let mut records = self.query_list(&sql, &params_vec, |row| {
            Ok(AnnualChildrenStatus {
                id: row.get(0)?,
                member: row.get(1)?,
                number_of_children: row.get(2)?,
                children: Vec::new(),
                created_at: parse_timestamp(&row.get::<_, String>(3)?),
            })
        })?;

        for rec in &mut records {
            rec.children = self.child_entries(&rec.id)?;
        }
        Ok(records)
    }

    fn child_entries(&self, status_id: &EntityId) -> Result<Vec<ChildEntry>> {
        let params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(status_id.clone())];
        self.query_list(
            "SELECT name, gender, age, school_status FROM child_entries
             WHERE status_id = ? ORDER BY slot",
            &params_vec,
            |row| {
                Ok(ChildEntry {
                    name: row.get(0)?,
                    gender: row.get(1)?,
                    age: row.get(2)?,
                    school_status: row.get(3)?,
                })
            },
        )
    }

    pub fn insert_group_annual(&self, rec: &AnnualSelfHelpGroupData) -> Result<String> {
        Self::check_survey(rec.validate())?;
        self.require(&rec.group)?;
        self.conn.execute(
            "INSERT INTO group_annual_data (id, group_id, regular_saving, shg_capital,
                members_with_loans, smallest_loan, largest_loan, loans_written_off,
                invested_in_group_iga, group_iga_code, description, social_savings_income,
                social_savings_expenditure, members_social_support, outsiders_social_support,
                supporting_institutions, min_monthly_personal, trainings_per_year,
                member_health_support, other_health_support, other_insurance_need,
                other_social_need, others, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            params![
                rec.id,
                rec.group,
                rec.regular_saving,
                rec.shg_capital,
                rec.members_with_loans,
                rec.smallest_loan,
                rec.largest_loan,
                rec.loans_written_off,
                rec.invested_in_group_iga,
                rec.group_iga_code,
                rec.description,
                rec.social_savings_income,
                rec.social_savings_expenditure,
                rec.members_social_support,
                rec.outsiders_social_support,
                rec.supporting_institutions,
                rec.min_monthly_personal,
                rec.trainings_per_year,
                rec.member_health_support,
                rec.other_health_support,
                rec.other_insurance_need,
                rec.other_social_need,
                rec.others,
                format_timestamp(&rec.created_at),
            ],
        )?;
        tracing::info!(id = %rec.id, group = %rec.group, "recorded annual group data");
        self.ensure_short_id(&rec.id)
    }

    pub fn list_group_annual(&self, filter: &SurveyFilter) -> Result<Vec<AnnualSelfHelpGroupData>> {
        let mut sql = format!(
            "SELECT {} FROM group_annual_data s WHERE 1=1",
            GROUP_ANNUAL_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];
        if let Some(ref group) = filter.group {
            sql.push_str(" AND s.group_id = ?");
            params_vec.push(Box::new(group.clone()));
        }
        finish(&mut sql, filter.limit);
        self.query_list(&sql, &params_vec, group_annual_from_row)
    }
}
