//! Raw data export
//!
//! The dump is four flat tables (annual data, six-month data, children status
//! and group status) restricted by the same filters as the aggregate reports.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use super::filter::ReportFilter;
use super::table::{Cell, Column, ReportTable};
use crate::core::error::Result;
use crate::core::store::Store;

/// One exported table and its `(key, label, expr)` columns
struct DumpSpec {
    name: &'static str,
    title: &'static str,
    from: &'static str,
    joins: &'static str,
    order: &'static str,
    columns: &'static [(&'static str, &'static str, &'static str)],
}

const MEMBER_JOINS: &str = "JOIN members m ON m.id = s.member_id \
     JOIN shg_groups g ON g.id = m.group_id";

const ANNUAL: DumpSpec = DumpSpec {
    name: "annual_data",
    title: "Annual Data",
    from: "annual_data s",
    joins: MEMBER_JOINS,
    order: "s.created_at, s.id",
    columns: &[
        ("id", "Record ID", "s.id"),
        ("member", "Member ID", "m.id"),
        ("member_name", "Member Name", "m.first_name || ' ' || m.last_name"),
        ("group", "Group", "g.name"),
        ("age", "Age", "s.age"),
        ("gender", "Gender", "s.gender"),
        ("education_level", "Education Level", "s.education_level"),
        ("marital_status", "Marital Status", "s.marital_status"),
        ("family_size", "Family Size", "s.family_size"),
        ("household_size", "Household Size", "s.household_size"),
        ("total_savings", "Total Savings", "s.total_savings"),
        ("loan_rounds", "Loan Rounds", "s.loan_rounds"),
        ("asset_value", "Asset Value", "s.asset_value"),
        ("household_decision", "Household Decision", "s.household_decision"),
        ("community_decision", "Community Decision", "s.community_decision"),
        ("mortality_under_5", "Mortality Under 5", "s.mortality_under_5"),
        ("mortality_other", "Mortality Other", "s.mortality_other"),
        ("housing", "Housing", "s.housing"),
        ("has_latrine", "Has Latrine", "CASE WHEN s.has_latrine THEN 'yes' ELSE 'no' END"),
        ("has_electricity", "Has Electricity", "CASE WHEN s.has_electricity THEN 'yes' ELSE 'no' END"),
        ("drinking_water", "Drinking Water", "s.drinking_water"),
        ("created_at", "Recorded At", "s.created_at"),
    ],
};

const SIX_MONTH: DumpSpec = DumpSpec {
    name: "six_month_data",
    title: "Six-Month Data",
    from: "six_month_data s",
    joins: MEMBER_JOINS,
    order: "s.created_at, s.id",
    columns: &[
        ("id", "Record ID", "s.id"),
        ("member", "Member ID", "m.id"),
        ("member_name", "Member Name", "m.first_name || ' ' || m.last_name"),
        ("group", "Group", "g.name"),
        ("active_iga", "Active IGA", "CASE WHEN s.active_iga THEN 'yes' ELSE 'no' END"),
        ("iga_activity", "IGA Activity", "s.iga_activity"),
        ("iga_capital", "IGA Capital", "s.iga_capital"),
        ("loan_from_shg", "Loan From SHG", "s.loan_from_shg"),
        ("loan_source", "Loan Source", "s.loan_source"),
        ("loan_from_other_sources", "Loan From Other Sources", "s.loan_from_other_sources"),
        ("purpose_of_loan", "Purpose Of Loan", "s.purpose_of_loan"),
        ("monthly_personal_income", "Monthly Personal Income", "s.monthly_personal_income"),
        ("monthly_household_income", "Monthly Household Income", "s.monthly_household_income"),
        ("meals_children", "Meals Children", "s.meals_children"),
        ("meals_adults", "Meals Adults", "s.meals_adults"),
        ("diarrhea_days_children", "Diarrhea Days Children", "s.diarrhea_days_children"),
        ("illness_days_children", "Illness Days Children", "s.illness_days_children"),
        ("diarrhea_days_others", "Diarrhea Days Others", "s.diarrhea_days_others"),
        ("illness_days_others", "Illness Days Others", "s.illness_days_others"),
        ("created_at", "Recorded At", "s.created_at"),
    ],
};

const CHILDREN: DumpSpec = DumpSpec {
    name: "children_status",
    title: "Children Status",
    from: "children_status s LEFT JOIN child_entries c ON c.status_id = s.id",
    joins: MEMBER_JOINS,
    order: "s.created_at, s.id, c.slot",
    columns: &[
        ("id", "Record ID", "s.id"),
        ("member", "Member ID", "m.id"),
        ("member_name", "Member Name", "m.first_name || ' ' || m.last_name"),
        ("group", "Group", "g.name"),
        ("number_of_children", "Number Of Children", "s.number_of_children"),
        ("slot", "Child", "c.slot"),
        ("child_name", "Child Name", "c.name"),
        ("child_gender", "Child Gender", "c.gender"),
        ("child_age", "Child Age", "c.age"),
        ("school_status", "School Status", "c.school_status"),
        ("created_at", "Recorded At", "s.created_at"),
    ],
};

const GROUP_STATUS: DumpSpec = DumpSpec {
    name: "group_status",
    title: "Group Status",
    from: "group_annual_data s JOIN shg_groups g ON g.id = s.group_id",
    joins: "",
    order: "s.created_at, s.id",
    columns: &[
        ("id", "Record ID", "s.id"),
        ("group_id", "Group ID", "g.id"),
        ("group", "Group", "g.name"),
        ("regular_saving", "Regular Saving", "s.regular_saving"),
        ("shg_capital", "SHG Capital", "s.shg_capital"),
        ("members_with_loans", "Members With Loans", "s.members_with_loans"),
        ("smallest_loan", "Smallest Loan", "s.smallest_loan"),
        ("largest_loan", "Largest Loan", "s.largest_loan"),
        ("loans_written_off", "Loans Written Off", "s.loans_written_off"),
        ("invested_in_group_iga", "Invested In Group IGA", "s.invested_in_group_iga"),
        ("group_iga_code", "Group IGA Code", "s.group_iga_code"),
        ("social_savings_income", "Social Savings Income", "s.social_savings_income"),
        ("social_savings_expenditure", "Social Savings Expenditure", "s.social_savings_expenditure"),
        ("members_social_support", "Members Social Support", "s.members_social_support"),
        ("outsiders_social_support", "Outsiders Social Support", "s.outsiders_social_support"),
        ("supporting_institutions", "Supporting Institutions", "s.supporting_institutions"),
        ("trainings_per_year", "Trainings Per Year", "s.trainings_per_year"),
        ("created_at", "Recorded At", "s.created_at"),
    ],
};

fn cell_from_value(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Integer(i) => Cell::Count(i),
        // raw export, no rounding
        Value::Real(r) => Cell::Text(r.to_string()),
        Value::Text(s) => Cell::Text(s),
        Value::Blob(_) => Cell::Null,
    }
}

fn export(store: &Store, filter: &ReportFilter, spec: &DumpSpec) -> Result<ReportTable> {
    let select = spec
        .columns
        .iter()
        .map(|(_, _, expr)| *expr)
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "SELECT {} FROM {} {} WHERE 1=1",
        select, spec.from, spec.joins
    );
    let mut values: Vec<Value> = Vec::new();
    filter.group_clause(&mut sql, &mut values);
    filter.period_clause(&mut sql, &mut values);
    sql.push_str(&format!(" ORDER BY {}", spec.order));
    tracing::debug!(table = spec.name, sql = %sql, "dump query");

    let mut table = ReportTable::new(
        spec.title,
        spec.columns
            .iter()
            .map(|(key, label, _)| Column::new(*key, *label))
            .collect(),
    );

    let width = spec.columns.len();
    let mut stmt = store.conn().prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        (0..width)
            .map(|idx| row.get::<_, Value>(idx).map(cell_from_value))
            .collect::<rusqlite::Result<Vec<Cell>>>()
    })?;
    for row in rows {
        table.push(row?);
    }
    Ok(table)
}

/// The four raw tables as `(file stem, table)` pairs
pub fn dump_tables(store: &Store, filter: &ReportFilter) -> Result<Vec<(&'static str, ReportTable)>> {
    [&ANNUAL, &SIX_MONTH, &CHILDREN, &GROUP_STATUS]
        .into_iter()
        .map(|spec| Ok((spec.name, export(store, filter, spec)?)))
        .collect()
}

/// Write each table as `<dir>/<name>.csv`; returns the written paths
pub fn write_dump(store: &Store, filter: &ReportFilter, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (name, table) in dump_tables(store, filter)? {
        let path = dir.join(format!("{}.csv", name));
        let mut writer = csv::Writer::from_path(&path)?;
        for record in table.to_records() {
            writer.write_record(&record)?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), rows = table.rows.len(), "wrote dump table");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Gender;
    use crate::entities::survey::{LoanPurpose, SchoolStatus};
    use crate::entities::{
        AnnualChildrenStatus, AnnualData, AnnualSelfHelpGroupData, ChildEntry, Cluster, Member,
        SelfHelpGroup, SixMonthData, Sponsor,
    };
    use tempfile::tempdir;

    fn seeded() -> (Store, Cluster) {
        let mut store = Store::open_in_memory().unwrap();
        let cluster = Cluster::new("Adama");
        store.insert_cluster(&cluster).unwrap();
        let group = SelfHelpGroup::new("Tesfa", Sponsor::Cluster(cluster.id.clone()));
        store.insert_group(&group).unwrap();
        let member = Member::new(group.id.clone(), "Hiwot", "Bekele", Gender::Female, 32);
        store.insert_member(&member).unwrap();

        store
            .insert_annual(&AnnualData::new(member.id.clone(), 32, Gender::Female))
            .unwrap();
        store
            .insert_six_month(&SixMonthData::new(member.id.clone(), LoanPurpose::Iga))
            .unwrap();

        let mut status = AnnualChildrenStatus::new(member.id.clone(), 2);
        status.children = vec![
            ChildEntry {
                name: Some("Abel".to_string()),
                school_status: Some(SchoolStatus::Enrolled),
                ..Default::default()
            },
            ChildEntry {
                name: Some("Sara".to_string()),
                ..Default::default()
            },
        ];
        store.insert_children_status(&status).unwrap();
        store
            .insert_group_annual(&AnnualSelfHelpGroupData::new(group.id.clone(), 20.0, 900.0))
            .unwrap();
        (store, cluster)
    }

    #[test]
    fn test_dump_tables() {
        let (store, _) = seeded();
        let tables = dump_tables(&store, &ReportFilter::all()).unwrap();
        let names: Vec<&str> = tables.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["annual_data", "six_month_data", "children_status", "group_status"]
        );
        assert_eq!(tables[0].1.rows.len(), 1);
        assert_eq!(tables[0].1.cell(0, "member_name"), Some(&Cell::text("Hiwot Bekele")));
        // one row per child
        assert_eq!(tables[2].1.rows.len(), 2);
        assert_eq!(tables[2].1.cell(0, "school_status"), Some(&Cell::text("enrolled")));
        assert!(tables[2].1.cell(1, "school_status").unwrap().is_null());
        assert_eq!(tables[3].1.cell(0, "shg_capital"), Some(&Cell::text("900")));
    }

    #[test]
    fn test_dump_respects_owner_filter() {
        let (store, _) = seeded();
        let other = Cluster::new("Other");
        store.insert_cluster(&other).unwrap();

        let mut filter = ReportFilter::all();
        filter.owner = Some(Sponsor::Cluster(other.id.clone()));
        for (_, table) in dump_tables(&store, &filter).unwrap() {
            assert!(table.is_empty());
        }
    }

    #[test]
    fn test_write_dump_files() {
        let (store, _) = seeded();
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("dump");
        let paths = write_dump(&store, &ReportFilter::all(), &out).unwrap();
        assert_eq!(paths.len(), 4);

        let annual = std::fs::read_to_string(out.join("annual_data.csv")).unwrap();
        let mut lines = annual.lines();
        assert!(lines.next().unwrap().starts_with("Record ID,Member ID,Member Name"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_dump_keeps_full_precision() {
        let (store, cluster) = seeded();
        let group = SelfHelpGroup::new("Kokeb", Sponsor::Cluster(cluster.id.clone()));
        store.insert_group(&group).unwrap();
        store
            .insert_group_annual(&AnnualSelfHelpGroupData::new(group.id.clone(), 12.345, 0.125))
            .unwrap();

        let tmp = tempdir().unwrap();
        let out = tmp.path().join("dump");
        write_dump(&store, &ReportFilter::all(), &out).unwrap();
        let status = std::fs::read_to_string(out.join("group_status.csv")).unwrap();
        assert!(status.contains("12.345"));
        assert!(status.contains("0.125"));
        assert!(!status.contains("12.35"));
    }
}
