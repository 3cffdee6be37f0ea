//! Aggregate reports
//!
//! Each report runs one grouped query per data source (groups, members, the
//! survey tables) with the same filter predicates, then joins the partial
//! totals per bucket in Rust. Buckets come from the filtered group set, so a
//! bucket with no survey rows still reports zeroes.

use std::collections::HashMap;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use super::dimension::Dimension;
use super::filter::ReportFilter;
use super::table::{Cell, Column, ReportTable};
use crate::core::error::Result;
use crate::core::identity::EntityId;
use crate::core::store::Store;
use crate::entities::Sponsor;

/// Row sources a report can aggregate over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Groups,
    Members,
    SixMonth,
    Annual,
    Children,
    GroupAnnual,
}

impl Source {
    fn from_sql(self) -> &'static str {
        match self {
            Source::Groups => "shg_groups g",
            Source::Members => "members m JOIN shg_groups g ON g.id = m.group_id",
            Source::SixMonth => {
                "six_month_data s
                 JOIN members m ON m.id = s.member_id
                 JOIN shg_groups g ON g.id = m.group_id"
            }
            Source::Annual => {
                "annual_data s
                 JOIN members m ON m.id = s.member_id
                 JOIN shg_groups g ON g.id = m.group_id"
            }
            Source::Children => {
                "child_entries c
                 JOIN children_status s ON s.id = c.status_id
                 JOIN members m ON m.id = s.member_id
                 JOIN shg_groups g ON g.id = m.group_id"
            }
            Source::GroupAnnual => "group_annual_data s JOIN shg_groups g ON g.id = s.group_id",
        }
    }

    /// Survey sources carry a timestamp and honour the date window
    fn dated(self) -> bool {
        !matches!(self, Source::Groups | Source::Members)
    }
}

/// Partial aggregates keyed by bucket
#[derive(Debug, Default)]
struct Totals(HashMap<String, Vec<Value>>);

impl Totals {
    fn value(&self, bucket: &str, idx: usize) -> Option<&Value> {
        self.0.get(bucket).and_then(|row| row.get(idx))
    }

    fn num(&self, bucket: &str, idx: usize) -> Option<f64> {
        match self.value(bucket, idx) {
            Some(Value::Integer(i)) => Some(*i as f64),
            Some(Value::Real(r)) => Some(*r),
            _ => None,
        }
    }

    fn sum(&self, bucket: &str, idx: usize) -> f64 {
        self.num(bucket, idx).unwrap_or(0.0)
    }

    fn count(&self, bucket: &str, idx: usize) -> i64 {
        match self.value(bucket, idx) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Real(r)) => *r as i64,
            _ => 0,
        }
    }
}

fn bucket_column(dim: Dimension) -> Column {
    match dim {
        Dimension::Group => Column::new("group", "Group"),
        Dimension::None => Column::new("scope", "Scope"),
        _ => Column::new("location", "Location"),
    }
}

fn summary_columns(dim: Dimension) -> Vec<Column> {
    vec![
        bucket_column(dim),
        Column::new("total_groups", "Total Groups"),
        Column::new("total_members", "Total Members"),
        Column::new("total_hh_size", "Total HH Size"),
        Column::new("total_savings", "Total Savings"),
        Column::new("total_capital", "Total Capital"),
        Column::new("total_loan_circulated", "Total Loan Circulated"),
        Column::new("avg_iga_capital", "Avg IGA Capital"),
    ]
}

/// Runs reports for one validated filter set
pub struct Aggregator<'a> {
    store: &'a Store,
    filter: &'a ReportFilter,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a Store, filter: &'a ReportFilter) -> Self {
        Self { store, filter }
    }

    /// `SELECT <bucket>, <select> FROM <source> WHERE <filters> GROUP BY <bucket>[, extra]`
    fn query(
        &self,
        dim: Dimension,
        source: Source,
        select: &str,
        extra_group: Option<&str>,
    ) -> Result<Vec<(String, Vec<Value>)>> {
        let mut sql = format!(
            "SELECT {} AS bucket, {} FROM {} WHERE 1=1",
            dim.key_sql(),
            select,
            source.from_sql()
        );
        let mut values: Vec<Value> = Vec::new();
        self.filter.group_clause(&mut sql, &mut values);
        if source.dated() {
            self.filter.period_clause(&mut sql, &mut values);
        }
        sql.push_str(" GROUP BY bucket");
        if let Some(extra) = extra_group {
            sql.push_str(&format!(", {} ORDER BY bucket, {}", extra, extra));
        }
        tracing::debug!(sql = %sql, params = values.len(), "aggregate query");

        let mut stmt = self.store.conn().prepare(&sql)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            let bucket: Option<String> = row.get(0)?;
            let mut cells = Vec::with_capacity(width.saturating_sub(1));
            for idx in 1..width {
                cells.push(row.get::<_, Value>(idx)?);
            }
            Ok((bucket, cells))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (bucket, cells) = row?;
            match bucket {
                Some(b) if !b.is_empty() => out.push((b, cells)),
                _ => {}
            }
        }
        Ok(out)
    }

    fn totals(&self, dim: Dimension, source: Source, select: &str) -> Result<Totals> {
        Ok(Totals(self.query(dim, source, select, None)?.into_iter().collect()))
    }

    /// Bucket keys and labels over the filtered groups, ordered by label
    fn buckets(&self, dim: Dimension) -> Result<Vec<(String, String)>> {
        if dim == Dimension::None {
            return Ok(vec![("all".to_string(), self.scope_label()?)]);
        }

        let key = dim.key_sql();
        let mut sql = format!(
            "SELECT DISTINCT {key}, {label} FROM shg_groups g
             WHERE {key} IS NOT NULL AND {key} <> ''",
            key = key,
            label = dim.label_sql()
        );
        let mut values: Vec<Value> = Vec::new();
        self.filter.group_clause(&mut sql, &mut values);
        sql.push_str(" ORDER BY 2, 1");

        let mut stmt = self.store.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Name of whatever the filters narrow the data set to
    fn scope_label(&self) -> Result<String> {
        if let Some(group) = &self.filter.group {
            return Ok(self.store.get_group(group)?.name);
        }
        match &self.filter.owner {
            Some(Sponsor::Cluster(id)) => Ok(self.store.get_cluster(id)?.name),
            Some(Sponsor::Facilitator(id)) => Ok(self.store.get_staff(id)?.name),
            None => Ok("System".to_string()),
        }
    }

    fn summary(&self, dim: Dimension, title: &str) -> Result<ReportTable> {
        let groups = self.totals(dim, Source::Groups, "COUNT(*)")?;
        let members = self.totals(
            dim,
            Source::Members,
            "COUNT(*), COALESCE(SUM(m.household_size), 0)",
        )?;
        let annual = self.totals(dim, Source::Annual, "COALESCE(SUM(s.total_savings), 0)")?;
        let six = self.totals(
            dim,
            Source::SixMonth,
            "COALESCE(SUM(s.iga_capital), 0), COALESCE(SUM(s.loan_from_shg), 0), AVG(s.iga_capital)",
        )?;

        let mut table = ReportTable::new(title, summary_columns(dim));
        for (key, label) in self.buckets(dim)? {
            table.push(vec![
                Cell::Text(label),
                Cell::Count(groups.count(&key, 0)),
                Cell::Count(members.count(&key, 0)),
                Cell::Count(members.count(&key, 1)),
                Cell::amount(annual.sum(&key, 0)),
                Cell::amount(six.sum(&key, 0)),
                Cell::amount(six.sum(&key, 1)),
                Cell::opt_amount(six.num(&key, 2)),
            ]);
        }
        Ok(table)
    }

    /// Group counts, membership, savings and capital per location
    pub fn group_summary(&self) -> Result<ReportTable> {
        self.summary(Dimension::for_location(self.filter), "Group Summary Report")
    }

    /// The same totals as [`group_summary`](Self::group_summary) over the whole filtered set
    pub fn scope_summary(&self) -> Result<ReportTable> {
        self.summary(Dimension::None, "Scope Summary Report")
    }

    /// Loan sizes, loan purposes and savings ranges per location
    pub fn loans_savings(&self) -> Result<ReportTable> {
        let dim = Dimension::for_location(self.filter);
        let members = self.totals(dim, Source::Members, "COUNT(*)")?;
        let six = self.totals(
            dim,
            Source::SixMonth,
            "MAX(s.loan_from_shg), MIN(s.iga_capital), MAX(s.iga_capital),
             COALESCE(SUM(s.loan_from_other_sources), 0)",
        )?;
        let annual = self.totals(
            dim,
            Source::Annual,
            "MIN(s.total_savings), MAX(s.total_savings)",
        )?;

        let mut by_purpose: HashMap<String, Vec<(String, f64)>> = HashMap::new();
        for (bucket, cells) in self.query(
            dim,
            Source::SixMonth,
            "s.purpose_of_loan, COALESCE(SUM(s.loan_from_shg), 0)",
            Some("s.purpose_of_loan"),
        )? {
            let purpose = match cells.first() {
                Some(Value::Text(p)) => p.clone(),
                _ => continue,
            };
            let total = match cells.get(1) {
                Some(Value::Integer(i)) => *i as f64,
                Some(Value::Real(r)) => *r,
                _ => 0.0,
            };
            by_purpose
                .entry(bucket)
                .or_default()
                .push((purpose, super::table::round2(total)));
        }

        let mut table = ReportTable::new(
            "Loans and Savings Report",
            vec![
                bucket_column(dim),
                Column::new("total_members", "Total Members"),
                Column::new("max_loan_received", "Max Loan Received"),
                Column::new("iga_capital_range", "IGA Capital Range"),
                Column::new("total_other_loans", "Total Other Loans"),
                Column::new("loan_by_purpose", "Loan by Purpose"),
                Column::new("savings_range", "Savings Range"),
            ],
        );
        for (key, label) in self.buckets(dim)? {
            table.push(vec![
                Cell::Text(label),
                Cell::Count(members.count(&key, 0)),
                Cell::opt_amount(six.num(&key, 0)),
                Cell::range(six.num(&key, 1), six.num(&key, 2)),
                Cell::amount(six.sum(&key, 3)),
                Cell::Breakdown(by_purpose.remove(&key).unwrap_or_default()),
                Cell::range(annual.num(&key, 0), annual.num(&key, 1)),
            ]);
        }
        Ok(table)
    }

    /// Household size, nutrition, child health and schooling per location
    pub fn household(&self) -> Result<ReportTable> {
        let dim = Dimension::for_location(self.filter);
        let members = self.totals(dim, Source::Members, "COUNT(*)")?;
        let annual = self.totals(
            dim,
            Source::Annual,
            "COALESCE(SUM(s.household_size), 0), COALESCE(SUM(s.mortality_under_5), 0)",
        )?;
        let six = self.totals(
            dim,
            Source::SixMonth,
            "AVG(s.meals_children + s.meals_adults),
             COALESCE(SUM(s.diarrhea_days_children + s.illness_days_children), 0)",
        )?;
        let children = self.totals(
            dim,
            Source::Children,
            "COUNT(c.school_status),
             COALESCE(SUM(CASE WHEN c.school_status = 'enrolled' THEN 1 ELSE 0 END), 0)",
        )?;

        let mut table = ReportTable::new(
            "Household Report",
            vec![
                bucket_column(dim),
                Column::new("total_members", "Total Members"),
                Column::new("total_household_size", "Total Household Size"),
                Column::new("avg_meals_per_day", "Avg Meals Per Day"),
                Column::new("total_child_morbidity", "Total Child Morbidity"),
                Column::new("total_child_mortality", "Total Child Mortality"),
                Column::new("school_enrollment_pct", "% School Enrollment"),
            ],
        );
        for (key, label) in self.buckets(dim)? {
            let total_members = members.count(&key, 0);
            if total_members == 0 {
                continue;
            }
            let with_status = children.count(&key, 0);
            let enrollment = if with_status > 0 {
                Cell::amount(children.count(&key, 1) as f64 * 100.0 / with_status as f64)
            } else {
                Cell::Null
            };
            table.push(vec![
                Cell::Text(label),
                Cell::Count(total_members),
                Cell::Count(annual.count(&key, 0)),
                Cell::opt_amount(six.num(&key, 0)),
                Cell::Count(six.count(&key, 1)),
                Cell::Count(annual.count(&key, 1)),
                enrollment,
            ]);
        }
        Ok(table)
    }

    /// Zero-defaulted metrics per location, the data set behind charts
    pub fn location_metrics(&self) -> Result<ReportTable> {
        let dim = Dimension::for_location(self.filter);
        let groups = self.totals(dim, Source::Groups, "COUNT(*)")?;
        let members = self.totals(dim, Source::Members, "COUNT(*)")?;
        let annual = self.totals(dim, Source::Annual, "COALESCE(SUM(s.total_savings), 0)")?;
        let six = self.totals(
            dim,
            Source::SixMonth,
            "COALESCE(SUM(s.iga_capital), 0), COALESCE(SUM(s.loan_from_shg), 0),
             COALESCE(MAX(s.loan_from_shg), 0), COALESCE(SUM(s.loan_from_other_sources), 0)",
        )?;

        let mut table = ReportTable::new(
            "Location Metrics",
            vec![
                bucket_column(dim),
                Column::new("total_groups", "Total Groups"),
                Column::new("total_members", "Total Members"),
                Column::new("total_savings", "Total Savings"),
                Column::new("total_capital", "Total Capital"),
                Column::new("total_loan_circulated", "Total Loan Circulated"),
                Column::new("max_loan_taken", "Max Loan Taken"),
                Column::new("total_loan_other_sources", "Total Loan Other Sources"),
            ],
        );
        for (key, label) in self.buckets(dim)? {
            table.push(vec![
                Cell::Text(label),
                Cell::Count(groups.count(&key, 0)),
                Cell::Count(members.count(&key, 0)),
                Cell::amount(annual.sum(&key, 0)),
                Cell::amount(six.sum(&key, 0)),
                Cell::amount(six.sum(&key, 1)),
                Cell::amount(six.sum(&key, 2)),
                Cell::amount(six.sum(&key, 3)),
            ]);
        }
        Ok(table)
    }

    /// Savings, capital, expenditure and income per group
    pub fn group_financials(&self) -> Result<ReportTable> {
        let dim = Dimension::Group;
        let annual = self.totals(dim, Source::Annual, "SUM(s.total_savings)")?;
        let six = self.totals(
            dim,
            Source::SixMonth,
            "SUM(s.iga_capital), AVG(s.iga_capital), AVG(s.monthly_personal_income)",
        )?;
        let group_annual = self.totals(
            dim,
            Source::GroupAnnual,
            "SUM(s.social_savings_expenditure)",
        )?;

        let mut table = ReportTable::new(
            "Group Financial Metrics",
            vec![
                bucket_column(dim),
                Column::new("weekly_saving", "Weekly Saving"),
                Column::new("total_capital", "Total Capital"),
                Column::new("total_expenditure", "Total Expenditure"),
                Column::new("avg_iga_capital", "Avg IGA Capital"),
                Column::new("avg_monthly_income", "Avg Monthly Income"),
            ],
        );
        for (key, label) in self.buckets(dim)? {
            table.push(vec![
                Cell::Text(label),
                Cell::amount(annual.sum(&key, 0)),
                Cell::amount(six.sum(&key, 0)),
                Cell::amount(group_annual.sum(&key, 0)),
                Cell::amount(six.sum(&key, 1)),
                Cell::amount(six.sum(&key, 2)),
            ]);
        }
        Ok(table)
    }
}

/// Attended and missed members of one meeting
pub fn attendance_table(store: &Store, meeting: &EntityId) -> Result<ReportTable> {
    let sheet = store.attendance_sheet(meeting)?;
    let mut table = ReportTable::new(
        "Meeting Attendance",
        vec![
            Column::new("member", "Member"),
            Column::new("name", "Name"),
            Column::new("attended", "Attended"),
        ],
    );
    for (members, attended) in [(&sheet.attended, "yes"), (&sheet.missed, "no")] {
        for member in members {
            table.push(vec![
                Cell::Text(store.display_id(&member.id)),
                Cell::Text(member.full_name()),
                Cell::text(attended),
            ]);
        }
    }
    Ok(table)
}

/// Distinct free-text group locations
pub fn locations_table(store: &Store) -> Result<ReportTable> {
    let mut table = ReportTable::new("Group Locations", vec![Column::new("location", "Location")]);
    for location in store.distinct_locations()? {
        table.push(vec![Cell::Text(location)]);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::filter::{group_age_window, parse_date, DateRange};
    use crate::core::entity::{format_timestamp, Gender};
    use crate::entities::survey::{LoanPurpose, SchoolStatus};
    use crate::entities::{
        AnnualChildrenStatus, AnnualData, AnnualSelfHelpGroupData, ChildEntry, Cluster, Member,
        SelfHelpGroup, SixMonthData,
    };

    struct Fixture {
        store: Store,
        cluster: Cluster,
        groups: Vec<SelfHelpGroup>,
        members: Vec<Member>,
    }

    fn group_in(store: &Store, cluster: &Cluster, name: &str, region: &str, zone: &str) -> SelfHelpGroup {
        let mut group = SelfHelpGroup::new(name, Sponsor::Cluster(cluster.id.clone()));
        group.region = Some(region.to_string());
        group.zone = Some(zone.to_string());
        store.insert_group(&group).unwrap();
        group
    }

    /// One cluster, two groups of three members, one annual row per member
    fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        let cluster = Cluster::new("Adama");
        store.insert_cluster(&cluster).unwrap();

        let groups = vec![
            group_in(&store, &cluster, "Tesfa", "Oromia", "East Shewa"),
            group_in(&store, &cluster, "Andinet", "Amhara", "North Shewa"),
        ];

        let mut members = Vec::new();
        let mut savings = 100.0;
        for group in &groups {
            for i in 0..3 {
                let mut member =
                    Member::new(group.id.clone(), format!("M{}", i), "Test", Gender::Female, 30);
                member.household_size = Some(4);
                store.insert_member(&member).unwrap();

                let mut annual = AnnualData::new(member.id.clone(), 30, Gender::Female);
                annual.total_savings = savings;
                annual.household_size = 5;
                store.insert_annual(&annual).unwrap();
                savings += 50.0;

                members.push(member);
            }
        }

        Fixture {
            store,
            cluster,
            groups,
            members,
        }
    }

    fn six_month(store: &Store, member: &Member, capital: f64, loan: f64, purpose: LoanPurpose) {
        let mut rec = SixMonthData::new(member.id.clone(), purpose);
        rec.iga_capital = Some(capital);
        rec.loan_from_shg = Some(loan);
        rec.meals_children = 3;
        rec.meals_adults = 2;
        rec.diarrhea_days_children = 1;
        rec.illness_days_children = 2;
        store.insert_six_month(&rec).unwrap();
    }

    fn amount(table: &ReportTable, row: usize, key: &str) -> f64 {
        match table.cell(row, key) {
            Some(Cell::Amount(v)) => *v,
            other => panic!("{} is not an amount: {:?}", key, other),
        }
    }

    fn count(table: &ReportTable, row: usize, key: &str) -> i64 {
        match table.cell(row, key) {
            Some(Cell::Count(v)) => *v,
            other => panic!("{} is not a count: {:?}", key, other),
        }
    }

    #[test]
    fn test_scope_summary_over_cluster() {
        let fx = fixture();
        let mut filter = ReportFilter::all();
        filter.owner = Some(Sponsor::Cluster(fx.cluster.id.clone()));

        let table = Aggregator::new(&fx.store, &filter).scope_summary().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, "scope"), Some(&Cell::text("Adama")));
        assert_eq!(count(&table, 0, "total_groups"), 2);
        assert_eq!(count(&table, 0, "total_members"), 6);
        assert_eq!(count(&table, 0, "total_hh_size"), 24);
        // 100 + 150 + ... + 350
        assert_eq!(amount(&table, 0, "total_savings"), 1350.0);
        assert_eq!(amount(&table, 0, "total_capital"), 0.0);
        assert!(table.cell(0, "avg_iga_capital").unwrap().is_null());
    }

    #[test]
    fn test_scope_summary_for_single_group() {
        let fx = fixture();
        let mut filter = ReportFilter::all();
        filter.group = Some(fx.groups[1].id.clone());

        let table = Aggregator::new(&fx.store, &filter).scope_summary().unwrap();
        assert_eq!(table.cell(0, "scope"), Some(&Cell::text("Andinet")));
        assert_eq!(count(&table, 0, "total_members"), 3);
        assert_eq!(amount(&table, 0, "total_savings"), 250.0 + 300.0 + 350.0);
    }

    #[test]
    fn test_empty_store_scope_is_zeroed() {
        let store = Store::open_in_memory().unwrap();
        let filter = ReportFilter::all();
        let table = Aggregator::new(&store, &filter).scope_summary().unwrap();
        assert_eq!(table.cell(0, "scope"), Some(&Cell::text("System")));
        assert_eq!(count(&table, 0, "total_groups"), 0);
        assert_eq!(amount(&table, 0, "total_loan_circulated"), 0.0);
    }

    #[test]
    fn test_group_summary_by_region_then_zone() {
        let fx = fixture();
        six_month(&fx.store, &fx.members[0], 1000.0, 500.0, LoanPurpose::Iga);
        six_month(&fx.store, &fx.members[1], 3000.0, 700.0, LoanPurpose::Iga);

        let filter = ReportFilter::all();
        let table = Aggregator::new(&fx.store, &filter).group_summary().unwrap();
        assert_eq!(table.columns[0].label, "Location");
        let locations: Vec<String> = table.rows.iter().map(|r| r[0].csv_text()).collect();
        assert_eq!(locations, vec!["Amhara", "Oromia"]);

        assert_eq!(amount(&table, 1, "total_capital"), 4000.0);
        assert_eq!(amount(&table, 1, "total_loan_circulated"), 1200.0);
        assert_eq!(amount(&table, 1, "avg_iga_capital"), 2000.0);
        assert_eq!(amount(&table, 0, "total_capital"), 0.0);
        assert!(table.cell(0, "avg_iga_capital").unwrap().is_null());

        let mut by_zone = ReportFilter::all();
        by_zone.zone = Some("East Shewa".to_string());
        let table = Aggregator::new(&fx.store, &by_zone).group_summary().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, "location"), Some(&Cell::text("East Shewa")));
    }

    #[test]
    fn test_date_range_includes_end_day() {
        let fx = fixture();
        let mut filter = ReportFilter::all();
        let start = parse_date("2020-01-01", false).unwrap();
        let end = parse_date(&format_timestamp(&crate::core::entity::now())[..10], true).unwrap();
        filter.period = Some(DateRange { start, end });

        let table = Aggregator::new(&fx.store, &filter).scope_summary().unwrap();
        assert_eq!(amount(&table, 0, "total_savings"), 1350.0);

        filter.period = Some(DateRange {
            start,
            end: parse_date("2020-12-31", true).unwrap(),
        });
        let table = Aggregator::new(&fx.store, &filter).scope_summary().unwrap();
        assert_eq!(amount(&table, 0, "total_savings"), 0.0);
        // membership is not dated
        assert_eq!(count(&table, 0, "total_members"), 6);
    }

    #[test]
    fn test_reports_are_repeatable() {
        let fx = fixture();
        six_month(&fx.store, &fx.members[3], 800.0, 200.0, LoanPurpose::Education);
        let filter = ReportFilter::all();
        let agg = Aggregator::new(&fx.store, &filter);
        assert_eq!(agg.loans_savings().unwrap(), agg.loans_savings().unwrap());
        assert_eq!(agg.household().unwrap(), agg.household().unwrap());
    }

    #[test]
    fn test_filters_narrow_monotonically() {
        let fx = fixture();
        let mut filters = vec![ReportFilter::all()];
        let mut next = ReportFilter::all();
        next.owner = Some(Sponsor::Cluster(fx.cluster.id.clone()));
        filters.push(next.clone());
        next.region = Some("Oromia".to_string());
        filters.push(next.clone());
        next.zone = Some("Nowhere".to_string());
        filters.push(next);

        let mut previous = i64::MAX;
        for filter in &filters {
            let table = Aggregator::new(&fx.store, filter).scope_summary().unwrap();
            let members = count(&table, 0, "total_members");
            assert!(members <= previous);
            previous = members;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_loans_savings_breakdown() {
        let fx = fixture();
        six_month(&fx.store, &fx.members[0], 1000.0, 500.0, LoanPurpose::Iga);
        six_month(&fx.store, &fx.members[1], 3000.0, 700.0, LoanPurpose::Education);
        six_month(&fx.store, &fx.members[2], 2000.0, 100.0, LoanPurpose::Iga);

        let mut filter = ReportFilter::all();
        filter.region = Some("Oromia".to_string());
        let table = Aggregator::new(&fx.store, &filter).loans_savings().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(amount(&table, 0, "max_loan_received"), 700.0);
        assert_eq!(
            table.cell(0, "iga_capital_range"),
            Some(&Cell::Range {
                min: 1000.0,
                max: 3000.0
            })
        );
        assert_eq!(
            table.cell(0, "savings_range"),
            Some(&Cell::Range { min: 100.0, max: 200.0 })
        );
        match table.cell(0, "loan_by_purpose") {
            Some(Cell::Breakdown(parts)) => {
                assert_eq!(parts.len(), 2);
                assert!(parts.windows(2).all(|w| w[0].0 <= w[1].0));
                let iga = parts.iter().find(|(p, _)| p == LoanPurpose::Iga.as_str());
                assert_eq!(iga.map(|(_, v)| *v), Some(600.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_household_enrollment() {
        let mut fx = fixture();
        six_month(&fx.store, &fx.members[0], 0.0, 0.0, LoanPurpose::Iga);

        let mut status = AnnualChildrenStatus::new(fx.members[0].id.clone(), 2);
        status.children = vec![
            ChildEntry {
                school_status: Some(SchoolStatus::Enrolled),
                ..Default::default()
            },
            ChildEntry {
                school_status: Some(SchoolStatus::DroppedOut),
                ..Default::default()
            },
        ];
        fx.store.insert_children_status(&status).unwrap();

        let mut filter = ReportFilter::all();
        filter.region = Some("Oromia".to_string());
        let table = Aggregator::new(&fx.store, &filter).household().unwrap();
        assert_eq!(count(&table, 0, "total_household_size"), 15);
        assert_eq!(amount(&table, 0, "avg_meals_per_day"), 5.0);
        assert_eq!(count(&table, 0, "total_child_morbidity"), 3);
        assert_eq!(amount(&table, 0, "school_enrollment_pct"), 50.0);

        filter.region = Some("Amhara".to_string());
        let table = Aggregator::new(&fx.store, &filter).household().unwrap();
        assert!(table.cell(0, "school_enrollment_pct").unwrap().is_null());
        assert!(table.cell(0, "avg_meals_per_day").unwrap().is_null());

        // a location whose groups have no members is skipped
        let empty = group_in(&fx.store, &fx.cluster, "Empty", "Sidama", "Hawassa");
        fx.groups.push(empty);
        let table = Aggregator::new(&fx.store, &ReportFilter::all()).household().unwrap();
        assert!(table.rows.iter().all(|r| r[0].csv_text() != "Sidama"));
    }

    #[test]
    fn test_location_metrics_zero_defaults() {
        let fx = fixture();
        let table = Aggregator::new(&fx.store, &ReportFilter::all())
            .location_metrics()
            .unwrap();
        assert_eq!(table.rows.len(), 2);
        for row in 0..2 {
            assert_eq!(amount(&table, row, "max_loan_taken"), 0.0);
            assert_eq!(amount(&table, row, "total_loan_other_sources"), 0.0);
            assert_eq!(count(&table, row, "total_members"), 3);
        }
    }

    #[test]
    fn test_group_financials() {
        let fx = fixture();
        let mut rec = SixMonthData::new(fx.members[0].id.clone(), LoanPurpose::Iga);
        rec.iga_capital = Some(100.0);
        rec.monthly_personal_income = 333.333;
        fx.store.insert_six_month(&rec).unwrap();

        let mut group_data = AnnualSelfHelpGroupData::new(fx.groups[0].id.clone(), 20.0, 5000.0);
        group_data.social_savings_expenditure = 75.5;
        fx.store.insert_group_annual(&group_data).unwrap();

        let table = Aggregator::new(&fx.store, &ReportFilter::all())
            .group_financials()
            .unwrap();
        assert_eq!(table.columns[0].label, "Group");
        let names: Vec<String> = table.rows.iter().map(|r| r[0].csv_text()).collect();
        assert_eq!(names, vec!["Andinet", "Tesfa"]);

        assert_eq!(amount(&table, 1, "weekly_saving"), 450.0);
        assert_eq!(amount(&table, 1, "total_expenditure"), 75.5);
        assert_eq!(amount(&table, 1, "avg_monthly_income"), 333.33);
        assert_eq!(amount(&table, 0, "avg_iga_capital"), 0.0);
    }

    #[test]
    fn test_attendance_and_locations_tables() {
        let fx = fixture();
        let meeting = crate::entities::Meeting::new(
            fx.groups[0].id.clone(),
            "Savings",
            crate::core::entity::now(),
        );
        fx.store.insert_meeting(&meeting).unwrap();
        fx.store
            .record_attendance(&meeting.id, &fx.members[0].id, true)
            .unwrap();
        fx.store
            .record_attendance(&meeting.id, &fx.members[1].id, false)
            .unwrap();

        let table = attendance_table(&fx.store, &meeting.id).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, "attended"), Some(&Cell::text("yes")));
        assert_eq!(table.cell(1, "attended"), Some(&Cell::text("no")));

        assert!(locations_table(&fx.store).unwrap().is_empty());
    }

    #[test]
    fn test_facilitator_and_group_age_filters() {
        let store = Store::open_in_memory().unwrap();
        let cluster = Cluster::new("Adama");
        store.insert_cluster(&cluster).unwrap();
        let facilitator =
            crate::entities::Staff::new("Almaz", crate::entities::StaffRole::Facilitator);
        store.insert_staff(&facilitator).unwrap();

        let mut old = SelfHelpGroup::new("Old", Sponsor::Cluster(cluster.id.clone()));
        old.created_at = chrono::Utc::now() - chrono::Duration::days(400);
        store.insert_group(&old).unwrap();
        let young = SelfHelpGroup::new("Young", Sponsor::Facilitator(facilitator.id.clone()));
        store.insert_group(&young).unwrap();

        let names = |filter: &ReportFilter| -> Vec<String> {
            let table = Aggregator::new(&store, filter).group_financials().unwrap();
            table.rows.iter().map(|r| r[0].csv_text()).collect()
        };
        assert_eq!(names(&ReportFilter::all()), vec!["Old", "Young"]);

        let mut by_age = ReportFilter::all();
        let today = chrono::Utc::now().date_naive();
        by_age.group_window = Some(group_age_window(1, today).unwrap());
        assert_eq!(names(&by_age), vec!["Old"]);
        let table = Aggregator::new(&store, &by_age).scope_summary().unwrap();
        assert_eq!(count(&table, 0, "total_groups"), 1);

        let mut by_facilitator = ReportFilter::all();
        by_facilitator.owner = Some(Sponsor::Facilitator(facilitator.id.clone()));
        assert_eq!(names(&by_facilitator), vec!["Young"]);
        let table = Aggregator::new(&store, &by_facilitator).scope_summary().unwrap();
        assert_eq!(table.cell(0, "scope"), Some(&Cell::text("Almaz")));
        assert_eq!(count(&table, 0, "total_groups"), 1);

        by_facilitator.group_window = by_age.group_window;
        assert!(names(&by_facilitator).is_empty());
    }
}
