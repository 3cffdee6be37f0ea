//! `shg survey` command - Record and list survey data
//!
//! Survey records are append-only, so there is no edit or delete here.

use clap::{Subcommand, ValueEnum};
use miette::Result;

use crate::analytics::{Cell, Column, ReportTable};
use crate::cli::helpers::{non_blank, Session};
use crate::cli::render::{emit_created, emit_list};
use crate::cli::GlobalOpts;
use crate::core::entity::{Gender, MaritalStatus};
use crate::core::identity::EntityPrefix;
use crate::core::store::SurveyFilter;
use crate::entities::survey::{
    DecisionMaking, DrinkingWater, Housing, IgaActivity, LoanPurpose, LoanSource, SchoolStatus,
};
use crate::entities::{
    AnnualChildrenStatus, AnnualData, AnnualSelfHelpGroupData, ChildEntry, SixMonthData,
};

#[derive(Subcommand, Debug)]
pub enum SurveyCommands {
    /// Record a six-month member survey
    SixMonth(SixMonthArgs),

    /// Record an annual member survey
    Annual(AnnualArgs),

    /// Record an annual children status survey
    Children(ChildrenArgs),

    /// Record an annual group survey
    GroupAnnual(GroupAnnualArgs),

    /// List recorded surveys of one kind
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct SixMonthArgs {
    /// Member (MEM@N)
    #[arg(long, short = 'm')]
    pub member: String,

    /// Purpose of the SHG loan (iga, social_events, furniture, education, others)
    #[arg(long)]
    pub purpose: LoanPurpose,

    /// The member runs an income-generating activity
    #[arg(long)]
    pub active_iga: bool,

    #[arg(long)]
    pub iga_activity: Option<IgaActivity>,

    #[arg(long)]
    pub iga_capital: Option<f64>,

    #[arg(long)]
    pub loan_from_shg: Option<f64>,

    /// Lender for loans outside the SHG
    #[arg(long)]
    pub loan_source: Option<LoanSource>,

    #[arg(long)]
    pub loan_other: Option<f64>,

    #[arg(long, default_value_t = 0.0)]
    pub personal_income: f64,

    #[arg(long, default_value_t = 0.0)]
    pub household_income: f64,

    #[arg(long, default_value_t = 0)]
    pub meals_children: u32,

    #[arg(long, default_value_t = 0)]
    pub meals_adults: u32,

    #[arg(long, default_value_t = 0)]
    pub diarrhea_children: u32,

    #[arg(long, default_value_t = 0)]
    pub illness_children: u32,

    #[arg(long, default_value_t = 0)]
    pub diarrhea_others: u32,

    #[arg(long, default_value_t = 0)]
    pub illness_others: u32,
}

#[derive(clap::Args, Debug)]
pub struct AnnualArgs {
    /// Member (MEM@N)
    #[arg(long, short = 'm')]
    pub member: String,

    /// Age at survey time (default: the member's age)
    #[arg(long)]
    pub age: Option<u32>,

    /// Default: the member's gender
    #[arg(long)]
    pub gender: Option<Gender>,

    #[arg(long)]
    pub education: Option<String>,

    #[arg(long)]
    pub marital_status: Option<MaritalStatus>,

    #[arg(long, default_value_t = 0)]
    pub family_size: u32,

    #[arg(long, default_value_t = 0)]
    pub household_size: u32,

    /// Total savings held with the group
    #[arg(long, default_value_t = 0.0)]
    pub savings: f64,

    #[arg(long, default_value_t = 0)]
    pub loan_rounds: u32,

    #[arg(long, default_value_t = 0.0)]
    pub asset_value: f64,

    #[arg(long)]
    pub household_decision: Option<DecisionMaking>,

    #[arg(long)]
    pub community_decision: Option<DecisionMaking>,

    #[arg(long, default_value_t = 0)]
    pub mortality_under_5: u32,

    #[arg(long, default_value_t = 0)]
    pub mortality_other: u32,

    #[arg(long)]
    pub housing: Option<Housing>,

    #[arg(long)]
    pub latrine: bool,

    #[arg(long)]
    pub electricity: bool,

    /// Drinking water source
    #[arg(long)]
    pub water: Option<DrinkingWater>,
}

#[derive(clap::Args, Debug)]
pub struct ChildrenArgs {
    /// Member (MEM@N)
    #[arg(long, short = 'm')]
    pub member: String,

    /// Number of children in the household
    #[arg(long)]
    pub number: u32,

    /// One child as name:gender:age:school_status (up to five); empty parts are skipped
    #[arg(long = "child", value_parser = parse_child)]
    pub children: Vec<ChildEntry>,
}

#[derive(clap::Args, Debug)]
pub struct GroupAnnualArgs {
    /// Group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: String,

    /// Weekly regular saving per member
    #[arg(long)]
    pub regular_saving: f64,

    #[arg(long)]
    pub capital: f64,

    #[arg(long, default_value_t = 0)]
    pub members_with_loans: u32,

    #[arg(long)]
    pub smallest_loan: Option<f64>,

    #[arg(long)]
    pub largest_loan: Option<f64>,

    #[arg(long, default_value_t = 0.0)]
    pub written_off: f64,

    #[arg(long, default_value_t = 0.0)]
    pub invested_iga: f64,

    #[arg(long)]
    pub iga_code: Option<String>,

    #[arg(long, default_value_t = 0.0)]
    pub social_income: f64,

    #[arg(long, default_value_t = 0.0)]
    pub social_expenditure: f64,

    #[arg(long, default_value_t = 0)]
    pub members_support: u32,

    #[arg(long, default_value_t = 0)]
    pub outsiders_support: u32,

    #[arg(long, default_value_t = 0)]
    pub institutions: u32,

    #[arg(long, default_value_t = 0)]
    pub trainings: u32,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SurveyKind {
    SixMonth,
    Annual,
    Children,
    GroupAnnual,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Which survey table to list
    #[arg(long, short = 'k', value_enum)]
    pub kind: SurveyKind,

    /// Only surveys of this member (MEM@N)
    #[arg(long, short = 'm')]
    pub member: Option<String>,

    /// Only surveys of this group or its members (SHG@N)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn run(cmd: SurveyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SurveyCommands::SixMonth(args) => run_six_month(args, global),
        SurveyCommands::Annual(args) => run_annual(args, global),
        SurveyCommands::Children(args) => run_children(args, global),
        SurveyCommands::GroupAnnual(args) => run_group_annual(args, global),
        SurveyCommands::List(args) => run_list(args, global),
    }
}

/// Parse `name:gender:age:school_status`
fn parse_child(s: &str) -> std::result::Result<ChildEntry, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    if parts.len() > 4 {
        return Err(format!(
            "Invalid child '{}'. Use name:gender:age:school_status",
            s
        ));
    }
    let part = |i: usize| parts.get(i).copied().filter(|p| !p.is_empty());

    Ok(ChildEntry {
        name: part(0).map(str::to_string),
        gender: part(1).map(str::parse::<Gender>).transpose()?,
        age: part(2)
            .map(|a| a.parse::<u32>().map_err(|_| format!("Invalid child age: {}", a)))
            .transpose()?,
        school_status: part(3).map(str::parse::<SchoolStatus>).transpose()?,
    })
}

fn run_six_month(args: SixMonthArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let member = session.resolve(&args.member, EntityPrefix::Mem)?;

    let mut rec = SixMonthData::new(member, args.purpose);
    rec.active_iga = args.active_iga;
    rec.iga_activity = args.iga_activity;
    rec.iga_capital = args.iga_capital;
    rec.loan_from_shg = args.loan_from_shg;
    rec.loan_source = args.loan_source;
    rec.loan_from_other_sources = args.loan_other;
    rec.monthly_personal_income = args.personal_income;
    rec.monthly_household_income = args.household_income;
    rec.meals_children = args.meals_children;
    rec.meals_adults = args.meals_adults;
    rec.diarrhea_days_children = args.diarrhea_children;
    rec.illness_days_children = args.illness_children;
    rec.diarrhea_days_others = args.diarrhea_others;
    rec.illness_days_others = args.illness_others;

    let short_id = session.store.insert_six_month(&rec)?;
    emit_created(&rec, &rec.id, &short_id, "Recorded six-month survey", global)
}

fn run_annual(args: AnnualArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let member_id = session.resolve(&args.member, EntityPrefix::Mem)?;
    let member = session.store.get_member(&member_id)?;

    let mut rec = AnnualData::new(
        member_id,
        args.age.unwrap_or(member.age),
        args.gender.unwrap_or(member.gender),
    );
    rec.education_level = args.education.unwrap_or_default();
    if let Some(status) = args.marital_status.or(member.marital_status) {
        rec.marital_status = status;
    }
    rec.family_size = args.family_size;
    rec.household_size = args.household_size;
    rec.total_savings = args.savings;
    rec.loan_rounds = args.loan_rounds;
    rec.asset_value = args.asset_value;
    if let Some(d) = args.household_decision {
        rec.household_decision = d;
    }
    if let Some(d) = args.community_decision {
        rec.community_decision = d;
    }
    rec.mortality_under_5 = args.mortality_under_5;
    rec.mortality_other = args.mortality_other;
    if let Some(h) = args.housing {
        rec.housing = h;
    }
    rec.has_latrine = args.latrine;
    rec.has_electricity = args.electricity;
    if let Some(w) = args.water {
        rec.drinking_water = w;
    }

    let short_id = session.store.insert_annual(&rec)?;
    emit_created(&rec, &rec.id, &short_id, "Recorded annual survey", global)
}

fn run_children(args: ChildrenArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let member = session.resolve(&args.member, EntityPrefix::Mem)?;

    let mut rec = AnnualChildrenStatus::new(member, args.number);
    rec.children = args.children;

    let short_id = session.store.insert_children_status(&rec)?;
    emit_created(&rec, &rec.id, &short_id, "Recorded children status", global)
}

fn run_group_annual(args: GroupAnnualArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let group = session.resolve(&args.group, EntityPrefix::Shg)?;

    let mut rec = AnnualSelfHelpGroupData::new(group, args.regular_saving, args.capital);
    rec.members_with_loans = args.members_with_loans;
    rec.smallest_loan = args.smallest_loan;
    rec.largest_loan = args.largest_loan;
    rec.loans_written_off = args.written_off;
    rec.invested_in_group_iga = args.invested_iga;
    rec.group_iga_code = non_blank(args.iga_code);
    rec.description = non_blank(args.description);
    rec.social_savings_income = args.social_income;
    rec.social_savings_expenditure = args.social_expenditure;
    rec.members_social_support = args.members_support;
    rec.outsiders_social_support = args.outsiders_support;
    rec.supporting_institutions = args.institutions;
    rec.trainings_per_year = args.trainings;

    let short_id = session.store.insert_group_annual(&rec)?;
    emit_created(&rec, &rec.id, &short_id, "Recorded annual group survey", global)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let filter = SurveyFilter {
        member: session.resolve_opt(args.member.as_deref(), EntityPrefix::Mem)?,
        group: session.resolve_opt(args.group.as_deref(), EntityPrefix::Shg)?,
        limit: args.limit,
    };
    let store = &session.store;
    let date = |ts: &chrono::DateTime<chrono::Utc>| Cell::Text(ts.format("%Y-%m-%d").to_string());

    match args.kind {
        SurveyKind::SixMonth => {
            let records = store.list_six_month(&filter)?;
            let mut table = ReportTable::new(
                "Six-Month Surveys",
                vec![
                    Column::new("id", "ID"),
                    Column::new("member", "Member"),
                    Column::new("loan_from_shg", "SHG Loan"),
                    Column::new("purpose_of_loan", "Purpose"),
                    Column::new("iga_capital", "IGA Capital"),
                    Column::new("created_at", "Recorded"),
                ],
            );
            for r in &records {
                table.push(vec![
                    Cell::Text(store.display_id(&r.id)),
                    Cell::Text(store.display_id(&r.member)),
                    Cell::opt_amount(r.loan_from_shg),
                    Cell::text(r.purpose_of_loan.as_str()),
                    Cell::opt_amount(r.iga_capital),
                    date(&r.created_at),
                ]);
            }
            emit_list(&records, &table, global)
        }
        SurveyKind::Annual => {
            let records = store.list_annual(&filter)?;
            let mut table = ReportTable::new(
                "Annual Surveys",
                vec![
                    Column::new("id", "ID"),
                    Column::new("member", "Member"),
                    Column::new("household_size", "HH Size"),
                    Column::new("total_savings", "Savings"),
                    Column::new("asset_value", "Assets"),
                    Column::new("created_at", "Recorded"),
                ],
            );
            for r in &records {
                table.push(vec![
                    Cell::Text(store.display_id(&r.id)),
                    Cell::Text(store.display_id(&r.member)),
                    Cell::Count(i64::from(r.household_size)),
                    Cell::amount(r.total_savings),
                    Cell::amount(r.asset_value),
                    date(&r.created_at),
                ]);
            }
            emit_list(&records, &table, global)
        }
        SurveyKind::Children => {
            let records = store.list_children_status(&filter)?;
            let mut table = ReportTable::new(
                "Children Status Surveys",
                vec![
                    Column::new("id", "ID"),
                    Column::new("member", "Member"),
                    Column::new("number_of_children", "Children"),
                    Column::new("enrolled", "Enrolled"),
                    Column::new("created_at", "Recorded"),
                ],
            );
            for r in &records {
                let enrolled = r
                    .children
                    .iter()
                    .filter(|c| c.school_status == Some(SchoolStatus::Enrolled))
                    .count();
                table.push(vec![
                    Cell::Text(store.display_id(&r.id)),
                    Cell::Text(store.display_id(&r.member)),
                    Cell::Count(i64::from(r.number_of_children)),
                    Cell::Count(enrolled as i64),
                    date(&r.created_at),
                ]);
            }
            emit_list(&records, &table, global)
        }
        SurveyKind::GroupAnnual => {
            let records = store.list_group_annual(&filter)?;
            let mut table = ReportTable::new(
                "Annual Group Surveys",
                vec![
                    Column::new("id", "ID"),
                    Column::new("group", "Group"),
                    Column::new("regular_saving", "Regular Saving"),
                    Column::new("shg_capital", "Capital"),
                    Column::new("members_with_loans", "Borrowers"),
                    Column::new("created_at", "Recorded"),
                ],
            );
            for r in &records {
                table.push(vec![
                    Cell::Text(store.display_id(&r.id)),
                    Cell::Text(store.display_id(&r.group)),
                    Cell::amount(r.regular_saving),
                    Cell::amount(r.shg_capital),
                    Cell::Count(i64::from(r.members_with_loans)),
                    date(&r.created_at),
                ]);
            }
            emit_list(&records, &table, global)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_child_full() {
        let child = parse_child("Abebe:male:9:enrolled").unwrap();
        assert_eq!(child.name.as_deref(), Some("Abebe"));
        assert_eq!(child.gender, Some(Gender::Male));
        assert_eq!(child.age, Some(9));
        assert_eq!(child.school_status, Some(SchoolStatus::Enrolled));
    }

    #[test]
    fn test_parse_child_partial() {
        let child = parse_child("::4").unwrap();
        assert_eq!(
            child,
            ChildEntry {
                age: Some(4),
                ..Default::default()
            }
        );
        assert_eq!(parse_child("").unwrap(), ChildEntry::default());
    }

    #[test]
    fn test_parse_child_rejects_bad_parts() {
        assert!(parse_child("Abebe:boy").unwrap_err().contains("Invalid gender"));
        assert!(parse_child("Abebe:male:nine").unwrap_err().contains("age"));
        assert!(parse_child("a:b:c:d:e").is_err());
    }
}
