//! `shg report` command - Aggregate programme reports
//!
//! Every report takes the same filter flags. Location reports group by the
//! most specific location filter given (woreda, then zone, then region).

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::analytics::{write_dump, Aggregator, FilterParams, ReportFilter, ReportTable};
use crate::cli::helpers::Session;
use crate::cli::render::{emit_table, write_output};
use crate::cli::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Groups, members, savings and capital per location
    Summary(FilterArgs),

    /// Loan sizes, purposes and savings ranges per location
    Loans(FilterArgs),

    /// Household size, nutrition, child health and schooling per location
    Household(FilterArgs),

    /// Zero-defaulted totals per location, suitable for charts
    Locations(FilterArgs),

    /// Savings, capital, expenditure and income per group
    Groups(FilterArgs),

    /// Totals over the whole filtered set, or a single group
    Scope(ScopeArgs),

    /// Write the raw survey tables as CSV files
    Dump(DumpArgs),
}

/// Filter flags shared by every report
#[derive(clap::Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only surveys recorded on or after this date (YYYY-MM-DD); needs --end-date
    #[arg(long)]
    pub start_date: Option<String>,

    /// Only surveys recorded on or before this date (YYYY-MM-DD); needs --start-date
    #[arg(long)]
    pub end_date: Option<String>,

    /// Only groups of this cluster (CLU@N)
    #[arg(long, short = 'c')]
    pub cluster: Option<String>,

    /// Only groups of this facilitator (STF@N)
    #[arg(long)]
    pub facilitator: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub zone: Option<String>,

    #[arg(long)]
    pub woreda: Option<String>,

    /// Only groups that are this many whole years old
    #[arg(long)]
    pub group_age: Option<String>,
}

impl FilterArgs {
    fn params(self, group: Option<String>) -> FilterParams {
        FilterParams {
            start_date: self.start_date,
            end_date: self.end_date,
            cluster: self.cluster,
            facilitator: self.facilitator,
            region: self.region,
            zone: self.zone,
            woreda: self.woreda,
            group_age: self.group_age,
            group,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ScopeArgs {
    /// Report on a single group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(clap::Args, Debug)]
pub struct DumpArgs {
    /// Output directory (default: .shg/reports/dump-<date>)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Summary(args) => run_report(args.params(None), global, |a| a.group_summary()),
        ReportCommands::Loans(args) => run_report(args.params(None), global, |a| a.loans_savings()),
        ReportCommands::Household(args) => run_report(args.params(None), global, |a| a.household()),
        ReportCommands::Locations(args) => {
            run_report(args.params(None), global, |a| a.location_metrics())
        }
        ReportCommands::Groups(args) => {
            run_report(args.params(None), global, |a| a.group_financials())
        }
        ReportCommands::Scope(args) => {
            run_report(args.filter.params(args.group), global, |a| a.scope_summary())
        }
        ReportCommands::Dump(args) => run_dump(args, global),
    }
}

fn parse_filter(session: &Session, params: &FilterParams) -> Result<ReportFilter> {
    let filter = ReportFilter::parse(params, &session.store, Utc::now().date_naive())?;
    tracing::debug!(?filter, "report filter");
    Ok(filter)
}

fn run_report<F>(params: FilterParams, global: &GlobalOpts, build: F) -> Result<()>
where
    F: FnOnce(&Aggregator<'_>) -> crate::core::Result<ReportTable>,
{
    let session = Session::open(global)?;
    let filter = parse_filter(&session, &params)?;
    let table = build(&Aggregator::new(&session.store, &filter))?;
    tracing::info!(report = %table.title, rows = table.rows.len(), "built report");

    let title = session.config.report_title(&table.title);
    emit_table(&table, global, title)
}

fn run_dump(args: DumpArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let filter = parse_filter(&session, &args.filter.params(None))?;
    let dir = args.dir.unwrap_or_else(|| {
        session
            .workspace
            .reports_dir()
            .join(format!("dump-{}", Utc::now().format("%Y%m%d-%H%M%S")))
    });

    let written = write_dump(&session.store, &filter, &dir)?;

    if global.is_json() {
        let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        let mut json = serde_json::to_string_pretty(&paths).map_err(crate::core::ShgError::from)?;
        json.push('\n');
        return write_output(&json, global);
    }
    if !global.quiet {
        println!(
            "{} Wrote {} tables to {}",
            style("✓").green(),
            written.len(),
            style(dir.display()).cyan()
        );
        for path in &written {
            if let Some(name) = path.file_name() {
                println!("  {}", style(name.to_string_lossy()).dim());
            }
        }
    }
    Ok(())
}
