//! `shg group` command - Self-help group management

use clap::Subcommand;
use miette::Result;

use crate::analytics::{locations_table, Cell, Column, ReportTable};
use crate::cli::helpers::{confirm, non_blank, truncate_str, Session};
use crate::cli::render::{emit_created, emit_done, emit_entity, emit_list, emit_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{now, Status};
use crate::core::identity::EntityPrefix;
use crate::core::store::GroupFilter;
use crate::core::ShgError;
use crate::entities::{SelfHelpGroup, Sponsor, SponsorKind};

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a group under a cluster or a facilitator
    New(NewArgs),

    /// List groups
    List(ListArgs),

    /// Show a group's details
    Show(ShowArgs),

    /// Change a group's fields
    Edit(EditArgs),

    /// Delete a group with its members, surveys and meetings
    Delete(DeleteArgs),

    /// Move every group of a cluster or facilitator to another cluster
    Transfer(TransferArgs),

    /// List the distinct free-text locations in use
    Locations,
}

/// Location fields shared by `new` and `edit`
#[derive(clap::Args, Debug, Default)]
pub struct LocationArgs {
    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub zone: Option<String>,

    #[arg(long)]
    pub woreda: Option<String>,

    /// Free-text location (village, kebele)
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<f64>,
}

impl LocationArgs {
    /// Overwrite only the fields that were given
    fn apply(self, group: &mut SelfHelpGroup) {
        if let Some(v) = self.region {
            group.region = non_blank(Some(v));
        }
        if let Some(v) = self.zone {
            group.zone = non_blank(Some(v));
        }
        if let Some(v) = self.woreda {
            group.woreda = non_blank(Some(v));
        }
        if let Some(v) = self.location {
            group.location = non_blank(Some(v));
        }
        if self.latitude.is_some() {
            group.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            group.longitude = self.longitude;
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Group name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Owning cluster (CLU@N)
    #[arg(long, short = 'c', required_unless_present = "facilitator", conflicts_with = "facilitator")]
    pub cluster: Option<String>,

    /// Owning facilitator (STF@N)
    #[arg(long)]
    pub facilitator: Option<String>,

    /// Group leader (STF@N)
    #[arg(long)]
    pub leader: Option<String>,

    #[command(flatten)]
    pub place: LocationArgs,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Only groups of this cluster (CLU@N)
    #[arg(long, short = 'c')]
    pub cluster: Option<String>,

    /// Only groups of this facilitator (STF@N)
    #[arg(long)]
    pub facilitator: Option<String>,

    /// Exact free-text location
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    /// Search in name
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Group ID or short ID (SHG@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Group ID or short ID (SHG@N)
    pub id: String,

    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Move the group to this cluster (CLU@N)
    #[arg(long, short = 'c', conflicts_with = "facilitator")]
    pub cluster: Option<String>,

    /// Move the group to this facilitator (STF@N)
    #[arg(long)]
    pub facilitator: Option<String>,

    #[arg(long)]
    pub leader: Option<String>,

    #[arg(long, short = 's')]
    pub status: Option<Status>,

    #[command(flatten)]
    pub place: LocationArgs,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Group ID or short ID (SHG@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct TransferArgs {
    /// Kind of the current owner: facilitator or cluster
    #[arg(long)]
    pub source_type: String,

    /// Current owner (STF@N or CLU@N)
    #[arg(long)]
    pub source: String,

    /// Receiving cluster (CLU@N)
    #[arg(long)]
    pub target: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: GroupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        GroupCommands::New(args) => run_new(args, global),
        GroupCommands::List(args) => run_list(args, global),
        GroupCommands::Show(args) => run_show(args, global),
        GroupCommands::Edit(args) => run_edit(args, global),
        GroupCommands::Delete(args) => run_delete(args, global),
        GroupCommands::Transfer(args) => run_transfer(args, global),
        GroupCommands::Locations => run_locations(global),
    }
}

fn sponsor_from(
    session: &Session,
    cluster: Option<&str>,
    facilitator: Option<&str>,
) -> Result<Option<Sponsor>> {
    if let Some(c) = cluster {
        return Ok(Some(Sponsor::Cluster(session.resolve(c, EntityPrefix::Clu)?)));
    }
    if let Some(f) = facilitator {
        return Ok(Some(Sponsor::Facilitator(session.resolve(f, EntityPrefix::Stf)?)));
    }
    Ok(None)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    let sponsor = sponsor_from(&session, args.cluster.as_deref(), args.facilitator.as_deref())?
        .ok_or_else(|| {
            ShgError::validation(
                "A group must be associated with either a cluster or a facilitator.",
            )
        })?;

    let mut group = SelfHelpGroup::new(args.name, sponsor);
    group.leader = session.resolve_opt(args.leader.as_deref(), EntityPrefix::Stf)?;
    group.description = non_blank(args.description);
    args.place.apply(&mut group);
    let short_id = session.store.insert_group(&group)?;

    emit_created(
        &group,
        &group.id,
        &short_id,
        &format!("Created group {}", group.name),
        global,
    )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let groups = session.store.list_groups(&GroupFilter {
        status: args.status,
        cluster: session.resolve_opt(args.cluster.as_deref(), EntityPrefix::Clu)?,
        facilitator: session.resolve_opt(args.facilitator.as_deref(), EntityPrefix::Stf)?,
        location: non_blank(args.location),
        region: non_blank(args.region),
        search: args.search,
        limit: args.limit,
    })?;

    if args.count {
        println!("{}", groups.len());
        return Ok(());
    }

    let mut table = ReportTable::new(
        "Groups",
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("sponsor", "Sponsor"),
            Column::new("status", "Status"),
            Column::new("region", "Region"),
            Column::new("location", "Location"),
            Column::new("total_members", "Members"),
        ],
    );
    let wide = !matches!(global.format, OutputFormat::Auto | OutputFormat::Table);
    for overview in &groups {
        let g = &overview.group;
        let name = if wide { g.name.clone() } else { truncate_str(&g.name, 30) };
        table.push(vec![
            Cell::Text(session.store.display_id(&g.id)),
            Cell::Text(name),
            Cell::Text(session.store.display_id(g.sponsor.id())),
            Cell::text(g.status.as_str()),
            g.region.as_deref().map(Cell::text).unwrap_or(Cell::Null),
            g.location.as_deref().map(Cell::text).unwrap_or(Cell::Null),
            Cell::Count(overview.total_members),
        ]);
    }
    emit_list(&groups, &table, global)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Shg)?;
    let overview = session.store.group_overview(&id)?;
    emit_entity(&overview, &session.store.display_id(&id), global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Shg)?;
    let mut group = session.store.get_group(&id)?;

    if let Some(name) = args.name {
        group.name = name;
    }
    if let Some(sponsor) =
        sponsor_from(&session, args.cluster.as_deref(), args.facilitator.as_deref())?
    {
        group.sponsor = sponsor;
    }
    if let Some(leader) = args.leader {
        group.leader = Some(session.resolve(&leader, EntityPrefix::Stf)?);
    }
    if let Some(status) = args.status {
        group.status = status;
    }
    if let Some(description) = args.description {
        group.description = non_blank(Some(description));
    }
    args.place.apply(&mut group);
    group.updated_at = now();

    session.store.update_group(&mut group)?;
    emit_done("Updated group", &session.store.display_id(&id), global);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Shg)?;
    let overview = session.store.group_overview(&id)?;
    let short_id = session.store.display_id(&id);

    let prompt = format!(
        "Delete group {} ({}) and its {} member(s)?",
        overview.group.name, short_id, overview.total_members
    );
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    session.store.delete_group(&id)?;
    emit_done("Deleted group", &short_id, global);
    Ok(())
}

fn run_transfer(args: TransferArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    let kind: SponsorKind = args.source_type.parse().map_err(ShgError::Validation)?;
    let source = kind.with_id(session.resolve(&args.source, kind.prefix())?);
    let target = session.resolve(&args.target, EntityPrefix::Clu)?;

    let prompt = format!(
        "Move all groups of {} to cluster {}?",
        session.store.display_id(source.id()),
        session.store.display_id(&target)
    );
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let moved = session.store.transfer_groups(&source, &target)?;

    if global.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "message": format!("Successfully transferred {} groups.", moved),
                "moved": moved,
            })
        );
    } else if !global.quiet {
        emit_done(
            &format!("Transferred {} group(s) to", moved),
            &session.store.display_id(&target),
            global,
        );
    }
    Ok(())
}

fn run_locations(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let table = locations_table(&session.store)?;
    if global.is_json() {
        let locations = session.store.distinct_locations()?;
        return emit_list(&locations, &table, global);
    }
    emit_table(&table, global, &table.title)
}
