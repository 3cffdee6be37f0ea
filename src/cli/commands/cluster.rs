//! `shg cluster` command - Cluster management

use clap::Subcommand;
use miette::Result;

use crate::analytics::{Cell, Column, ReportTable};
use crate::cli::helpers::{confirm, non_blank, Session};
use crate::cli::render::{emit_created, emit_done, emit_entity, emit_list};
use crate::cli::GlobalOpts;
use crate::core::entity::{now, Status};
use crate::core::identity::EntityPrefix;
use crate::core::store::ClusterFilter;
use crate::entities::Cluster;

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Create a cluster
    New(NewArgs),

    /// List clusters with their group and member counts
    List(ListArgs),

    /// Show a cluster's details
    Show(ShowArgs),

    /// Change a cluster's fields
    Edit(EditArgs),

    /// Delete a cluster and, with it, all of its groups
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Cluster name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Free-text location
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Managing staff member (STF@N)
    #[arg(long, short = 'm')]
    pub manager: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status (active, inactive)
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Search in name
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Cluster ID or short ID (CLU@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Cluster ID or short ID (CLU@N)
    pub id: String,

    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// New managing staff member (STF@N)
    #[arg(long, short = 'm', conflicts_with = "clear_manager")]
    pub manager: Option<String>,

    /// Remove the manager
    #[arg(long)]
    pub clear_manager: bool,

    #[arg(long, short = 's')]
    pub status: Option<Status>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Cluster ID or short ID (CLU@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: ClusterCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ClusterCommands::New(args) => run_new(args, global),
        ClusterCommands::List(args) => run_list(args, global),
        ClusterCommands::Show(args) => run_show(args, global),
        ClusterCommands::Edit(args) => run_edit(args, global),
        ClusterCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    let mut cluster = Cluster::new(args.name);
    cluster.location = non_blank(args.location);
    cluster.description = non_blank(args.description);
    cluster.manager = session.resolve_opt(args.manager.as_deref(), EntityPrefix::Stf)?;
    let short_id = session.store.insert_cluster(&cluster)?;

    emit_created(
        &cluster,
        &cluster.id,
        &short_id,
        &format!("Created cluster {}", cluster.name),
        global,
    )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let clusters = session.store.list_clusters(&ClusterFilter {
        status: args.status,
        search: args.search,
    })?;

    if args.count {
        println!("{}", clusters.len());
        return Ok(());
    }

    let mut table = ReportTable::new(
        "Clusters",
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("status", "Status"),
            Column::new("location", "Location"),
            Column::new("manager", "Manager"),
            Column::new("total_groups", "Groups"),
            Column::new("total_members", "Members"),
        ],
    );
    for overview in &clusters {
        let c = &overview.cluster;
        table.push(vec![
            Cell::Text(session.store.display_id(&c.id)),
            Cell::text(&c.name),
            Cell::text(c.status.as_str()),
            c.location.as_deref().map(Cell::text).unwrap_or(Cell::Null),
            c.manager
                .as_ref()
                .map(|m| Cell::Text(session.store.display_id(m)))
                .unwrap_or(Cell::Null),
            Cell::Count(overview.total_groups),
            Cell::Count(overview.total_members),
        ]);
    }
    emit_list(&clusters, &table, global)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Clu)?;
    let overview = session.store.cluster_overview(&id)?;
    emit_entity(&overview, &session.store.display_id(&id), global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Clu)?;
    let mut cluster = session.store.get_cluster(&id)?;

    if let Some(name) = args.name {
        cluster.name = name;
    }
    if let Some(location) = args.location {
        cluster.location = non_blank(Some(location));
    }
    if let Some(description) = args.description {
        cluster.description = non_blank(Some(description));
    }
    if let Some(status) = args.status {
        cluster.status = status;
    }
    if args.clear_manager {
        cluster.manager = None;
    } else if let Some(manager) = args.manager {
        cluster.manager = Some(session.resolve(&manager, EntityPrefix::Stf)?);
    }
    cluster.updated_at = now();

    session.store.update_cluster(&mut cluster)?;
    emit_done("Updated cluster", &session.store.display_id(&id), global);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Clu)?;
    let overview = session.store.cluster_overview(&id)?;
    let short_id = session.store.display_id(&id);

    let prompt = format!(
        "Delete cluster {} ({}) with {} group(s) and {} member(s)?",
        overview.cluster.name, short_id, overview.total_groups, overview.total_members
    );
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    session.store.delete_cluster(&id)?;
    emit_done("Deleted cluster", &short_id, global);
    Ok(())
}
