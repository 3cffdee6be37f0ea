//! `shg staff` command - Staff management

use clap::Subcommand;
use miette::Result;

use crate::analytics::{Cell, Column, ReportTable};
use crate::cli::helpers::{confirm, non_blank, Session};
use crate::cli::render::{emit_created, emit_done, emit_entity, emit_list};
use crate::cli::GlobalOpts;
use crate::core::entity::Gender;
use crate::core::identity::EntityPrefix;
use crate::core::store::StaffFilter;
use crate::entities::{Staff, StaffRole};

#[derive(Subcommand, Debug)]
pub enum StaffCommands {
    /// Register a staff member
    New(NewArgs),

    /// List staff members
    List(ListArgs),

    /// Show a staff member's details
    Show(ShowArgs),

    /// Delete a staff member
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Full name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Role (super_admin, facilitator, cluster_manager, shg_lead)
    #[arg(long, short = 'r')]
    pub role: StaffRole,

    #[arg(long)]
    pub phone: Option<String>,

    /// Gender (male, female)
    #[arg(long)]
    pub gender: Option<Gender>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<StaffRole>,

    /// Search in name
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Staff ID or short ID (STF@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Staff ID or short ID (STF@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: StaffCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        StaffCommands::New(args) => run_new(args, global),
        StaffCommands::List(args) => run_list(args, global),
        StaffCommands::Show(args) => run_show(args, global),
        StaffCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    let mut staff = Staff::new(args.name, args.role);
    staff.phone = non_blank(args.phone);
    staff.gender = args.gender;
    let short_id = session.store.insert_staff(&staff)?;

    emit_created(
        &staff,
        &staff.id,
        &short_id,
        &format!("Created {} {}", staff.role, staff.name),
        global,
    )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let staff = session.store.list_staff(&StaffFilter {
        role: args.role,
        search: args.search,
    })?;

    if args.count {
        println!("{}", staff.len());
        return Ok(());
    }

    let mut table = ReportTable::new(
        "Staff",
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("role", "Role"),
            Column::new("phone", "Phone"),
        ],
    );
    for s in &staff {
        table.push(vec![
            Cell::Text(session.store.display_id(&s.id)),
            Cell::text(&s.name),
            Cell::text(s.role.as_str()),
            s.phone.as_deref().map(Cell::text).unwrap_or(Cell::Null),
        ]);
    }
    emit_list(&staff, &table, global)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Stf)?;
    let staff = session.store.get_staff(&id)?;
    emit_entity(&staff, &session.store.display_id(&id), global)
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Stf)?;
    let staff = session.store.get_staff(&id)?;
    let short_id = session.store.display_id(&id);

    if !confirm(&format!("Delete staff member {} ({})?", staff.name, short_id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    session.store.delete_staff(&id)?;
    emit_done("Deleted staff member", &short_id, global);
    Ok(())
}
