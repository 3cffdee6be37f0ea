//! `shg member` command - Group member management

use clap::Subcommand;
use miette::Result;

use crate::analytics::{Cell, Column, ReportTable};
use crate::cli::helpers::{confirm, non_blank, Session};
use crate::cli::render::{emit_created, emit_done, emit_entity, emit_list};
use crate::cli::GlobalOpts;
use crate::core::entity::{now, Gender, MaritalStatus, Status};
use crate::core::identity::EntityPrefix;
use crate::core::store::MemberFilter;
use crate::entities::{Member, Religion};

#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// Enrol a member in a group
    New(NewArgs),

    /// List members
    List(ListArgs),

    /// Show a member's details
    Show(ShowArgs),

    /// Change a member's fields
    Edit(EditArgs),

    /// Delete a member with their surveys and attendance
    Delete(DeleteArgs),
}

/// Household fields shared by `new` and `edit`
#[derive(clap::Args, Debug)]
pub struct HouseholdArgs {
    #[arg(long)]
    pub household_size: Option<u32>,

    /// Marital status (single, married, divorced, widowed)
    #[arg(long)]
    pub marital_status: Option<MaritalStatus>,

    /// Religion (christianity, islam, traditional, other)
    #[arg(long)]
    pub religion: Option<Religion>,

    /// Number of other SHG members living in the same house
    #[arg(long)]
    pub other_shg_members: Option<u32>,

    #[arg(long)]
    pub responsible_for_children: Option<bool>,

    /// Phone number or other contact details
    #[arg(long)]
    pub contact: Option<String>,
}

impl HouseholdArgs {
    fn apply(self, member: &mut Member) {
        if self.household_size.is_some() {
            member.household_size = self.household_size;
        }
        if self.marital_status.is_some() {
            member.marital_status = self.marital_status;
        }
        if self.religion.is_some() {
            member.religion = self.religion;
        }
        if let Some(n) = self.other_shg_members {
            member.other_shg_member_in_house = n > 0;
            member.other_shg_members = (n > 0).then_some(n);
        }
        if let Some(flag) = self.responsible_for_children {
            member.responsible_for_children = flag;
        }
        if let Some(contact) = self.contact {
            member.contact_details = non_blank(Some(contact));
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Gender (male, female)
    #[arg(long)]
    pub gender: Gender,

    #[arg(long)]
    pub age: u32,

    #[command(flatten)]
    pub household: HouseholdArgs,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only members of this group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Only members of groups in this cluster (CLU@N)
    #[arg(long, short = 'c')]
    pub cluster: Option<String>,

    #[arg(long)]
    pub gender: Option<Gender>,

    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Search in first or last name
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
    /// Member ID or short ID (MEM@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Member ID or short ID (MEM@N)
    pub id: String,

    /// Move the member to another group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub gender: Option<Gender>,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long, short = 's')]
    pub status: Option<Status>,

    #[command(flatten)]
    pub household: HouseholdArgs,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Member ID or short ID (MEM@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: MemberCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MemberCommands::New(args) => run_new(args, global),
        MemberCommands::List(args) => run_list(args, global),
        MemberCommands::Show(args) => run_show(args, global),
        MemberCommands::Edit(args) => run_edit(args, global),
        MemberCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let group = session.resolve(&args.group, EntityPrefix::Shg)?;

    let mut member = Member::new(group, args.first_name, args.last_name, args.gender, args.age);
    args.household.apply(&mut member);
    let short_id = session.store.insert_member(&member)?;

    emit_created(
        &member,
        &member.id,
        &short_id,
        &format!("Enrolled {}", member.full_name()),
        global,
    )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let members = session.store.list_members(&MemberFilter {
        group: session.resolve_opt(args.group.as_deref(), EntityPrefix::Shg)?,
        cluster: session.resolve_opt(args.cluster.as_deref(), EntityPrefix::Clu)?,
        gender: args.gender,
        status: args.status,
        search: args.search,
        limit: args.limit,
    })?;

    if args.count {
        println!("{}", members.len());
        return Ok(());
    }

    let mut table = ReportTable::new(
        "Members",
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("gender", "Gender"),
            Column::new("age", "Age"),
            Column::new("group", "Group"),
            Column::new("status", "Status"),
        ],
    );
    for m in &members {
        table.push(vec![
            Cell::Text(session.store.display_id(&m.id)),
            Cell::Text(m.full_name()),
            Cell::text(m.gender.as_str()),
            Cell::Count(i64::from(m.age)),
            Cell::Text(session.store.display_id(&m.group)),
            Cell::text(m.status.as_str()),
        ]);
    }
    emit_list(&members, &table, global)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Mem)?;
    let member = session.store.get_member(&id)?;
    emit_entity(&member, &session.store.display_id(&id), global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Mem)?;
    let mut member = session.store.get_member(&id)?;

    if let Some(group) = args.group {
        member.group = session.resolve(&group, EntityPrefix::Shg)?;
    }
    if let Some(first) = args.first_name {
        member.first_name = first;
    }
    if let Some(last) = args.last_name {
        member.last_name = last;
    }
    if let Some(gender) = args.gender {
        member.gender = gender;
    }
    if let Some(age) = args.age {
        member.age = age;
    }
    if let Some(status) = args.status {
        member.status = status;
    }
    args.household.apply(&mut member);
    member.updated_at = now();

    session.store.update_member(&mut member)?;
    emit_done("Updated member", &session.store.display_id(&id), global);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let id = session.resolve(&args.id, EntityPrefix::Mem)?;
    let member = session.store.get_member(&id)?;
    let short_id = session.store.display_id(&id);

    let prompt = format!("Delete member {} ({})?", member.full_name(), short_id);
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    session.store.delete_member(&id)?;
    emit_done("Deleted member", &short_id, global);
    Ok(())
}
