//! `shg meeting` command - Group meetings and attendance

use clap::Subcommand;
use miette::Result;

use crate::analytics::filter::parse_date;
use crate::analytics::{attendance_table, Cell, Column, ReportTable};
use crate::cli::helpers::{truncate_str, Session};
use crate::cli::render::{emit_created, emit_done, emit_entity, emit_list, emit_table};
use crate::cli::GlobalOpts;
use crate::core::entity::{now, Entity};
use crate::core::identity::EntityPrefix;
use crate::entities::Meeting;

#[derive(Subcommand, Debug)]
pub enum MeetingCommands {
    /// Record a group meeting
    New(NewArgs),

    /// List meetings, newest first
    List(ListArgs),

    /// Mark a member present or absent at a meeting
    Attend(AttendArgs),

    /// Show who attended and who missed a meeting
    Attendance(AttendanceArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: String,

    #[arg(long, short = 'a')]
    pub agenda: String,

    /// Meeting date, YYYY-MM-DD or RFC 3339 (default: now)
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only meetings of this group (SHG@N)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Search in agenda and notes
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AttendArgs {
    /// Meeting (MTG@N)
    pub meeting: String,

    /// Members to mark (MEM@N), repeatable
    #[arg(long, short = 'm', required = true)]
    pub member: Vec<String>,

    /// Mark the members absent instead of present
    #[arg(long)]
    pub absent: bool,
}

#[derive(clap::Args, Debug)]
pub struct AttendanceArgs {
    /// Meeting (MTG@N)
    pub meeting: String,
}

pub fn run(cmd: MeetingCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MeetingCommands::New(args) => run_new(args, global),
        MeetingCommands::List(args) => run_list(args, global),
        MeetingCommands::Attend(args) => run_attend(args, global),
        MeetingCommands::Attendance(args) => run_attendance(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let group = session.resolve(&args.group, EntityPrefix::Shg)?;
    let when = match args.date.as_deref() {
        Some(d) => parse_date(d, false)?,
        None => now(),
    };

    let mut meeting = Meeting::new(group, args.agenda, when);
    meeting.notes = args.notes.unwrap_or_default();
    let short_id = session.store.insert_meeting(&meeting)?;

    emit_created(
        &meeting,
        &meeting.id,
        &short_id,
        &format!("Recorded meeting {}", meeting.label()),
        global,
    )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let group = session.resolve_opt(args.group.as_deref(), EntityPrefix::Shg)?;
    let meetings = session
        .store
        .list_meetings(group.as_ref(), args.search.as_deref())?;

    let mut table = ReportTable::new(
        "Meetings",
        vec![
            Column::new("id", "ID"),
            Column::new("group", "Group"),
            Column::new("meeting_date", "Date"),
            Column::new("agenda", "Agenda"),
        ],
    );
    for m in &meetings {
        table.push(vec![
            Cell::Text(session.store.display_id(&m.id)),
            Cell::Text(session.store.display_id(&m.group)),
            Cell::Text(m.meeting_date.format("%Y-%m-%d").to_string()),
            Cell::Text(truncate_str(&m.agenda, 40)),
        ]);
    }
    emit_list(&meetings, &table, global)
}

fn run_attend(args: AttendArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let meeting = session.resolve(&args.meeting, EntityPrefix::Mtg)?;

    let mut records = Vec::with_capacity(args.member.len());
    for input in &args.member {
        let member = session.resolve(input, EntityPrefix::Mem)?;
        records.push(session.store.record_attendance(&meeting, &member, !args.absent)?);
    }

    if global.is_json() {
        return emit_entity(&records, &session.store.display_id(&meeting), global);
    }

    let state = if args.absent { "absent" } else { "present" };
    emit_done(
        &format!("Marked {} member(s) {} at", records.len(), state),
        &session.store.display_id(&meeting),
        global,
    );
    Ok(())
}

fn run_attendance(args: AttendanceArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let meeting = session.resolve(&args.meeting, EntityPrefix::Mtg)?;

    if global.is_json() {
        let sheet = session.store.attendance_sheet(&meeting)?;
        return emit_entity(&sheet, &session.store.display_id(&meeting), global);
    }

    let table = attendance_table(&session.store, &meeting)?;
    emit_table(&table, global, &table.title)
}
