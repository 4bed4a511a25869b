//! `wl meeting` — create, show, and list meeting notes.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::io::Write;
use worklog_core::WorklogStore;
use worklog_core::model::meeting::{Meeting, MeetingDraft};

use crate::output::{OutputMode, fail, render};

#[derive(Subcommand, Debug)]
pub enum MeetingCommand {
    /// Record a new meeting.
    New(NewMeetingArgs),

    /// Show one meeting by its file key (e.g. 2026-03-01-sprint-planning).
    Show {
        /// Meeting file key.
        key: String,
    },

    /// List all meetings, newest first.
    List,
}

#[derive(Args, Debug)]
pub struct NewMeetingArgs {
    /// Meeting title.
    #[arg(short, long)]
    pub title: String,

    /// Meeting date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Participant name (repeatable).
    #[arg(short, long = "participant")]
    pub participants: Vec<String>,

    /// Agenda entry (repeatable).
    #[arg(long = "agenda")]
    pub agenda: Vec<String>,

    /// Free-form notes body.
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Action item (repeatable).
    #[arg(long = "action")]
    pub action_items: Vec<String>,
}

pub fn run_meeting(
    command: &MeetingCommand,
    store: &WorklogStore,
    output: OutputMode,
) -> anyhow::Result<()> {
    match command {
        MeetingCommand::New(args) => {
            let draft = MeetingDraft {
                title: args.title.clone(),
                date: args
                    .date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc()),
                participants: args.participants.clone(),
                agenda: args.agenda.clone(),
                notes: args.notes.clone(),
                action_items: args.action_items.clone(),
            };
            match store.create_meeting(draft) {
                Ok(meeting) => render(output, &meeting, write_meeting),
                Err(e) => Err(fail(output, e)),
            }
        }
        MeetingCommand::Show { key } => match store.get_meeting(key) {
            Ok(meeting) => render(output, &meeting, write_meeting),
            Err(e) => Err(fail(output, e)),
        },
        MeetingCommand::List => match store.list_meetings() {
            Ok(meetings) => render(output, &meetings, |meetings, w| {
                for meeting in meetings {
                    writeln!(
                        w,
                        "{}  {} ({} participants)",
                        meeting.date.format("%Y-%m-%d"),
                        meeting.title,
                        meeting.participants.len()
                    )?;
                }
                writeln!(w, "{} meetings", meetings.len())
            }),
            Err(e) => Err(fail(output, e)),
        },
    }
}

fn write_meeting(meeting: &Meeting, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{}  {}", meeting.date.format("%Y-%m-%d"), meeting.title)?;
    if !meeting.participants.is_empty() {
        writeln!(w, "  participants: {}", meeting.participants.join(", "))?;
    }
    for entry in &meeting.agenda {
        writeln!(w, "  agenda: {entry}")?;
    }
    if !meeting.notes.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", meeting.notes)?;
    }
    for action in &meeting.action_items {
        writeln!(w, "  action: {action}")?;
    }
    Ok(())
}
