/// CLI argument parsing and command handling.
use std::rc::Rc;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db;
use crate::frequency::Frequency;
use crate::lifecycle::{Lifecycle, LifecycleError, ReminderLifecycle, TrackingLifecycle};
use crate::occurrence::next_occurrence;
use crate::store::ReminderStore;
use crate::types::{
    Reminder, ReminderId, ReminderQuery, ReminderStatus, ReminderValue, Schedule, Tracking,
    TrackingId, TrackingQuery, TrackingState, UserId,
};

/// The single local user.
const DEFAULT_USER: UserId = 1;

#[derive(Parser)]
#[command(
    name = "habitr",
    version,
    about = "Habitr - A terminal habit and reminder tracker"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new tracking.
    Add {
        question: String,
        /// Recurrence rule, e.g. daily, weekly:mon,wed,fri, monthly:last,
        /// monthly:2nd-tue, yearly:3-21, once:2026-01-01.
        #[arg(short = 'f', long = "frequency")]
        frequency: String,
        /// Time-of-day slot as HH:MM, up to five times.
        #[arg(short = 'a', long = "at")]
        at: Vec<String>,
        #[arg(short = 'd', long = "details")]
        details: Option<String>,
        #[arg(long = "icon")]
        icon: Option<String>,
        /// Create the tracking paused instead of running.
        #[arg(long = "paused")]
        paused: bool,
    },
    /// List trackings.
    List {
        /// Include archived trackings.
        #[arg(long = "all")]
        all: bool,
        /// Show archived trackings only.
        #[arg(long = "archived")]
        archived: bool,
    },
    /// Edit the question, details or icon of a tracking.
    Edit {
        id: TrackingId,
        #[arg(short = 'q', long = "question")]
        question: Option<String>,
        #[arg(short = 'd', long = "details")]
        details: Option<String>,
        #[arg(long = "icon")]
        icon: Option<String>,
    },
    /// Pause a running tracking.
    Pause { id: TrackingId },
    /// Resume a paused or archived tracking.
    Resume { id: TrackingId },
    /// Archive a tracking, keeping only its answered history.
    Archive { id: TrackingId },
    /// Delete a tracking and everything attached to it.
    Delete { id: TrackingId },
    /// List reminders.
    Reminders {
        /// Filter by status: upcoming, pending or answered.
        #[arg(short = 's', long = "status")]
        status: Option<String>,
        /// Filter by tracking id.
        #[arg(short = 't', long = "tracking")]
        tracking: Option<TrackingId>,
    },
    /// Promote upcoming reminders whose time has arrived to pending.
    Due,
    /// Answer a pending reminder.
    Answer {
        id: ReminderId,
        #[arg(long = "done")]
        done: bool,
        #[arg(long = "dismiss")]
        dismiss: bool,
        #[arg(short = 'n', long = "notes")]
        notes: Option<String>,
    },
}

/// Execute a CLI command.
pub fn run(command: Command, conn: Rc<Connection>) -> Result<()> {
    match command {
        Command::Add {
            question,
            frequency,
            at,
            details,
            icon,
            paused,
        } => handle_add(question, frequency, at, details, icon, paused, &conn)?,
        Command::List { all, archived } => handle_list(all, archived, &conn)?,
        Command::Edit {
            id,
            question,
            details,
            icon,
        } => handle_edit(id, question, details, icon, &conn)?,
        Command::Pause { id } => handle_transition(id, TrackingState::Paused, &conn)?,
        Command::Resume { id } => handle_transition(id, TrackingState::Running, &conn)?,
        Command::Archive { id } => handle_transition(id, TrackingState::Archived, &conn)?,
        Command::Delete { id } => handle_delete(id, &conn)?,
        Command::Reminders { status, tracking } => handle_reminders(status, tracking, &conn)?,
        Command::Due => handle_due(&conn)?,
        Command::Answer {
            id,
            done,
            dismiss,
            notes,
        } => handle_answer(id, done, dismiss, notes, &conn)?,
    }
    Ok(())
}

fn tracking_lifecycle(conn: &Rc<Connection>) -> TrackingLifecycle {
    TrackingLifecycle::new(Rc::clone(conn), Rc::new(|| Local::now()))
}

fn handle_add(
    question: String,
    frequency: String,
    at: Vec<String>,
    details: Option<String>,
    icon: Option<String>,
    paused: bool,
    conn: &Rc<Connection>,
) -> Result<()> {
    let frequency = match Frequency::parse(&frequency) {
        Ok(frequency) => frequency,
        Err(err) => {
            println!("Invalid frequency: {err}");
            return Ok(());
        }
    };

    let mut schedules = Vec::new();
    for raw in &at {
        let Some((hour, minutes)) = parse_slot(raw) else {
            println!("Invalid schedule '{raw}', expected HH:MM.");
            return Ok(());
        };
        schedules.push(Schedule {
            id: None,
            tracking_id: None,
            hour,
            minutes,
        });
    }

    let now = Local::now();
    let tracking = Tracking {
        id: None,
        user_id: DEFAULT_USER,
        question,
        details,
        icon,
        frequency,
        state: if paused {
            TrackingState::Paused
        } else {
            TrackingState::Running
        },
        schedules,
        created_at: now,
        updated_at: now,
    };
    if let Err(err) = tracking.validate() {
        println!("{err}");
        return Ok(());
    }

    let id = db::create_tracking(&tracking, conn)?;
    // Reload so the hooks observe the persisted record with bound schedules.
    if let Some(created) = db::query_tracking_by_id(id, conn)? {
        tracking_lifecycle(conn).created(&created)?;
    }
    println!("Created tracking #{id}.");
    Ok(())
}

fn handle_list(all: bool, archived: bool, conn: &Rc<Connection>) -> Result<()> {
    let query = if all {
        TrackingQuery::All
    } else if archived {
        TrackingQuery::ByState(TrackingState::Archived)
    } else {
        TrackingQuery::Active
    };
    let trackings = db::query_trackings(query, conn)?;
    if trackings.is_empty() {
        println!("No trackings.");
        return Ok(());
    }

    let now = Local::now();
    for tracking in &trackings {
        let Some(id) = tracking.id else {
            continue;
        };
        let slots = if tracking.schedules.is_empty() {
            "no slots".to_string()
        } else {
            tracking
                .schedules
                .iter()
                .map(|schedule| schedule.label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut line = format!(
            "#{id} [{}] {} ({} at {slots})",
            tracking.state, tracking.question, tracking.frequency
        );
        if tracking.state == TrackingState::Running {
            if let Some(next) = next_occurrence(&tracking.frequency, now, &tracking.schedules) {
                line.push_str(&format!(", next {}", next.format("%Y-%m-%d %H:%M")));
            }
        }
        println!("{line}");
    }
    Ok(())
}

fn handle_edit(
    id: TrackingId,
    question: Option<String>,
    details: Option<String>,
    icon: Option<String>,
    conn: &Rc<Connection>,
) -> Result<()> {
    let Some(tracking) = db::query_tracking_by_id(id, conn)? else {
        println!("Tracking #{id} not found.");
        return Ok(());
    };

    let mut updated = tracking;
    if let Some(question) = question {
        updated.question = question;
    }
    if let Some(details) = details {
        updated.details = Some(details);
    }
    if let Some(icon) = icon {
        updated.icon = Some(icon);
    }
    if let Err(err) = updated.validate() {
        println!("{err}");
        return Ok(());
    }

    db::update_tracking_details(
        id,
        updated.question.clone(),
        updated.details.clone(),
        updated.icon.clone(),
        conn,
    )?;
    tracking_lifecycle(conn).updated(&updated)?;
    println!("Tracking #{id} updated.");
    Ok(())
}

/// Shared by pause, resume and archive. The state write happens between the
/// before- and after-handlers, so after-handlers see the committed state.
fn handle_transition(id: TrackingId, to: TrackingState, conn: &Rc<Connection>) -> Result<()> {
    let Some(tracking) = db::query_tracking_by_id(id, conn)? else {
        println!("Tracking #{id} not found.");
        return Ok(());
    };

    let lifecycle = tracking_lifecycle(conn);
    let from = match lifecycle.transition(&tracking, to) {
        Ok(from) => from,
        Err(LifecycleError::InvalidTransition { from, to }) => {
            println!("Tracking #{id} cannot go from {from} to {to}.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    db::update_tracking_state(id, to, conn)?;
    let persisted = Tracking {
        state: to,
        ..tracking
    };
    lifecycle.after_state_change(&persisted, from, to)?;
    println!("Tracking #{id} is now {to}.");
    Ok(())
}

fn handle_delete(id: TrackingId, conn: &Rc<Connection>) -> Result<()> {
    let Some(tracking) = db::query_tracking_by_id(id, conn)? else {
        println!("Tracking #{id} not found.");
        return Ok(());
    };
    db::delete_tracking(id, conn)?;
    tracking_lifecycle(conn).deleted(&tracking)?;
    println!("Tracking #{id} deleted.");
    Ok(())
}

fn handle_reminders(
    status: Option<String>,
    tracking: Option<TrackingId>,
    conn: &Rc<Connection>,
) -> Result<()> {
    let query = match (&status, tracking) {
        (Some(_), Some(_)) => {
            println!("Filter by either status or tracking, not both.");
            return Ok(());
        }
        (Some(raw), None) => match ReminderStatus::parse(raw) {
            Some(status) => ReminderQuery::ByStatus(status),
            None => {
                println!("Unknown status '{raw}'.");
                return Ok(());
            }
        },
        (None, Some(id)) => ReminderQuery::ByTracking(id),
        (None, None) => ReminderQuery::All,
    };

    let reminders = db::query_reminders(query, conn)?;
    if reminders.is_empty() {
        println!("No reminders.");
        return Ok(());
    }
    for reminder in &reminders {
        let Some(id) = reminder.id else {
            continue;
        };
        let value = match reminder.value {
            Some(value) => format!(" ({value})"),
            None => String::new(),
        };
        let notes = match &reminder.notes {
            Some(notes) => format!(" - {notes}"),
            None => String::new(),
        };
        println!(
            "#{id} tracking #{} {} [{}]{value}{notes}",
            reminder.tracking_id,
            reminder.scheduled_time.format("%Y-%m-%d %H:%M"),
            reminder.status,
        );
    }
    Ok(())
}

fn handle_due(conn: &Rc<Connection>) -> Result<()> {
    let now = Local::now();
    let due = db::query_reminders(ReminderQuery::DueBy(now), conn)?;
    if due.is_empty() {
        println!("Nothing due.");
        return Ok(());
    }

    let lifecycle = ReminderLifecycle::new();
    for reminder in due {
        let Some(id) = reminder.id else {
            continue;
        };
        let from = lifecycle.transition(&reminder, ReminderStatus::Pending)?;
        db::mark_reminder_pending(id, conn)?;
        let pending = Reminder {
            status: ReminderStatus::Pending,
            ..reminder
        };
        lifecycle.after_state_change(&pending, from, ReminderStatus::Pending)?;
        println!(
            "Reminder #{id} is due: {} (tracking #{}).",
            pending.scheduled_time.format("%Y-%m-%d %H:%M"),
            pending.tracking_id
        );
    }
    Ok(())
}

fn handle_answer(
    id: ReminderId,
    done: bool,
    dismiss: bool,
    notes: Option<String>,
    conn: &Rc<Connection>,
) -> Result<()> {
    let value = match (done, dismiss) {
        (true, false) => ReminderValue::Completed,
        (false, true) => ReminderValue::Dismissed,
        _ => {
            println!("Pass exactly one of --done or --dismiss.");
            return Ok(());
        }
    };

    let Some(reminder) = db::query_reminder_by_id(id, conn)? else {
        println!("Reminder #{id} not found.");
        return Ok(());
    };

    let lifecycle = ReminderLifecycle::new();
    let from = match lifecycle.transition(&reminder, ReminderStatus::Answered) {
        Ok(from) => from,
        Err(LifecycleError::InvalidTransition { from, .. }) => {
            println!("Reminder #{id} is {from}; only pending reminders can be answered.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    db::answer_reminder(id, value, notes.clone(), conn)?;
    let answered = Reminder {
        status: ReminderStatus::Answered,
        value: Some(value),
        notes: notes.or_else(|| reminder.notes.clone()),
        ..reminder.clone()
    };
    lifecycle.after_state_change(&answered, from, ReminderStatus::Answered)?;
    println!("Reminder #{id} answered ({value}).");

    // The answered occurrence is final; the next one is a fresh reminder.
    // One-time trackings never regenerate.
    let Some(tracking) = db::query_tracking_by_id(reminder.tracking_id, conn)? else {
        return Ok(());
    };
    if tracking.state != TrackingState::Running || tracking.frequency.is_one_time() {
        return Ok(());
    }
    let Some(tracking_id) = tracking.id else {
        return Ok(());
    };
    if let Some(at) = next_occurrence(&tracking.frequency, Local::now(), &tracking.schedules) {
        let next = conn.create_reminder(tracking_id, tracking.user_id, at)?;
        if let Some(next_id) = next.id {
            println!(
                "Next reminder #{next_id} scheduled for {}.",
                at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

fn parse_slot(value: &str) -> Option<(u8, u8)> {
    let (hour, minutes) = value.trim().split_once(':')?;
    Some((hour.parse().ok()?, minutes.parse().ok()?))
}
