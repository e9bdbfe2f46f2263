/// Reminder database queries.
///
/// Every write validates the status/value coupling before touching the
/// database: a value belongs to answered reminders and to nothing else.
use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::{Connection, Row};

use crate::lifecycle::validate_status_value;
use crate::store::ReminderStore;
use crate::types::{
    Reminder, ReminderId, ReminderQuery, ReminderStatus, ReminderValue, TrackingId, UserId,
};

pub fn create_reminder(reminder: &Reminder, conn: &Connection) -> Result<ReminderId> {
    validate_status_value(reminder.status, reminder.value)?;
    conn.execute(
        "INSERT INTO reminders (tracking_id, user_id, scheduled_time, notes, status, value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            reminder.tracking_id,
            reminder.user_id,
            reminder.scheduled_time.to_rfc3339(),
            reminder.notes,
            reminder.status.as_str(),
            reminder.value.map(|v| v.as_str()),
        ],
    )?;
    Ok(conn.last_insert_rowid() as ReminderId)
}

pub fn query_reminders(query: ReminderQuery, conn: &Connection) -> Result<Vec<Reminder>> {
    match query {
        ReminderQuery::All => query_reminders_all(conn),
        ReminderQuery::ByTracking(tracking_id) => query_reminders_by_tracking(tracking_id, conn),
        ReminderQuery::ByStatus(status) => query_reminders_by_status(status, conn),
        // Due reminders are upcoming ones whose time has arrived. The time
        // comparison happens here rather than in SQL so mixed UTC offsets in
        // the stored text cannot skew it.
        ReminderQuery::DueBy(instant) => {
            let upcoming = query_reminders_by_status(ReminderStatus::Upcoming, conn)?;
            Ok(upcoming
                .into_iter()
                .filter(|reminder| reminder.scheduled_time <= instant)
                .collect())
        }
    }
}

fn query_reminders_all(conn: &Connection) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare(
        "SELECT id, tracking_id, user_id, scheduled_time, notes, status, value
         FROM reminders ORDER BY scheduled_time",
    )?;
    let rows = stmt.query_map([], reminder_from_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn query_reminders_by_tracking(tracking_id: TrackingId, conn: &Connection) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare(
        "SELECT id, tracking_id, user_id, scheduled_time, notes, status, value
         FROM reminders WHERE tracking_id = ?1 ORDER BY scheduled_time",
    )?;
    let rows = stmt.query_map([tracking_id], reminder_from_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn query_reminders_by_status(status: ReminderStatus, conn: &Connection) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare(
        "SELECT id, tracking_id, user_id, scheduled_time, notes, status, value
         FROM reminders WHERE status = ?1 ORDER BY scheduled_time",
    )?;
    let rows = stmt.query_map([status.as_str()], reminder_from_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub fn query_reminder_by_id(id: ReminderId, conn: &Connection) -> Result<Option<Reminder>> {
    let mut stmt = conn.prepare(
        "SELECT id, tracking_id, user_id, scheduled_time, notes, status, value
         FROM reminders WHERE id = ?1",
    )?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(reminder_from_row(row)?))
    } else {
        Ok(None)
    }
}

/// Promotes a due reminder to pending.
pub fn mark_reminder_pending(id: ReminderId, conn: &Connection) -> Result<()> {
    validate_status_value(ReminderStatus::Pending, None)?;
    conn.execute(
        "UPDATE reminders SET status = ?1, value = NULL WHERE id = ?2",
        rusqlite::params![ReminderStatus::Pending.as_str(), id],
    )?;
    Ok(())
}

/// Finalizes a reminder with the user's response. Existing notes survive
/// when none are supplied.
pub fn answer_reminder(
    id: ReminderId,
    value: ReminderValue,
    notes: Option<String>,
    conn: &Connection,
) -> Result<()> {
    validate_status_value(ReminderStatus::Answered, Some(value))?;
    conn.execute(
        "UPDATE reminders SET status = ?1, value = ?2, notes = COALESCE(?3, notes) WHERE id = ?4",
        rusqlite::params![
            ReminderStatus::Answered.as_str(),
            value.as_str(),
            notes,
            id
        ],
    )?;
    Ok(())
}

pub fn delete_reminders_by_status(
    tracking_id: TrackingId,
    user_id: UserId,
    status: ReminderStatus,
    conn: &Connection,
) -> Result<usize> {
    let count = conn.execute(
        "DELETE FROM reminders WHERE tracking_id = ?1 AND user_id = ?2 AND status = ?3",
        rusqlite::params![tracking_id, user_id, status.as_str()],
    )?;
    Ok(count)
}

pub fn delete_reminders_by_tracking(tracking_id: TrackingId, conn: &Connection) -> Result<usize> {
    let count = conn.execute(
        "DELETE FROM reminders WHERE tracking_id = ?1",
        [tracking_id],
    )?;
    Ok(count)
}

/// The lifecycle orchestrator talks to reminder persistence through this
/// seam.
impl ReminderStore for Connection {
    fn create_reminder(
        &self,
        tracking_id: TrackingId,
        user_id: UserId,
        at: DateTime<Local>,
    ) -> Result<Reminder> {
        let reminder = Reminder {
            id: None,
            tracking_id,
            user_id,
            scheduled_time: at,
            notes: None,
            status: ReminderStatus::Upcoming,
            value: None,
        };
        let id = create_reminder(&reminder, self)?;
        Ok(Reminder {
            id: Some(id),
            ..reminder
        })
    }

    fn delete_upcoming_by_tracking(
        &self,
        tracking_id: TrackingId,
        user_id: UserId,
    ) -> Result<usize> {
        delete_reminders_by_status(tracking_id, user_id, ReminderStatus::Upcoming, self)
    }

    fn delete_pending_by_tracking(
        &self,
        tracking_id: TrackingId,
        user_id: UserId,
    ) -> Result<usize> {
        delete_reminders_by_status(tracking_id, user_id, ReminderStatus::Pending, self)
    }
}

fn reminder_from_row(row: &Row) -> rusqlite::Result<Reminder> {
    let scheduled: Option<String> = row.get(3)?;
    let status: String = row.get(5)?;
    let value: Option<String> = row.get(6)?;
    Ok(Reminder {
        id: Some(row.get(0)?),
        tracking_id: row.get(1)?,
        user_id: row.get(2)?,
        scheduled_time: crate::db::parse_required_datetime(scheduled).expect(
            "Expecting parsing of scheduled datetime to succeed, all Db entries should be parsable.",
        ),
        notes: row.get(4)?,
        status: ReminderStatus::parse(&status).unwrap_or(ReminderStatus::Upcoming),
        value: value.as_deref().and_then(ReminderValue::parse),
    })
}
