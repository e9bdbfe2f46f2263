/// Schedule (time-of-day slot) database queries.
use anyhow::Result;
use rusqlite::Connection;

use crate::types::{Schedule, ScheduleId, TrackingId};

pub fn create_schedule(
    tracking_id: TrackingId,
    schedule: &Schedule,
    conn: &Connection,
) -> Result<ScheduleId> {
    schedule.validate()?;
    conn.execute(
        "INSERT INTO schedules (tracking_id, hour, minutes) VALUES (?1, ?2, ?3)",
        rusqlite::params![tracking_id, schedule.hour, schedule.minutes],
    )?;
    Ok(conn.last_insert_rowid() as ScheduleId)
}

/// Slots come back ordered by (hour, minutes), the resolver's tie-break
/// order.
pub fn query_schedules_by_tracking_id(
    tracking_id: TrackingId,
    conn: &Connection,
) -> Result<Vec<Schedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, tracking_id, hour, minutes FROM schedules
         WHERE tracking_id = ?1 ORDER BY hour, minutes",
    )?;
    let rows = stmt.query_map([tracking_id], |row| {
        Ok(Schedule {
            id: Some(row.get(0)?),
            tracking_id: Some(row.get(1)?),
            hour: row.get(2)?,
            minutes: row.get(3)?,
        })
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub fn delete_schedules_by_tracking(tracking_id: TrackingId, conn: &Connection) -> Result<usize> {
    let count = conn.execute(
        "DELETE FROM schedules WHERE tracking_id = ?1",
        [tracking_id],
    )?;
    Ok(count)
}
