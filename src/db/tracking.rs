/// Tracking database queries.
use anyhow::Result;
use chrono::Local;
use rusqlite::{Connection, Row};

use crate::db::schedule::{create_schedule, delete_schedules_by_tracking, query_schedules_by_tracking_id};
use crate::db::reminder::delete_reminders_by_tracking;
use crate::frequency::Frequency;
use crate::types::{Tracking, TrackingId, TrackingQuery, TrackingState};

/// Inserts the tracking and its schedules. The payload is validated first;
/// nothing is written for invalid input.
pub fn create_tracking(tracking: &Tracking, conn: &Connection) -> Result<TrackingId> {
    tracking.validate()?;
    let frequency = serde_json::to_string(&tracking.frequency)?;
    conn.execute(
        "INSERT INTO trackings (user_id, question, details, icon, frequency, state, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            tracking.user_id,
            tracking.question,
            tracking.details,
            tracking.icon,
            frequency,
            tracking.state.as_str(),
            tracking.created_at.to_rfc3339(),
            tracking.updated_at.to_rfc3339(),
        ],
    )?;
    let id = conn.last_insert_rowid() as TrackingId;
    for schedule in &tracking.schedules {
        create_schedule(id, schedule, conn)?;
    }
    Ok(id)
}

pub fn query_trackings(query: TrackingQuery, conn: &Connection) -> Result<Vec<Tracking>> {
    let sql = match query {
        TrackingQuery::All => "SELECT * FROM trackings".to_string(),
        TrackingQuery::Active => "SELECT * FROM trackings WHERE state != 'archived'".to_string(),
        TrackingQuery::ByState(state) => {
            format!("SELECT * FROM trackings WHERE state = '{}'", state.as_str())
        }
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], tracking_from_row)?;
    let mut trackings = Vec::new();
    for row in rows {
        trackings.push(finish_tracking(row?, conn)?);
    }
    Ok(trackings)
}

pub fn query_tracking_by_id(id: TrackingId, conn: &Connection) -> Result<Option<Tracking>> {
    let mut stmt = conn.prepare("SELECT * FROM trackings WHERE id = ?1")?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        let raw = tracking_from_row(row)?;
        Ok(Some(finish_tracking(raw, conn)?))
    } else {
        Ok(None)
    }
}

pub fn update_tracking_details(
    id: TrackingId,
    question: String,
    details: Option<String>,
    icon: Option<String>,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "UPDATE trackings SET question = ?1, details = ?2, icon = ?3, updated_at = ?4 WHERE id = ?5",
        rusqlite::params![question, details, icon, Local::now().to_rfc3339(), id],
    )?;
    Ok(())
}

pub fn update_tracking_state(id: TrackingId, state: TrackingState, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE trackings SET state = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![state.as_str(), Local::now().to_rfc3339(), id],
    )?;
    Ok(())
}

/// Removes the tracking together with its schedules and reminders.
pub fn delete_tracking(id: TrackingId, conn: &Connection) -> Result<()> {
    delete_reminders_by_tracking(id, conn)?;
    delete_schedules_by_tracking(id, conn)?;
    conn.execute("DELETE FROM trackings WHERE id = ?1", [id])?;
    Ok(())
}

/// Maps a `trackings` row; schedules are attached separately.
fn tracking_from_row(row: &Row) -> rusqlite::Result<RawTracking> {
    Ok(RawTracking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        question: row.get(2)?,
        details: row.get(3)?,
        icon: row.get(4)?,
        frequency: row.get(5)?,
        state: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

struct RawTracking {
    id: TrackingId,
    user_id: u32,
    question: String,
    details: Option<String>,
    icon: Option<String>,
    frequency: String,
    state: String,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn finish_tracking(raw: RawTracking, conn: &Connection) -> Result<Tracking> {
    let frequency: Frequency = serde_json::from_str(&raw.frequency)?;
    let state = TrackingState::parse(&raw.state)
        .ok_or_else(|| anyhow::anyhow!("Unknown tracking state: {}", raw.state))?;
    Ok(Tracking {
        id: Some(raw.id),
        user_id: raw.user_id,
        question: raw.question,
        details: raw.details,
        icon: raw.icon,
        frequency,
        state,
        schedules: query_schedules_by_tracking_id(raw.id, conn)?,
        created_at: crate::db::parse_required_datetime(raw.created_at)?,
        updated_at: crate::db::parse_required_datetime(raw.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::db;
    use crate::types::Schedule;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 5, hour, minute, 0).unwrap()
    }

    fn water_tracking() -> Tracking {
        Tracking {
            id: None,
            user_id: 1,
            question: "Did you drink water?".to_string(),
            details: Some("Two liters a day".to_string()),
            icon: None,
            frequency: Frequency::Daily,
            state: TrackingState::Running,
            schedules: vec![
                Schedule {
                    id: None,
                    tracking_id: None,
                    hour: 18,
                    minutes: 30,
                },
                Schedule {
                    id: None,
                    tracking_id: None,
                    hour: 9,
                    minutes: 0,
                },
            ],
            created_at: at(8, 0),
            updated_at: at(8, 0),
        }
    }

    #[test]
    fn create_and_query_round_trip() {
        let conn = test_conn();
        let id = create_tracking(&water_tracking(), &conn).unwrap();

        let loaded = query_tracking_by_id(id, &conn).unwrap().unwrap();
        assert_eq!(loaded.question, "Did you drink water?");
        assert_eq!(loaded.frequency, Frequency::Daily);
        assert_eq!(loaded.state, TrackingState::Running);
        // Slots come back in resolver order.
        let slots: Vec<(u8, u8)> = loaded
            .schedules
            .iter()
            .map(|s| (s.hour, s.minutes))
            .collect();
        assert_eq!(slots, vec![(9, 0), (18, 30)]);
        assert_eq!(loaded.created_at, at(8, 0));
    }

    #[test]
    fn invalid_trackings_are_not_persisted() {
        let conn = test_conn();
        let mut tracking = water_tracking();
        tracking.question = String::new();
        assert!(create_tracking(&tracking, &conn).is_err());
        assert!(query_trackings(TrackingQuery::All, &conn).unwrap().is_empty());
    }

    #[test]
    fn state_updates_are_visible() {
        let conn = test_conn();
        let id = create_tracking(&water_tracking(), &conn).unwrap();
        update_tracking_state(id, TrackingState::Paused, &conn).unwrap();

        let loaded = query_tracking_by_id(id, &conn).unwrap().unwrap();
        assert_eq!(loaded.state, TrackingState::Paused);
    }

    #[test]
    fn active_query_excludes_archived_trackings() {
        let conn = test_conn();
        let id = create_tracking(&water_tracking(), &conn).unwrap();
        let other = create_tracking(&water_tracking(), &conn).unwrap();
        update_tracking_state(other, TrackingState::Archived, &conn).unwrap();

        let active = query_trackings(TrackingQuery::Active, &conn).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, Some(id));

        let archived =
            query_trackings(TrackingQuery::ByState(TrackingState::Archived), &conn).unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, Some(other));
    }

    #[test]
    fn details_updates_touch_the_record() {
        let conn = test_conn();
        let id = create_tracking(&water_tracking(), &conn).unwrap();
        update_tracking_details(
            id,
            "Did you hydrate?".to_string(),
            None,
            Some("droplet".to_string()),
            &conn,
        )
        .unwrap();

        let loaded = query_tracking_by_id(id, &conn).unwrap().unwrap();
        assert_eq!(loaded.question, "Did you hydrate?");
        assert_eq!(loaded.details, None);
        assert_eq!(loaded.icon, Some("droplet".to_string()));
    }

    #[test]
    fn deleting_a_tracking_removes_schedules_and_reminders() {
        let conn = test_conn();
        let id = create_tracking(&water_tracking(), &conn).unwrap();
        db::reminder::create_reminder(
            &crate::types::Reminder {
                id: None,
                tracking_id: id,
                user_id: 1,
                scheduled_time: at(9, 0),
                notes: None,
                status: crate::types::ReminderStatus::Upcoming,
                value: None,
            },
            &conn,
        )
        .unwrap();

        delete_tracking(id, &conn).unwrap();
        assert!(query_tracking_by_id(id, &conn).unwrap().is_none());
        assert!(query_schedules_by_tracking_id(id, &conn).unwrap().is_empty());
        let reminders =
            db::query_reminders(crate::types::ReminderQuery::ByTracking(id), &conn).unwrap();
        assert!(reminders.is_empty());
    }
}
