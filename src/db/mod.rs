/// Database module with tracking, schedule, reminder queries and migrations.
mod migrations;
mod reminder;
mod schedule;
mod tracking;

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::Connection;

// Re-export all public functions
pub use reminder::{
    answer_reminder, mark_reminder_pending, query_reminder_by_id, query_reminders,
};
pub use tracking::{
    create_tracking, delete_tracking, query_tracking_by_id, query_trackings,
    update_tracking_details, update_tracking_state,
};

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Returns the default database path inside the user's data directory.
/// Falls back to `./habitr.db` when no data dir is found.
pub fn default_db_path() -> String {
    if let Some(data_dir) = dirs::data_local_dir() {
        let habitr_dir = data_dir.join("habitr");
        std::fs::create_dir_all(&habitr_dir).ok();
        habitr_dir.join("habitr.db").to_string_lossy().into_owned()
    } else {
        "habitr.db".to_string()
    }
}

pub(crate) fn parse_required_datetime(value: Option<String>) -> Result<DateTime<Local>> {
    value
        .and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|dt| dt.with_timezone(&Local))
        })
        .ok_or_else(|| anyhow::anyhow!("Failed to parse datetime"))
}
