/// Database migrations and schema management.
use anyhow::Result;
use rusqlite::Connection;

/// Creates the initial schema if it doesn't exist yet.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS trackings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            question    TEXT    NOT NULL,
            details     TEXT,
            icon        TEXT,
            frequency   TEXT    NOT NULL,
            state       TEXT    NOT NULL DEFAULT 'running',
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedules (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_id INTEGER NOT NULL,
            hour        INTEGER NOT NULL,
            minutes     INTEGER NOT NULL,
            FOREIGN KEY (tracking_id) REFERENCES trackings(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_id    INTEGER NOT NULL,
            user_id        INTEGER NOT NULL,
            scheduled_time TEXT    NOT NULL,
            notes          TEXT,
            status         TEXT    NOT NULL DEFAULT 'upcoming',
            value          TEXT,
            FOREIGN KEY (tracking_id) REFERENCES trackings(id) ON DELETE CASCADE
        );
        ",
    )?;
    Ok(())
}
