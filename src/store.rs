use anyhow::Result;
use chrono::{DateTime, Local};

use crate::types::{Reminder, TrackingId, UserId};

/// Reminder persistence operations the lifecycle hooks depend on.
///
/// Implemented for `rusqlite::Connection` in `db::reminder`; tests substitute
/// an in-memory recording store.
pub(crate) trait ReminderStore {
    /// Inserts a new upcoming reminder scheduled at `at`.
    fn create_reminder(
        &self,
        tracking_id: TrackingId,
        user_id: UserId,
        at: DateTime<Local>,
    ) -> Result<Reminder>;

    /// Deletes every upcoming reminder of a tracking. Returns the count.
    fn delete_upcoming_by_tracking(
        &self,
        tracking_id: TrackingId,
        user_id: UserId,
    ) -> Result<usize>;

    /// Deletes every pending reminder of a tracking. Returns the count.
    fn delete_pending_by_tracking(&self, tracking_id: TrackingId, user_id: UserId)
    -> Result<usize>;
}
