//! Tracking state machine and the reminder bookkeeping around it.

use std::rc::Rc;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::occurrence::next_occurrence;
use crate::store::ReminderStore;
use crate::types::{Tracking, TrackingState};

use super::{Lifecycle, LifecycleError, LifecycleHooks};

/// Every pair of distinct states is a legal transition; staying in place is
/// not. Archived trackings can come back to running or paused.
pub(crate) fn validate_tracking_transition(
    from: TrackingState,
    to: TrackingState,
) -> Result<(), LifecycleError> {
    use TrackingState::*;
    match (from, to) {
        (Running, Paused)
        | (Paused, Running)
        | (Running, Archived)
        | (Archived, Running)
        | (Paused, Archived)
        | (Archived, Paused) => Ok(()),
        _ => Err(LifecycleError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

/// Time source for occurrence computation, injectable for tests.
pub(crate) type Clock = Rc<dyn Fn() -> DateTime<Local>>;

/// Orchestrates reminder bookkeeping around the tracking lifecycle:
///
/// - creating a running tracking creates its first reminder,
/// - pausing drops the upcoming (not yet due) reminders,
/// - archiving drops upcoming and pending ones, keeping answered history,
/// - resuming regenerates the next reminder.
///
/// All of it is best-effort: the hooks log store failures and swallow them,
/// so the entity operation that triggered them always stands.
pub(crate) struct TrackingLifecycle {
    hooks: LifecycleHooks<Tracking, TrackingState>,
}

impl TrackingLifecycle {
    pub fn new<R>(store: Rc<R>, clock: Clock) -> Self
    where
        R: ReminderStore + 'static,
    {
        let mut hooks = LifecycleHooks::new();

        let create_store = Rc::clone(&store);
        let create_clock = Rc::clone(&clock);
        hooks.on_create(Box::new(move |tracking: &Tracking| {
            if tracking.state == TrackingState::Running {
                create_next_reminder(create_store.as_ref(), tracking, (create_clock)());
            }
            Ok(())
        }));

        hooks.on_update(Box::new(|tracking: &Tracking| {
            debug!(tracking = ?tracking.id, "tracking updated");
            Ok(())
        }));

        hooks.on_delete(Box::new(|tracking: &Tracking| {
            debug!(tracking = ?tracking.id, "tracking deleted");
            Ok(())
        }));

        hooks.before_state_change(Box::new(|tracking: &Tracking, from, to| {
            debug!(tracking = ?tracking.id, %from, %to, "state change validated");
            Ok(())
        }));

        let pause_store = Rc::clone(&store);
        hooks.after_state_change(Box::new(move |tracking: &Tracking, _from, to| {
            if to == TrackingState::Paused {
                purge_upcoming(pause_store.as_ref(), tracking);
            }
            Ok(())
        }));

        let archive_store = Rc::clone(&store);
        hooks.after_state_change(Box::new(move |tracking: &Tracking, _from, to| {
            if to == TrackingState::Archived {
                purge_upcoming(archive_store.as_ref(), tracking);
                purge_pending(archive_store.as_ref(), tracking);
            }
            Ok(())
        }));

        hooks.after_state_change(Box::new(move |tracking: &Tracking, _from, to| {
            if to == TrackingState::Running {
                create_next_reminder(store.as_ref(), tracking, (clock)());
            }
            Ok(())
        }));

        Self { hooks }
    }
}

impl Lifecycle for TrackingLifecycle {
    type Entity = Tracking;
    type State = TrackingState;

    fn hooks(&self) -> &LifecycleHooks<Tracking, TrackingState> {
        &self.hooks
    }

    fn current_state(&self, tracking: &Tracking) -> TrackingState {
        tracking.state
    }

    fn validate_transition(
        &self,
        from: TrackingState,
        to: TrackingState,
    ) -> Result<(), LifecycleError> {
        validate_tracking_transition(from, to)
    }
}

/// Creates the tracking's next reminder. One-time frequencies get at most
/// one shot: once the date has passed there is nothing left to create.
fn create_next_reminder(store: &dyn ReminderStore, tracking: &Tracking, now: DateTime<Local>) {
    let Some(id) = tracking.id else {
        return;
    };
    let Some(at) = next_occurrence(&tracking.frequency, now, &tracking.schedules) else {
        if tracking.frequency.is_one_time() {
            debug!(tracking = id, "one-time date has passed, nothing to create");
        } else {
            debug!(tracking = id, "no next occurrence, skipping reminder");
        }
        return;
    };
    match store.create_reminder(id, tracking.user_id, at) {
        Ok(_) => debug!(tracking = id, at = %at, "created reminder"),
        Err(err) => warn!(tracking = id, "failed to create reminder: {err:#}"),
    }
}

fn purge_upcoming(store: &dyn ReminderStore, tracking: &Tracking) {
    let Some(id) = tracking.id else {
        return;
    };
    match store.delete_upcoming_by_tracking(id, tracking.user_id) {
        Ok(count) => debug!(tracking = id, count, "purged upcoming reminders"),
        Err(err) => warn!(tracking = id, "failed to purge upcoming reminders: {err:#}"),
    }
}

fn purge_pending(store: &dyn ReminderStore, tracking: &Tracking) {
    let Some(id) = tracking.id else {
        return;
    };
    match store.delete_pending_by_tracking(id, tracking.user_id) {
        Ok(count) => debug!(tracking = id, count, "purged pending reminders"),
        Err(err) => warn!(tracking = id, "failed to purge pending reminders: {err:#}"),
    }
}
