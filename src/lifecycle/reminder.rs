//! Reminder status state machine.

use crate::error::ValidationError;
use crate::types::{Reminder, ReminderStatus, ReminderValue};

use super::{Lifecycle, LifecycleError, LifecycleHooks};

/// An upcoming reminder becomes pending when its scheduled time arrives;
/// a pending reminder becomes answered on user response. Answered is final
/// for the occurrence.
pub(crate) fn validate_reminder_transition(
    from: ReminderStatus,
    to: ReminderStatus,
) -> Result<(), LifecycleError> {
    match (from, to) {
        (ReminderStatus::Upcoming, ReminderStatus::Pending)
        | (ReminderStatus::Pending, ReminderStatus::Answered) => Ok(()),
        _ => Err(LifecycleError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

/// A value is carried by answered reminders, and only by them. The storage
/// layer checks this before every reminder write.
pub(crate) fn validate_status_value(
    status: ReminderStatus,
    value: Option<ReminderValue>,
) -> Result<(), ValidationError> {
    match (status, value) {
        (ReminderStatus::Answered, Some(_)) => Ok(()),
        (ReminderStatus::Answered, None) => Err(ValidationError::AnswerWithoutValue),
        (_, Some(_)) => Err(ValidationError::ValueWithoutAnswer),
        (_, None) => Ok(()),
    }
}

/// Reminder lifecycle over the generic engine. No handlers are registered;
/// the status machine itself is the contract.
pub(crate) struct ReminderLifecycle {
    hooks: LifecycleHooks<Reminder, ReminderStatus>,
}

impl ReminderLifecycle {
    pub fn new() -> Self {
        Self {
            hooks: LifecycleHooks::new(),
        }
    }
}

impl Lifecycle for ReminderLifecycle {
    type Entity = Reminder;
    type State = ReminderStatus;

    fn hooks(&self) -> &LifecycleHooks<Reminder, ReminderStatus> {
        &self.hooks
    }

    fn current_state(&self, reminder: &Reminder) -> ReminderStatus {
        reminder.status
    }

    fn validate_transition(
        &self,
        from: ReminderStatus,
        to: ReminderStatus,
    ) -> Result<(), LifecycleError> {
        validate_reminder_transition(from, to)
    }
}
