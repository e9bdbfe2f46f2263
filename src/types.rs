use std::fmt;

use chrono::{DateTime, Local};

use crate::error::ValidationError;
use crate::frequency::Frequency;

pub type UserId = u32;
pub type TrackingId = u32;
pub type ScheduleId = u32;
pub type ReminderId = u32;

/// Upper bound on the question text, in characters.
pub const MAX_QUESTION_LEN: usize = 100;
/// A tracking carries at most this many time-of-day slots.
pub const MAX_SCHEDULES: usize = 5;

/// Lifecycle state of a tracking. New trackings start out running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum TrackingState {
    #[default]
    Running,
    Paused,
    Archived,
}

impl TrackingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single reminder occurrence.
///
/// Upcoming reminders are informational (not yet due), pending ones await a
/// user response, answered ones are final. The next occurrence is always a
/// new reminder row, never a reopened one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReminderStatus {
    Upcoming,
    Pending,
    Answered,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Pending => "pending",
            Self::Answered => "answered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(Self::Upcoming),
            "pending" => Some(Self::Pending),
            "answered" => Some(Self::Answered),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an answered reminder was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReminderValue {
    Completed,
    Dismissed,
}

impl ReminderValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///A single Tracking is a recurring question the user wants to be reminded of
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Tracking {
    pub id: Option<TrackingId>,
    pub user_id: UserId,
    pub question: String,
    pub details: Option<String>,
    pub icon: Option<String>,
    pub frequency: Frequency,
    pub state: TrackingState,
    pub schedules: Vec<Schedule>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl Tracking {
    /// Checks the construction invariants before anything is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.question.chars().count();
        if len == 0 || len > MAX_QUESTION_LEN {
            return Err(ValidationError::QuestionLength);
        }
        self.frequency.validate()?;
        if self.schedules.len() > MAX_SCHEDULES {
            return Err(ValidationError::TooManySchedules);
        }
        for schedule in &self.schedules {
            schedule.validate()?;
        }
        Ok(())
    }
}

pub(crate) enum TrackingQuery {
    All,
    Active,
    ByState(TrackingState),
}

/// A time-of-day slot of a tracking. The back-reference is lookup only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Schedule {
    pub id: Option<ScheduleId>,
    pub tracking_id: Option<TrackingId>,
    pub hour: u8,
    pub minutes: u8,
}

impl Schedule {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hour > 23 {
            return Err(ValidationError::HourOutOfRange(self.hour));
        }
        if self.minutes > 59 {
            return Err(ValidationError::MinutesOutOfRange(self.minutes));
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minutes)
    }
}

/// One concrete occurrence of a tracking, logically owned by it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Reminder {
    pub id: Option<ReminderId>,
    pub tracking_id: TrackingId,
    pub user_id: UserId,
    pub scheduled_time: DateTime<Local>,
    pub notes: Option<String>,
    pub status: ReminderStatus,
    pub value: Option<ReminderValue>,
}

pub(crate) enum ReminderQuery {
    All,
    ByTracking(TrackingId),
    ByStatus(ReminderStatus),
    DueBy(DateTime<Local>),
}
