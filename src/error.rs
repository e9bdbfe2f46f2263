use thiserror::Error;

/// Rejected input, raised at validation time before anything is persisted.
/// These are never retried; the caller reports them and moves on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ValidationError {
    #[error("question must be between 1 and 100 characters")]
    QuestionLength,
    #[error("hour out of range: {0}")]
    HourOutOfRange(u8),
    #[error("minutes out of range: {0}")]
    MinutesOutOfRange(u8),
    #[error("a tracking can have at most 5 schedules")]
    TooManySchedules,
    #[error("weekly frequency needs at least one weekday")]
    EmptyWeekdays,
    #[error("weekday index out of range: {0}")]
    WeekdayOutOfRange(u8),
    #[error("monthly frequency needs at least one day of month")]
    EmptyMonthDays,
    #[error("day of month out of range: {0}")]
    DayOfMonthOutOfRange(u8),
    #[error("ordinal out of range: {0}")]
    OrdinalOutOfRange(u8),
    #[error("month out of range: {0}")]
    MonthOutOfRange(u8),
    #[error("no such calendar date: month {month}, day {day}")]
    NoSuchDate { month: u8, day: u8 },
    #[error("unrecognized frequency: {0}")]
    FrequencyFormat(String),
    #[error("only answered reminders carry a value")]
    ValueWithoutAnswer,
    #[error("an answered reminder requires a value")]
    AnswerWithoutValue,
}
