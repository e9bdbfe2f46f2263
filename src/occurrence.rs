//! Next-occurrence computation.
//!
//! `next_occurrence` is a pure function from a frequency, a reference
//! instant and the configured time-of-day slots to the next instant a
//! reminder should fire. All date math works on explicit calendar fields
//! (`NaiveDate`), never on instant-duration arithmetic, so month and year
//! boundaries and DST shifts cannot cause drift.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate};

use crate::frequency::{Frequency, MonthlyRule, YearlyRule};
use crate::types::Schedule;

/// How many months ahead a monthly rule is searched. Rules can skip months
/// (day 31, fifth weekdays), but never this many in a row.
const MONTH_SEARCH_LIMIT: u32 = 14;
/// How many years ahead a yearly rule is searched. Covers the worst gaps
/// between leap days and fifth-weekday years.
const YEAR_SEARCH_LIMIT: i32 = 50;

/// Computes the next wall-clock instant at which a reminder should fire,
/// or `None` if the frequency can never fire again.
///
/// Candidates are every (rule date, slot) combination strictly after `from`;
/// the earliest wins, slots tie-breaking by (hour, minutes). The exception
/// is a one-time frequency, which always uses the earliest slot on its
/// target date, even when that instant has already passed on the day itself.
/// A tracking without configured slots never fires.
pub(crate) fn next_occurrence(
    frequency: &Frequency,
    from: DateTime<Local>,
    schedules: &[Schedule],
) -> Option<DateTime<Local>> {
    let slots = sorted_slots(schedules);
    if slots.is_empty() {
        return None;
    }
    match frequency {
        Frequency::Daily => next_daily(from, &slots),
        Frequency::Weekly { days } => next_weekly(days, from, &slots),
        Frequency::Monthly { rule } => next_monthly(rule, from, &slots),
        Frequency::Yearly { rule } => next_yearly(rule, from, &slots),
        Frequency::OneTime { date } => next_one_time(*date, from, &slots),
    }
}

fn next_daily(from: DateTime<Local>, slots: &[(u8, u8)]) -> Option<DateTime<Local>> {
    let today = from.date_naive();
    if let Some(instant) = first_slot_after(today, from, slots) {
        return Some(instant);
    }
    first_slot_after(today.succ_opt()?, from, slots)
}

fn next_weekly(days: &[u8], from: DateTime<Local>, slots: &[(u8, u8)]) -> Option<DateTime<Local>> {
    let today = from.date_naive();
    // Seven days ahead is always enough: if today's slots have all passed,
    // the same weekday next week is offset 7.
    for offset in 0..=7u64 {
        let date = today.checked_add_days(Days::new(offset))?;
        let weekday = date.weekday().num_days_from_sunday() as u8;
        if !days.contains(&weekday) {
            continue;
        }
        if let Some(instant) = first_slot_after(date, from, slots) {
            return Some(instant);
        }
    }
    None
}

fn next_monthly(
    rule: &MonthlyRule,
    from: DateTime<Local>,
    slots: &[(u8, u8)],
) -> Option<DateTime<Local>> {
    let (mut year, mut month) = (from.year(), from.month());
    for _ in 0..MONTH_SEARCH_LIMIT {
        let mut dates = dates_in_month(rule, year, month);
        dates.sort();
        for date in dates {
            if let Some(instant) = first_slot_after(date, from, slots) {
                return Some(instant);
            }
        }
        (year, month) = next_month(year, month);
    }
    None
}

fn next_yearly(
    rule: &YearlyRule,
    from: DateTime<Local>,
    slots: &[(u8, u8)],
) -> Option<DateTime<Local>> {
    for offset in 0..YEAR_SEARCH_LIMIT {
        let year = from.year() + offset;
        let date = match rule {
            YearlyRule::Date { month, day } => {
                NaiveDate::from_ymd_opt(year, *month as u32, *day as u32)
            }
            YearlyRule::WeekdayOrdinal {
                month,
                weekday,
                ordinal,
            } => nth_weekday_of_month(year, *month as u32, *weekday, *ordinal),
        };
        // Years where the rule has no real date (Feb 29, missing fifth
        // weekday) are skipped.
        let Some(date) = date else {
            continue;
        };
        if let Some(instant) = first_slot_after(date, from, slots) {
            return Some(instant);
        }
    }
    None
}

fn next_one_time(
    date: NaiveDate,
    from: DateTime<Local>,
    slots: &[(u8, u8)],
) -> Option<DateTime<Local>> {
    if date < from.date_naive() {
        return None;
    }
    // The earliest slot wins outright, even when that instant has already
    // passed on the target day itself.
    slot_instant(date, *slots.first()?)
}

/// The rule's concrete dates within one month, unordered.
fn dates_in_month(rule: &MonthlyRule, year: i32, month: u32) -> Vec<NaiveDate> {
    match rule {
        MonthlyRule::DayNumber { days } => days
            .iter()
            .filter_map(|&day| NaiveDate::from_ymd_opt(year, month, day as u32))
            .collect(),
        MonthlyRule::LastDay => last_day_of_month(year, month).into_iter().collect(),
        MonthlyRule::WeekdayOrdinal { weekday, ordinal } => {
            nth_weekday_of_month(year, month, *weekday, *ordinal)
                .into_iter()
                .collect()
        }
    }
}

fn sorted_slots(schedules: &[Schedule]) -> Vec<(u8, u8)> {
    let mut slots: Vec<(u8, u8)> = schedules
        .iter()
        .map(|schedule| (schedule.hour, schedule.minutes))
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
}

/// The earliest slot on `date` strictly after `from`, if any.
fn first_slot_after(
    date: NaiveDate,
    from: DateTime<Local>,
    slots: &[(u8, u8)],
) -> Option<DateTime<Local>> {
    for &slot in slots {
        if let Some(instant) = slot_instant(date, slot) {
            if instant > from {
                return Some(instant);
            }
        }
    }
    None
}

fn slot_instant(date: NaiveDate, (hour, minutes): (u8, u8)) -> Option<DateTime<Local>> {
    date.and_hms_opt(hour as u32, minutes as u32, 0)?
        .and_local_timezone(Local)
        .earliest()
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// The Nth `weekday` (0 = Sunday) of a month, or `None` when the month has
/// no such day.
fn nth_weekday_of_month(year: i32, month: u32, weekday: u8, ordinal: u8) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let first_weekday = first.weekday().num_days_from_sunday() as u8;
    let day = 1 + ((weekday + 7 - first_weekday) % 7) as u32 + 7 * (ordinal as u32 - 1);
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .unwrap()
    }

    fn slots(pairs: &[(u8, u8)]) -> Vec<Schedule> {
        pairs
            .iter()
            .map(|&(hour, minutes)| Schedule {
                id: None,
                tracking_id: Some(1),
                hour,
                minutes,
            })
            .collect()
    }

    #[test]
    fn daily_picks_the_next_slot_today() {
        let next = next_occurrence(
            &Frequency::Daily,
            at(2024, 1, 2, 10, 0),
            &slots(&[(7, 0), (20, 15)]),
        );
        assert_eq!(next, Some(at(2024, 1, 2, 20, 15)));
    }

    #[test]
    fn daily_rolls_to_tomorrow_after_the_last_slot() {
        let next = next_occurrence(&Frequency::Daily, at(2024, 1, 1, 8, 0), &slots(&[(7, 0)]));
        assert_eq!(next, Some(at(2024, 1, 2, 7, 0)));
    }

    #[test]
    fn daily_at_the_exact_slot_instant_rolls_forward() {
        // "At or after" is strict: firing again at the same instant would
        // duplicate the occurrence that just fired.
        let next = next_occurrence(&Frequency::Daily, at(2024, 1, 1, 7, 0), &slots(&[(7, 0)]));
        assert_eq!(next, Some(at(2024, 1, 2, 7, 0)));
    }

    #[test]
    fn weekly_restricts_to_the_configured_weekdays() {
        // 2024-01-02 was a Tuesday; Mon/Wed/Fri at 09:00 resolves to
        // Wednesday 09:00.
        let frequency = Frequency::Weekly {
            days: vec![1, 3, 5],
        };
        let next = next_occurrence(&frequency, at(2024, 1, 2, 10, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 1, 3, 9, 0)));
    }

    #[test]
    fn weekly_wraps_to_next_week_when_todays_slots_passed() {
        // 2024-01-03 was a Wednesday; only Wednesdays configured.
        let frequency = Frequency::Weekly { days: vec![3] };
        let next = next_occurrence(&frequency, at(2024, 1, 3, 10, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 1, 10, 9, 0)));
    }

    #[test]
    fn monthly_last_day_of_a_thirty_day_month() {
        let frequency = Frequency::Monthly {
            rule: MonthlyRule::LastDay,
        };
        let next = next_occurrence(&frequency, at(2024, 4, 28, 7, 0), &slots(&[(8, 0)]));
        assert_eq!(next, Some(at(2024, 4, 30, 8, 0)));
    }

    #[test]
    fn monthly_last_day_rolls_to_the_following_month() {
        let frequency = Frequency::Monthly {
            rule: MonthlyRule::LastDay,
        };
        let next = next_occurrence(&frequency, at(2024, 4, 30, 9, 0), &slots(&[(8, 0)]));
        assert_eq!(next, Some(at(2024, 5, 31, 8, 0)));
    }

    #[test]
    fn monthly_day_numbers_pick_the_earliest_remaining_day() {
        let frequency = Frequency::Monthly {
            rule: MonthlyRule::DayNumber { days: vec![1, 15] },
        };
        let next = next_occurrence(&frequency, at(2024, 1, 2, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 1, 15, 9, 0)));
    }

    #[test]
    fn monthly_day_31_skips_short_months() {
        let frequency = Frequency::Monthly {
            rule: MonthlyRule::DayNumber { days: vec![31] },
        };
        let next = next_occurrence(&frequency, at(2024, 4, 1, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 5, 31, 9, 0)));
    }

    #[test]
    fn monthly_nth_weekday_resolves_per_month() {
        // Second Tuesday of January 2024 was the 9th; past it, the next one
        // is February 13th.
        let frequency = Frequency::Monthly {
            rule: MonthlyRule::WeekdayOrdinal {
                weekday: 2,
                ordinal: 2,
            },
        };
        let next = next_occurrence(&frequency, at(2024, 1, 15, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 2, 13, 9, 0)));
    }

    #[test]
    fn monthly_fifth_weekday_skips_months_without_one() {
        // March 2024 had five Fridays (the fifth on the 29th); April did not,
        // so from April the next fifth Friday is May 31st.
        let frequency = Frequency::Monthly {
            rule: MonthlyRule::WeekdayOrdinal {
                weekday: 5,
                ordinal: 5,
            },
        };
        let next = next_occurrence(&frequency, at(2024, 4, 1, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 5, 31, 9, 0)));
    }

    #[test]
    fn yearly_date_rolls_to_next_year_once_passed() {
        let frequency = Frequency::Yearly {
            rule: YearlyRule::Date { month: 3, day: 21 },
        };
        let next = next_occurrence(&frequency, at(2024, 3, 21, 10, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2025, 3, 21, 9, 0)));
    }

    #[test]
    fn yearly_leap_day_waits_for_a_leap_year() {
        let frequency = Frequency::Yearly {
            rule: YearlyRule::Date { month: 2, day: 29 },
        };
        let next = next_occurrence(&frequency, at(2023, 3, 1, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 2, 29, 9, 0)));
    }

    #[test]
    fn yearly_nth_weekday_of_month() {
        // Fourth Thursday of November 2024 was the 28th.
        let frequency = Frequency::Yearly {
            rule: YearlyRule::WeekdayOrdinal {
                month: 11,
                weekday: 4,
                ordinal: 4,
            },
        };
        let next = next_occurrence(&frequency, at(2024, 1, 1, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 11, 28, 9, 0)));
    }

    #[test]
    fn one_time_on_the_day_uses_the_earliest_slot_even_if_passed() {
        let frequency = Frequency::OneTime {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let next = next_occurrence(
            &frequency,
            at(2024, 1, 1, 12, 0),
            &slots(&[(18, 30), (9, 0)]),
        );
        assert_eq!(next, Some(at(2024, 1, 1, 9, 0)));
    }

    #[test]
    fn one_time_before_the_day_fires_on_it() {
        let frequency = Frequency::OneTime {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let next = next_occurrence(&frequency, at(2023, 12, 30, 12, 0), &slots(&[(9, 0)]));
        assert_eq!(next, Some(at(2024, 1, 1, 9, 0)));
    }

    #[test]
    fn one_time_expires_the_day_after() {
        let frequency = Frequency::OneTime {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let next = next_occurrence(
            &frequency,
            at(2024, 1, 2, 0, 30),
            &slots(&[(9, 0), (18, 30)]),
        );
        assert_eq!(next, None);
    }

    #[test]
    fn no_slots_means_nothing_fires() {
        assert_eq!(
            next_occurrence(&Frequency::Daily, at(2024, 1, 1, 8, 0), &[]),
            None
        );
    }

    #[test]
    fn slots_tie_break_by_hour_then_minutes() {
        let next = next_occurrence(
            &Frequency::Daily,
            at(2024, 1, 1, 5, 0),
            &slots(&[(9, 30), (9, 0), (7, 45)]),
        );
        assert_eq!(next, Some(at(2024, 1, 1, 7, 45)));
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let frequency = Frequency::Weekly {
            days: vec![1, 3, 5],
        };
        let from = at(2024, 1, 2, 10, 0);
        let configured = slots(&[(9, 0), (18, 30)]);
        let first = next_occurrence(&frequency, from, &configured);
        let second = next_occurrence(&frequency, from, &configured);
        assert_eq!(first, second);
    }
}
