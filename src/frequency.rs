//! Recurrence rules for trackings.
//!
//! A frequency is stored as tagged JSON in the database and has a compact
//! text form for the command line: `daily`, `weekly:mon,wed,fri`,
//! `monthly:1,15`, `monthly:last`, `monthly:2nd-tue`, `yearly:3-21`,
//! `yearly:11:4th-thu`, `once:2026-01-01`.
//!
//! Weekday indices are 0 (Sunday) through 6 (Saturday) everywhere.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How a monthly frequency picks its days.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum MonthlyRule {
    /// Explicit days of the month (1-31). Days a month does not have are
    /// skipped for that month.
    DayNumber { days: Vec<u8> },
    /// The last calendar day of every month.
    LastDay,
    /// The Nth given weekday of every month (ordinal 1-5).
    WeekdayOrdinal { weekday: u8, ordinal: u8 },
}

/// How a yearly frequency picks its date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum YearlyRule {
    /// A fixed month/day every year. February 29 is legal and fires only in
    /// leap years.
    Date { month: u8, day: u8 },
    /// The Nth given weekday of a given month every year.
    WeekdayOrdinal { month: u8, weekday: u8, ordinal: u8 },
}

/// Recurrence rule of a tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Frequency {
    Daily,
    Weekly { days: Vec<u8> },
    Monthly { rule: MonthlyRule },
    Yearly { rule: YearlyRule },
    OneTime { date: NaiveDate },
}

impl Frequency {
    /// Parse the compact text form. The result is always validated.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let frequency = Self::parse_label(s.trim())?;
        frequency.validate()?;
        Ok(frequency)
    }

    fn parse_label(s: &str) -> Result<Self, ValidationError> {
        if s == "daily" {
            return Ok(Self::Daily);
        }
        if let Some(rest) = s.strip_prefix("weekly:") {
            let days = rest
                .split(',')
                .map(|name| {
                    parse_weekday(name.trim())
                        .ok_or_else(|| ValidationError::FrequencyFormat(s.to_string()))
                })
                .collect::<Result<Vec<u8>, _>>()?;
            return Ok(Self::Weekly { days });
        }
        if let Some(rest) = s.strip_prefix("monthly:") {
            let rest = rest.trim();
            if rest == "last" {
                return Ok(Self::Monthly {
                    rule: MonthlyRule::LastDay,
                });
            }
            if let Some((ordinal, weekday)) = parse_ordinal_weekday(rest) {
                return Ok(Self::Monthly {
                    rule: MonthlyRule::WeekdayOrdinal { weekday, ordinal },
                });
            }
            let days = rest
                .split(',')
                .map(|day| {
                    day.trim()
                        .parse::<u8>()
                        .map_err(|_| ValidationError::FrequencyFormat(s.to_string()))
                })
                .collect::<Result<Vec<u8>, _>>()?;
            return Ok(Self::Monthly {
                rule: MonthlyRule::DayNumber { days },
            });
        }
        if let Some(rest) = s.strip_prefix("yearly:") {
            let rest = rest.trim();
            // `M:Nth-ddd` picks the Nth weekday of month M, `M-D` a fixed date.
            if let Some((month, ordinal_part)) = rest.split_once(':') {
                let month = month
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| ValidationError::FrequencyFormat(s.to_string()))?;
                let (ordinal, weekday) = parse_ordinal_weekday(ordinal_part.trim())
                    .ok_or_else(|| ValidationError::FrequencyFormat(s.to_string()))?;
                return Ok(Self::Yearly {
                    rule: YearlyRule::WeekdayOrdinal {
                        month,
                        weekday,
                        ordinal,
                    },
                });
            }
            let Some((month, day)) = rest.split_once('-') else {
                return Err(ValidationError::FrequencyFormat(s.to_string()));
            };
            let month = month
                .trim()
                .parse::<u8>()
                .map_err(|_| ValidationError::FrequencyFormat(s.to_string()))?;
            let day = day
                .trim()
                .parse::<u8>()
                .map_err(|_| ValidationError::FrequencyFormat(s.to_string()))?;
            return Ok(Self::Yearly {
                rule: YearlyRule::Date { month, day },
            });
        }
        if let Some(rest) = s.strip_prefix("once:") {
            let date = NaiveDate::parse_from_str(rest.trim(), "%Y-%m-%d")
                .map_err(|_| ValidationError::FrequencyFormat(s.to_string()))?;
            return Ok(Self::OneTime { date });
        }
        Err(ValidationError::FrequencyFormat(s.to_string()))
    }

    /// Checks that the descriptor conforms to its tag's shape. The resolver
    /// assumes validated input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Daily | Self::OneTime { .. } => Ok(()),
            Self::Weekly { days } => {
                if days.is_empty() {
                    return Err(ValidationError::EmptyWeekdays);
                }
                for &day in days {
                    if day > 6 {
                        return Err(ValidationError::WeekdayOutOfRange(day));
                    }
                }
                Ok(())
            }
            Self::Monthly { rule } => match rule {
                MonthlyRule::DayNumber { days } => {
                    if days.is_empty() {
                        return Err(ValidationError::EmptyMonthDays);
                    }
                    for &day in days {
                        if !(1..=31).contains(&day) {
                            return Err(ValidationError::DayOfMonthOutOfRange(day));
                        }
                    }
                    Ok(())
                }
                MonthlyRule::LastDay => Ok(()),
                MonthlyRule::WeekdayOrdinal { weekday, ordinal } => {
                    validate_ordinal_weekday(*weekday, *ordinal)
                }
            },
            Self::Yearly { rule } => match rule {
                YearlyRule::Date { month, day } => {
                    if !(1..=12).contains(month) {
                        return Err(ValidationError::MonthOutOfRange(*month));
                    }
                    // 2024 is a leap year, so Feb 29 passes and Feb 30 does not.
                    if NaiveDate::from_ymd_opt(2024, *month as u32, *day as u32).is_none() {
                        return Err(ValidationError::NoSuchDate {
                            month: *month,
                            day: *day,
                        });
                    }
                    Ok(())
                }
                YearlyRule::WeekdayOrdinal {
                    month,
                    weekday,
                    ordinal,
                } => {
                    if !(1..=12).contains(month) {
                        return Err(ValidationError::MonthOutOfRange(*month));
                    }
                    validate_ordinal_weekday(*weekday, *ordinal)
                }
            },
        }
    }

    /// One-time frequencies produce at most one reminder ever.
    pub fn is_one_time(&self) -> bool {
        matches!(self, Self::OneTime { .. })
    }

    pub fn label(&self) -> String {
        match self {
            Self::Daily => "daily".to_string(),
            Self::Weekly { days } => {
                let names: Vec<&str> = days.iter().map(|&d| weekday_name(d)).collect();
                format!("weekly:{}", names.join(","))
            }
            Self::Monthly { rule } => match rule {
                MonthlyRule::DayNumber { days } => {
                    let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                    format!("monthly:{}", days.join(","))
                }
                MonthlyRule::LastDay => "monthly:last".to_string(),
                MonthlyRule::WeekdayOrdinal { weekday, ordinal } => {
                    format!(
                        "monthly:{}-{}",
                        ordinal_label(*ordinal),
                        weekday_name(*weekday)
                    )
                }
            },
            Self::Yearly { rule } => match rule {
                YearlyRule::Date { month, day } => format!("yearly:{month}-{day}"),
                YearlyRule::WeekdayOrdinal {
                    month,
                    weekday,
                    ordinal,
                } => format!(
                    "yearly:{month}:{}-{}",
                    ordinal_label(*ordinal),
                    weekday_name(*weekday)
                ),
            },
            Self::OneTime { date } => format!("once:{}", date.format("%Y-%m-%d")),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn validate_ordinal_weekday(weekday: u8, ordinal: u8) -> Result<(), ValidationError> {
    if weekday > 6 {
        return Err(ValidationError::WeekdayOutOfRange(weekday));
    }
    if !(1..=5).contains(&ordinal) {
        return Err(ValidationError::OrdinalOutOfRange(ordinal));
    }
    Ok(())
}

fn parse_weekday(name: &str) -> Option<u8> {
    match name {
        "sun" => Some(0),
        "mon" => Some(1),
        "tue" => Some(2),
        "wed" => Some(3),
        "thu" => Some(4),
        "fri" => Some(5),
        "sat" => Some(6),
        _ => None,
    }
}

fn weekday_name(day: u8) -> &'static str {
    match day {
        0 => "sun",
        1 => "mon",
        2 => "tue",
        3 => "wed",
        4 => "thu",
        5 => "fri",
        6 => "sat",
        _ => "?",
    }
}

/// Parses `2nd-tue` style ordinal-weekday pairs.
fn parse_ordinal_weekday(s: &str) -> Option<(u8, u8)> {
    let (ordinal_part, weekday_part) = s.split_once('-')?;
    let digits: String = ordinal_part
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let suffix = &ordinal_part[digits.len()..];
    if digits.is_empty() || !matches!(suffix, "st" | "nd" | "rd" | "th") {
        return None;
    }
    let ordinal = digits.parse().ok()?;
    let weekday = parse_weekday(weekday_part.trim())?;
    Some((ordinal, weekday))
}

fn ordinal_label(ordinal: u8) -> String {
    let suffix = match ordinal {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{ordinal}{suffix}")
}
