use crate::history::{RangeError, TimeRange};
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc};
use std::str::FromStr;

/// Report period presets offered by the route report screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    PreviousWeek,
    ThisMonth,
    PreviousMonth,
    Custom { from: DateTime<Utc>, to: DateTime<Utc> },
}

impl Period {
    /// Resolve the period against `now` into an inclusive UTC range
    ///
    /// Weeks start on Monday. Each range ends on the last millisecond of the
    /// period.
    pub fn resolve(self, now: DateTime<Utc>) -> Result<TimeRange, RangeError> {
        let today = now.date_naive();

        let (start, end) = match self {
            Period::Custom { from, to } => return TimeRange::new(from, to),
            Period::Today => (today, next_day(today)?),
            Period::Yesterday => (previous_day(today)?, today),
            Period::ThisWeek => {
                let monday = week_start(today)?;
                (monday, add_days(monday, 7)?)
            }
            Period::PreviousWeek => {
                let monday = week_start(today)?;
                (sub_days(monday, 7)?, monday)
            }
            Period::ThisMonth => {
                let first = month_start(today)?;
                (first, next_month(first)?)
            }
            Period::PreviousMonth => {
                let first = month_start(today)?;
                (previous_month(first)?, first)
            }
        };

        let from = start.and_hms_opt(0, 0, 0).ok_or(RangeError::OutOfCalendar)?.and_utc();
        let to = end.and_hms_opt(0, 0, 0).ok_or(RangeError::OutOfCalendar)?.and_utc()
            - Duration::milliseconds(1);
        TimeRange::new(from, to)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::ThisWeek => "this-week",
            Period::PreviousWeek => "previous-week",
            Period::ThisMonth => "this-month",
            Period::PreviousMonth => "previous-month",
            Period::Custom { .. } => "custom",
        }
    }
}

impl FromStr for Period {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "today" => Ok(Period::Today),
            "yesterday" => Ok(Period::Yesterday),
            "this-week" | "week" => Ok(Period::ThisWeek),
            "previous-week" | "last-week" => Ok(Period::PreviousWeek),
            "this-month" | "month" => Ok(Period::ThisMonth),
            "previous-month" | "last-month" => Ok(Period::PreviousMonth),
            _ => Err(RangeError::UnknownPeriod(s.to_string())),
        }
    }
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, RangeError> {
    date.checked_add_days(Days::new(days)).ok_or(RangeError::OutOfCalendar)
}

fn sub_days(date: NaiveDate, days: u64) -> Result<NaiveDate, RangeError> {
    date.checked_sub_days(Days::new(days)).ok_or(RangeError::OutOfCalendar)
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, RangeError> {
    add_days(date, 1)
}

fn previous_day(date: NaiveDate) -> Result<NaiveDate, RangeError> {
    sub_days(date, 1)
}

fn week_start(date: NaiveDate) -> Result<NaiveDate, RangeError> {
    sub_days(date, date.weekday().num_days_from_monday() as u64)
}

fn month_start(date: NaiveDate) -> Result<NaiveDate, RangeError> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).ok_or(RangeError::OutOfCalendar)
}

fn next_month(first: NaiveDate) -> Result<NaiveDate, RangeError> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(RangeError::OutOfCalendar)
}

fn previous_month(first: NaiveDate) -> Result<NaiveDate, RangeError> {
    let (year, month) = if first.month() == 1 {
        (first.year() - 1, 12)
    } else {
        (first.year(), first.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(RangeError::OutOfCalendar)
}
