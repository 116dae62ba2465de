use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::ExpenseError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PatternUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Recurrence rule: one unit with an interval multiplier, e.g. every 2 weeks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub every: u32,
    pub unit: PatternUnit,
}

impl RecurrencePattern {
    pub const fn new(every: u32, unit: PatternUnit) -> Self {
        Self { every, unit }
    }

    pub const fn daily(every: u32) -> Self {
        Self::new(every, PatternUnit::Day)
    }

    pub const fn weekly(every: u32) -> Self {
        Self::new(every, PatternUnit::Week)
    }

    pub const fn monthly(every: u32) -> Self {
        Self::new(every, PatternUnit::Month)
    }

    pub const fn yearly(every: u32) -> Self {
        Self::new(every, PatternUnit::Year)
    }

    pub fn validate(&self) -> Result<(), ExpenseError> {
        if self.every == 0 {
            return Err(ExpenseError::Validation(
                "recurrence interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Next candidate date one interval after `from`.
    ///
    /// Monthly and yearly steps re-apply `anchor_day` (the intended
    /// day-of-month) before clamping, so a series anchored on day 31 springs
    /// back to the 31st after passing through a short month.
    pub fn advance(&self, from: NaiveDate, anchor_day: Option<u32>) -> NaiveDate {
        match self.unit {
            PatternUnit::Day => from + Duration::days(self.every as i64),
            PatternUnit::Week => from + Duration::weeks(self.every as i64),
            PatternUnit::Month => shift_month(from, self.every as i32, anchor_day),
            PatternUnit::Year => shift_year(from, self.every as i32, anchor_day),
        }
    }

    /// One interval before `from`; used to seed a generation cursor so the
    /// first advance lands exactly on the series start date.
    pub fn step_back(&self, from: NaiveDate, anchor_day: Option<u32>) -> NaiveDate {
        match self.unit {
            PatternUnit::Day => from - Duration::days(self.every as i64),
            PatternUnit::Week => from - Duration::weeks(self.every as i64),
            PatternUnit::Month => shift_month(from, -(self.every as i32), anchor_day),
            PatternUnit::Year => shift_year(from, -(self.every as i32), anchor_day),
        }
    }

    pub fn label(&self) -> String {
        match (self.every, self.unit) {
            (1, PatternUnit::Day) => "Daily".into(),
            (1, PatternUnit::Week) => "Weekly".into(),
            (1, PatternUnit::Month) => "Monthly".into(),
            (1, PatternUnit::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {:?}s", n, unit),
        }
    }
}

/// A (month, year) aggregation bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MonthBucket {
    pub month: u32,
    pub year: i32,
}

impl MonthBucket {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }
}

impl PartialOrd for MonthBucket {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MonthBucket {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month).cmp(&(other.year, other.month))
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Signed day count from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    MonthBucket::of(a) == MonthBucket::of(b)
}

fn shift_month(date: NaiveDate, months: i32, anchor_day: Option<u32>) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = anchor_day
        .unwrap_or_else(|| date.day())
        .min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap()
}

fn shift_year(date: NaiveDate, years: i32, anchor_day: Option<u32>) -> NaiveDate {
    let year = date.year() + years;
    let day = anchor_day
        .unwrap_or_else(|| date.day())
        .min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day).unwrap()
}
