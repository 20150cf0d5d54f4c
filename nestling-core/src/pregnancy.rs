//! Due-date and pregnancy-week arithmetic.
//!
//! All calculations count from the first day of the last menstrual period
//! (LMP), with a full-term pregnancy taken as 280 days.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Length of a full-term pregnancy, counted from LMP.
pub const FULL_TERM_DAYS: i64 = 280;

/// Days between LMP and conception.
pub const CONCEPTION_OFFSET_DAYS: i64 = 14;

/// Highest week number reported.
pub const MAX_PREGNANCY_WEEK: u32 = 42;

/// Gestational age in completed weeks plus days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GestationalAge {
    pub weeks: u32,
    pub days: u32,
}

impl GestationalAge {
    pub fn from_days(total: i64) -> Self {
        let total = total.max(0) as u32;
        Self {
            weeks: total / 7,
            days: total % 7,
        }
    }

    pub fn total_days(&self) -> u32 {
        self.weeks * 7 + self.days
    }
}

impl fmt::Display for GestationalAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}w{}d", self.weeks, self.days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trimester {
    First,
    Second,
    Third,
}

impl fmt::Display for Trimester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trimester::First => write!(f, "first"),
            Trimester::Second => write!(f, "second"),
            Trimester::Third => write!(f, "third"),
        }
    }
}

/// Estimated due date from the first day of the last period.
pub fn due_date_from_lmp(lmp: NaiveDate) -> NaiveDate {
    lmp + Duration::days(FULL_TERM_DAYS)
}

/// Inverse of [`due_date_from_lmp`].
pub fn lmp_from_due_date(due: NaiveDate) -> NaiveDate {
    due - Duration::days(FULL_TERM_DAYS)
}

pub fn conception_date(due: NaiveDate) -> NaiveDate {
    lmp_from_due_date(due) + Duration::days(CONCEPTION_OFFSET_DAYS)
}

/// Days left until the due date; negative once it has passed.
pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Gestational age on `today`, clamped at zero before LMP.
pub fn gestational_age(due: NaiveDate, today: NaiveDate) -> GestationalAge {
    GestationalAge::from_days(FULL_TERM_DAYS - days_until_due(due, today))
}

/// The 1-based week of pregnancy `today` falls in, capped at
/// [`MAX_PREGNANCY_WEEK`].
pub fn pregnancy_week(due: NaiveDate, today: NaiveDate) -> u32 {
    (gestational_age(due, today).weeks + 1).min(MAX_PREGNANCY_WEEK)
}

pub fn trimester(week: u32) -> Trimester {
    match week {
        0..=13 => Trimester::First,
        14..=27 => Trimester::Second,
        _ => Trimester::Third,
    }
}
