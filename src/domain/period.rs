use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One calendar-month accumulation window, anchored at the first of its month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    start: NaiveDate,
}

impl Period {
    /// The period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            start: first_of_month(date),
        }
    }

    /// Builds a period from a stored start date, snapping to the first of the month.
    pub fn from_start(start: NaiveDate) -> Self {
        Self::containing(start)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end: the first day of the following month.
    pub fn end_exclusive(&self) -> NaiveDate {
        add_months(self.start, 1)
    }

    /// Inclusive end: the last day of the month.
    pub fn end_inclusive(&self) -> NaiveDate {
        self.end_exclusive() - Duration::days(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end_exclusive()
    }

    pub fn next(&self) -> Self {
        Self {
            start: self.end_exclusive(),
        }
    }

    /// True when this period's month is strictly before the month of `today`.
    pub fn elapsed_by(&self, today: NaiveDate) -> bool {
        (self.start.year(), self.start.month()) < (today.year(), today.month())
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Advances by whole calendar months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    let mut day = date.day();
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    day = day.min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap_or(date)
}

/// Advances by whole calendar years, clamping Feb 29 to Feb 28 off leap years.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    let month = date.month();
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    let last_current = first_next - Duration::days(1);
    last_current.day()
}
