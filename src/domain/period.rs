//! Calendar windows used by the period-based queries. All in UTC.

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::ports::{RepositoryError, RepositoryResult};

/// Half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

pub fn validate_month(year: i32, month: u32) -> RepositoryResult<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidPeriod { year, month })
    }
}

fn first_instant(year: i32, month: u32) -> RepositoryResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or(RepositoryError::InvalidPeriod { year, month })
}

fn following_year(year: i32, month: u32) -> RepositoryResult<i32> {
    year.checked_add(1)
        .ok_or(RepositoryError::InvalidPeriod { year, month })
}

/// The window of one calendar month. December rolls over into January of
/// the following year.
pub fn month_window(year: i32, month: u32) -> RepositoryResult<Window> {
    validate_month(year, month)?;
    let (next_year, next_month) = if month == 12 {
        (following_year(year, month)?, 1)
    } else {
        (year, month + 1)
    };
    Ok(Window {
        start: first_instant(year, month)?,
        end: first_instant(next_year, next_month)?,
    })
}

pub fn year_window(year: i32) -> RepositoryResult<Window> {
    Ok(Window {
        start: first_instant(year, 1)?,
        end: first_instant(following_year(year, 1)?, 1)?,
    })
}

/// Resolves the optional year/month pair of `exists_for_category`.
/// Without a year there is no window and a lone month is ignored.
pub fn optional_window(year: Option<i32>, month: Option<u32>) -> RepositoryResult<Option<Window>> {
    match (year, month) {
        (Some(year), Some(month)) => month_window(year, month).map(Some),
        (Some(year), None) => year_window(year).map(Some),
        (None, _) => Ok(None),
    }
}

pub fn in_month(at: DateTime<Utc>, year: i32, month: u32) -> bool {
    at.year() == year && at.month() == month
}
