use crate::error::{BudgetError, Result};
use crate::schema::Period;
use chrono::{Datelike, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const FULL_MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn validate_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(BudgetError::InvalidArgument(format!(
            "month {} must be between 1 and 12",
            month
        )));
    }
    Ok(())
}

/// Upper bound on a generated period axis (a thousand years of months).
pub const MAX_PERIOD_COUNT: i64 = 12_000;

/// Produces `count` consecutive monthly periods starting at
/// (`start_year`, `start_month`), wrapping December into January of the
/// following year.
pub fn generate_periods(start_year: i32, start_month: u32, count: i64) -> Result<Vec<Period>> {
    if count <= 0 {
        return Err(BudgetError::InvalidArgument(format!(
            "period count must be greater than zero, got {}",
            count
        )));
    }
    validate_month(start_month)?;

    if count > MAX_PERIOD_COUNT {
        return Err(BudgetError::InvalidArgument(format!(
            "period count must not exceed {}, got {}",
            MAX_PERIOD_COUNT, count
        )));
    }

    let mut periods = Vec::with_capacity(count as usize);
    let mut current = Period {
        year: start_year,
        month: start_month,
    };

    for i in 0..count {
        periods.push(current);
        if i + 1 < count {
            current = current.next()?;
        }
    }

    Ok(periods)
}

/// Parses a "YYYY-MM" period. Months outside 1..=12 are rejected.
pub fn parse_period_string(period: &str) -> Result<Period> {
    let (year, month) = period.trim().split_once('-').ok_or_else(|| {
        BudgetError::InvalidArgument(format!(
            "Invalid period format: {}. Expected YYYY-MM",
            period
        ))
    })?;

    let year: i32 = year.parse().map_err(|_| {
        BudgetError::InvalidArgument(format!("Invalid year in period: {}", period))
    })?;
    let month: u32 = month.parse().map_err(|_| {
        BudgetError::InvalidArgument(format!("Invalid month in period: {}", period))
    })?;

    Period::new(year, month)
}

/// Fiscal year a date falls in, for a fiscal year that starts in
/// `start_month` and is named after the calendar year it ends in.
pub fn current_fiscal_year(today: NaiveDate, start_month: u32) -> Result<i32> {
    validate_month(start_month)?;

    if today.month() < start_month {
        return Ok(today.year());
    }

    if start_month == 1 {
        Ok(today.year())
    } else {
        Ok(today.year() + 1)
    }
}

/// Months from `start` to `end`; negative when `end` precedes `start`.
pub fn months_between(start: Period, end: Period) -> i64 {
    let year_diff = (end.year - start.year) as i64;
    let month_diff = end.month as i64 - start.month as i64;
    year_diff * 12 + month_diff
}
