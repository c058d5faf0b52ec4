use crate::error::{BudgetError, Result};
use crate::schema::{Cell, EntryMode, Period};
use crate::utils::{FULL_MONTH_NAMES, MONTH_NAMES};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("valid year regex"));
static ISO_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(20\d{2})-(\d{1,2})$").expect("valid iso period regex"));

const ELEMENT_HEADER_TOKENS: [&str; 3] = ["wbs", "element", "code"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column_index: usize,
    pub period: Period,
}

/// Header layout inferred from the first row of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Period columns in header order. A column appears at most once; the
    /// same period may appear under several columns.
    pub month_columns: Vec<ColumnMapping>,
    pub element_column: Option<usize>,
}

impl ColumnLayout {
    /// A sheet with an element column carries per-element hours.
    pub fn entry_mode(&self) -> EntryMode {
        if self.element_column.is_some() {
            EntryMode::Element
        } else {
            EntryMode::Aggregate
        }
    }

    pub fn period_for_column(&self, column_index: usize) -> Option<Period> {
        self.month_columns
            .iter()
            .find(|m| m.column_index == column_index)
            .map(|m| m.period)
    }
}

/// Infers the period columns and the element column of a header row.
///
/// Fails with [`BudgetError::NoPeriodColumnsFound`] when no column can be
/// read as a period; a missing element column is valid.
pub fn map_columns(header: &[Cell]) -> Result<ColumnLayout> {
    let mut month_columns = Vec::new();

    for (column_index, cell) in header.iter().enumerate() {
        if let Some(period) = recognise_period(&cell.as_text()) {
            month_columns.push(ColumnMapping {
                column_index,
                period,
            });
        }
    }

    if month_columns.is_empty() {
        return Err(BudgetError::NoPeriodColumnsFound);
    }

    let element_column = header.iter().position(|cell| {
        let normalized = cell.as_text().to_lowercase();
        ELEMENT_HEADER_TOKENS
            .iter()
            .any(|token| normalized.contains(token))
    });

    debug!(
        "Mapped {} period columns, element column {:?}",
        month_columns.len(),
        element_column
    );

    Ok(ColumnLayout {
        month_columns,
        element_column,
    })
}

/// First recognised pattern wins: a month name with a year, then "YYYY-MM".
fn recognise_period(raw: &str) -> Option<Period> {
    recognise_month_name(&raw.to_lowercase()).or_else(|| recognise_iso(raw.trim()))
}

fn recognise_month_name(normalized: &str) -> Option<Period> {
    let month_idx = (0..12).find(|&m| {
        normalized.contains(&MONTH_NAMES[m].to_lowercase())
            || normalized.contains(&FULL_MONTH_NAMES[m].to_lowercase())
    })?;

    let year: i32 = YEAR_RE.captures(normalized)?.get(1)?.as_str().parse().ok()?;
    Period::new(year, month_idx as u32 + 1).ok()
}

fn recognise_iso(trimmed: &str) -> Option<Period> {
    let caps = ISO_PERIOD_RE.captures(trimmed)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    Period::new(year, month).ok()
}
