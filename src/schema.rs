use crate::error::{BudgetError, Result};
use crate::hours::HourMap;
use crate::utils::{generate_periods, validate_month};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (year, month) pair on the fiscal calendar. Ordering is chronological.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Period {
    #[schemars(description = "Calendar year of the period (e.g., 2025)")]
    pub year: i32,

    #[schemars(description = "Calendar month of the period, 1 = January through 12 = December")]
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        validate_month(month).map_err(|_| BudgetError::InvalidPeriod { year, month })?;
        Ok(Self { year, month })
    }

    /// The calendar month immediately after this one. Fails past the last
    /// representable year.
    pub fn next(&self) -> Result<Self> {
        if self.month != 12 {
            return Ok(Self {
                year: self.year,
                month: self.month + 1,
            });
        }
        let year = self.year.checked_add(1).ok_or_else(|| {
            BudgetError::InvalidArgument(format!("no period follows {}", self))
        })?;
        Ok(Self { year, month: 1 })
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn month_end(&self) -> Option<NaiveDate> {
        let next = self.next().ok()?;
        NaiveDate::from_ymd_opt(next.year, next.month, 1)?.pred_opt()
    }

    /// Header label in the "Jan 2025" form recognised by the column mapper.
    pub fn label(&self) -> String {
        match self.first_day() {
            Some(date) => date.format("%b %Y").to_string(),
            None => self.iso(),
        }
    }

    /// "2025-01" form.
    pub fn iso(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso())
    }
}

/// A work-breakdown element of a project. Reference data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Element {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// A raw spreadsheet cell as produced by the sheet decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text rendering of the cell, numbers formatted without a trailing ".0".
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// One row of the persistence payload. Only emitted with positive hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LineItem {
    #[serde(flatten)]
    pub period: Period,

    #[serde(rename = "budgetedHours")]
    #[schemars(description = "Hours budgeted for the period; always greater than zero")]
    pub hours: f64,

    #[serde(
        rename = "wbsElementId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(
        description = "Work-breakdown element the hours are attributed to; absent for project-level hours"
    )]
    pub element_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EntryMode {
    #[schemars(description = "Hours are entered per period for the project as a whole")]
    Aggregate,

    #[schemars(description = "Hours are entered per period for each work-breakdown element")]
    Element,
}

impl Default for EntryMode {
    fn default() -> Self {
        Self::Aggregate
    }
}

/// Serializable name of a distribution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    Even,
    FrontLoaded,
    BackLoaded,
    Custom,
}

/// Shaping rule used to spread a total across periods.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionStrategy {
    /// Equal share per period, the remainder going to the earliest periods.
    Even,
    /// 60% of the total in the first half of the periods.
    FrontLoaded,
    /// 40% of the total in the first half of the periods.
    BackLoaded,
    /// A caller-supplied map, returned unchanged.
    Custom(HourMap),
}

impl DistributionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            DistributionStrategy::Even => StrategyKind::Even,
            DistributionStrategy::FrontLoaded => StrategyKind::FrontLoaded,
            DistributionStrategy::BackLoaded => StrategyKind::BackLoaded,
            DistributionStrategy::Custom(_) => StrategyKind::Custom,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, DistributionStrategy::Custom(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum BudgetType {
    Original,
    Reforecast,
    Amendment,
    WhatIf,
}

impl Default for BudgetType {
    fn default() -> Self {
        Self::Original
    }
}

/// Fiscal calendar settings that drive period generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiscalConfig {
    #[schemars(description = "Fiscal year, named after the calendar year in which it ends")]
    pub fiscal_year: i32,

    #[schemars(description = "Calendar year of the first period")]
    pub start_year: i32,

    #[schemars(description = "Calendar month of the first period (1-12)")]
    pub start_month: u32,

    #[schemars(description = "Number of monthly periods in the budget horizon")]
    pub period_count: usize,
}

impl FiscalConfig {
    /// Twelve-period configuration for a fiscal year starting in `start_month`.
    pub fn for_fiscal_year(fiscal_year: i32, start_month: u32) -> Result<Self> {
        validate_month(start_month)?;
        let start_year = if start_month == 1 {
            fiscal_year
        } else {
            fiscal_year - 1
        };

        Ok(Self {
            fiscal_year,
            start_year,
            start_month,
            period_count: 12,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: FiscalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_month(self.start_month)?;
        if self.period_count == 0 {
            return Err(BudgetError::InvalidArgument(
                "period count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn periods(&self) -> Result<Vec<Period>> {
        self.validate()?;
        generate_periods(self.start_year, self.start_month, self.period_count as i64)
    }
}

/// Payload of a budget-creation request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    pub project_id: String,
    pub budget_type: BudgetType,
    pub fiscal_year: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[schemars(description = "Sum of budgetedHours over all budget lines")]
    pub total_budgeted_hours: f64,

    pub budget_lines: Vec<LineItem>,
}

impl CreateBudgetRequest {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CreateBudgetRequest)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
