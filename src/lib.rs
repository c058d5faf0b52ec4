//! # Budget Hours Builder
//!
//! A library for turning budget hours into month-by-month line items: spreading
//! a single total across fiscal periods, and reconciling externally authored
//! spreadsheets into the same per-period (optionally per-work-breakdown-element)
//! hour map.
//!
//! ## Core Concepts
//!
//! - **Period**: a (year, month) pair on the fiscal calendar
//! - **Distribution Strategy**: Even, FrontLoaded, BackLoaded or Custom shaping of a total
//! - **Hour Map**: hours keyed by period and optional element, never negative
//! - **Preview / Commit**: an import is parsed and shown first, then merged additively
//! - **Line Items**: the positive-hour entries submitted as `budgetLines`
//!
//! ## Example
//!
//! ```rust,ignore
//! use budget_hours_builder::*;
//!
//! let config = FiscalConfig::for_fiscal_year(2025, 10)?;
//! let periods = config.periods()?;
//!
//! let hours = distribute(&DistributionStrategy::FrontLoaded, 1200, &periods)?;
//!
//! let rows = vec![
//!     vec![Cell::from("WBS Code"), Cell::from("Oct 2024"), Cell::from("Nov 2024")],
//!     vec![Cell::from("1.1"), Cell::from("40"), Cell::from("12")],
//! ];
//! let catalog = ElementCatalog::new(elements);
//! let preview = preview_sheet(&rows, &catalog)?;
//! let merged = preview.commit(&hours);
//!
//! let lines = build_lines(&merged);
//! ```

pub mod catalog;
pub mod columns;
pub mod draft;
pub mod engine;
pub mod error;
pub mod hours;
pub mod ingestion;
pub mod lines;
pub mod schema;
pub mod template;
pub mod utils;

pub use catalog::ElementCatalog;
pub use columns::{map_columns, ColumnLayout, ColumnMapping};
pub use draft::BudgetDraft;
pub use engine::{distribute, Distributor};
pub use error::{BudgetError, Result};
pub use hours::{merge, HourEntry, HourKey, HourMap};
pub use ingestion::*;
pub use lines::{build_lines, build_request, lines_total, BudgetHeader};
pub use schema::*;
pub use template::{build_template, template_file_name, write_csv_rows};
pub use utils::*;

use log::info;
use std::io::Read;

pub struct BudgetImporter<'a> {
    catalog: &'a ElementCatalog,
}

impl<'a> BudgetImporter<'a> {
    pub fn new(catalog: &'a ElementCatalog) -> Self {
        Self { catalog }
    }

    pub fn preview(&self, rows: &[Vec<Cell>]) -> Result<ImportPreview> {
        preview_sheet(rows, self.catalog)
    }

    pub fn preview_csv<R: Read>(&self, reader: R) -> Result<ImportPreview> {
        let rows = read_csv_rows(reader)?;
        info!("Decoded {} CSV rows", rows.len());
        self.preview(&rows)
    }

    /// Preview and commit in one step; nothing is merged when the sheet is
    /// rejected.
    pub fn import(&self, rows: &[Vec<Cell>], existing: &HourMap) -> Result<HourMap> {
        let preview = self.preview(rows)?;
        Ok(preview.commit(existing))
    }
}

pub fn import_sheet(
    rows: &[Vec<Cell>],
    elements: &[Element],
    existing: &HourMap,
) -> Result<HourMap> {
    let catalog = ElementCatalog::new(elements.to_vec());
    BudgetImporter::new(&catalog).import(rows, existing)
}
