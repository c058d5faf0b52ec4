use crate::catalog::ElementCatalog;
use crate::columns::{map_columns, ColumnLayout};
use crate::error::{BudgetError, Result};
use crate::hours::{merge, HourEntry, HourMap};
use crate::schema::{Cell, EntryMode, Period};
use csv::ReaderBuilder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// Outcome of reading one cell as an hour value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Blank,
    /// Text that is not a number. Counts as zero hours.
    Unparsable(String),
}

impl CellValue {
    pub fn hours(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Blank | CellValue::Unparsable(_) => 0.0,
        }
    }
}

/// Reads a cell as a number. Digit-grouping commas are accepted ("1,200");
/// anything else that does not parse, or parses to a non-finite value, is
/// reported as unparsable.
///
/// The whole text must be numeric: there is no leading-prefix parse, so
/// "40h" is unparsable rather than 40, and "1,200" reads as 1200 rather
/// than 1.
pub fn parse_cell(cell: &Cell) -> CellValue {
    match cell {
        Cell::Empty => CellValue::Blank,
        Cell::Number(n) if n.is_finite() => CellValue::Number(*n),
        Cell::Number(n) => CellValue::Unparsable(n.to_string()),
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return CellValue::Blank;
            }
            match trimmed.replace(',', "").parse::<f64>() {
                Ok(n) if n.is_finite() => CellValue::Number(n),
                _ => CellValue::Unparsable(trimmed.to_string()),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparsableCell {
    pub row_index: usize,
    pub column_index: usize,
    pub raw: String,
}

/// One data row matched against the known elements and the period columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    /// Index of the row in the sheet, header included.
    pub row_index: usize,
    /// Trimmed text of the element column, when the sheet has one.
    pub element_reference: Option<String>,
    /// Resolved element; `None` attributes the hours to the project.
    pub element_id: Option<String>,
    /// Strictly positive hours per period.
    pub hours_by_period: BTreeMap<Period, f64>,
    pub unparsable: Vec<UnparsableCell>,
}

impl ReconciledRow {
    pub fn is_unmatched(&self) -> bool {
        self.element_id.is_none()
            && self
                .element_reference
                .as_deref()
                .is_some_and(|r| !r.is_empty())
    }

    pub fn total_hours(&self) -> f64 {
        self.hours_by_period.values().sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = HourEntry> + '_ {
        self.hours_by_period.iter().map(|(period, hours)| HourEntry {
            period: *period,
            element_id: self.element_id.clone(),
            hours: *hours,
        })
    }
}

/// Resolves the element of a row and extracts its hours per mapped period.
/// Zero, negative and unparsable values are dropped; values from several
/// columns mapped to the same period are summed.
pub fn reconcile_row(
    row_index: usize,
    row: &[Cell],
    layout: &ColumnLayout,
    catalog: &ElementCatalog,
) -> ReconciledRow {
    let element_reference = layout.element_column.map(|idx| {
        row.get(idx)
            .map(|cell| cell.as_text().trim().to_string())
            .unwrap_or_default()
    });

    let element_id = element_reference
        .as_deref()
        .and_then(|reference| catalog.resolve(reference))
        .map(|element| element.id.clone());

    let mut hours_by_period: BTreeMap<Period, f64> = BTreeMap::new();
    let mut unparsable = Vec::new();

    for mapping in &layout.month_columns {
        let value = row
            .get(mapping.column_index)
            .map(parse_cell)
            .unwrap_or(CellValue::Blank);

        if let CellValue::Unparsable(raw) = &value {
            unparsable.push(UnparsableCell {
                row_index,
                column_index: mapping.column_index,
                raw: raw.clone(),
            });
        }

        let hours = value.hours();
        if hours > 0.0 {
            *hours_by_period.entry(mapping.period).or_insert(0.0) += hours;
        }
    }

    ReconciledRow {
        row_index,
        element_reference,
        element_id,
        hours_by_period,
        unparsable,
    }
}

/// Parsed sheet, shown for validation before it is merged anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPreview {
    pub layout: ColumnLayout,
    pub rows: Vec<ReconciledRow>,
    pub blank_rows: usize,
}

impl ImportPreview {
    pub fn entry_mode(&self) -> EntryMode {
        self.layout.entry_mode()
    }

    pub fn entries(&self) -> Vec<HourEntry> {
        self.rows.iter().flat_map(|row| row.entries()).collect()
    }

    pub fn total_hours(&self) -> f64 {
        self.rows.iter().map(|row| row.total_hours()).sum()
    }

    /// Element references that did not resolve to a known element.
    pub fn unmatched_references(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.is_unmatched())
            .filter_map(|row| row.element_reference.as_deref())
            .collect()
    }

    pub fn unparsable_cells(&self) -> Vec<&UnparsableCell> {
        self.rows.iter().flat_map(|row| row.unparsable.iter()).collect()
    }

    /// Imported periods that are not part of `axis`.
    pub fn periods_outside(&self, axis: &[Period]) -> BTreeSet<Period> {
        self.rows
            .iter()
            .flat_map(|row| row.hours_by_period.keys().copied())
            .filter(|period| !axis.contains(period))
            .collect()
    }

    /// Adds the previewed hours onto `existing`. Committing the same preview
    /// twice counts its rows twice.
    pub fn commit(&self, existing: &HourMap) -> HourMap {
        let entries = self.entries();
        info!(
            "Committing {} rows ({} entries, {:.2} hours) into budget",
            self.rows.len(),
            entries.len(),
            self.total_hours()
        );
        merge(existing, &entries)
    }
}

/// Header mapping and row reconciliation of a decoded sheet (first row is
/// the header). Blank rows are skipped.
pub fn preview_sheet(rows: &[Vec<Cell>], catalog: &ElementCatalog) -> Result<ImportPreview> {
    if rows.len() < 2 {
        return Err(BudgetError::EmptySheet { rows: rows.len() });
    }

    let layout = map_columns(&rows[0])?;

    let mut reconciled = Vec::new();
    let mut blank_rows = 0usize;

    for (row_index, row) in rows.iter().enumerate().skip(1) {
        if row.iter().all(Cell::is_blank) {
            blank_rows += 1;
            continue;
        }
        reconciled.push(reconcile_row(row_index, row, &layout, catalog));
    }

    if reconciled.is_empty() {
        return Err(BudgetError::EmptySheet { rows: rows.len() });
    }

    let preview = ImportPreview {
        layout,
        rows: reconciled,
        blank_rows,
    };

    let unmatched = preview.unmatched_references();
    if !unmatched.is_empty() {
        warn!(
            "{} rows reference unknown elements and will be budgeted at project level: {:?}",
            unmatched.len(),
            unmatched
        );
    }
    let unparsable = preview.unparsable_cells();
    if !unparsable.is_empty() {
        warn!(
            "{} cells could not be read as numbers and were counted as zero",
            unparsable.len()
        );
    }

    info!(
        "Previewed {} data rows across {} period columns ({:?} mode)",
        preview.rows.len(),
        preview.layout.month_columns.len(),
        preview.entry_mode()
    );

    Ok(preview)
}

/// Decodes CSV text into sheet rows. Rows may differ in length; empty
/// fields become [`Cell::Empty`].
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<Vec<Cell>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(rows)
}
