use crate::error::Result;
use crate::schema::{Cell, Element, EntryMode, Period};
use csv::WriterBuilder;
use std::io::Write;

const EXAMPLE_ELEMENTS: [(&str, &str); 2] = [("1.1", "Example Task 1"), ("1.2", "Example Task 2")];

/// Builds a blank import template whose header the column mapper
/// recognises: period labels such as "Jan 2025", preceded by "WBS Code" and
/// "WBS Description" columns in element mode.
pub fn build_template(periods: &[Period], elements: &[Element], mode: EntryMode) -> Vec<Vec<Cell>> {
    let zeros = || periods.iter().map(|_| Cell::Number(0.0));
    let labels = periods.iter().map(|p| Cell::Text(p.label()));

    match mode {
        EntryMode::Element => {
            let mut header = vec![Cell::from("WBS Code"), Cell::from("WBS Description")];
            header.extend(labels);

            let mut rows = vec![header];
            if elements.is_empty() {
                for (code, description) in EXAMPLE_ELEMENTS {
                    let mut row = vec![Cell::from(code), Cell::from(description)];
                    row.extend(zeros());
                    rows.push(row);
                }
            } else {
                for element in elements {
                    let mut row = vec![
                        Cell::Text(element.code.clone()),
                        Cell::Text(element.description.clone()),
                    ];
                    row.extend(zeros());
                    rows.push(row);
                }
            }
            rows
        }
        EntryMode::Aggregate => {
            let mut header = vec![Cell::from("Project")];
            header.extend(labels);

            let mut row = vec![Cell::from("Total")];
            row.extend(zeros());

            vec![header, row]
        }
    }
}

pub fn template_file_name(project_name: &str, fiscal_year: i32) -> String {
    let project: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let project = if project.is_empty() {
        "project".to_string()
    } else {
        project
    };
    format!("budget_template_{}_FY{}.csv", project, fiscal_year)
}

pub fn write_csv_rows<W: Write>(rows: &[Vec<Cell>], writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
    for row in rows {
        writer.write_record(row.iter().map(Cell::as_text))?;
    }
    writer.flush()?;
    Ok(())
}
