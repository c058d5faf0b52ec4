use crate::hours::HourMap;
use crate::schema::{BudgetType, CreateBudgetRequest, LineItem};
use log::debug;

/// Turns an hour map into persistence line items, dropping entries with no
/// hours. Lines come out ordered by period, project-level hours first, then
/// by element id.
pub fn build_lines(map: &HourMap) -> Vec<LineItem> {
    let lines: Vec<LineItem> = map
        .iter()
        .filter(|(_, hours)| *hours > 0.0)
        .map(|(key, hours)| LineItem {
            period: key.period,
            hours,
            element_id: key.element_id.clone(),
        })
        .collect();

    debug!(
        "Built {} budget lines from {} map entries",
        lines.len(),
        map.len()
    );
    lines
}

pub fn lines_total(lines: &[LineItem]) -> f64 {
    lines.iter().map(|line| line.hours).sum()
}

/// Header fields of a budget-creation request.
#[derive(Debug, Clone, Default)]
pub struct BudgetHeader {
    pub project_id: String,
    pub budget_type: BudgetType,
    pub fiscal_year: i32,
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn build_request(header: &BudgetHeader, map: &HourMap) -> CreateBudgetRequest {
    let budget_lines = build_lines(map);
    CreateBudgetRequest {
        project_id: header.project_id.clone(),
        budget_type: header.budget_type,
        fiscal_year: header.fiscal_year,
        name: header.name.clone(),
        description: header.description.clone(),
        total_budgeted_hours: lines_total(&budget_lines),
        budget_lines,
    }
}
