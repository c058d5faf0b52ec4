use budget_hours_builder::{
    build_template, template_file_name, write_csv_rows, BudgetDraft, BudgetHeader, BudgetImporter,
    BudgetType, DistributionStrategy, Element, ElementCatalog, EntryMode, FiscalConfig,
};

fn main() {
    let config = FiscalConfig::for_fiscal_year(2025, 10).expect("valid fiscal configuration");
    let elements = vec![
        Element {
            id: "wbs-1".to_string(),
            code: "1.1".to_string(),
            description: "Discovery".to_string(),
        },
        Element {
            id: "wbs-2".to_string(),
            code: "1.2".to_string(),
            description: "Delivery".to_string(),
        },
    ];

    let mut draft = BudgetDraft::from_config(&config).expect("draft from fiscal configuration");
    draft.set_total(2400).expect("non-negative total");
    draft.set_strategy(DistributionStrategy::FrontLoaded);

    println!("Front-loaded distribution of 2400 hours:");
    let hours = draft.hours().expect("distribution should succeed");
    for period in draft.periods() {
        println!(" - {}: {:.0}", period.label(), hours.hours(*period, None));
    }

    let template = build_template(draft.periods(), &elements, EntryMode::Element);
    let mut buffer = Vec::new();
    write_csv_rows(&template, &mut buffer).expect("template should encode");
    println!(
        "\nTemplate {}:\n{}",
        template_file_name("Apollo", config.fiscal_year),
        String::from_utf8_lossy(&buffer)
    );

    let upload = "WBS Code,Oct 2024,Nov 2024,Dec 2024\n1.1,40,40,n/a\ndelivery,0,16,24\n9.9,8,,\n";
    let catalog = ElementCatalog::new(elements);
    let preview = BudgetImporter::new(&catalog)
        .preview_csv(upload.as_bytes())
        .expect("upload should parse");

    println!("Preview: {} rows, {:.1} hours", preview.rows.len(), preview.total_hours());
    println!(" - unmatched references: {:?}", preview.unmatched_references());
    for cell in preview.unparsable_cells() {
        println!(
            " - row {} column {}: '{}' counted as zero",
            cell.row_index, cell.column_index, cell.raw
        );
    }

    draft.import(&preview).expect("import should merge");
    println!("Entry mode after import: {:?}", draft.mode());

    let header = BudgetHeader {
        project_id: "apollo".to_string(),
        budget_type: BudgetType::Original,
        fiscal_year: config.fiscal_year,
        name: Some("FY25 baseline".to_string()),
        description: None,
    };
    let request = draft.to_request(&header).expect("request should build");

    println!(
        "\nSubmitting {} element lines, {:.1} hours total",
        request.budget_lines.len(),
        request.total_budgeted_hours
    );
    for line in &request.budget_lines {
        let code = line
            .element_id
            .as_deref()
            .and_then(|id| catalog.by_id(id))
            .map(|element| element.code.as_str())
            .unwrap_or("-");
        println!(" - {} {}: {:.1}", line.period.label(), code, line.hours);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&request).expect("request serializes")
    );

    draft.set_mode(EntryMode::Aggregate);
    let project_request = draft.to_request(&header).expect("request should build");
    println!(
        "\nProject-level alternative: {} lines, {:.1} hours total",
        project_request.budget_lines.len(),
        project_request.total_budgeted_hours
    );
}
