use budget_hours_builder::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn wbs_elements() -> Vec<Element> {
    vec![
        Element {
            id: "wbs-100".to_string(),
            code: "1.1".to_string(),
            description: "Requirements and design".to_string(),
        },
        Element {
            id: "wbs-200".to_string(),
            code: "1.2".to_string(),
            description: "Implementation".to_string(),
        },
        Element {
            id: "wbs-300".to_string(),
            code: "2.0".to_string(),
            description: "Testing and rollout".to_string(),
        },
    ]
}

fn values(map: &HourMap, periods: &[Period]) -> Vec<f64> {
    periods.iter().map(|p| map.hours(*p, None)).collect()
}

#[test]
fn test_even_sum_and_spread_invariants() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let total: i64 = rng.gen_range(0..100_000);
        let n: i64 = rng.gen_range(1..=36);
        let periods = generate_periods(2024, rng.gen_range(1..=12), n).unwrap();

        let map = distribute(&DistributionStrategy::Even, total, &periods).unwrap();
        let vals = values(&map, &periods);

        assert_eq!(map.len(), periods.len());
        assert_eq!(vals.iter().sum::<f64>(), total as f64);

        let max = vals.iter().cloned().fold(f64::MIN, f64::max);
        let min = vals.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max - min <= 1.0, "spread {} for total {} over {}", max - min, total, n);
        assert!(vals.iter().all(|v| v.fract() == 0.0));
    }
}

#[test]
fn test_loaded_strategies_preserve_total() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..500 {
        let total: i64 = rng.gen_range(0..50_000);
        let n: i64 = rng.gen_range(1..=24);
        let periods = generate_periods(2025, 1, n).unwrap();

        for strategy in [DistributionStrategy::FrontLoaded, DistributionStrategy::BackLoaded] {
            let map = distribute(&strategy, total, &periods).unwrap();
            let vals = values(&map, &periods);
            assert_eq!(vals.iter().sum::<f64>(), total as f64);

            let first_len = (n as usize).div_ceil(2);
            let (first, second) = vals.split_at(first_len);
            for half in [first, second] {
                if half.is_empty() {
                    continue;
                }
                let max = half.iter().cloned().fold(f64::MIN, f64::max);
                let min = half.iter().cloned().fold(f64::MAX, f64::min);
                assert!(max - min <= 1.0);
            }
        }
    }
}

#[test]
fn test_front_loaded_weighting_for_fiscal_year() {
    let config = FiscalConfig::for_fiscal_year(2025, 10).unwrap();
    let periods = config.periods().unwrap();

    let front = distribute(&DistributionStrategy::FrontLoaded, 1200, &periods).unwrap();
    let back = distribute(&DistributionStrategy::BackLoaded, 1200, &periods).unwrap();

    let first_half: Vec<Period> = periods[..6].to_vec();
    let front_first: f64 = first_half.iter().map(|p| front.hours(*p, None)).sum();
    let back_first: f64 = first_half.iter().map(|p| back.hours(*p, None)).sum();

    assert_eq!(front_first, 720.0);
    assert_eq!(back_first, 480.0);
    assert_eq!(periods[0].label(), "Oct 2024");
}

#[test]
fn test_template_roundtrip_through_csv() {
    let config = FiscalConfig::for_fiscal_year(2025, 1).unwrap();
    let periods = config.periods().unwrap();
    let elements = wbs_elements();

    let template = build_template(&periods, &elements, EntryMode::Element);
    let mut buffer = Vec::new();
    write_csv_rows(&template, &mut buffer).unwrap();

    // Fill in a few cells as a user would
    let text = String::from_utf8(buffer).unwrap();
    let edited: String = text
        .lines()
        .map(|line| {
            if line.starts_with("1.2,") {
                line.replacen(",0,0,", ",80,120,", 1)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let catalog = ElementCatalog::new(elements);
    let preview = BudgetImporter::new(&catalog)
        .preview_csv(edited.as_bytes())
        .unwrap();

    assert_eq!(preview.entry_mode(), EntryMode::Element);
    assert_eq!(preview.layout.element_column, Some(0));
    assert_eq!(preview.layout.month_columns.len(), 12);
    assert!(preview.unmatched_references().is_empty());
    assert!(preview.periods_outside(&periods).is_empty());

    let merged = preview.commit(&HourMap::new());
    assert_eq!(merged.hours(periods[0], Some("wbs-200")), 80.0);
    assert_eq!(merged.hours(periods[1], Some("wbs-200")), 120.0);
    assert_eq!(merged.total(), 200.0);
}

#[test]
fn test_aggregate_template_is_importable() {
    let periods = generate_periods(2025, 4, 6).unwrap();
    let mut rows = build_template(&periods, &[], EntryMode::Aggregate);
    rows[1][3] = Cell::Number(25.0);

    let preview = preview_sheet(&rows, &ElementCatalog::default()).unwrap();
    assert_eq!(preview.entry_mode(), EntryMode::Aggregate);

    let lines = build_lines(&preview.commit(&HourMap::new()));
    assert_eq!(
        lines,
        vec![LineItem {
            period: Period::new(2025, 6).unwrap(),
            hours: 25.0,
            element_id: None,
        }]
    );
}

#[test]
fn test_reimport_accumulates_until_cleared() {
    let rows = vec![
        vec![Cell::from("Jan 2025"), Cell::from("Feb 2025")],
        vec![Cell::from("10"), Cell::from("")],
    ];
    let catalog = ElementCatalog::default();
    let importer = BudgetImporter::new(&catalog);

    let once = importer.import(&rows, &HourMap::new()).unwrap();
    let twice = importer.import(&rows, &once).unwrap();

    let jan = Period::new(2025, 1).unwrap();
    assert_eq!(once.hours(jan, None), 10.0);
    assert_eq!(twice.hours(jan, None), 20.0);
    assert_eq!(build_lines(&twice).len(), 1);
}

#[test]
fn test_draft_workflow_to_request() -> anyhow::Result<()> {
    let config = FiscalConfig::from_json(
        r#"{"fiscalYear":2025,"startYear":2025,"startMonth":1,"periodCount":12}"#,
    )?;
    let mut draft = BudgetDraft::from_config(&config)?;

    draft.set_total(1000)?;
    draft.set_strategy(DistributionStrategy::BackLoaded);
    let computed = draft.hours()?;
    assert_eq!(computed.total(), 1000.0);

    let march = Period::new(2025, 3)?;
    draft.edit(HourKey::aggregate(march), 0.0)?;
    assert_eq!(draft.strategy_kind(), StrategyKind::Custom);

    let rows = vec![
        vec![Cell::from("WBS"), Cell::from("2025-03"), Cell::from("2025-04")],
        vec![Cell::from("Implementation"), Cell::from("32"), Cell::from("x")],
        vec![Cell::from("9.9"), Cell::from("4"), Cell::Empty],
    ];
    let catalog = ElementCatalog::new(wbs_elements());
    let preview = preview_sheet(&rows, &catalog)?;
    assert_eq!(preview.unmatched_references(), vec!["9.9"]);
    assert_eq!(preview.unparsable_cells().len(), 1);

    draft.import(&preview)?;
    assert_eq!(draft.mode(), EntryMode::Element);

    let header = BudgetHeader {
        project_id: "proj-42".to_string(),
        budget_type: BudgetType::Reforecast,
        fiscal_year: config.fiscal_year,
        name: Some("FY25 reforecast".to_string()),
        description: None,
    };
    let request = draft.to_request(&header)?;

    // Only the matched element row is submitted; the unmatched "9.9" row and
    // the project-level distribution stay out of an element-mode request
    assert_eq!(
        request.budget_lines,
        vec![LineItem {
            period: march,
            hours: 32.0,
            element_id: Some("wbs-200".to_string()),
        }]
    );
    assert_eq!(request.total_budgeted_hours, 32.0);

    draft.set_mode(EntryMode::Aggregate);
    let project_request = draft.to_request(&header)?;
    assert!(project_request
        .budget_lines
        .iter()
        .all(|l| l.element_id.is_none() && l.hours > 0.0 && l.period != march));
    let back_loaded_march = computed.hours(march, None);
    assert_eq!(
        project_request.total_budgeted_hours,
        1000.0 - back_loaded_march
    );

    let json = serde_json::to_string(&request)?;
    assert!(json.contains(r#""budgetType":"Reforecast""#));
    Ok(())
}

#[test]
fn test_structural_errors_are_actionable() {
    let catalog = ElementCatalog::default();

    let err = preview_sheet(&[vec![Cell::from("Jan 2025")]], &catalog).unwrap_err();
    assert!(err.to_string().contains("at least a header row and one data row"));

    let rows = vec![
        vec![Cell::from("Month"), Cell::from("Budgeted Hours")],
        vec![Cell::from("Jan 2025"), Cell::from("10")],
    ];
    let err = preview_sheet(&rows, &catalog).unwrap_err();
    assert!(matches!(err, BudgetError::NoPeriodColumnsFound));
    assert!(err.to_string().contains("\"Jan 2025\""));
    assert!(err.to_string().contains("\"2025-01\""));
}
