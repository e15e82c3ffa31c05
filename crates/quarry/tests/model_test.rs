//! End-to-end tests through the filing model facade.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use quarry::{FilingModel, StatementView};
use quarry_core::{
    Dimension, Fact, FiscalPeriod, Period, PresentationNode, StatementRole, StatementType, Unit,
};
use quarry_statements::StandardConcept;
use std::collections::BTreeSet;

fn usd() -> Unit {
    Unit::Monetary("USD".to_string())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn role(id: &str, definition: &str, concepts: &[&str], order: usize) -> StatementRole {
    let mut role = StatementRole::new(id, definition);
    role.presentation = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| PresentationNode::line_item(*c, i as u32))
        .collect();
    role.presentation_order = order;
    role
}

fn catalog() -> Vec<StatementRole> {
    let mut income = role(
        "r-is",
        "Consolidated Statements of Operations",
        &[
            "us-gaap:Revenues",
            "us-gaap:CostOfRevenue",
            "us-gaap:GrossProfit",
            "us-gaap:OperatingIncomeLoss",
            "us-gaap:IncomeTaxExpenseBenefit",
            "us-gaap:NetIncomeLoss",
            "us-gaap:EarningsPerShareDiluted",
        ],
        1,
    );
    // The statement face declares a product/service hypercube
    income.declared_axes = Some(
        ["srt:ProductOrServiceAxis".to_string()]
            .into_iter()
            .collect::<BTreeSet<_>>(),
    );
    vec![
        role(
            "r-cover",
            "Document and Entity Information",
            &["dei:EntityRegistrantName"],
            0,
        ),
        income,
        role(
            "r-seg-note",
            "Segment Information - Revenues by Geography (Details)",
            &["us-gaap:Revenues"],
            8,
        ),
    ]
}

fn annual_revenue(fy: i32, value: f64) -> Fact {
    Fact::reported(
        "us-gaap:Revenues",
        value,
        usd(),
        Period::duration(date(fy, 1, 1), date(fy, 12, 31)),
    )
    .with_fiscal(fy, FiscalPeriod::Fy)
    .with_form("10-K")
    .with_filed(date(fy + 1, 2, 15))
}

fn facts() -> Vec<Fact> {
    vec![
        annual_revenue(2023, 460.0),
        // Product-line breakdown declared on the statement face
        annual_revenue(2023, 300.0)
            .with_dimension(Dimension::new("srt:ProductOrServiceAxis", "acme:WidgetsMember")),
        // Geography breakdown, not declared on the face
        annual_revenue(2023, 160.0).with_dimension(Dimension::new(
            "srt:StatementGeographicalAxis",
            "country:US",
        )),
        Fact::reported(
            "us-gaap:NetIncomeLoss",
            46.0,
            usd(),
            Period::duration(date(2023, 1, 1), date(2023, 12, 31)),
        )
        .with_fiscal(2023, FiscalPeriod::Fy)
        .with_form("10-K")
        .with_filed(date(2024, 2, 15)),
    ]
}

#[test]
fn statement_view_keeps_face_values_only() {
    let model = FilingModel::new(facts(), catalog());
    let view: StatementView = model.statement(StatementType::IncomeStatement).unwrap();

    assert_eq!(view.statement_type, StatementType::IncomeStatement);
    assert_eq!(view.role.role_id, "r-is");

    // Undimensioned totals and the declared product axis stay; the
    // undeclared geography axis is a footnote breakdown
    let revenues: Vec<&Fact> = view
        .facts
        .iter()
        .filter(|f| f.concept == "us-gaap:Revenues")
        .collect();
    assert_eq!(revenues.len(), 2);
    assert!(
        revenues
            .iter()
            .all(|f| !f.dimensions.iter().any(|d| d.axis.contains("Geographical")))
    );

    assert!(
        view.facts
            .iter()
            .any(|f| f.concept == "us-gaap:NetIncomeLoss")
    );
}

#[test]
fn quarterization_and_ttm_through_the_model() {
    let mut all = facts();
    // Quarterly history so TTM has a window: Q1 + YTDs for 2023
    all.push(
        Fact::reported(
            "us-gaap:NetIncomeLoss",
            10.0,
            usd(),
            Period::duration(date(2023, 1, 1), date(2023, 3, 31)),
        )
        .with_fiscal(2023, FiscalPeriod::Q1)
        .with_filed(date(2023, 5, 5)),
    );
    all.push(
        Fact::reported(
            "us-gaap:NetIncomeLoss",
            21.0,
            usd(),
            Period::duration(date(2023, 1, 1), date(2023, 6, 30)),
        )
        .with_fiscal(2023, FiscalPeriod::Ytd6m)
        .with_filed(date(2023, 8, 5)),
    );
    all.push(
        Fact::reported(
            "us-gaap:NetIncomeLoss",
            33.0,
            usd(),
            Period::duration(date(2023, 1, 1), date(2023, 9, 30)),
        )
        .with_fiscal(2023, FiscalPeriod::Ytd9m)
        .with_filed(date(2023, 11, 5)),
    );

    let model = FilingModel::new(all, catalog());

    let quarterized = model.quarterize_concept("us-gaap:NetIncomeLoss");
    assert_eq!(quarterized.facts.len(), 4);

    let ttm = model.ttm("us-gaap:NetIncomeLoss", None).unwrap();
    assert_relative_eq!(ttm.value, 46.0);
    assert!(ttm.uses_derived);
}

#[test]
fn standardization_learns_into_the_model_store() {
    let mut model = FilingModel::new(facts(), catalog());

    let mapped = model
        .standardize(
            "acme:NetIncomeAttributable",
            "Net income (loss)",
            Some(StatementType::IncomeStatement),
        )
        .unwrap();
    assert_eq!(mapped.standard, Some(StandardConcept::NetIncome));

    // Learned alias now resolves without scoring
    assert_eq!(
        model.mapping_store().lookup("NetIncomeAttributable"),
        Some(StandardConcept::NetIncome)
    );
}

#[test]
fn split_adjustment_through_the_model() {
    let mut all = facts();
    all.push(
        Fact::reported(
            "us-gaap:EarningsPerShareDiluted",
            4.6,
            Unit::PerShare("USD".to_string()),
            Period::duration(date(2023, 1, 1), date(2023, 12, 31)),
        )
        .with_filed(date(2024, 2, 15)),
    );
    all.push(
        Fact::reported(
            "us-gaap:StockholdersEquityNoteStockSplitConversionRatio1",
            2.0,
            Unit::Pure,
            Period::duration(date(2024, 6, 10), date(2024, 6, 10)),
        )
        .with_filed(date(2024, 8, 2)),
    );

    let model = FilingModel::new(all, catalog());
    let splits = model.splits();
    assert_eq!(splits.len(), 1);

    let adjusted = model.split_adjusted_facts();
    let eps = adjusted
        .iter()
        .find(|f| f.concept == "us-gaap:EarningsPerShareDiluted")
        .and_then(|f| f.value)
        .unwrap();
    assert_relative_eq!(eps, 2.3);

    // Monetary totals are untouched
    let revenue = adjusted
        .iter()
        .find(|f| f.concept == "us-gaap:Revenues" && !f.is_dimensioned())
        .and_then(|f| f.value)
        .unwrap();
    assert_relative_eq!(revenue, 460.0);
}
