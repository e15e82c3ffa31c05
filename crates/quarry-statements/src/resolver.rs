//! Statement resolution: mapping a requested canonical statement type to
//! the best matching structural container in a filing.
//!
//! Filings declare many roles — primary statements, footnotes, schedules,
//! parentheticals — and filer naming varies ("Statement of Income",
//! "Statements of Operations", "Consolidated Balance Sheets"). Resolution
//! first pattern-matches role definitions, then scores surviving candidates
//! by structural content. The one fallback is honest: a request for the
//! income statement may be answered with a comprehensive income statement,
//! and the returned `actual_type` says so.

use quarry_core::{QuarryError, Result, StatementRole, StatementType};
use tracing::debug;

/// Tunable scoring parameters for statement resolution.
///
/// The minimum score and content weights are heuristic and filer-dependent;
/// they are configuration, not law, and should be validated against a
/// corpus of known-good filings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Candidates below this total score are not statements at all
    pub min_score: f64,
    /// Weight per five line items, capped at three increments
    pub line_item_weight: f64,
    /// Weight for each type-defining concept present
    pub defining_concept_weight: f64,
    /// Boost when the loader's declared type matches the target
    pub declared_type_weight: f64,
    /// Penalty when a majority of line items are tax-disclosure concepts
    pub tax_majority_penalty: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_score: 4.0,
            line_item_weight: 1.0,
            defining_concept_weight: 2.0,
            declared_type_weight: 1.0,
            tax_majority_penalty: 4.0,
        }
    }
}

/// The outcome of statement resolution.
///
/// `actual_type` is the canonical type of the role that was matched. It is
/// set once, from the same candidate used to select content, and may differ
/// from the requested type only via the documented fallback.
#[derive(Debug, Clone)]
pub struct StatementMatch {
    /// The structural container that won
    pub role: StatementRole,
    /// Canonical type of the matched role
    pub actual_type: StatementType,
    /// Total resolution score of the winner
    pub score: f64,
}

/// Resolves a requested statement type against a filing's role catalog.
///
/// Returns [`QuarryError::StatementNotFound`] when no candidate scores
/// above the threshold — never a guess. The one fallback, income statement
/// to comprehensive income, updates `actual_type` to what was found.
pub fn resolve_statement(
    requested: StatementType,
    roles: &[StatementRole],
    config: &ResolverConfig,
) -> Result<StatementMatch> {
    if let Some((role, score)) = best_candidate(requested, roles, config) {
        return Ok(StatementMatch {
            role: role.clone(),
            actual_type: requested,
            score,
        });
    }

    // Some filers fold the income statement into a single statement of
    // comprehensive income. Answer with that statement, labeled as that
    // statement.
    if requested == StatementType::IncomeStatement {
        let fallback = StatementType::ComprehensiveIncome;
        if let Some((role, score)) = best_candidate(fallback, roles, config) {
            debug!(
                role_id = %role.role_id,
                "no standalone income statement; falling back to comprehensive income"
            );
            return Ok(StatementMatch {
                role: role.clone(),
                actual_type: fallback,
                score,
            });
        }
    }

    Err(QuarryError::StatementNotFound(requested))
}

/// Best role for a target type, or `None` when nothing clears the threshold.
fn best_candidate<'a>(
    target: StatementType,
    roles: &'a [StatementRole],
    config: &ResolverConfig,
) -> Option<(&'a StatementRole, f64)> {
    let mut best: Option<(&StatementRole, f64)> = None;
    for role in roles {
        let name = name_score(target, &role.definition);
        if name <= 0.0 {
            continue;
        }
        let total = name + content_score(target, role, config);
        debug!(
            role_id = %role.role_id,
            target = %target,
            score = total,
            "scored statement candidate"
        );
        if total < config.min_score {
            continue;
        }
        // Ties break by declared presentation order: the earlier role wins.
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                total > current_score
                    || (total == current_score
                        && role.presentation_order < current.presentation_order)
            }
        };
        if better {
            best = Some((role, total));
        }
    }
    best
}

/// Scores a role's definition text against type-specific name patterns.
///
/// Returns 0.0 when the text does not look like the target statement.
/// Patterns accept both singular and plural forms ("Statement of Income",
/// "Statements of Income").
fn name_score(target: StatementType, definition: &str) -> f64 {
    let text = normalize(definition);
    match target {
        StatementType::BalanceSheet => {
            if contains_form(&text, "balance sheet")
                || contains_form(&text, "statement of financial position")
                || contains_form(&text, "statement of financial condition")
            {
                3.0
            } else {
                0.0
            }
        }
        StatementType::IncomeStatement => {
            // A combined or standalone comprehensive income statement is
            // not a standalone income statement; the fallback handles it.
            if text.contains("comprehensive") {
                return 0.0;
            }
            if contains_form(&text, "income statement")
                || contains_form(&text, "statement of income")
                || contains_form(&text, "statement of earnings")
            {
                return 3.0;
            }
            // "Operations" is a broad word; a tax provision or discontinued
            // operations note must not match here.
            if contains_form(&text, "statement of operations")
                && !text.contains("tax")
                && !text.contains("discontinued")
            {
                return 3.0;
            }
            0.0
        }
        StatementType::CashFlowStatement => {
            if contains_form(&text, "statement of cash flows")
                || contains_form(&text, "cash flow statement")
            {
                3.0
            } else {
                0.0
            }
        }
        StatementType::ComprehensiveIncome => {
            if text.contains("comprehensive income") || text.contains("comprehensive loss") {
                3.0
            } else {
                0.0
            }
        }
        StatementType::StatementOfEquity => {
            if contains_form(&text, "statement of stockholders equity")
                || contains_form(&text, "statement of shareholders equity")
                || text.contains("changes in equity")
                || text.contains("changes in stockholders equity")
            {
                3.0
            } else {
                0.0
            }
        }
    }
}

/// Scores a role's structural content for a target type.
fn content_score(target: StatementType, role: &StatementRole, config: &ResolverConfig) -> f64 {
    let items = role.line_item_concepts();
    let mut score = 0.0;

    // More line items means more statement-like; capped so a sprawling
    // disclosure schedule cannot outscore a real statement on bulk alone.
    let increments = (items.len() / 5).min(3) as f64;
    score += increments * config.line_item_weight;

    for concept in defining_concepts(target) {
        if items.iter().any(|c| local_name(c) == *concept) {
            score += config.defining_concept_weight;
        }
    }

    if role.declared_type == Some(target) {
        score += config.declared_type_weight;
    }

    if !items.is_empty() {
        let tax_items = items.iter().filter(|c| is_tax_concept(c)).count();
        if tax_items * 2 > items.len() {
            score -= config.tax_majority_penalty;
        }
    }

    score
}

/// Concepts whose presence marks a role as a given statement type.
fn defining_concepts(target: StatementType) -> &'static [&'static str] {
    match target {
        StatementType::BalanceSheet => &["Assets", "LiabilitiesAndStockholdersEquity"],
        StatementType::IncomeStatement => &[
            "Revenues",
            "RevenueFromContractWithCustomerExcludingAssessedTax",
            "NetIncomeLoss",
        ],
        StatementType::CashFlowStatement => &[
            "NetCashProvidedByUsedInOperatingActivities",
            "NetCashProvidedByUsedInFinancingActivities",
        ],
        StatementType::ComprehensiveIncome => &[
            "ComprehensiveIncomeNetOfTax",
            "OtherComprehensiveIncomeLossNetOfTax",
            "NetIncomeLoss",
        ],
        StatementType::StatementOfEquity => &["StockholdersEquity"],
    }
}

fn is_tax_concept(concept: &str) -> bool {
    let local = local_name(concept);
    local.contains("IncomeTax") || local.contains("DeferredTax") || local.contains("TaxCredit")
}

fn local_name(concept: &str) -> &str {
    concept.rsplit(':').next().unwrap_or(concept)
}

/// Lowercases and strips punctuation that varies across filers.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .collect()
}

/// Matches a phrase in singular or plural form ("statement of income" /
/// "statements of income"; "balance sheet" / "balance sheets").
fn contains_form(text: &str, phrase: &str) -> bool {
    if text.contains(phrase) {
        return true;
    }
    if let Some((first, rest)) = phrase.split_once(' ') {
        let plural_first = format!("{}s {}", first, rest);
        if text.contains(&plural_first) {
            return true;
        }
    }
    let plural_last = format!("{}s", phrase);
    text.contains(&plural_last)
}
