//! Concept standardization: filer vocabulary onto a fixed canonical one.
//!
//! Different companies (and the same company across periods) tag the same
//! concept differently. Standardization tries an exact alias lookup first,
//! then a normalized string-similarity score against every canonical
//! concept's display name, boosted by statement-type keyword rules. High
//! scores map immediately and are learned; mid scores are queued as pending
//! and never silently applied; low scores leave the filer label untouched.

use crate::store::{ConceptMappingStore, PendingMapping};
use quarry_core::{DataQualityWarning, Result, StatementType, WarningKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The fixed canonical vocabulary filer-specific tags map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum StandardConcept {
    Revenue,
    CostOfRevenue,
    GrossProfit,
    OperatingExpenses,
    OperatingIncome,
    IncomeTaxExpense,
    NetIncome,
    ComprehensiveIncome,
    EpsBasic,
    EpsDiluted,
    SharesBasic,
    SharesDiluted,
    TotalAssets,
    CurrentAssets,
    CashAndEquivalents,
    TotalLiabilities,
    CurrentLiabilities,
    LongTermDebt,
    StockholdersEquity,
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    CapitalExpenditures,
    Dividends,
}

impl StandardConcept {
    /// Every canonical concept.
    pub const ALL: [Self; 24] = [
        Self::Revenue,
        Self::CostOfRevenue,
        Self::GrossProfit,
        Self::OperatingExpenses,
        Self::OperatingIncome,
        Self::IncomeTaxExpense,
        Self::NetIncome,
        Self::ComprehensiveIncome,
        Self::EpsBasic,
        Self::EpsDiluted,
        Self::SharesBasic,
        Self::SharesDiluted,
        Self::TotalAssets,
        Self::CurrentAssets,
        Self::CashAndEquivalents,
        Self::TotalLiabilities,
        Self::CurrentLiabilities,
        Self::LongTermDebt,
        Self::StockholdersEquity,
        Self::OperatingCashFlow,
        Self::InvestingCashFlow,
        Self::FinancingCashFlow,
        Self::CapitalExpenditures,
        Self::Dividends,
    ];

    /// Canonical display name, the target of similarity scoring.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::CostOfRevenue => "Cost of Revenue",
            Self::GrossProfit => "Gross Profit",
            Self::OperatingExpenses => "Operating Expenses",
            Self::OperatingIncome => "Operating Income",
            Self::IncomeTaxExpense => "Income Tax Expense",
            Self::NetIncome => "Net Income",
            Self::ComprehensiveIncome => "Comprehensive Income",
            Self::EpsBasic => "Earnings Per Share Basic",
            Self::EpsDiluted => "Earnings Per Share Diluted",
            Self::SharesBasic => "Weighted Average Shares Basic",
            Self::SharesDiluted => "Weighted Average Shares Diluted",
            Self::TotalAssets => "Total Assets",
            Self::CurrentAssets => "Current Assets",
            Self::CashAndEquivalents => "Cash and Cash Equivalents",
            Self::TotalLiabilities => "Total Liabilities",
            Self::CurrentLiabilities => "Current Liabilities",
            Self::LongTermDebt => "Long Term Debt",
            Self::StockholdersEquity => "Stockholders Equity",
            Self::OperatingCashFlow => "Operating Cash Flow",
            Self::InvestingCashFlow => "Investing Cash Flow",
            Self::FinancingCashFlow => "Financing Cash Flow",
            Self::CapitalExpenditures => "Capital Expenditures",
            Self::Dividends => "Dividends Paid",
        }
    }

    /// Seed us-gaap tag aliases. These cover the common variations; the
    /// store grows filer-specific aliases on top of them.
    pub const fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Revenue => &[
                "Revenues",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
                "RevenueFromContractWithCustomerIncludingAssessedTax",
                "SalesRevenueNet",
            ],
            Self::CostOfRevenue => &["CostOfRevenue", "CostOfGoodsAndServicesSold"],
            Self::GrossProfit => &["GrossProfit"],
            Self::OperatingExpenses => &["OperatingExpenses", "CostsAndExpenses"],
            Self::OperatingIncome => &["OperatingIncomeLoss"],
            Self::IncomeTaxExpense => &["IncomeTaxExpenseBenefit"],
            Self::NetIncome => &[
                "NetIncomeLoss",
                "ProfitLoss",
                "NetIncomeLossAvailableToCommonStockholdersBasic",
            ],
            Self::ComprehensiveIncome => &[
                "ComprehensiveIncomeNetOfTax",
                "ComprehensiveIncomeNetOfTaxIncludingPortionAttributableToNoncontrollingInterest",
            ],
            Self::EpsBasic => &["EarningsPerShareBasic"],
            Self::EpsDiluted => &["EarningsPerShareDiluted"],
            Self::SharesBasic => &["WeightedAverageNumberOfSharesOutstandingBasic"],
            Self::SharesDiluted => &["WeightedAverageNumberOfDilutedSharesOutstanding"],
            Self::TotalAssets => &["Assets"],
            Self::CurrentAssets => &["AssetsCurrent"],
            Self::CashAndEquivalents => &[
                "CashAndCashEquivalentsAtCarryingValue",
                "CashCashEquivalentsAndShortTermInvestments",
            ],
            Self::TotalLiabilities => &["Liabilities"],
            Self::CurrentLiabilities => &["LiabilitiesCurrent"],
            Self::LongTermDebt => &[
                "LongTermDebt",
                "LongTermDebtNoncurrent",
                "LongTermDebtAndCapitalLeaseObligations",
            ],
            Self::StockholdersEquity => &[
                "StockholdersEquity",
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            ],
            Self::OperatingCashFlow => &[
                "NetCashProvidedByUsedInOperatingActivities",
                "CashProvidedByUsedInOperatingActivities",
            ],
            Self::InvestingCashFlow => &["NetCashProvidedByUsedInInvestingActivities"],
            Self::FinancingCashFlow => &["NetCashProvidedByUsedInFinancingActivities"],
            Self::CapitalExpenditures => &[
                "PaymentsToAcquirePropertyPlantAndEquipment",
                "PaymentsForCapitalImprovements",
            ],
            Self::Dividends => &["PaymentsOfDividends", "PaymentsOfDividendsCommonStock"],
        }
    }
}

impl std::fmt::Display for StandardConcept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Pluggable label-similarity scoring.
///
/// Scores are in `[0.0, 1.0]`; 1.0 means the labels are equivalent after
/// normalization.
pub trait SimilarityScorer: std::fmt::Debug {
    /// Scores the similarity of two labels.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Default scorer: Sørensen–Dice coefficient over character bigrams of the
/// normalized labels. Bigrams never span word boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigramDice;

impl SimilarityScorer for BigramDice {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a = normalize_label(a);
        let b = normalize_label(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }

        let bigrams_a = bigrams(&a);
        let bigrams_b = bigrams(&b);
        if bigrams_a.is_empty() || bigrams_b.is_empty() {
            return 0.0;
        }

        let mut counts: HashMap<&(char, char), usize> = HashMap::new();
        for bg in &bigrams_a {
            *counts.entry(bg).or_insert(0) += 1;
        }
        let mut overlap = 0usize;
        for bg in &bigrams_b {
            if let Some(n) = counts.get_mut(bg) {
                if *n > 0 {
                    *n -= 1;
                    overlap += 1;
                }
            }
        }
        (2.0 * overlap as f64) / (bigrams_a.len() + bigrams_b.len()) as f64
    }
}

/// Lowercases, maps punctuation to spaces, and collapses whitespace.
fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_space = true;
    for c in label.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Character bigrams per word.
fn bigrams(normalized: &str) -> Vec<(char, char)> {
    let mut out = Vec::new();
    for word in normalized.split(' ') {
        let chars: Vec<char> = word.chars().collect();
        for pair in chars.windows(2) {
            out.push((pair[0], pair[1]));
        }
    }
    out
}

/// Acceptance thresholds for standardization.
#[derive(Debug, Clone, Copy)]
pub struct StandardizerConfig {
    /// Scores at or above this map immediately and are learned
    pub accept_threshold: f64,
    /// Scores in `[pending_threshold, accept_threshold)` are queued
    pub pending_threshold: f64,
}

impl Default for StandardizerConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.9,
            pending_threshold: 0.5,
        }
    }
}

/// Where a label was encountered, used for contextual boosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    /// The statement the label appeared on, when known
    pub statement_type: Option<StatementType>,
}

impl MatchContext {
    /// Context for a label found on a given statement.
    pub const fn on_statement(statement_type: StatementType) -> Self {
        Self {
            statement_type: Some(statement_type),
        }
    }
}

/// The outcome of standardizing one `(concept, label)` pair.
///
/// A queued mid-confidence candidate surfaces here as a warning; the
/// mapping itself is never silently applied.
#[derive(Debug, Clone, Default)]
pub struct Standardized {
    /// The canonical concept, when a mapping was applied
    pub standard: Option<StandardConcept>,
    /// Non-fatal signals raised while scoring
    pub warnings: Vec<DataQualityWarning>,
}

/// Maps `(concept, label)` pairs onto [`StandardConcept`] values.
#[derive(Debug)]
pub struct Standardizer {
    config: StandardizerConfig,
    scorer: Box<dyn SimilarityScorer + Send + Sync>,
}

impl Default for Standardizer {
    fn default() -> Self {
        Self::new(StandardizerConfig::default())
    }
}

impl Standardizer {
    /// Creates a standardizer with the default bigram-Dice scorer.
    pub fn new(config: StandardizerConfig) -> Self {
        Self {
            config,
            scorer: Box::new(BigramDice),
        }
    }

    /// Swaps in a different scoring function.
    pub fn with_scorer(
        config: StandardizerConfig,
        scorer: Box<dyn SimilarityScorer + Send + Sync>,
    ) -> Self {
        Self { config, scorer }
    }

    /// Standardizes one `(concept, label)` pair.
    ///
    /// Exact alias lookup first; otherwise the label is scored against
    /// every canonical display name with contextual boosts. Only scores at
    /// or above the accept threshold produce a mapping (which is learned
    /// into the store). Mid-confidence candidates are queued as pending
    /// and surface as a [`WarningKind::LowConfidenceMapping`] warning;
    /// below that, no mapping is produced and the caller keeps the
    /// original label.
    pub fn standardize(
        &self,
        concept: &str,
        label: &str,
        context: &MatchContext,
        store: &mut ConceptMappingStore,
    ) -> Result<Standardized> {
        let alias = concept.rsplit(':').next().unwrap_or(concept);
        if let Some(standard) = store.lookup(alias) {
            return Ok(Standardized {
                standard: Some(standard),
                warnings: Vec::new(),
            });
        }

        let mut best: Option<(StandardConcept, f64)> = None;
        for candidate in StandardConcept::ALL {
            let base = self.scorer.score(label, candidate.display_name());
            let boosted = (base + context_boost(candidate, context, label)).min(1.0);
            if best.is_none_or(|(_, s)| boosted > s) {
                best = Some((candidate, boosted));
            }
        }
        let Some((standard, score)) = best else {
            return Ok(Standardized::default());
        };

        if score >= self.config.accept_threshold {
            debug!(alias, %standard, score, "accepted concept mapping");
            store.add_alias(standard, alias)?;
            Ok(Standardized {
                standard: Some(standard),
                warnings: Vec::new(),
            })
        } else if score >= self.config.pending_threshold {
            warn!(alias, %standard, score, "queueing low-confidence concept mapping");
            store.queue_pending(PendingMapping {
                alias: alias.to_string(),
                standard,
                confidence: score,
                source_label: label.to_string(),
            })?;
            Ok(Standardized {
                standard: None,
                warnings: vec![DataQualityWarning::new(
                    WarningKind::LowConfidenceMapping,
                    format!("{alias}: best match {standard} at {score:.2} queued for review"),
                )],
            })
        } else {
            Ok(Standardized::default())
        }
    }
}

/// Statement-type keyword boosts.
///
/// A "total" + "assets" label seen inside a balance sheet is almost
/// certainly total assets even when the filer's phrasing strays from the
/// canonical display name.
fn context_boost(candidate: StandardConcept, context: &MatchContext, label: &str) -> f64 {
    let Some(statement) = context.statement_type else {
        return 0.0;
    };
    let label = normalize_label(label);
    let has = |kw: &str| label.contains(kw);

    match (statement, candidate) {
        (StatementType::BalanceSheet, StandardConcept::TotalAssets)
            if has("total") && has("assets") =>
        {
            0.15
        }
        (StatementType::BalanceSheet, StandardConcept::TotalLiabilities)
            if has("total") && has("liabilities") =>
        {
            0.15
        }
        (StatementType::BalanceSheet, StandardConcept::StockholdersEquity)
            if has("equity") =>
        {
            0.1
        }
        (StatementType::IncomeStatement, StandardConcept::Revenue)
            if has("revenue") || has("net sales") =>
        {
            0.1
        }
        (StatementType::IncomeStatement, StandardConcept::NetIncome)
            if (has("net") && has("income")) || (has("net") && has("earnings")) =>
        {
            0.1
        }
        (StatementType::CashFlowStatement, StandardConcept::OperatingCashFlow)
            if has("operating") =>
        {
            0.1
        }
        _ => 0.0,
    }
}
