//! The immutable fact value object and collection queries.

use crate::dimension::Dimension;
use crate::period::Period;
use crate::statement::StatementType;
use crate::unit::Unit;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fiscal period tag attached by the filer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    /// First fiscal quarter
    Q1,
    /// Second fiscal quarter
    Q2,
    /// Third fiscal quarter
    Q3,
    /// Fourth fiscal quarter
    Q4,
    /// Six-month year-to-date
    Ytd6m,
    /// Nine-month year-to-date
    Ytd9m,
    /// Full fiscal year
    Fy,
}

impl FiscalPeriod {
    /// Parses a filer tag ("Q1".."Q4", "6M", "9M", "FY").
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            "6M" | "H1" => Some(Self::Ytd6m),
            "9M" => Some(Self::Ytd9m),
            "FY" => Some(Self::Fy),
            _ => None,
        }
    }
}

impl std::fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::Ytd6m => "6M",
            Self::Ytd9m => "9M",
            Self::Fy => "FY",
        };
        f.write_str(s)
    }
}

/// Where a fact came from.
///
/// Every derived fact carries a non-empty description of the exact
/// subtraction or adjustment that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Taken directly from a filing
    Reported,
    /// Computed by the engine; the string names the derivation
    Derived(String),
}

impl Provenance {
    /// Returns true for engine-derived facts.
    pub const fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }

    /// The derivation description, if derived.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Reported => None,
            Self::Derived(s) => Some(s.as_str()),
        }
    }
}

/// One reported or derived value tied to a concept, period, and unit.
///
/// Facts are immutable once constructed. Equality for deduplication is by
/// `(concept, unit, period end)` via [`Fact::dedup_key`]; full structural
/// equality exists for tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Namespace-qualified concept (e.g. "us-gaap:NetIncomeLoss")
    pub concept: String,
    /// Display label from the filing, when present
    pub label: Option<String>,
    /// The value exactly as reported
    pub raw_value: String,
    /// Typed numeric value, when the raw value parses
    pub value: Option<f64>,
    /// Normalized unit of measure
    pub unit: Unit,
    /// Instant or duration context
    pub period: Period,
    /// Fiscal year the filer assigned
    pub fiscal_year: Option<i32>,
    /// Fiscal period tag the filer assigned
    pub fiscal_period: Option<FiscalPeriod>,
    /// Originating form type (e.g. "10-K", "10-Q")
    pub form: Option<String>,
    /// Date the originating filing was submitted
    pub filed: Option<NaiveDate>,
    /// Accession identifier of the originating filing
    pub accession: Option<String>,
    /// Statement this fact most likely belongs to, per the loader
    pub statement_hint: Option<StatementType>,
    /// Axis/member qualifiers; empty for consolidated values
    pub dimensions: Vec<Dimension>,
    /// Reported or derived, with the derivation description
    pub provenance: Provenance,
}

impl Fact {
    /// Creates a reported fact with a numeric value.
    pub fn reported(concept: impl Into<String>, value: f64, unit: Unit, period: Period) -> Self {
        Self {
            concept: concept.into(),
            label: None,
            raw_value: value.to_string(),
            value: Some(value),
            unit,
            period,
            fiscal_year: None,
            fiscal_period: None,
            form: None,
            filed: None,
            accession: None,
            statement_hint: None,
            dimensions: Vec::new(),
            provenance: Provenance::Reported,
        }
    }

    /// Creates a non-numeric reported fact, preserving the raw text.
    pub fn reported_text(
        concept: impl Into<String>,
        raw_value: impl Into<String>,
        unit: Unit,
        period: Period,
    ) -> Self {
        Self {
            concept: concept.into(),
            label: None,
            raw_value: raw_value.into(),
            value: None,
            unit,
            period,
            fiscal_year: None,
            fiscal_period: None,
            form: None,
            filed: None,
            accession: None,
            statement_hint: None,
            dimensions: Vec::new(),
            provenance: Provenance::Reported,
        }
    }

    /// Creates a derived fact. The provenance description must name the
    /// exact derivation performed.
    pub fn derived(
        concept: impl Into<String>,
        value: f64,
        unit: Unit,
        period: Period,
        provenance: impl Into<String>,
    ) -> Self {
        let description = provenance.into();
        debug_assert!(!description.is_empty(), "derived facts need provenance");
        Self {
            concept: concept.into(),
            label: None,
            raw_value: value.to_string(),
            value: Some(value),
            unit,
            period,
            fiscal_year: None,
            fiscal_period: None,
            form: None,
            filed: None,
            accession: None,
            statement_hint: None,
            dimensions: Vec::new(),
            provenance: Provenance::Derived(description),
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets fiscal year and period tags.
    #[must_use]
    pub fn with_fiscal(mut self, year: i32, period: FiscalPeriod) -> Self {
        self.fiscal_year = Some(year);
        self.fiscal_period = Some(period);
        self
    }

    /// Sets the originating form type.
    #[must_use]
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Sets the filing date.
    #[must_use]
    pub fn with_filed(mut self, filed: NaiveDate) -> Self {
        self.filed = Some(filed);
        self
    }

    /// Sets the accession identifier.
    #[must_use]
    pub fn with_accession(mut self, accession: impl Into<String>) -> Self {
        self.accession = Some(accession.into());
        self
    }

    /// Sets the loader's statement-type hint.
    #[must_use]
    pub fn with_statement_hint(mut self, hint: StatementType) -> Self {
        self.statement_hint = Some(hint);
        self
    }

    /// Adds a dimension qualifier.
    #[must_use]
    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// The concept name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.concept.rsplit(':').next().unwrap_or(&self.concept)
    }

    /// Returns true if any axis/member qualifiers are attached.
    pub fn is_dimensioned(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Returns true for engine-derived facts.
    pub const fn is_derived(&self) -> bool {
        self.provenance.is_derived()
    }

    /// Identity used for deduplication: same concept, same unit, same
    /// period end. Later filings of the same key supersede earlier ones.
    pub fn dedup_key(&self) -> (&str, String, NaiveDate) {
        (&self.concept, self.unit.to_string(), self.period.end())
    }
}

/// A queryable collection of facts.
///
/// Thin wrapper over a `Vec<Fact>`; all queries are linear scans over the
/// immutable slice, which is plenty for per-company fact sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactSet {
    /// All facts in the set
    pub facts: Vec<Fact>,
}

impl FactSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of facts in the set.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if the set holds no facts.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// The most recent fact for a concept, by period end.
    pub fn latest(&self, concept: &str) -> Option<&Fact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept)
            .max_by_key(|f| f.period.end())
    }

    /// All facts for a concept, newest first.
    pub fn by_concept(&self, concept: &str) -> Vec<&Fact> {
        let mut out: Vec<&Fact> = self.facts.iter().filter(|f| f.concept == concept).collect();
        out.sort_by(|a, b| b.period.end().cmp(&a.period.end()));
        out
    }

    /// All facts for a concept in a fiscal year.
    pub fn by_fiscal_year(&self, concept: &str, fiscal_year: i32) -> Vec<&Fact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept && f.fiscal_year == Some(fiscal_year))
            .collect()
    }

    /// All facts for a concept from a given form type.
    pub fn by_form(&self, concept: &str, form: &str) -> Vec<&Fact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept && f.form.as_deref() == Some(form))
            .collect()
    }

    /// Distinct concepts present in the set, sorted.
    pub fn concepts(&self) -> Vec<String> {
        let mut concepts: Vec<String> = self.facts.iter().map(|f| f.concept.clone()).collect();
        concepts.sort();
        concepts.dedup();
        concepts
    }
}

impl From<Vec<Fact>> for FactSet {
    fn from(facts: Vec<Fact>) -> Self {
        Self { facts }
    }
}

impl FromIterator<Fact> for FactSet {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}
