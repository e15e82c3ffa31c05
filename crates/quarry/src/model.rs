//! The filing model: one company's facts and structure behind one type.

use chrono::NaiveDate;
use quarry_core::{Fact, FactSet, Result, StatementRole, StatementType};
use quarry_derive::{
    Quarterized, SplitConfig, SplitEvent, TtmMetric, TtmTrendRow, apply_split_adjustments,
    calculate_ttm, calculate_ttm_trend, detect_splits, quarterize,
};
use quarry_statements::{
    ConceptMappingStore, DimensionClass, MatchContext, ResolverConfig, Standardized, Standardizer,
    classify_dimension, resolve_statement,
};
use std::collections::BTreeSet;
use tracing::debug;

/// A resolved statement with its face-value facts.
#[derive(Debug, Clone)]
pub struct StatementView {
    /// Canonical type of the statement actually found; differs from the
    /// requested type only via the income-to-comprehensive fallback
    pub statement_type: StatementType,
    /// The structural container the statement resolved to
    pub role: StatementRole,
    /// Resolution score of the winning role
    pub score: f64,
    /// Facts on the statement face, in fact-set order
    pub facts: Vec<Fact>,
}

/// One company's facts, role catalog, and concept mappings.
///
/// All derivation methods recompute from the underlying facts on each
/// call; the model holds no derived state.
#[derive(Debug)]
pub struct FilingModel {
    facts: FactSet,
    roles: Vec<StatementRole>,
    resolver: ResolverConfig,
    standardizer: Standardizer,
    store: ConceptMappingStore,
}

impl FilingModel {
    /// Builds a model over a fact set and role catalog with default
    /// configuration and an in-memory mapping store.
    pub fn new(facts: impl Into<FactSet>, roles: Vec<StatementRole>) -> Self {
        Self {
            facts: facts.into(),
            roles,
            resolver: ResolverConfig::default(),
            standardizer: Standardizer::default(),
            store: ConceptMappingStore::in_memory(),
        }
    }

    /// Replaces the in-memory mapping store, typically with one opened
    /// from disk so learned aliases persist across runs.
    pub fn with_mapping_store(mut self, store: ConceptMappingStore) -> Self {
        self.store = store;
        self
    }

    /// Overrides the statement-resolution configuration.
    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    /// The underlying fact set.
    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    /// The role catalog.
    pub fn roles(&self) -> &[StatementRole] {
        &self.roles
    }

    /// The concept-mapping store, for inspecting learned aliases and the
    /// pending queue.
    pub fn mapping_store(&self) -> &ConceptMappingStore {
        &self.store
    }

    /// Mutable access to the mapping store, for promoting pending
    /// mappings and saving.
    pub fn mapping_store_mut(&mut self) -> &mut ConceptMappingStore {
        &mut self.store
    }

    /// Resolves a statement and assembles its face-value facts.
    ///
    /// Facts qualify when their concept is a line item of the resolved
    /// role and their dimensions classify as face value for that role;
    /// footnote breakdowns are excluded.
    pub fn statement(&self, requested: StatementType) -> Result<StatementView> {
        let matched = resolve_statement(requested, &self.roles, &self.resolver)?;
        let line_items: BTreeSet<&str> = matched.role.line_item_concepts().into_iter().collect();

        let facts: Vec<Fact> = self
            .facts
            .facts
            .iter()
            .filter(|f| {
                line_items.contains(f.concept.as_str())
                    && classify_dimension(f, &matched.role) == DimensionClass::FaceValue
            })
            .cloned()
            .collect();

        debug!(
            requested = %requested,
            actual = %matched.actual_type,
            role_id = %matched.role.role_id,
            facts = facts.len(),
            "assembled statement view"
        );
        Ok(StatementView {
            statement_type: matched.actual_type,
            role: matched.role,
            score: matched.score,
            facts,
        })
    }

    /// Standardizes one `(concept, label)` pair, learning accepted
    /// mappings into the model's store. Queued mid-confidence candidates
    /// surface as warnings on the result.
    pub fn standardize(
        &mut self,
        concept: &str,
        label: &str,
        statement: Option<StatementType>,
    ) -> Result<Standardized> {
        let context = MatchContext {
            statement_type: statement,
        };
        self.standardizer
            .standardize(concept, label, &context, &mut self.store)
    }

    /// Quarterizes every fact of a concept.
    pub fn quarterize_concept(&self, concept: &str) -> Quarterized {
        quarterize(&self.concept_facts(concept))
    }

    /// Trailing-twelve-month aggregate for a concept as of a date.
    pub fn ttm(&self, concept: &str, as_of: Option<NaiveDate>) -> Result<TtmMetric> {
        calculate_ttm(&self.concept_facts(concept), as_of)
    }

    /// TTM trend for a concept, newest first.
    pub fn ttm_trend(&self, concept: &str, periods: usize) -> Vec<TtmTrendRow> {
        calculate_ttm_trend(&self.concept_facts(concept), periods)
    }

    /// Stock splits disclosed anywhere in the fact set, oldest first.
    pub fn splits(&self) -> Vec<SplitEvent> {
        detect_splits(&self.facts.facts, &SplitConfig::default())
    }

    /// All facts restated onto the latest post-split share basis.
    pub fn split_adjusted_facts(&self) -> Vec<Fact> {
        let splits = self.splits();
        apply_split_adjustments(&self.facts.facts, &splits)
    }

    fn concept_facts(&self, concept: &str) -> Vec<Fact> {
        self.facts
            .by_concept(concept)
            .into_iter()
            .cloned()
            .collect()
    }
}
