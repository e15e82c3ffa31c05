//! Retroactive stock-split normalization.
//!
//! Filings report share counts and per-share amounts as of their own
//! filing date. After a split, new filings restate history but old
//! filings do not, so a raw time series mixes pre- and post-split bases.
//! Split events are detected from the conversion-ratio concepts filers
//! tag, then every fact predating a split is brought onto the post-split
//! basis: share counts multiply by the cumulative ratio, per-share
//! amounts divide by it. Monetary totals are unaffected.

use chrono::{Datelike, NaiveDate};
use quarry_core::{Fact, Provenance, Unit};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Filters applied while reading split events out of tagged facts.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// A ratio filed more than this many days after the event date is an
    /// echo of the original disclosure in a later filing, not a new split.
    pub max_filing_lag_days: i64,
    /// A ratio tagged over a context longer than this is a duration
    /// artifact; the event itself is a single day.
    pub max_event_duration_days: i64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_filing_lag_days: 280,
            max_event_duration_days: 31,
        }
    }
}

/// A stock split distilled from conversion-ratio disclosures.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitEvent {
    /// Effective date of the split
    pub date: NaiveDate,
    /// Conversion ratio; 2.0 means a 2-for-1 split
    pub ratio: f64,
    /// Concept the ratio was tagged under
    pub concept: String,
    /// Filing date of the disclosure, when known
    pub filed: Option<NaiveDate>,
}

/// Scans facts for stock-split conversion ratios and returns the distinct
/// split events, oldest first.
///
/// Ratios of exactly 1 (no-op), non-positive ratios, duration artifacts,
/// and filing-lag echoes are all dropped. A ratio repeated across filings
/// in the same calendar year counts once.
pub fn detect_splits(facts: &[Fact], config: &SplitConfig) -> Vec<SplitEvent> {
    let mut events: Vec<SplitEvent> = Vec::new();
    let mut seen: BTreeSet<(i32, u64)> = BTreeSet::new();

    for fact in facts {
        if !is_split_ratio_concept(fact.local_name()) {
            continue;
        }
        let Some(ratio) = fact.value else { continue };
        if ratio <= 0.0 || ratio == 1.0 {
            continue;
        }

        if let Some(days) = fact.period.duration_days()
            && days > config.max_event_duration_days
        {
            debug!(
                concept = %fact.concept,
                days,
                "dropping split ratio tagged over a long duration"
            );
            continue;
        }
        let date = fact.period.end();

        if let Some(filed) = fact.filed {
            let lag = filed.signed_duration_since(date).num_days();
            if lag > config.max_filing_lag_days {
                debug!(%date, %filed, "dropping split echo from a later filing");
                continue;
            }
        }

        if !seen.insert((date.year(), ratio.to_bits())) {
            continue;
        }

        warn!(%date, ratio, "detected stock split");
        events.push(SplitEvent {
            date,
            ratio,
            concept: fact.concept.clone(),
            filed: fact.filed,
        });
    }

    events.sort_by_key(|e| e.date);
    events
}

/// Restates share counts and per-share amounts onto the latest post-split
/// basis.
///
/// A split applies to a fact when the fact's period ended before the
/// split's effective date and the fact was filed before the split took
/// effect. Anything filed on or after the effective date already reports
/// on the post-split basis, even when the ratio itself is not disclosed
/// until a later filing. Adjusted facts are marked derived with the
/// cumulative ratio in their provenance.
pub fn apply_split_adjustments(facts: &[Fact], splits: &[SplitEvent]) -> Vec<Fact> {
    facts
        .iter()
        .map(|fact| {
            let ratio = cumulative_ratio(fact, splits);
            if ratio == 1.0 {
                return fact.clone();
            }
            adjust(fact, ratio)
        })
        .collect()
}

/// Product of the ratios of every split that postdates the fact.
fn cumulative_ratio(fact: &Fact, splits: &[SplitEvent]) -> f64 {
    splits
        .iter()
        .filter(|split| split_applies(fact, split))
        .map(|split| split.ratio)
        .product()
}

fn split_applies(fact: &Fact, split: &SplitEvent) -> bool {
    if split.date <= fact.period.end() {
        return false;
    }
    // A fact filed on or after the effective date reports post-split
    // figures even when the ratio is only disclosed in a later filing
    match (fact.filed, split.filed) {
        (Some(fact_filed), _) if fact_filed >= split.date => false,
        (Some(fact_filed), Some(split_filed)) => fact_filed < split_filed,
        _ => true,
    }
}

fn adjust(fact: &Fact, ratio: f64) -> Fact {
    let mut adjusted = fact.clone();
    match &fact.unit {
        Unit::Shares => {
            adjusted.value = fact.value.map(|v| v * ratio);
        }
        Unit::PerShare(_) => {
            adjusted.value = fact.value.map(|v| v / ratio);
        }
        _ => return adjusted,
    }
    adjusted.provenance = Provenance::Derived(format!("split-adjusted x{ratio}"));
    debug!(
        concept = %fact.concept,
        end = %fact.period.end(),
        ratio,
        "restated fact onto post-split basis"
    );
    adjusted
}

/// True for the conversion-ratio concepts filers tag splits under, such as
/// `StockholdersEquityNoteStockSplitConversionRatio1`.
fn is_split_ratio_concept(local_name: &str) -> bool {
    local_name.contains("SplitConversionRatio")
}
