//! Quarterization: deriving discrete quarters from cumulative disclosures.
//!
//! Filers often disclose only year-to-date or annual figures for a period;
//! the discrete quarter is reconstructed by subtraction:
//!
//! - Q2 = YTD-6M minus the nearest prior reported quarter
//! - Q3 = YTD-9M minus the nearest prior YTD-6M
//! - Q4 = annual minus the YTD-9M with the identical fiscal-year start
//!   (nearest prior YTD-9M when no exact start match exists)
//!
//! Only additive units (monetary, share counts) participate; attempting to
//! subtract ratios or per-share values is silently skipped. Negative
//! derived quarters are kept and flagged — restatements and 52/53-week
//! fiscal calendars produce them legitimately.

use chrono::{Days, NaiveDate};
use quarry_core::{
    DataQualityWarning, DurationBucket, Fact, FiscalPeriod, Period, Provenance, WarningKind,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Consecutive discrete quarters must be this many days apart.
pub(crate) const GAP_MIN_DAYS: i64 = 70;
pub(crate) const GAP_MAX_DAYS: i64 = 110;

/// The remainder left after a subtraction must itself span a quarter.
const REMAINDER_MIN_DAYS: i64 = 70;
const REMAINDER_MAX_DAYS: i64 = 120;

/// The outcome of quarterization: a discrete quarterly series plus any
/// data-quality signals raised along the way.
#[derive(Debug, Clone, Default)]
pub struct Quarterized {
    /// Discrete quarterly facts, sorted by concept then period end
    pub facts: Vec<Fact>,
    /// Non-fatal signals (negative derivations, sequence gaps)
    pub warnings: Vec<DataQualityWarning>,
}

/// Derives missing discrete quarters across all concepts in the input.
///
/// Operates on consolidated (undimensioned) duration facts; instants,
/// dimensioned facts, and facts without a numeric value do not participate.
/// The output contains only discrete quarters — reported ones passed
/// through and derived ones filled in — deduplicated by period end (latest
/// filing date wins) and sorted. Running it again on its own output returns
/// the same series.
pub fn quarterize(facts: &[Fact]) -> Quarterized {
    let mut groups: BTreeMap<(String, String), Vec<&Fact>> = BTreeMap::new();
    for fact in facts {
        if fact.period.is_duration() && !fact.is_dimensioned() && fact.value.is_some() {
            groups
                .entry((fact.concept.clone(), fact.unit.to_string()))
                .or_default()
                .push(fact);
        }
    }

    let mut result = Quarterized::default();
    for group in groups.values() {
        quarterize_group(group, &mut result);
    }
    result
}

/// Quarterizes one (concept, unit) series.
fn quarterize_group(group: &[&Fact], result: &mut Quarterized) {
    let mut quarters: Vec<Fact> = Vec::new();
    let mut ytd6: Vec<&Fact> = Vec::new();
    let mut ytd9: Vec<&Fact> = Vec::new();
    let mut annual: Vec<&Fact> = Vec::new();

    for fact in group {
        match fact.period.bucket() {
            Some(DurationBucket::Quarter) => quarters.push((*fact).clone()),
            Some(DurationBucket::Ytd6m) => ytd6.push(fact),
            Some(DurationBucket::Ytd9m) => ytd9.push(fact),
            Some(DurationBucket::Annual) => annual.push(fact),
            _ => {}
        }
    }

    let additive = group.first().is_some_and(|f| f.unit.is_additive());
    if additive {
        let mut derived: Vec<Fact> = Vec::new();

        // Q2 = YTD6M minus the nearest prior reported quarter
        let reported_quarters: Vec<&Fact> =
            quarters.iter().filter(|q| !q.is_derived()).collect();
        for cum in &ytd6 {
            if let Some(prior) = nearest_prior(&reported_quarters, cum.period.end()) {
                if let Some(fact) =
                    derive_remainder(cum, prior, FiscalPeriod::Q2, "YTD6M", "quarter", result)
                {
                    derived.push(fact);
                }
            }
        }

        // Q3 = YTD9M minus the nearest prior YTD6M
        for cum in &ytd9 {
            if let Some(prior) = nearest_prior(&ytd6, cum.period.end()) {
                if let Some(fact) =
                    derive_remainder(cum, prior, FiscalPeriod::Q3, "YTD9M", "YTD6M", result)
                {
                    derived.push(fact);
                }
            }
        }

        // Q4 = annual minus the YTD9M sharing the fiscal-year start,
        // falling back to the nearest prior YTD9M
        for cum in &annual {
            let same_start = ytd9
                .iter()
                .find(|f| f.period.start() == cum.period.start())
                .copied();
            let prior = same_start.or_else(|| nearest_prior(&ytd9, cum.period.end()));
            if let Some(prior) = prior {
                if let Some(fact) =
                    derive_remainder(cum, prior, FiscalPeriod::Q4, "FY", "YTD9M", result)
                {
                    derived.push(fact);
                }
            }
        }

        quarters.extend(derived);
    } else if !(ytd6.is_empty() && ytd9.is_empty() && annual.is_empty()) {
        // Non-additive concepts (ratios, per-share amounts) are never
        // subtracted; the cumulative facts are simply not quarterized.
        if let Some(first) = group.first() {
            debug!(
                concept = %first.concept,
                unit = %first.unit,
                "skipping derivation for non-additive unit"
            );
        }
    }

    // Dedup by period end: the latest-filed fact wins; on a filing-date
    // tie the reported fact beats the derived one.
    let mut by_end: BTreeMap<NaiveDate, Fact> = BTreeMap::new();
    for fact in quarters {
        let end = fact.period.end();
        match by_end.get(&end) {
            Some(existing) if !supersedes(&fact, existing) => {}
            _ => {
                by_end.insert(end, fact);
            }
        }
    }

    // Gap check over the final sequence
    let ends: Vec<NaiveDate> = by_end.keys().copied().collect();
    for pair in ends.windows(2) {
        let days = pair[1].signed_duration_since(pair[0]).num_days();
        if !(GAP_MIN_DAYS..=GAP_MAX_DAYS).contains(&days) {
            let concept = &by_end[&pair[0]].concept;
            let message = format!(
                "{}: quarters ending {} and {} are {} days apart",
                concept, pair[0], pair[1], days
            );
            warn!("{message}");
            result
                .warnings
                .push(DataQualityWarning::new(WarningKind::QuarterGap, message));
        }
    }

    result.facts.extend(by_end.into_values());
}

/// Subtracts `prior` from `cum`, producing the remainder quarter.
///
/// Returns `None` when the remainder span is not quarter-sized or either
/// value is missing.
fn derive_remainder(
    cum: &Fact,
    prior: &Fact,
    tag: FiscalPeriod,
    cum_name: &str,
    prior_name: &str,
    result: &mut Quarterized,
) -> Option<Fact> {
    let cum_end = cum.period.end();
    let prior_end = prior.period.end();
    let remainder_days = cum_end.signed_duration_since(prior_end).num_days();
    if !(REMAINDER_MIN_DAYS..=REMAINDER_MAX_DAYS).contains(&remainder_days) {
        return None;
    }
    let (cum_value, prior_value) = (cum.value?, prior.value?);
    let value = cum_value - prior_value;
    let start = prior_end.checked_add_days(Days::new(1))?;

    if value < 0.0 {
        let message = format!(
            "{}: derived {} ending {} is negative ({})",
            cum.concept, tag, cum_end, value
        );
        warn!("{message}");
        result.warnings.push(DataQualityWarning::new(
            WarningKind::NegativeDerivedQuarter,
            message,
        ));
    }

    let fact = Fact {
        concept: cum.concept.clone(),
        label: cum.label.clone(),
        raw_value: value.to_string(),
        value: Some(value),
        unit: cum.unit.clone(),
        period: Period::duration(start, cum_end),
        fiscal_year: cum.fiscal_year,
        fiscal_period: Some(tag),
        form: cum.form.clone(),
        filed: cum.filed,
        accession: cum.accession.clone(),
        statement_hint: cum.statement_hint,
        dimensions: Vec::new(),
        provenance: Provenance::Derived(format!(
            "derived from {} ending {} minus {} ending {}",
            cum_name, cum_end, prior_name, prior_end
        )),
    };
    Some(fact)
}

/// The candidate ending latest before `end`, provided the remainder it
/// would leave is quarter-sized.
fn nearest_prior<'a>(candidates: &[&'a Fact], end: NaiveDate) -> Option<&'a Fact> {
    candidates
        .iter()
        .filter(|f| {
            let days = end.signed_duration_since(f.period.end()).num_days();
            (REMAINDER_MIN_DAYS..=REMAINDER_MAX_DAYS).contains(&days)
        })
        .max_by_key(|f| f.period.end())
        .copied()
}

/// Whether `new` replaces `existing` for the same period end.
fn supersedes(new: &Fact, existing: &Fact) -> bool {
    let new_filed = new.filed.unwrap_or(NaiveDate::MIN);
    let existing_filed = existing.filed.unwrap_or(NaiveDate::MIN);
    if new_filed != existing_filed {
        return new_filed > existing_filed;
    }
    // Same filing date: a reported value beats a derived one
    !new.is_derived() && existing.is_derived()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::Unit;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usd() -> Unit {
        Unit::Monetary("USD".to_string())
    }

    fn duration_fact(value: f64, start: NaiveDate, end: NaiveDate, filed: NaiveDate) -> Fact {
        Fact::reported(
            "us-gaap:Revenues",
            value,
            usd(),
            Period::duration(start, end),
        )
        .with_filed(filed)
    }

    /// A calendar-year filer reporting Q1, YTD6, YTD9, FY.
    fn cumulative_year() -> Vec<Fact> {
        vec![
            duration_fact(100.0, date(2023, 1, 1), date(2023, 3, 31), date(2023, 5, 1))
                .with_fiscal(2023, FiscalPeriod::Q1),
            duration_fact(210.0, date(2023, 1, 1), date(2023, 6, 30), date(2023, 8, 1))
                .with_fiscal(2023, FiscalPeriod::Ytd6m),
            duration_fact(330.0, date(2023, 1, 1), date(2023, 9, 30), date(2023, 11, 1))
                .with_fiscal(2023, FiscalPeriod::Ytd9m),
            duration_fact(460.0, date(2023, 1, 1), date(2023, 12, 31), date(2024, 2, 15))
                .with_fiscal(2023, FiscalPeriod::Fy),
        ]
    }

    #[test]
    fn test_quarters_sum_to_annual() {
        let result = quarterize(&cumulative_year());
        assert_eq!(result.facts.len(), 4);

        let values: Vec<f64> = result.facts.iter().map(|f| f.value.unwrap()).collect();
        assert_eq!(values, vec![100.0, 110.0, 120.0, 130.0]);
        assert!((values.iter().sum::<f64>() - 460.0).abs() < 1e-9);

        // Derived facts name their subtraction
        let q4 = &result.facts[3];
        assert!(q4.is_derived());
        let description = q4.provenance.description().unwrap();
        assert!(description.contains("FY"));
        assert!(description.contains("YTD9M"));

        // Derived period start is the prior fact's end + 1 day
        assert_eq!(result.facts[1].period.start(), Some(date(2023, 4, 1)));
        assert_eq!(result.facts[1].fiscal_period, Some(FiscalPeriod::Q2));
        assert_eq!(result.facts[2].period.start(), Some(date(2023, 7, 1)));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_idempotent_on_discrete_series() {
        let first = quarterize(&cumulative_year());
        let second = quarterize(&first.facts);
        assert_eq!(first.facts, second.facts);
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn test_negative_derived_quarter_kept_and_flagged() {
        // Restated YTD below the reported Q1
        let facts = vec![
            duration_fact(100.0, date(2023, 1, 1), date(2023, 3, 31), date(2023, 5, 1)),
            duration_fact(80.0, date(2023, 1, 1), date(2023, 6, 30), date(2023, 8, 1)),
        ];
        let result = quarterize(&facts);
        let q2 = result
            .facts
            .iter()
            .find(|f| f.period.end() == date(2023, 6, 30))
            .unwrap();
        assert_eq!(q2.value, Some(-20.0));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::NegativeDerivedQuarter)
        );
    }

    #[test]
    fn test_non_additive_units_never_subtracted() {
        let eps = |value: f64, start, end| {
            Fact::reported(
                "us-gaap:EarningsPerShareBasic",
                value,
                Unit::PerShare("USD".to_string()),
                Period::duration(start, end),
            )
        };
        let facts = vec![
            eps(1.0, date(2023, 1, 1), date(2023, 3, 31)),
            eps(2.1, date(2023, 1, 1), date(2023, 6, 30)),
        ];
        let result = quarterize(&facts);
        // The reported quarter passes through; no Q2 is fabricated
        assert_eq!(result.facts.len(), 1);
        assert_eq!(result.facts[0].period.end(), date(2023, 3, 31));
    }

    #[test]
    fn test_dedup_latest_filing_wins() {
        let original = duration_fact(100.0, date(2023, 1, 1), date(2023, 3, 31), date(2023, 5, 1));
        let restated =
            duration_fact(105.0, date(2023, 1, 1), date(2023, 3, 31), date(2023, 8, 1));
        let result = quarterize(&[original, restated]);
        assert_eq!(result.facts.len(), 1);
        assert_eq!(result.facts[0].value, Some(105.0));
    }

    #[test]
    fn test_gap_flagged_when_quarter_missing() {
        let facts = vec![
            duration_fact(100.0, date(2023, 1, 1), date(2023, 3, 31), date(2023, 5, 1)),
            // Next quarter on record ends two quarters later
            duration_fact(120.0, date(2023, 7, 1), date(2023, 9, 30), date(2023, 11, 1)),
        ];
        let result = quarterize(&facts);
        assert_eq!(result.facts.len(), 2);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::QuarterGap)
        );
    }

    #[test]
    fn test_q4_falls_back_to_nearest_prior_ytd9() {
        // A 52/53-week filer whose FY start differs from the YTD9 start by
        // a few days; the exact-start match fails, the fallback still pairs
        // them.
        let facts = vec![
            duration_fact(330.0, date(2023, 1, 2), date(2023, 9, 30), date(2023, 11, 1))
                .with_fiscal(2023, FiscalPeriod::Ytd9m),
            duration_fact(460.0, date(2022, 12, 31), date(2023, 12, 30), date(2024, 2, 15))
                .with_fiscal(2023, FiscalPeriod::Fy),
        ];
        let result = quarterize(&facts);
        let q4 = result
            .facts
            .iter()
            .find(|f| f.fiscal_period == Some(FiscalPeriod::Q4))
            .unwrap();
        assert_eq!(q4.value, Some(130.0));
        assert_eq!(q4.period.start(), Some(date(2023, 10, 1)));
    }

    #[test]
    fn test_dimensioned_facts_excluded() {
        use quarry_core::Dimension;
        let mut facts = cumulative_year();
        facts.push(
            duration_fact(60.0, date(2023, 1, 1), date(2023, 3, 31), date(2023, 5, 1))
                .with_dimension(Dimension::new("srt:ProductOrServiceAxis", "m")),
        );
        let result = quarterize(&facts);
        assert!(result.facts.iter().all(|f| !f.is_dimensioned()));
    }
}
