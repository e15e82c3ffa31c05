//! Trailing-twelve-month aggregation over quarterized facts.
//!
//! A TTM window is exactly four consecutive quarters, each the
//! latest-filed version for its period end. Windows are rebuilt from the
//! supplied facts on every call; nothing is cached.

use crate::quarterize::{GAP_MAX_DAYS, GAP_MIN_DAYS, quarterize};
use chrono::NaiveDate;
use quarry_core::{DataQualityWarning, Fact, QuarryError, Result, WarningKind};
use tracing::debug;

/// A trailing-twelve-month aggregate and its full derivation record.
#[derive(Debug, Clone)]
pub struct TtmMetric {
    /// Concept the aggregate covers
    pub concept: String,
    /// Sum of the four quarterly values
    pub value: f64,
    /// Start of the earliest contributing quarter
    pub period_start: NaiveDate,
    /// End of the latest contributing quarter
    pub period_end: NaiveDate,
    /// The exact four contributing facts, oldest first
    pub facts: Vec<Fact>,
    /// True when any contributing quarter was derived
    pub uses_derived: bool,
    /// True when the window has a sequence gap
    pub has_gap: bool,
    /// Data-quality signals for the caller
    pub warnings: Vec<DataQualityWarning>,
}

/// One row of a TTM trend.
#[derive(Debug, Clone)]
pub struct TtmTrendRow {
    /// End of the window's latest quarter
    pub period_end: NaiveDate,
    /// Sum of the window's four quarterly values
    pub value: f64,
    /// Growth against the same window one year earlier, when the series
    /// extends eight quarters back; `None` otherwise
    pub yoy_growth: Option<f64>,
    /// True when any quarter in the window was derived
    pub uses_derived: bool,
    /// True when the window has a sequence gap
    pub has_gap: bool,
}

/// Computes the trailing-twelve-month aggregate for a single concept.
///
/// The input is quarterized first, so cumulative disclosures participate.
/// The window is the four most recent quarters ending on or before `as_of`
/// (all quarters when `None`). Fewer than four available quarters is
/// [`QuarryError::InsufficientData`] — caller-visible and non-fatal.
pub fn calculate_ttm(facts: &[Fact], as_of: Option<NaiveDate>) -> Result<TtmMetric> {
    let quarterized = quarterize(facts);
    let eligible = eligible_quarters(&quarterized.facts, as_of);

    let available = eligible.len();
    if available < 4 {
        return Err(QuarryError::InsufficientData {
            needed: 4,
            available,
        });
    }

    let window: Vec<Fact> = eligible[available - 4..].to_vec();
    let mut warnings = Vec::new();

    let uses_derived = window.iter().any(|f| f.is_derived());
    if uses_derived {
        let derived: Vec<String> = window
            .iter()
            .filter(|f| f.is_derived())
            .map(|f| f.period.end().to_string())
            .collect();
        warnings.push(DataQualityWarning::new(
            WarningKind::DerivedQuarterUsed,
            format!("window includes derived quarters ending {}", derived.join(", ")),
        ));
    }

    let has_gap = window_has_gap(&window);
    if has_gap {
        warnings.push(DataQualityWarning::new(
            WarningKind::QuarterGap,
            "window quarters are not consecutive".to_string(),
        ));
    }

    if available == 4 {
        warnings.push(DataQualityWarning::new(
            WarningKind::ThinHistory,
            "exactly four quarters available; no earlier history".to_string(),
        ));
    }

    let value: f64 = window.iter().filter_map(|f| f.value).sum();
    let period_start = window[0]
        .period
        .start()
        .unwrap_or_else(|| window[0].period.end());
    let period_end = window[3].period.end();
    debug!(
        concept = %window[0].concept,
        %period_end,
        value,
        "computed TTM window"
    );

    Ok(TtmMetric {
        concept: window[0].concept.clone(),
        value,
        period_start,
        period_end,
        facts: window,
        uses_derived,
        has_gap,
        warnings,
    })
}

/// Slides the four-quarter window across the whole quarterized series.
///
/// Rows are returned newest first, truncated to `periods`. Year-over-year
/// growth compares a window to the window four quarters earlier, which
/// requires the series to extend eight quarters back from the window end;
/// rows without that history carry `None`.
pub fn calculate_ttm_trend(facts: &[Fact], periods: usize) -> Vec<TtmTrendRow> {
    let quarterized = quarterize(facts);
    let quarters = eligible_quarters(&quarterized.facts, None);
    if quarters.len() < 4 {
        return Vec::new();
    }

    // Oldest window first
    let mut rows: Vec<TtmTrendRow> = Vec::new();
    for i in 0..=quarters.len() - 4 {
        let window = &quarters[i..i + 4];
        let value: f64 = window.iter().filter_map(|f| f.value).sum();
        let yoy_growth = if i >= 4 {
            let prior = rows[i - 4].value;
            if prior != 0.0 {
                Some((value - prior) / prior.abs())
            } else {
                None
            }
        } else {
            None
        };
        rows.push(TtmTrendRow {
            period_end: window[3].period.end(),
            value,
            yoy_growth,
            uses_derived: window.iter().any(|f| f.is_derived()),
            has_gap: window_has_gap(window),
        });
    }

    rows.reverse();
    rows.truncate(periods);
    rows
}

/// Estimates Q4 weighted-average shares from full-year and nine-month
/// weighted averages: `4 x FY - 3 x YTD9`. Falls back to the full-year
/// figure when the nine-month figure is unavailable or the estimate comes
/// out non-positive.
pub fn estimate_q4_shares(fy_shares: f64, ytd9_shares: Option<f64>) -> f64 {
    match ytd9_shares {
        Some(ytd9) => {
            let estimate = 4.0 * fy_shares - 3.0 * ytd9;
            if estimate > 0.0 { estimate } else { fy_shares }
        }
        None => fy_shares,
    }
}

/// Derives fourth-quarter EPS.
///
/// EPS is never derived by subtracting EPS values — per-share amounts are
/// not additive. Instead, Q4 EPS is derived Q4 net income over the
/// estimated Q4 weighted-average share count.
pub fn derive_q4_eps(
    q4_net_income: f64,
    fy_shares: f64,
    ytd9_shares: Option<f64>,
) -> Option<f64> {
    let shares = estimate_q4_shares(fy_shares, ytd9_shares);
    if shares > 0.0 {
        Some(q4_net_income / shares)
    } else {
        None
    }
}

/// Filters a quarterized sequence to one (concept, unit) series ending on
/// or before `as_of`, sorted oldest first.
///
/// Callers normally pass facts for a single concept; when several are
/// present, the series of the most recently ending fact is used.
fn eligible_quarters(quarters: &[Fact], as_of: Option<NaiveDate>) -> Vec<Fact> {
    let mut eligible: Vec<Fact> = quarters
        .iter()
        .filter(|f| as_of.is_none_or(|d| f.period.end() <= d))
        .cloned()
        .collect();
    eligible.sort_by_key(|f| f.period.end());

    let Some(latest) = eligible.last() else {
        return eligible;
    };
    let concept = latest.concept.clone();
    let unit = latest.unit.clone();
    eligible.retain(|f| f.concept == concept && f.unit == unit);
    eligible
}

/// True when any adjacent pair in the window is not quarter-spaced.
fn window_has_gap(window: &[Fact]) -> bool {
    window.windows(2).any(|pair| {
        let days = pair[1]
            .period
            .end()
            .signed_duration_since(pair[0].period.end())
            .num_days();
        !(GAP_MIN_DAYS..=GAP_MAX_DAYS).contains(&days)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quarry_core::{FiscalPeriod, Period, Unit};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usd() -> Unit {
        Unit::Monetary("USD".to_string())
    }

    fn quarter(value: f64, start: NaiveDate, end: NaiveDate) -> Fact {
        Fact::reported("us-gaap:Revenues", value, usd(), Period::duration(start, end))
            .with_filed(end)
    }

    /// Eight discrete calendar quarters, 2022Q1 through 2023Q4.
    fn two_years() -> Vec<Fact> {
        vec![
            quarter(90.0, date(2022, 1, 1), date(2022, 3, 31)),
            quarter(95.0, date(2022, 4, 1), date(2022, 6, 30)),
            quarter(100.0, date(2022, 7, 1), date(2022, 9, 30)),
            quarter(115.0, date(2022, 10, 1), date(2022, 12, 31)),
            quarter(100.0, date(2023, 1, 1), date(2023, 3, 31)),
            quarter(110.0, date(2023, 4, 1), date(2023, 6, 30)),
            quarter(120.0, date(2023, 7, 1), date(2023, 9, 30)),
            quarter(130.0, date(2023, 10, 1), date(2023, 12, 31)),
        ]
    }

    #[test]
    fn test_ttm_sums_last_four_quarters() {
        let metric = calculate_ttm(&two_years(), None).unwrap();
        assert_relative_eq!(metric.value, 460.0);
        assert_eq!(metric.facts.len(), 4);
        assert_eq!(metric.period_end, date(2023, 12, 31));
        assert_eq!(metric.period_start, date(2023, 1, 1));
        assert!(!metric.uses_derived);
        assert!(!metric.has_gap);

        // Strictly increasing, distinct period ends
        for pair in metric.facts.windows(2) {
            assert!(pair[0].period.end() < pair[1].period.end());
        }
    }

    #[test]
    fn test_ttm_respects_as_of() {
        let metric = calculate_ttm(&two_years(), Some(date(2023, 6, 30))).unwrap();
        assert_relative_eq!(metric.value, 100.0 + 115.0 + 100.0 + 110.0);
        assert_eq!(metric.period_end, date(2023, 6, 30));
    }

    #[test]
    fn test_ttm_insufficient_data() {
        let facts = two_years();
        let err = calculate_ttm(&facts[..3], None).unwrap_err();
        match err {
            QuarryError::InsufficientData { needed, available } => {
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ttm_from_cumulative_disclosures() {
        // Only Q1 + YTD facts on file; quarterization feeds the window
        let facts = vec![
            quarter(100.0, date(2023, 1, 1), date(2023, 3, 31)),
            Fact::reported(
                "us-gaap:Revenues",
                210.0,
                usd(),
                Period::duration(date(2023, 1, 1), date(2023, 6, 30)),
            )
            .with_filed(date(2023, 8, 1))
            .with_fiscal(2023, FiscalPeriod::Ytd6m),
            Fact::reported(
                "us-gaap:Revenues",
                330.0,
                usd(),
                Period::duration(date(2023, 1, 1), date(2023, 9, 30)),
            )
            .with_filed(date(2023, 11, 1))
            .with_fiscal(2023, FiscalPeriod::Ytd9m),
            Fact::reported(
                "us-gaap:Revenues",
                460.0,
                usd(),
                Period::duration(date(2023, 1, 1), date(2023, 12, 31)),
            )
            .with_filed(date(2024, 2, 15))
            .with_fiscal(2023, FiscalPeriod::Fy),
        ];

        let metric = calculate_ttm(&facts, None).unwrap();
        assert_relative_eq!(metric.value, 460.0);
        assert!(metric.uses_derived);
        assert!(
            metric
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::DerivedQuarterUsed)
        );
    }

    #[test]
    fn test_thin_history_warning() {
        let facts = two_years();
        let metric = calculate_ttm(&facts[4..], None).unwrap();
        assert!(
            metric
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::ThinHistory)
        );
    }

    #[test]
    fn test_trend_newest_first_with_yoy() {
        let rows = calculate_ttm_trend(&two_years(), 10);
        // Eight quarters make five windows
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].period_end, date(2023, 12, 31));
        assert_relative_eq!(rows[0].value, 460.0);

        // Newest window has a full prior-year window: (460 - 400) / 400
        let oldest_value: f64 = 90.0 + 95.0 + 100.0 + 115.0;
        assert_relative_eq!(rows[0].yoy_growth.unwrap(), (460.0 - oldest_value) / oldest_value);

        // Early windows have no prior-year comparison
        assert_eq!(rows[4].yoy_growth, None);
        assert_eq!(rows[3].yoy_growth, None);
    }

    #[test]
    fn test_trend_truncates_to_requested_periods() {
        let rows = calculate_ttm_trend(&two_years(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period_end, date(2023, 12, 31));
        assert_eq!(rows[1].period_end, date(2023, 9, 30));
    }

    #[test]
    fn test_estimate_q4_shares() {
        // FY average 1000, YTD9 average 980 => Q4 = 4000 - 2940 = 1060
        assert_relative_eq!(estimate_q4_shares(1000.0, Some(980.0)), 1060.0);
        // Missing YTD9 falls back to FY
        assert_relative_eq!(estimate_q4_shares(1000.0, None), 1000.0);
        // Degenerate estimate falls back to FY
        assert_relative_eq!(estimate_q4_shares(100.0, Some(500.0)), 100.0);
    }

    #[test]
    fn test_derive_q4_eps() {
        let eps = derive_q4_eps(530.0, 1000.0, Some(980.0)).unwrap();
        assert_relative_eq!(eps, 0.5, max_relative = 1e-9);
        assert_eq!(derive_q4_eps(530.0, 0.0, None), None);
    }
}
