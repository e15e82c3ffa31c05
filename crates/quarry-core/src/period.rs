//! Reporting periods and duration classification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The time context a fact applies to.
///
/// Balance-sheet items are reported at an instant; income-statement and
/// cash-flow items cover a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// A point-in-time measurement (e.g. total assets at year end).
    Instant(NaiveDate),
    /// A span of time (e.g. revenue for a quarter).
    Duration {
        /// First day of the reporting period
        start: NaiveDate,
        /// Last day of the reporting period
        end: NaiveDate,
    },
}

impl Period {
    /// Builds a duration period from start and end dates.
    pub const fn duration(start: NaiveDate, end: NaiveDate) -> Self {
        Self::Duration { start, end }
    }

    /// Returns true if this is a point-in-time period.
    pub const fn is_instant(&self) -> bool {
        matches!(self, Self::Instant(_))
    }

    /// Returns true if this period covers a span of time.
    pub const fn is_duration(&self) -> bool {
        matches!(self, Self::Duration { .. })
    }

    /// The end date (for instants, the instant itself).
    pub const fn end(&self) -> NaiveDate {
        match self {
            Self::Instant(d) => *d,
            Self::Duration { end, .. } => *end,
        }
    }

    /// The start date, if this is a duration.
    pub const fn start(&self) -> Option<NaiveDate> {
        match self {
            Self::Instant(_) => None,
            Self::Duration { start, .. } => Some(*start),
        }
    }

    /// Number of days covered, if this is a duration.
    pub fn duration_days(&self) -> Option<i64> {
        match self {
            Self::Instant(_) => None,
            Self::Duration { start, end } => Some(end.signed_duration_since(*start).num_days()),
        }
    }

    /// Classifies this period into a duration bucket.
    ///
    /// Instants have no bucket.
    pub fn bucket(&self) -> Option<DurationBucket> {
        self.duration_days().map(DurationBucket::classify)
    }
}

/// Calendar-span bucket for a duration fact.
///
/// Filers report fiscal quarters of uneven length (52/53-week calendars,
/// short transition periods), so each bucket is a day-count range rather
/// than an exact span. Classification is pure and deterministic: a day
/// count on a boundary shared by two ranges always lands in the shorter
/// bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBucket {
    /// A discrete fiscal quarter (70-120 days)
    Quarter,
    /// Year-to-date through two quarters (140-240 days)
    Ytd6m,
    /// Year-to-date through three quarters (230-330 days)
    Ytd9m,
    /// A full fiscal year (330-420 days)
    Annual,
    /// Anything else; excluded from derivation
    Other,
}

impl DurationBucket {
    /// Classifies a day count into its bucket.
    pub const fn classify(days: i64) -> Self {
        if days >= 70 && days <= 120 {
            Self::Quarter
        } else if days >= 140 && days <= 240 {
            Self::Ytd6m
        } else if days >= 230 && days <= 330 {
            Self::Ytd9m
        } else if days > 330 && days <= 420 {
            Self::Annual
        } else {
            Self::Other
        }
    }

    /// Returns true if facts in this bucket may participate in
    /// year-to-date subtraction.
    pub const fn is_derivable(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl std::fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Quarter => "quarter",
            Self::Ytd6m => "YTD-6M",
            Self::Ytd9m => "YTD-9M",
            Self::Annual => "annual",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}
