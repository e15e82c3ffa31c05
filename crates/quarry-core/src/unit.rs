//! Unit normalization and the additivity gate.

use serde::{Deserialize, Serialize};

/// Normalized unit of measure for a fact.
///
/// Raw XBRL unit strings are free-form ("USD", "shares", "USD/shares",
/// "pure", occasionally exotic currencies). The category drives the
/// additivity invariant: only monetary and share-count duration facts may
/// participate in year-to-date subtraction. Ratios and per-share amounts
/// never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// A currency amount, tagged with the ISO currency code.
    Monetary(String),
    /// A plain share count.
    Shares,
    /// A per-share amount (e.g. EPS), tagged with the currency code.
    PerShare(String),
    /// A dimensionless ratio or pure number.
    Pure,
    /// An unrecognized unit, preserved verbatim.
    Other(String),
}

impl Unit {
    /// Normalizes a raw XBRL unit string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("shares") {
            return Self::Shares;
        }
        if trimmed.eq_ignore_ascii_case("pure") {
            return Self::Pure;
        }
        if let Some((num, denom)) = trimmed.split_once('/') {
            if denom.trim().eq_ignore_ascii_case("shares") && is_currency_code(num.trim()) {
                return Self::PerShare(num.trim().to_ascii_uppercase());
            }
            return Self::Other(trimmed.to_string());
        }
        if is_currency_code(trimmed) {
            return Self::Monetary(trimmed.to_ascii_uppercase());
        }
        Self::Other(trimmed.to_string())
    }

    /// Returns true if duration facts in this unit may be subtracted from
    /// one another to derive discrete quarters.
    pub const fn is_additive(&self) -> bool {
        matches!(self, Self::Monetary(_) | Self::Shares)
    }

    /// Returns true for per-share amounts.
    pub const fn is_per_share(&self) -> bool {
        matches!(self, Self::PerShare(_))
    }

    /// Returns true for plain share counts.
    pub const fn is_share_count(&self) -> bool {
        matches!(self, Self::Shares)
    }
}

/// Three uppercase ASCII letters, the shape of an ISO 4217 code.
fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic())
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monetary(c) => f.write_str(c),
            Self::Shares => f.write_str("shares"),
            Self::PerShare(c) => write!(f, "{}/shares", c),
            Self::Pure => f.write_str("pure"),
            Self::Other(s) => f.write_str(s),
        }
    }
}
