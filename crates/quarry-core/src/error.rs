//! Error taxonomy and data-quality warnings.

use crate::statement::StatementType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Errors that can occur during derivation and resolution.
///
/// Merely missing or empty input is never an error: absence of a statement
/// or a quarter is a representable, caller-visible outcome. Data-quality
/// issues ride along on results as [`DataQualityWarning`] values and are
/// never raised.
#[derive(Debug, Error)]
pub enum QuarryError {
    /// No statement role scored above the resolver threshold
    #[error("no {0} found above the resolver score threshold")]
    StatementNotFound(StatementType),

    /// Too few quarters available for a trailing-twelve-month window
    #[error("insufficient data: {needed} quarters needed, {available} available")]
    InsufficientData {
        /// Quarters a TTM window requires
        needed: usize,
        /// Quarters available after quarterization
        available: usize,
    },

    /// Concept mapping store failure
    #[error("mapping store error: {0}")]
    Store(String),

    /// IO error from the mapping store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error from the mapping store
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Machine-usable category of a data-quality signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A derived quarter came out negative (restatement or 52/53-week
    /// calendar artifact)
    NegativeDerivedQuarter,
    /// Consecutive quarters are not 70-110 days apart
    QuarterGap,
    /// A TTM window includes at least one derived quarter
    DerivedQuarterUsed,
    /// Barely enough history for the requested window
    ThinHistory,
    /// A concept mapping was queued at low confidence
    LowConfidenceMapping,
}

/// A non-fatal signal attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    /// Category of the signal
    pub kind: WarningKind,
    /// Human-readable description
    pub message: String,
}

impl DataQualityWarning {
    /// Creates a warning.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
