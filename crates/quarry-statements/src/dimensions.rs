//! Face-value vs. footnote-breakdown classification for dimensional facts.

use quarry_core::{Fact, StatementRole};
use tracing::debug;

/// Whether a dimensional fact belongs on the statement face or in a
/// footnote breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionClass {
    /// Shown in the default statement view without opt-in
    FaceValue,
    /// Hidden unless explicitly requested
    Breakdown,
}

/// Axes historically presented on the statement face even without a
/// definition linkbase — product/service and share-class breakdowns nested
/// directly under a primary line. Matched by axis local name.
const FACE_AXIS_FALLBACK: &[&str] = &[
    "ProductOrServiceAxis",
    "ProductsAndServicesAxis",
    "StatementClassOfStockAxis",
    "ClassOfStockAxis",
];

/// Classifies a fact as face value or breakdown for a given role.
///
/// Undimensioned facts are trivially face values. When the role carries
/// definition-linkbase data, the declared hypercube is authoritative: every
/// axis on the fact must be declared valid, regardless of axis name. The
/// allow-list fallback applies only when the filing has no definition
/// linkbase for the role.
pub fn classify_dimension(fact: &Fact, role: &StatementRole) -> DimensionClass {
    if !fact.is_dimensioned() {
        return DimensionClass::FaceValue;
    }

    if role.has_definition_linkbase() {
        let all_declared = fact.dimensions.iter().all(|d| role.declares_axis(&d.axis));
        return if all_declared {
            DimensionClass::FaceValue
        } else {
            DimensionClass::Breakdown
        };
    }

    let all_allow_listed = fact.dimensions.iter().all(|d| {
        let local = d.axis_local_name();
        FACE_AXIS_FALLBACK.iter().any(|allowed| local == *allowed)
    });
    if all_allow_listed {
        debug!(
            concept = %fact.concept,
            role_id = %role.role_id,
            "face classification via axis allow-list; role has no definition linkbase"
        );
        DimensionClass::FaceValue
    } else {
        DimensionClass::Breakdown
    }
}
