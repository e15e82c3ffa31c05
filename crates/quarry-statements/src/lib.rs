#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dimensions;
pub mod resolver;
pub mod standardize;
pub mod store;

pub use dimensions::{DimensionClass, classify_dimension};
pub use resolver::{ResolverConfig, StatementMatch, resolve_statement};
pub use standardize::{
    BigramDice, MatchContext, SimilarityScorer, StandardConcept, Standardized, Standardizer,
    StandardizerConfig,
};
pub use store::{ConceptMappingStore, PendingMapping};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
