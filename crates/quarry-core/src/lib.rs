#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dimension;
pub mod error;
pub mod fact;
pub mod period;
pub mod statement;
pub mod unit;

pub use dimension::Dimension;
pub use error::{DataQualityWarning, QuarryError, Result, WarningKind};
pub use fact::{Fact, FactSet, FiscalPeriod, Provenance};
pub use period::{DurationBucket, Period};
pub use statement::{CalculationEdge, PresentationNode, StatementRole, StatementType};
pub use unit::Unit;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
