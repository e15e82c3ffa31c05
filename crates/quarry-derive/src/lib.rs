#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod quarterize;
pub mod splits;
pub mod ttm;

pub use quarterize::{Quarterized, quarterize};
pub use splits::{SplitConfig, SplitEvent, apply_split_adjustments, detect_splits};
pub use ttm::{TtmMetric, TtmTrendRow, calculate_ttm, calculate_ttm_trend, derive_q4_eps};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
