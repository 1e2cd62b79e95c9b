//! Cache simulator result post-processing (`ssresults`)
//!
//! Flattens per-run result files into a combined table ([`collect`]),
//! normalizes every run against the baseline at the same cache point
//! ([`normalize`]) and slices the result for charting ([`slice`]).

// Modules
pub mod collect;
pub mod config;
pub mod config_tag;
pub mod data;
pub mod mode;
pub mod normalize;
pub mod slice;

// Exports
pub use self::{
	config::Config,
	config_tag::{ConfigTag, ConfigTagParser},
	data::{NormalizedRecord, SummaryRecord},
	normalize::Normalized,
};
