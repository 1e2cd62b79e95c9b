//! Configuration

// Imports
use {
	crate::mode::{self, Knob},
	anyhow::Context,
	std::{
		collections::BTreeSet,
		fs,
		path::{Path, PathBuf},
	},
};

/// Configuration
///
/// All fields have defaults, so a config file only needs to mention
/// the ones it wants to change.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
	/// Root directory with a sub-directory per configuration tag
	pub results_root: PathBuf,

	/// Combined table, relative to `results_root`
	pub summary_file: PathBuf,

	/// Prefix of every per-run result file
	pub result_file_prefix: String,

	/// Extension of every per-run result file
	pub result_file_extension: String,

	/// Analysis directory, relative to `results_root`
	pub analysis_dir: PathBuf,

	/// Normalized table, relative to `analysis_dir`
	pub normalized_file: PathBuf,

	/// Charts directory, relative to `analysis_dir`
	pub plots_dir: PathBuf,

	/// Reference point
	pub reference: Reference,

	/// Modes dropped before normalization
	pub excluded_modes: BTreeSet<String>,

	/// Canonical mode order for chart series
	pub mode_order: Vec<String>,
}

impl Config {
	/// Loads the config from `path`, or the default config if `None`
	pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
		let Some(path) = path else {
			return Ok(Self::default());
		};

		let config_file = fs::File::open(path).with_context(|| format!("Unable to open config file {path:?}"))?;
		serde_json::from_reader(config_file).with_context(|| format!("Unable to parse config file {path:?}"))
	}

	/// Path of the combined table
	pub fn summary_path(&self) -> PathBuf {
		self.results_root.join(&self.summary_file)
	}

	/// Path of the analysis directory
	pub fn analysis_path(&self) -> PathBuf {
		self.results_root.join(&self.analysis_dir)
	}

	/// Path of the normalized table
	pub fn normalized_path(&self) -> PathBuf {
		self.analysis_path().join(&self.normalized_file)
	}

	/// Path of the charts directory
	pub fn plots_path(&self) -> PathBuf {
		self.analysis_path().join(&self.plots_dir)
	}

	/// Returns if `mode` (already normalized) is excluded
	pub fn is_excluded(&self, mode: &str) -> bool {
		self.excluded_modes
			.iter()
			.any(|excluded| mode::normalize(excluded) == mode)
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			results_root:          PathBuf::from("results/ss"),
			summary_file:          PathBuf::from("ss_summary_all.csv"),
			result_file_prefix:    "ss_".to_owned(),
			result_file_extension: "csv".to_owned(),
			analysis_dir:          PathBuf::from("analysis"),
			normalized_file:       PathBuf::from("ss_normalized.csv"),
			plots_dir:             PathBuf::from("plots"),
			reference:             Reference::default(),
			excluded_modes:        BTreeSet::from(["stream_multi".to_owned()]),
			mode_order:            mode::Mechanism::ALL
				.iter()
				.map(|mechanism| mechanism.name().to_owned())
				.collect(),
		}
	}
}

/// Reference cache point and knob values
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Reference {
	/// Level-1 data cache geometry
	pub dl1: String,

	/// Level-2 unified cache geometry
	pub ul2: String,

	/// Victim cache entries
	pub vc_entries: u64,

	/// Miss cache entries
	pub mc_entries: u64,

	/// Stream buffer depth
	pub sb_depth: u64,
}

impl Reference {
	/// Returns the reference value of `knob`
	pub fn knob(&self, knob: Knob) -> u64 {
		match knob {
			Knob::VcEntries => self.vc_entries,
			Knob::McEntries => self.mc_entries,
			Knob::SbDepth => self.sb_depth,
		}
	}
}

impl Default for Reference {
	fn default() -> Self {
		Self {
			dl1:        "dl1:1024:32:1:l".to_owned(),
			ul2:        "ul2:16384:64:4:l".to_owned(),
			vc_entries: 4,
			mc_entries: 4,
			sb_depth:   4,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_keeps_defaults() {
		let config = serde_json::from_str::<Config>(
			r#"{ "results_root": "out", "reference": { "sb_depth": 8 }, "excluded_modes": [] }"#,
		)
		.expect("Unable to parse config");

		assert_eq!(config.results_root, PathBuf::from("out"));
		assert_eq!(config.summary_path(), PathBuf::from("out/ss_summary_all.csv"));
		assert_eq!(config.normalized_path(), PathBuf::from("out/analysis/ss_normalized.csv"));
		assert_eq!(config.reference.sb_depth, 8);
		assert_eq!(config.reference.vc_entries, 4);
		assert_eq!(config.reference.dl1, "dl1:1024:32:1:l");
		assert!(!config.is_excluded("stream_multi"));
	}

	#[test]
	fn default_excludes_multi_buffer_streams() {
		let config = Config::default();
		assert!(config.is_excluded("stream_multi"));
		assert!(!config.is_excluded("stream"));
		assert_eq!(config.mode_order, [
			"baseline",
			"victim",
			"miss",
			"stream",
			"victim_stream",
			"miss_stream"
		]);
	}
}
