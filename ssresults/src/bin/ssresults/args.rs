//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Config file
	///
	/// If not passed, the default configuration is used.
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Results root.
	///
	/// Overrides the config file's
	#[clap(long = "results-root")]
	pub results_root: Option<PathBuf>,

	/// Sub-command
	#[command(subcommand)]
	pub sub_cmd: SubCmd,
}

/// Sub-command
#[derive(Debug, clap::Subcommand)]
pub enum SubCmd {
	/// Collects all result files into the combined table
	#[clap(name = "collect")]
	Collect,

	/// Normalizes the combined table against the baseline
	#[clap(name = "normalize")]
	Normalize,

	/// Collects, then normalizes
	#[clap(name = "run")]
	Run,
}
