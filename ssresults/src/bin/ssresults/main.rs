//! Cache simulator result post-processing (`ssresults`)

// Modules
mod args;

// Imports
use {
	self::args::{Args, SubCmd},
	anyhow::Context,
	clap::Parser,
	ssresults::{collect, normalize, Config},
	ssresults_util::logger,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file
	let mut config = Config::load(args.config_file.as_deref()).context("Unable to load config")?;
	if let Some(results_root) = args.results_root {
		config.results_root = results_root;
	}
	tracing::debug!(?config, "Loaded config");

	match args.sub_cmd {
		SubCmd::Collect => {
			collect::run(&config).context("Unable to collect results")?;
		},
		SubCmd::Normalize => {
			normalize::run(&config).context("Unable to normalize results")?;
		},
		SubCmd::Run => {
			collect::run(&config).context("Unable to collect results")?;
			normalize::run(&config).context("Unable to normalize results")?;
		},
	}

	Ok(())
}
