//! Creates charts from the combined simulator results

// Modules
mod args;
mod charts;
mod render;

// Imports
use {
	self::{args::Args, charts::Charts, render::Renderer},
	anyhow::Context,
	clap::Parser,
	ssresults::{normalize, Config},
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

	// Normalize the combined table, keeping the normalized table alongside the charts
	let normalized = normalize::run(&config).context("Unable to normalize results")?;

	// Then render all charts
	let renderer = Renderer::new(args.output.width, args.output.height, config.mode_order.clone());
	let written = Charts::new(&config, &renderer, &normalized.records)
		.render_all()
		.context("Unable to render charts")?;
	tracing::info!("Wrote {written} charts to {:?}", config.plots_path());

	Ok(())
}
