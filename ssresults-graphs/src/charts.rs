//! Chart catalogue

// Imports
use {
	crate::render::{Labels, Renderer},
	itertools::Itertools,
	ssresults::{
		mode::{self, Knob, Mechanism},
		slice::{self, Axis, Metric},
		config::Reference,
		Config,
		NormalizedRecord,
	},
	std::path::{Path, PathBuf},
};

/// Makes a value usable as a file name component
pub fn file_safe(value: &str) -> String {
	value.replace([':', '/'], "-")
}

/// Title of a mechanism bar chart of `what`, including the reference point and knobs
fn mechanism_title(what: &str, reference: &Reference) -> String {
	format!(
		"Mechanism vs {what} @ DL1={}, UL2={} (ref knobs: VC={}, MC={}, SB_DEPTH={})",
		reference.dl1, reference.ul2, reference.vc_entries, reference.mc_entries, reference.sb_depth
	)
}

/// Groups `records` by `key`, in key order.
///
/// Records without a key are dropped.
fn group_by<'a, K: Ord + std::hash::Hash>(
	records: impl IntoIterator<Item = &'a NormalizedRecord>,
	key: impl Fn(&NormalizedRecord) -> Option<K>,
) -> Vec<(K, Vec<&'a NormalizedRecord>)> {
	records
		.into_iter()
		.filter_map(|record| Some((key(record)?, record)))
		.into_group_map()
		.into_iter()
		.sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs))
		.collect()
}

/// Chart catalogue
pub struct Charts<'a> {
	/// Config
	config: &'a Config,

	/// Renderer
	renderer: &'a Renderer,

	/// All normalized records
	records: &'a [NormalizedRecord],

	/// Output directory
	plots_dir: PathBuf,

	/// Charts written so far
	written: usize,
}

impl<'a> Charts<'a> {
	/// Creates the catalogue over `records`
	pub fn new(config: &'a Config, renderer: &'a Renderer, records: &'a [NormalizedRecord]) -> Self {
		Self {
			config,
			renderer,
			records,
			plots_dir: config.plots_path(),
			written: 0,
		}
	}

	/// Renders every chart, returning how many were written
	pub fn render_all(mut self) -> Result<usize, anyhow::Error> {
		self.cache_size_vs_miss()?;
		self.mechanism_bars(
			Metric::Dl1MissNorm,
			"2_mechanism_vs_miss_bars/mechanism_vs_dl1_miss__ref.png",
			"DL1 miss (normalized)",
			"DL1 miss rate (normalized to baseline)",
		)?;
		self.knob_sweep(Knob::VcEntries, Metric::VcHitRate, "3_vc_entries_vs_vc_hitrate", "vc", "Victim cache")?;
		self.knob_sweep(Knob::McEntries, Metric::McHitRate, "4_mc_entries_vs_mc_hitrate", "mc", "Miss cache")?;
		self.knob_sweep(Knob::SbDepth, Metric::SbHitRate, "5_sb_depth_vs_sb_hitrate", "sb", "Stream buffer")?;
		self.ul2_size_vs_miss()?;
		self.ul2_demand_vs_dl1()?;
		self.mechanism_bars(
			Metric::CpiNorm,
			"8_cpi_vs_mechanism_bars/mechanism_vs_cpi__ref.png",
			"CPI (normalized)",
			"CPI (normalized to baseline)",
		)?;

		Ok(self.written)
	}

	/// Renders a line chart, counting it if written
	fn lines(&mut self, path: &Path, labels: Labels, records: &[&NormalizedRecord], x: Axis, y: Metric) -> Result<(), anyhow::Error> {
		let series = slice::line_series(records, x, y, &self.config.mode_order);
		if self.renderer.lines(path, labels, &series)? {
			self.written += 1;
		}

		Ok(())
	}

	/// DL1 capacity against DL1 miss rate, per benchmark and UL2 geometry
	fn cache_size_vs_miss(&mut self) -> Result<(), anyhow::Error> {
		let (config, records) = (self.config, self.records);
		let sliced = slice::reference_slice(records, &config.reference, None);
		let groups = self::group_by(sliced, |record| {
			Some((record.summary.benchmark.clone(), record.ul2_cfg()?.to_owned()))
		});

		for ((benchmark, ul2), records) in groups {
			for (kind, metric, y) in [
				("raw", Metric::Dl1MissRate, "DL1 miss rate"),
				("norm", Metric::Dl1MissNorm, "DL1 miss rate (normalized to baseline)"),
			] {
				let path = self.plots_dir.join(format!(
					"1_cache_size_vs_miss/dl1_size_vs_dl1_miss_{kind}/{}__dl1miss_{kind}_vs_dl1__ul2_{}.png",
					self::file_safe(&benchmark),
					self::file_safe(&ul2),
				));
				let title = format!("{benchmark}: DL1 size vs DL1 miss ({kind}) @ UL2={ul2}");
				let labels = Labels {
					title: &title,
					x:     "DL1 size (bytes)",
					y,
				};
				self.lines(&path, labels, &records, Axis::Dl1Bytes, metric)?;
			}
		}

		Ok(())
	}

	/// Per-benchmark bars of each mode at the reference point
	fn mechanism_bars(&mut self, metric: Metric, file: &str, what: &str, y: &str) -> Result<(), anyhow::Error> {
		let (config, records) = (self.config, self.records);
		let reference = &config.reference;
		let at_point = records
			.iter()
			.filter(|record| slice::at_reference_point(record, reference));
		let sliced = slice::reference_slice(at_point, reference, None);

		let bars = slice::bar_groups(&sliced, metric, &config.mode_order);
		let title = self::mechanism_title(what, reference);
		let labels = Labels {
			title: &title,
			x:     "benchmark",
			y,
		};
		if self.renderer.bars(&self.plots_dir.join(file), labels, &bars)? {
			self.written += 1;
		}

		Ok(())
	}

	/// Knob against the matching sub-cache hit rate, per benchmark at the reference point.
	///
	/// Only modes parameterized by `knob` are shown.
	fn knob_sweep(&mut self, knob: Knob, metric: Metric, dir: &str, short: &str, name: &str) -> Result<(), anyhow::Error> {
		let (config, records) = (self.config, self.records);
		let reference = &config.reference;
		let has_knob = |record: &NormalizedRecord| {
			Mechanism::from_mode(&record.summary.mode).is_some_and(|mechanism| mechanism.knobs().contains(&knob))
		};
		let at_point = records
			.iter()
			.filter(|record| has_knob(record) && slice::at_reference_point(record, reference));
		let sliced = slice::reference_slice(at_point, reference, Some(knob));
		let groups = self::group_by(sliced, |record| Some(record.summary.benchmark.clone()));

		for (benchmark, records) in groups {
			let path = self.plots_dir.join(format!(
				"{dir}/{}__{}_vs_{short}_hr__ref.png",
				self::file_safe(&benchmark),
				knob.name(),
			));
			let title = format!(
				"{benchmark}: {name} {} vs hit rate @ DL1={} UL2={}",
				knob.name(),
				reference.dl1,
				reference.ul2
			);
			let y = format!("{short} hit rate");
			let labels = Labels {
				title: &title,
				x:     knob.name(),
				y:     &y,
			};
			self.lines(&path, labels, &records, Axis::Knob(knob), metric)?;
		}

		Ok(())
	}

	/// UL2 capacity against UL2 miss rate for the baseline, per benchmark and DL1 geometry
	fn ul2_size_vs_miss(&mut self) -> Result<(), anyhow::Error> {
		let records = self.records;
		let baseline = records.iter().filter(|record| record.is_mode(mode::BASELINE));
		let groups = self::group_by(baseline, |record| {
			Some((record.summary.benchmark.clone(), record.dl1_cfg()?.to_owned()))
		});

		for ((benchmark, dl1), records) in groups {
			for (kind, metric, y) in [
				("raw", Metric::Ul2MissRate, "UL2 miss rate"),
				("norm", Metric::Ul2MissNorm, "UL2 miss rate (normalized to baseline)"),
			] {
				let path = self.plots_dir.join(format!(
					"6_ul2_size_vs_ul2_miss/baseline_only_{kind}/{}__ul2miss_{kind}_vs_ul2__dl1_{}.png",
					self::file_safe(&benchmark),
					self::file_safe(&dl1),
				));
				let title = format!("{benchmark}: UL2 size vs UL2 miss ({kind}) @ DL1={dl1}");
				let labels = Labels {
					title: &title,
					x:     "UL2 size (bytes)",
					y,
				};
				self.lines(&path, labels, &records, Axis::Ul2Bytes, metric)?;
			}
		}

		Ok(())
	}

	/// DL1 capacity against normalized UL2 demand traffic, per benchmark and UL2 geometry
	fn ul2_demand_vs_dl1(&mut self) -> Result<(), anyhow::Error> {
		let (config, records) = (self.config, self.records);
		let sliced = slice::reference_slice(records, &config.reference, None);
		let groups = self::group_by(sliced, |record| {
			Some((record.summary.benchmark.clone(), record.ul2_cfg()?.to_owned()))
		});

		for ((benchmark, ul2), records) in groups {
			let path = self.plots_dir.join(format!(
				"7_ul2_demand_vs_dl1/{}__ul2demand_vs_dl1__ul2_{}.png",
				self::file_safe(&benchmark),
				self::file_safe(&ul2),
			));
			let title = format!("{benchmark}: UL2 demand (normalized) vs DL1 size @ UL2={ul2}");
			let labels = Labels {
				title: &title,
				x:     "DL1 size (bytes)",
				y:     "UL2 demand accesses (normalized to baseline)",
			};
			self.lines(&path, labels, &records, Axis::Dl1Bytes, Metric::Ul2DemandNorm)?;
		}

		Ok(())
	}
}
