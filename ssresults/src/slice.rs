//! Reference slicing.
//!
//! Sweeping one dimension while holding the rest fixed requires every
//! mode to be reduced to a single consistent slice first, otherwise
//! several sweeps with the same mode would interleave into one line.

// Imports
use {
	crate::{
		config::Reference,
		data::NormalizedRecord,
		mode::{Knob, Mechanism},
	},
	average::{Estimate, Mean},
	std::collections::{BTreeMap, BTreeSet},
};

/// Returns if `record` is at the reference knobs of its mode.
///
/// The knob `free`, if any, is the one being swept, and isn't fixed.
/// Modes we don't know the knobs of always match.
pub fn at_reference_knobs(record: &NormalizedRecord, reference: &Reference, free: Option<Knob>) -> bool {
	let Some(mechanism) = Mechanism::from_mode(&record.summary.mode) else {
		return true;
	};

	mechanism
		.knobs()
		.iter()
		.filter(|&&knob| Some(knob) != free)
		.all(|&knob| record.tag.knobs.get(knob) == Some(reference.knob(knob)))
}

/// Returns if `record` is at the reference cache point
pub fn at_reference_point(record: &NormalizedRecord, reference: &Reference) -> bool {
	record.dl1_cfg() == Some(reference.dl1.as_str()) && record.ul2_cfg() == Some(reference.ul2.as_str())
}

/// Filters `records` down to the reference knobs of each mode
pub fn reference_slice<'a>(
	records: impl IntoIterator<Item = &'a NormalizedRecord>,
	reference: &Reference,
	free: Option<Knob>,
) -> Vec<&'a NormalizedRecord> {
	records
		.into_iter()
		.filter(|record| self::at_reference_knobs(record, reference, free))
		.collect()
}

/// Chart x axis
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Axis {
	/// Level-1 data cache capacity
	Dl1Bytes,

	/// Level-2 unified cache capacity
	Ul2Bytes,

	/// A knob
	Knob(Knob),
}

impl Axis {
	/// Value of this axis for `record`
	pub fn value(self, record: &NormalizedRecord) -> Option<u64> {
		match self {
			Self::Dl1Bytes => record.dl1_bytes(),
			Self::Ul2Bytes => record.ul2_bytes(),
			Self::Knob(knob) => record.tag.knobs.get(knob),
		}
	}
}

/// Chart y axis
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Metric {
	Dl1MissRate,
	Dl1MissNorm,
	Ul2MissRate,
	Ul2MissNorm,
	Ul2DemandNorm,
	CpiNorm,
	VcHitRate,
	McHitRate,
	SbHitRate,
}

impl Metric {
	/// Value of this metric for `record`
	pub fn value(self, record: &NormalizedRecord) -> Option<f64> {
		let summary = &record.summary;
		match self {
			Self::Dl1MissRate => summary.dl1_miss_rate.value,
			Self::Dl1MissNorm => record.norm.dl1_miss_rate,
			Self::Ul2MissRate => summary.ul2_miss_rate.value,
			Self::Ul2MissNorm => record.norm.ul2_miss_rate,
			Self::Ul2DemandNorm => record.norm.ul2_demand,
			Self::CpiNorm => record.norm.cpi,
			Self::VcHitRate => summary.vc.hit_rate,
			Self::McHitRate => summary.mc.hit_rate,
			Self::SbHitRate => summary.sb.hit_rate,
		}
	}
}

/// A line, one point per distinct x
#[derive(PartialEq, Clone, Debug)]
pub struct Series {
	/// Mode
	pub mode: String,

	/// Points, sorted by x
	pub points: Vec<(u64, f64)>,
}

/// Builds one line per mode, averaging y over equal x.
///
/// Records with an undefined x or y are ignored. Lines follow `mode_order`,
/// and modes not in it aren't drawn.
///
/// This should be called on an already sliced set of records, averaging
/// before slicing would mix different sweeps.
pub fn line_series(records: &[&NormalizedRecord], x: Axis, y: Metric, mode_order: &[String]) -> Vec<Series> {
	let mut points = BTreeMap::<(&str, u64), Mean>::new();
	for record in records {
		let (Some(x), Some(y)) = (x.value(record), y.value(record)) else {
			continue;
		};

		points
			.entry((record.summary.mode.as_str(), x))
			.or_insert_with(Mean::new)
			.add(y);
	}

	mode_order
		.iter()
		.filter_map(|mode| {
			let points = points
				.range((mode.as_str(), u64::MIN)..=(mode.as_str(), u64::MAX))
				.map(|(&(_, x), y)| (x, y.mean()))
				.collect::<Vec<_>>();

			(!points.is_empty()).then(|| Series {
				mode: mode.clone(),
				points,
			})
		})
		.collect()
}

/// Grouped bars, one group per benchmark and one bar per mode
#[derive(PartialEq, Clone, Debug)]
pub struct Bars {
	/// Benchmarks, sorted
	pub benchmarks: Vec<String>,

	/// Bars of each mode
	pub series: Vec<BarSeries>,
}

impl Bars {
	/// Returns if there's nothing to draw
	pub fn is_empty(&self) -> bool {
		self.series.is_empty()
	}
}

/// Bars of a single mode
#[derive(PartialEq, Clone, Debug)]
pub struct BarSeries {
	/// Mode
	pub mode: String,

	/// Mean of each benchmark, in [`Bars::benchmarks`] order.
	///
	/// `None` if the mode has no value for that benchmark.
	pub values: Vec<Option<f64>>,
}

/// Builds grouped bars of the mean of `y` per (mode, benchmark).
///
/// Records with an undefined y are ignored. Series follow `mode_order`.
pub fn bar_groups(records: &[&NormalizedRecord], y: Metric, mode_order: &[String]) -> Bars {
	let mut means = BTreeMap::<(&str, &str), Mean>::new();
	let mut benchmarks = BTreeSet::new();
	for record in records {
		let Some(y) = y.value(record) else {
			continue;
		};

		let benchmark = record.summary.benchmark.as_str();
		benchmarks.insert(benchmark);
		means
			.entry((record.summary.mode.as_str(), benchmark))
			.or_insert_with(Mean::new)
			.add(y);
	}

	let series = mode_order
		.iter()
		.filter(|mode| means.keys().any(|&(record_mode, _)| record_mode == mode.as_str()))
		.map(|mode| BarSeries {
			mode:   mode.clone(),
			values: benchmarks
				.iter()
				.map(|&benchmark| means.get(&(mode.as_str(), benchmark)).map(Mean::mean))
				.collect(),
		})
		.collect();

	Bars {
		benchmarks: benchmarks.into_iter().map(str::to_owned).collect(),
		series,
	}
}
