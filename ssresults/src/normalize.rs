//! Normalizer.
//!
//! Normalizes every record against the mean of the baseline records
//! at the same cache point.

// Imports
use {
	crate::{
		config::Config,
		config_tag::ConfigTagParser,
		data::{CacheMetrics, NormalizedRecord, RawRow, SummaryRecord},
		mode,
	},
	anyhow::Context,
	average::{Estimate, Mean},
	std::{collections::HashMap, fs, io, path::Path},
};

/// `a / b`, undefined if either is undefined or `b` is zero
pub fn safe_div(a: Option<f64>, b: Option<f64>) -> Option<f64> {
	match (a, b) {
		(Some(a), Some(b)) if b != 0.0 => Some(a / b),
		_ => None,
	}
}

/// Cache point key, `(benchmark, dl1, ul2)`
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct BaselineKey {
	pub benchmark: String,
	pub dl1:       String,
	pub ul2:       String,
}

impl BaselineKey {
	/// Gets the key of a record.
	///
	/// Returns `None` if either cache level's geometry is undefined.
	pub fn of(record: &NormalizedRecord) -> Option<Self> {
		Some(Self {
			benchmark: record.summary.benchmark.clone(),
			dl1:       record.dl1_cfg()?.to_owned(),
			ul2:       record.ul2_cfg()?.to_owned(),
		})
	}
}

/// Running means of each metric.
///
/// Undefined samples are skipped, so each metric may have a different count.
#[derive(Clone, Debug)]
struct MetricsMean {
	dl1_miss_rate: Mean,
	ul2_miss_rate: Mean,
	ul2_demand:    Mean,
	cpi:           Mean,
}

impl MetricsMean {
	fn new() -> Self {
		Self {
			dl1_miss_rate: Mean::new(),
			ul2_miss_rate: Mean::new(),
			ul2_demand:    Mean::new(),
			cpi:           Mean::new(),
		}
	}

	fn add(&mut self, metrics: &CacheMetrics) {
		let samples = [
			(&mut self.dl1_miss_rate, metrics.dl1_miss_rate),
			(&mut self.ul2_miss_rate, metrics.ul2_miss_rate),
			(&mut self.ul2_demand, metrics.ul2_demand),
			(&mut self.cpi, metrics.cpi),
		];
		for (mean, sample) in samples {
			if let Some(sample) = sample {
				mean.add(sample);
			}
		}
	}

	fn finish(&self) -> CacheMetrics {
		let mean = |samples: &Mean| (!samples.is_empty()).then(|| samples.mean());
		CacheMetrics {
			dl1_miss_rate: mean(&self.dl1_miss_rate),
			ul2_miss_rate: mean(&self.ul2_miss_rate),
			ul2_demand:    mean(&self.ul2_demand),
			cpi:           mean(&self.cpi),
		}
	}
}

/// Computes the baseline means of every cache point with at least one baseline record
pub fn baseline_means(records: &[NormalizedRecord]) -> HashMap<BaselineKey, CacheMetrics> {
	let mut means = HashMap::<_, MetricsMean>::new();
	for record in records.iter().filter(|record| record.is_mode(mode::BASELINE)) {
		let Some(key) = BaselineKey::of(record) else {
			continue;
		};

		means
			.entry(key)
			.or_insert_with(MetricsMean::new)
			.add(&CacheMetrics::of(&record.summary));
	}

	means.into_iter().map(|(key, mean)| (key, mean.finish())).collect()
}

/// Normalized table
#[derive(Clone, Debug)]
pub struct Normalized {
	/// All records, in input order
	pub records: Vec<NormalizedRecord>,

	/// Records excluded by their mode
	pub excluded: usize,
}

impl Normalized {
	/// Number of records without a baseline at their cache point
	pub fn missing_baseline(&self) -> usize {
		self.records.iter().filter(|record| !record.has_baseline()).count()
	}
}

/// Normalizes all records.
///
/// Modes are normalized and excluded modes are dropped before anything else.
pub fn normalize(records: Vec<SummaryRecord>, config: &Config) -> Normalized {
	let parser = ConfigTagParser::new();

	// Prepare all records
	let total = records.len();
	let mut records = records
		.into_iter()
		.filter_map(|mut summary| {
			summary.mode = mode::normalize(&summary.mode);
			if config.is_excluded(&summary.mode) {
				return None;
			}

			let tag = parser.parse(&summary.config);
			Some(NormalizedRecord {
				summary,
				tag,
				baseline: None,
				norm: CacheMetrics::default(),
			})
		})
		.collect::<Vec<_>>();
	let excluded = total - records.len();

	// Note: The means are fully computed before any record is joined with them.
	let baselines = self::baseline_means(&records);
	for record in &mut records {
		let Some(baseline) = BaselineKey::of(record).and_then(|key| baselines.get(&key)) else {
			continue;
		};

		record.norm = CacheMetrics::of(&record.summary).zip_with(baseline, self::safe_div);
		record.baseline = Some(*baseline);
	}

	Normalized { records, excluded }
}

/// Reads the combined table
pub fn read_summary<R: io::Read>(reader: R) -> Result<Vec<SummaryRecord>, anyhow::Error> {
	let mut reader = csv::ReaderBuilder::new()
		.flexible(true)
		.trim(csv::Trim::All)
		.from_reader(reader);

	reader
		.deserialize::<RawRow>()
		.enumerate()
		.map(|(row_idx, row)| {
			let row = row.with_context(|| format!("Unable to decode row {row_idx}"))?;
			Ok(SummaryRecord::from_summary_row(&row))
		})
		.collect()
}

/// Reads the combined table from `path`.
///
/// # Errors
/// Returns an error if the file doesn't exist.
pub fn read_summary_file(path: &Path) -> Result<Vec<SummaryRecord>, anyhow::Error> {
	anyhow::ensure!(path.is_file(), "Missing input CSV: {path:?}");

	let file = fs::File::open(path).with_context(|| format!("Unable to open {path:?}"))?;
	self::read_summary(io::BufReader::new(file)).with_context(|| format!("Unable to read {path:?}"))
}

/// Writes the normalized table to `writer`
pub fn write_normalized<W: io::Write>(writer: W, records: &[NormalizedRecord]) -> Result<(), anyhow::Error> {
	let mut writer = csv::Writer::from_writer(writer);
	writer
		.write_record(NormalizedRecord::header())
		.context("Unable to write header")?;
	for record in records {
		writer.write_record(record.fields()).context("Unable to write record")?;
	}
	writer.flush().context("Unable to flush")?;

	Ok(())
}

/// Writes the normalized table to `config.normalized_path()`, overwriting it
pub fn write_normalized_file(config: &Config, normalized: &Normalized) -> Result<(), anyhow::Error> {
	let path = config.normalized_path();
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).with_context(|| format!("Unable to create directory {parent:?}"))?;
	}

	let file = fs::File::create(&path).with_context(|| format!("Unable to create {path:?}"))?;
	self::write_normalized(io::BufWriter::new(file), &normalized.records)
		.with_context(|| format!("Unable to write {path:?}"))?;

	tracing::info!("Wrote: {path:?} ({} rows)", normalized.records.len());
	Ok(())
}

/// Logs the operator summary of a normalization
pub fn log_summary(config: &Config, normalized: &Normalized) {
	let reference = &config.reference;
	tracing::info!(
		"Baseline missing for {} rows (no baseline at that benchmark+DL1+UL2 cache point).",
		normalized.missing_baseline()
	);
	tracing::info!("Reference cache point: DL1={} UL2={}", reference.dl1, reference.ul2);
	tracing::info!(
		"Reference knobs: VC={} MC={} SB_DEPTH={}",
		reference.vc_entries,
		reference.mc_entries,
		reference.sb_depth
	);
	tracing::info!(
		"Excluded modes: {:?} ({} rows dropped)",
		config.excluded_modes,
		normalized.excluded
	);
}

/// Reads the combined table, normalizes it and writes the normalized table
pub fn run(config: &Config) -> Result<Normalized, anyhow::Error> {
	let records = self::read_summary_file(&config.summary_path())?;
	let normalized = self::normalize(records, config);
	self::write_normalized_file(config, &normalized)?;
	self::log_summary(config, &normalized);

	Ok(normalized)
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::data::{Field, SubCacheStats},
	};

	const CACHE_POINT: &str = "dl1:1024:32:1:l__ul2:16384:64:4:l";

	fn record(config: &str, benchmark: &str, mode: &str, dl1_miss_rate: Option<f64>) -> SummaryRecord {
		SummaryRecord {
			config:             config.to_owned(),
			benchmark:          benchmark.to_owned(),
			mode:               mode.to_owned(),
			il1_miss_rate:      Field::default(),
			dl1_miss_rate:      dl1_miss_rate.map(Field::from).unwrap_or_default(),
			ul2_miss_rate:      Field::from(0.5),
			sim_num_insn:       Field::from(1_000_000.0),
			sim_elapsed_time:   Field::from(3.0),
			sim_cpi:            Field::from(2.0),
			vc:                 SubCacheStats::default(),
			mc:                 SubCacheStats::default(),
			sb:                 SubCacheStats::default(),
			sb_prefetches:      Field::default(),
			ul2_d_accesses:     Field::from(100.0),
			ul2_i_accesses:     Field::default(),
			ul2_total_accesses: Some(100.0),
			source_csv:         "ss_test.csv".to_owned(),
		}
	}

	fn approx_eq(lhs: Option<f64>, rhs: f64) -> bool {
		lhs.is_some_and(|lhs| (lhs - rhs).abs() < 1e-12)
	}

	fn find<'a>(normalized: &'a Normalized, mode: &str) -> &'a NormalizedRecord {
		normalized
			.records
			.iter()
			.find(|record| record.is_mode(mode))
			.expect("Missing record")
	}

	#[test]
	fn safe_div_undefined_cases() {
		assert_eq!(safe_div(Some(1.0), Some(4.0)), Some(0.25));
		assert_eq!(safe_div(Some(0.0), Some(4.0)), Some(0.0));
		assert_eq!(safe_div(Some(1.0), Some(0.0)), None);
		assert_eq!(safe_div(Some(1.0), Some(-0.0)), None);
		assert_eq!(safe_div(None, Some(4.0)), None);
		assert_eq!(safe_div(Some(1.0), None), None);
		assert_eq!(safe_div(Some(3.0), Some(0.5)), Some(6.0));
		assert_eq!(safe_div(Some(1.0), Some(1e-300)), Some(1.0 / 1e-300));
	}

	#[test]
	fn normalizes_against_baseline() {
		let records = vec![
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", Some(0.10)),
			record(&format!("victim_vc8__{CACHE_POINT}"), "gcc", " Victim ", Some(0.08)),
		];
		let normalized = normalize(records, &Config::default());
		assert_eq!(normalized.missing_baseline(), 0);

		let victim = find(&normalized, "victim");
		assert!(victim.has_baseline());
		assert!(approx_eq(victim.norm.dl1_miss_rate, 0.8));
		assert!(approx_eq(victim.norm.cpi, 1.0));
		assert_eq!(victim.tag.knobs.vc_entries, Some(8));

		let baseline = find(&normalized, "baseline");
		assert_eq!(baseline.norm.dl1_miss_rate, Some(1.0));
		assert_eq!(baseline.norm.ul2_demand, Some(1.0));
	}

	#[test]
	fn missing_baseline_is_undefined() {
		let records = vec![
			record(&format!("baseline__{CACHE_POINT}"), "mcf", "baseline", Some(0.10)),
			record(&format!("victim_vc8__{CACHE_POINT}"), "gcc", "victim", Some(0.08)),
		];
		let normalized = normalize(records, &Config::default());
		assert_eq!(normalized.missing_baseline(), 1);

		let victim = find(&normalized, "victim");
		assert!(!victim.has_baseline());
		assert_eq!(victim.norm, CacheMetrics::default());
	}

	#[test]
	fn baseline_means_ignore_other_modes() {
		let baseline_only = vec![
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", Some(0.10)),
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", Some(0.20)),
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", None),
		];
		let mut with_victim = baseline_only.clone();
		with_victim.push(record(&format!("victim_vc8__{CACHE_POINT}"), "gcc", "victim", Some(0.9)));

		let key = BaselineKey {
			benchmark: "gcc".to_owned(),
			dl1:       "dl1:1024:32:1:l".to_owned(),
			ul2:       "ul2:16384:64:4:l".to_owned(),
		};
		let means = |records: Vec<SummaryRecord>| {
			let normalized = normalize(records, &Config::default());
			baseline_means(&normalized.records)
		};

		let lhs = means(baseline_only);
		let rhs = means(with_victim);
		assert_eq!(lhs, rhs);
		assert_eq!(lhs.len(), 1);
		assert!(approx_eq(lhs[&key].dl1_miss_rate, 0.15));
		assert!(approx_eq(lhs[&key].cpi, 2.0));
	}

	#[test]
	fn undefined_geometry_never_joins() {
		let records = vec![
			record("baseline", "gcc", "baseline", Some(0.10)),
			record("victim_vc8", "gcc", "victim", Some(0.08)),
		];
		let normalized = normalize(records, &Config::default());
		assert_eq!(normalized.records.len(), 2);
		assert_eq!(normalized.missing_baseline(), 2);
		assert_eq!(find(&normalized, "victim").dl1_bytes(), None);
	}

	#[test]
	fn excluded_modes_are_dropped() {
		let records = vec![
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", Some(0.10)),
			record(&format!("stream_multi_d4__{CACHE_POINT}"), "gcc", "Stream_Multi", Some(0.05)),
		];
		let normalized = normalize(records, &Config::default());
		assert_eq!(normalized.excluded, 1);
		assert!(normalized.records.iter().all(|record| !record.is_mode("stream_multi")));

		let mut output = vec![];
		write_normalized(&mut output, &normalized.records).expect("Unable to write normalized table");
		let output = String::from_utf8(output).expect("Output wasn't utf-8");
		assert!(!output.contains("stream_multi"));
	}

	#[test]
	fn normalized_table_columns() {
		let records = vec![
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", Some(0.10)),
			record("victim_vc8", "gcc", "victim", Some(0.08)),
		];
		let normalized = normalize(records, &Config::default());

		let mut output = vec![];
		write_normalized(&mut output, &normalized.records).expect("Unable to write normalized table");
		let output = String::from_utf8(output).expect("Output wasn't utf-8");
		let lines = output.lines().collect::<Vec<_>>();
		assert_eq!(lines.len(), 3);

		let header = lines[0].split(',').collect::<Vec<_>>();
		assert_eq!(header.len(), SummaryRecord::HEADER.len() + NormalizedRecord::EXTRA_HEADER.len());
		assert_eq!(header.last(), Some(&"has_baseline_for_cachepoint"));

		let baseline = lines[1].split(',').skip(SummaryRecord::HEADER.len()).collect::<Vec<_>>();
		assert_eq!(baseline, [
			"dl1:1024:32:1:l",
			"ul2:16384:64:4:l",
			"32768",
			"4194304",
			"",
			"",
			"",
			"100",
			"0.1",
			"0.5",
			"100",
			"2",
			"1",
			"1",
			"1",
			"1",
			"true"
		]);

		let victim = lines[2].split(',').skip(SummaryRecord::HEADER.len()).collect::<Vec<_>>();
		assert_eq!(victim, ["", "", "", "", "8", "", "", "100", "", "", "", "", "", "", "", "", "false"]);
	}

	#[test]
	fn read_summary_round_trips_written_table() {
		let records = vec![
			record(&format!("baseline__{CACHE_POINT}"), "gcc", "baseline", Some(0.10)),
			record(&format!("victim_vc8__{CACHE_POINT}"), "gcc", "victim", None),
		];
		let mut output = vec![];
		crate::collect::write_summary(&mut output, &records).expect("Unable to write summary");

		let read = read_summary(output.as_slice()).expect("Unable to read summary");
		assert_eq!(read, records);
	}

	#[test]
	fn missing_summary_is_fatal() {
		let path = std::env::temp_dir().join("ssresults-missing-summary.csv");
		let err = read_summary_file(&path).expect_err("Missing file was read");
		assert!(err.to_string().contains("Missing input CSV"));
	}
}
