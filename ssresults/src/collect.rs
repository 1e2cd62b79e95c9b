//! Collector.
//!
//! Flattens every per-run result file under the results root into
//! the combined table.

// Imports
use {
	crate::{
		config::Config,
		data::{RawRow, SummaryRecord},
	},
	anyhow::Context,
	std::{
		fs,
		io,
		path::{Path, PathBuf},
	},
};

/// Finds all result files under `config.results_root`, in path order.
///
/// The combined table itself is never included.
pub fn find_result_files(config: &Config) -> Result<Vec<PathBuf>, anyhow::Error> {
	let root = &config.results_root;
	anyhow::ensure!(root.is_dir(), "Missing results directory: {root:?}");

	let summary_path = config.summary_path();
	let mut files = vec![];
	for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
		let entry = entry.with_context(|| format!("Unable to walk results directory {root:?}"))?;
		if !entry.file_type().is_file() || !self::is_result_file(config, entry.path()) {
			continue;
		}

		if self::is_same_file(entry.path(), &summary_path) {
			tracing::debug!(path = ?entry.path(), "Skipping combined table");
			continue;
		}

		files.push(entry.into_path());
	}

	Ok(files)
}

/// Returns if `path` follows the result file naming convention
fn is_result_file(config: &Config, path: &Path) -> bool {
	let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
		return false;
	};
	let has_ext = path
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext == config.result_file_extension);

	file_name.starts_with(&config.result_file_prefix) && has_ext
}

/// Returns if `lhs` and `rhs` point to the same file.
///
/// If either can't be canonicalized (e.g. it doesn't exist yet), compares them as-is.
fn is_same_file(lhs: &Path, rhs: &Path) -> bool {
	match (fs::canonicalize(lhs), fs::canonicalize(rhs)) {
		(Ok(lhs), Ok(rhs)) => lhs == rhs,
		_ => lhs == rhs,
	}
}

/// Returns the configuration tag of a result file.
///
/// This is the first component of its path relative to `root`.
pub fn config_tag_of(root: &Path, path: &Path) -> Option<String> {
	let relative = path.strip_prefix(root).ok()?;
	let component = relative.components().next()?;

	Some(component.as_os_str().to_string_lossy().into_owned())
}

/// Reads all records of a result table.
///
/// Rows that can't be decoded are skipped with a warning.
pub fn read_results<R: io::Read>(reader: R, config_tag: &str, source: &str) -> Result<Vec<SummaryRecord>, anyhow::Error> {
	let mut reader = csv::ReaderBuilder::new()
		.flexible(true)
		.trim(csv::Trim::All)
		.from_reader(reader);

	let mut records = vec![];
	for (row_idx, row) in reader.deserialize::<RawRow>().enumerate() {
		let row = match row {
			Ok(row) => row,
			Err(err) => {
				tracing::warn!(?source, row_idx, ?err, "Skipping undecodable row");
				continue;
			},
		};

		match SummaryRecord::from_result_row(config_tag, source, &row) {
			Some(record) => records.push(record),
			None => tracing::trace!(?source, row_idx, "Skipping row without a benchmark"),
		}
	}

	Ok(records)
}

/// Collects all records under `config.results_root`
pub fn collect(config: &Config) -> Result<Vec<SummaryRecord>, anyhow::Error> {
	let root = &config.results_root;
	let files = self::find_result_files(config).context("Unable to find result files")?;
	tracing::debug!(files = files.len(), ?root, "Found result files");

	let mut records = vec![];
	for path in files {
		let config_tag = self::config_tag_of(root, &path).with_context(|| format!("Result file {path:?} is outside of {root:?}"))?;

		// Note: The file is fully read and closed before we open the next.
		let file = fs::File::open(&path).with_context(|| format!("Unable to open result file {path:?}"))?;
		let source = path.to_string_lossy();
		let file_records = self::read_results(io::BufReader::new(file), &config_tag, &source)
			.with_context(|| format!("Unable to read result file {path:?}"))?;

		tracing::trace!(?path, %config_tag, records = file_records.len(), "Read result file");
		records.extend(file_records);
	}

	Ok(records)
}

/// Writes the combined table to `writer`
pub fn write_summary<W: io::Write>(writer: W, records: &[SummaryRecord]) -> Result<(), anyhow::Error> {
	let mut writer = csv::Writer::from_writer(writer);
	writer
		.write_record(SummaryRecord::HEADER)
		.context("Unable to write header")?;
	for record in records {
		writer.write_record(record.fields()).context("Unable to write record")?;
	}
	writer.flush().context("Unable to flush")?;

	Ok(())
}

/// Collects all records and writes the combined table, overwriting it.
///
/// Returns the number of records written.
pub fn run(config: &Config) -> Result<usize, anyhow::Error> {
	let records = self::collect(config)?;

	let summary_path = config.summary_path();
	if let Some(parent) = summary_path.parent() {
		fs::create_dir_all(parent).with_context(|| format!("Unable to create directory {parent:?}"))?;
	}
	let summary_file =
		fs::File::create(&summary_path).with_context(|| format!("Unable to create combined table {summary_path:?}"))?;
	self::write_summary(io::BufWriter::new(summary_file), &records)
		.with_context(|| format!("Unable to write combined table {summary_path:?}"))?;

	tracing::info!("Wrote summary of {} rows to {summary_path:?}", records.len());
	Ok(records.len())
}

#[cfg(test)]
mod tests {
	use {super::*, std::env};

	/// Creates an empty, unique, temporary directory
	fn temp_dir(name: &str) -> PathBuf {
		let path = env::temp_dir().join(format!("ssresults-{name}-{}", std::process::id()));
		let _ = fs::remove_dir_all(&path);
		fs::create_dir_all(&path).expect("Unable to create temporary directory");
		path
	}

	const RESULTS: &str = "\
benchmark,mode,dl1_miss_rate,sim_CPI,vc_lookups,vc_hits,ul2_d_accesses,ul2_i_accesses
gcc,victim,0.08,1.5,400,100,1000,24
benchmark,mode,dl1_miss_rate,sim_CPI,vc_lookups,vc_hits,ul2_d_accesses,ul2_i_accesses
,victim,0.1,1.0,,,,
mcf, victim ,bad,2.0,0,0,,
";

	#[test]
	fn read_results_skips_junk_rows() {
		let records = read_results(RESULTS.as_bytes(), "victim_vc8", "ss_victim.csv").expect("Unable to read results");
		assert_eq!(records.len(), 2);

		let gcc = &records[0];
		assert_eq!(gcc.benchmark, "gcc");
		assert_eq!(gcc.config, "victim_vc8");
		assert_eq!(gcc.vc.hit_rate, Some(0.25));
		assert_eq!(gcc.ul2_total_accesses, Some(1024.0));
		assert_eq!(gcc.source_csv, "ss_victim.csv");

		let mcf = &records[1];
		assert_eq!(mcf.mode, "victim");
		assert_eq!(mcf.dl1_miss_rate.value, None);
		assert_eq!(mcf.sim_cpi.value, Some(2.0));
		assert_eq!(mcf.vc.hit_rate, None);
		assert_eq!(mcf.ul2_total_accesses, None);
	}

	#[test]
	fn config_tag_is_first_component() {
		let root = Path::new("results/ss");
		assert_eq!(
			config_tag_of(root, Path::new("results/ss/victim_vc8__dl1:64:32:1:l/run1/ss_a.csv")).as_deref(),
			Some("victim_vc8__dl1:64:32:1:l")
		);
		assert_eq!(config_tag_of(root, Path::new("other/ss_a.csv")), None);
	}

	#[test]
	fn write_summary_header_and_empty_fields() {
		let records = read_results(RESULTS.as_bytes(), "victim_vc8", "ss_victim.csv").expect("Unable to read results");
		let mut output = vec![];
		write_summary(&mut output, &records).expect("Unable to write summary");

		let output = String::from_utf8(output).expect("Summary wasn't utf-8");
		let mut lines = output.lines();
		assert_eq!(lines.next(), Some(SummaryRecord::HEADER.join(",").as_str()));
		assert_eq!(
			lines.next(),
			Some("victim_vc8,gcc,victim,,0.08,,,,1.5,400,100,0.2500,,,,,,,,1000,24,1024,ss_victim.csv")
		);
		assert_eq!(lines.next(), Some("victim_vc8,mcf,victim,,bad,,,,2.0,0,0,,,,,,,,,,,,ss_victim.csv"));
		assert_eq!(lines.next(), None);
	}

	#[test]
	fn counters_are_copied_verbatim() {
		let results = "\
benchmark,mode,dl1_miss_rate,sim_num_insn,ul2_d_accesses
gcc,baseline, 0.0800 ,9007199254740993,12345678901234567891
";
		let records = read_results(results.as_bytes(), "baseline", "s").expect("Unable to read results");
		let mut output = vec![];
		write_summary(&mut output, &records).expect("Unable to write summary");

		let output = String::from_utf8(output).expect("Summary wasn't utf-8");
		assert_eq!(
			output.lines().nth(1),
			Some("baseline,gcc,baseline,,0.0800,,9007199254740993,,,,,,,,,,,,,12345678901234567891,,12345678901234567000,s")
		);
	}

	#[test]
	fn run_collects_tree_and_skips_summary() {
		let root = temp_dir("collect");
		let config = Config {
			results_root: root.clone(),
			..Config::default()
		};

		let baseline_dir = root.join("baseline__dl1:1024:32:1:l__ul2:16384:64:4:l");
		let victim_dir = root.join("victim_vc4__dl1:1024:32:1:l__ul2:16384:64:4:l").join("nested");
		fs::create_dir_all(&baseline_dir).expect("Unable to create directory");
		fs::create_dir_all(&victim_dir).expect("Unable to create directory");
		fs::write(baseline_dir.join("ss_baseline.csv"), "benchmark,mode,dl1_miss_rate\ngcc,baseline,0.1\n")
			.expect("Unable to write results");
		fs::write(victim_dir.join("ss_victim.csv"), "benchmark,mode,dl1_miss_rate\ngcc,victim,0.08\n")
			.expect("Unable to write results");
		fs::write(victim_dir.join("notes.csv"), "benchmark,mode\nignored,victim\n").expect("Unable to write notes");

		// Running twice must not pick up the combined table
		assert_eq!(run(&config).expect("Unable to collect"), 2);
		assert_eq!(run(&config).expect("Unable to collect"), 2);

		let summary = fs::read_to_string(config.summary_path()).expect("Unable to read summary");
		assert_eq!(summary.lines().count(), 3);
		assert!(summary.contains("baseline__dl1:1024:32:1:l__ul2:16384:64:4:l,gcc,baseline"));
		assert!(summary.contains("victim_vc4__dl1:1024:32:1:l__ul2:16384:64:4:l,gcc,victim"));

		fs::remove_dir_all(&root).expect("Unable to remove temporary directory");
	}

	#[test]
	fn missing_root_is_fatal() {
		let config = Config {
			results_root: env::temp_dir().join("ssresults-does-not-exist"),
			..Config::default()
		};
		assert!(collect(&config).is_err());
	}
}
