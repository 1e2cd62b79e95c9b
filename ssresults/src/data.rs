//! Tables.
//!
//! Counters copied from the result files keep their text, which is
//! written back unchanged, next to the parsed value used for computing.
//! Derived numbers are kept as `Option<f64>` in memory. Only when writing
//! does `None` become the empty field.

// Imports
use {
	crate::config_tag::ConfigTag,
	ssresults_util::{fixed_field, FieldDisplay, ParseField},
};

/// Decimals used when writing hit rates
pub const HIT_RATE_DECIMALS: usize = 4;

/// Row of a result table, as read.
///
/// Used for both per-run result files and the combined table. Columns
/// that are missing from the table are `None`, and unknown ones are ignored.
#[derive(Clone, Default, Debug)]
#[derive(serde::Deserialize)]
#[serde(default)]
pub struct RawRow {
	pub config:             Option<String>,
	pub benchmark:          Option<String>,
	pub mode:               Option<String>,
	pub il1_miss_rate:      Option<String>,
	pub dl1_miss_rate:      Option<String>,
	pub ul2_miss_rate:      Option<String>,
	pub sim_num_insn:       Option<String>,
	pub sim_elapsed_time:   Option<String>,
	#[serde(rename = "sim_CPI")]
	pub sim_cpi:            Option<String>,
	pub vc_lookups:         Option<String>,
	pub vc_hits:            Option<String>,
	pub vc_hit_rate:        Option<String>,
	pub mc_lookups:         Option<String>,
	pub mc_hits:            Option<String>,
	pub mc_hit_rate:        Option<String>,
	pub sb_lookups:         Option<String>,
	pub sb_hits:            Option<String>,
	pub sb_hit_rate:        Option<String>,
	pub sb_prefetches:      Option<String>,
	pub ul2_d_accesses:     Option<String>,
	pub ul2_i_accesses:     Option<String>,
	pub ul2_total_accesses: Option<String>,
	pub source_csv:         Option<String>,
}

/// Parses an optional raw field
fn num(field: &Option<String>) -> Option<f64> {
	field.as_deref().and_then(|field| field.parse_field())
}

/// Copied counter
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Field {
	/// Text, trimmed
	pub text: String,

	/// Value, if the text is a number
	pub value: Option<f64>,
}

impl Field {
	/// Creates a field from its text
	pub fn new(text: &str) -> Self {
		let text = text.trim();
		Self {
			text:  text.to_owned(),
			value: text.parse_field(),
		}
	}

	/// Creates a field from an optional raw field
	fn read(field: &Option<String>) -> Self {
		Self::new(field.as_deref().unwrap_or_default())
	}
}

impl From<f64> for Field {
	fn from(value: f64) -> Self {
		Self::new(&value.to_string())
	}
}

/// Trims an optional raw field
fn text(field: &Option<String>) -> String {
	field.as_deref().unwrap_or_default().trim().to_owned()
}

/// Sub-cache counters
#[derive(Clone, PartialEq, Default, Debug)]
pub struct SubCacheStats {
	pub lookups:  Field,
	pub hits:     Field,
	pub hit_rate: Option<f64>,
}

impl SubCacheStats {
	/// Creates the stats from the raw counters, deriving the hit rate
	pub fn from_counters(lookups: Field, hits: Field) -> Self {
		let hit_rate = self::hit_rate(hits.value, lookups.value);
		Self {
			lookups,
			hits,
			hit_rate,
		}
	}
}

/// Hit rate, `hits / lookups`.
///
/// Undefined if either is undefined or `lookups` isn't positive.
pub fn hit_rate(hits: Option<f64>, lookups: Option<f64>) -> Option<f64> {
	match (hits, lookups) {
		(Some(hits), Some(lookups)) if lookups > 0.0 => Some(hits / lookups),
		_ => None,
	}
}

/// Total level-2 accesses, `demand + instruction`.
///
/// Undefined only if both are undefined, otherwise a missing one counts as 0.
pub fn total_accesses(demand: Option<f64>, instruction: Option<f64>) -> Option<f64> {
	match (demand, instruction) {
		(None, None) => None,
		(demand, instruction) => Some(demand.unwrap_or(0.0) + instruction.unwrap_or(0.0)),
	}
}

/// Combined table record.
///
/// One per (configuration, benchmark, mode) in each result file.
#[derive(Clone, PartialEq, Debug)]
pub struct SummaryRecord {
	/// Configuration tag
	pub config: String,

	/// Benchmark
	pub benchmark: String,

	/// Mode
	pub mode: String,

	pub il1_miss_rate:    Field,
	pub dl1_miss_rate:    Field,
	pub ul2_miss_rate:    Field,
	pub sim_num_insn:     Field,
	pub sim_elapsed_time: Field,
	pub sim_cpi:          Field,

	/// Victim cache
	pub vc: SubCacheStats,

	/// Miss cache
	pub mc: SubCacheStats,

	/// Stream buffer
	pub sb: SubCacheStats,

	/// Stream buffer prefetches
	pub sb_prefetches: Field,

	pub ul2_d_accesses:     Field,
	pub ul2_i_accesses:     Field,
	pub ul2_total_accesses: Option<f64>,

	/// Result file this record came from
	pub source_csv: String,
}

impl SummaryRecord {
	/// Column names, in order
	pub const HEADER: [&'static str; 23] = [
		"config",
		"benchmark",
		"mode",
		"il1_miss_rate",
		"dl1_miss_rate",
		"ul2_miss_rate",
		"sim_num_insn",
		"sim_elapsed_time",
		"sim_CPI",
		"vc_lookups",
		"vc_hits",
		"vc_hit_rate",
		"mc_lookups",
		"mc_hits",
		"mc_hit_rate",
		"sb_lookups",
		"sb_hits",
		"sb_hit_rate",
		"sb_prefetches",
		"ul2_d_accesses",
		"ul2_i_accesses",
		"ul2_total_accesses",
		"source_csv",
	];

	/// Creates a record from a row of a per-run result file, deriving
	/// the hit rates and total accesses.
	///
	/// Returns `None` if the row has no benchmark, or is a repeated header.
	pub fn from_result_row(config: &str, source_csv: &str, row: &RawRow) -> Option<Self> {
		let benchmark = self::text(&row.benchmark);
		if benchmark.is_empty() || benchmark.eq_ignore_ascii_case("benchmark") {
			return None;
		}

		let ul2_d_accesses = Field::read(&row.ul2_d_accesses);
		let ul2_i_accesses = Field::read(&row.ul2_i_accesses);
		let ul2_total_accesses = self::total_accesses(ul2_d_accesses.value, ul2_i_accesses.value);
		Some(Self {
			config:             config.to_owned(),
			benchmark,
			mode:               self::text(&row.mode),
			il1_miss_rate:      Field::read(&row.il1_miss_rate),
			dl1_miss_rate:      Field::read(&row.dl1_miss_rate),
			ul2_miss_rate:      Field::read(&row.ul2_miss_rate),
			sim_num_insn:       Field::read(&row.sim_num_insn),
			sim_elapsed_time:   Field::read(&row.sim_elapsed_time),
			sim_cpi:            Field::read(&row.sim_cpi),
			vc:                 SubCacheStats::from_counters(Field::read(&row.vc_lookups), Field::read(&row.vc_hits)),
			mc:                 SubCacheStats::from_counters(Field::read(&row.mc_lookups), Field::read(&row.mc_hits)),
			sb:                 SubCacheStats::from_counters(Field::read(&row.sb_lookups), Field::read(&row.sb_hits)),
			sb_prefetches:      Field::read(&row.sb_prefetches),
			ul2_d_accesses,
			ul2_i_accesses,
			ul2_total_accesses,
			source_csv:         source_csv.to_owned(),
		})
	}

	/// Creates a record from a row of the combined table.
	///
	/// Derived columns are taken as written, not re-derived.
	pub fn from_summary_row(row: &RawRow) -> Self {
		Self {
			config:             self::text(&row.config),
			benchmark:          self::text(&row.benchmark),
			mode:               self::text(&row.mode),
			il1_miss_rate:      Field::read(&row.il1_miss_rate),
			dl1_miss_rate:      Field::read(&row.dl1_miss_rate),
			ul2_miss_rate:      Field::read(&row.ul2_miss_rate),
			sim_num_insn:       Field::read(&row.sim_num_insn),
			sim_elapsed_time:   Field::read(&row.sim_elapsed_time),
			sim_cpi:            Field::read(&row.sim_cpi),
			vc:                 SubCacheStats {
				lookups:  Field::read(&row.vc_lookups),
				hits:     Field::read(&row.vc_hits),
				hit_rate: self::num(&row.vc_hit_rate),
			},
			mc:                 SubCacheStats {
				lookups:  Field::read(&row.mc_lookups),
				hits:     Field::read(&row.mc_hits),
				hit_rate: self::num(&row.mc_hit_rate),
			},
			sb:                 SubCacheStats {
				lookups:  Field::read(&row.sb_lookups),
				hits:     Field::read(&row.sb_hits),
				hit_rate: self::num(&row.sb_hit_rate),
			},
			sb_prefetches:      Field::read(&row.sb_prefetches),
			ul2_d_accesses:     Field::read(&row.ul2_d_accesses),
			ul2_i_accesses:     Field::read(&row.ul2_i_accesses),
			ul2_total_accesses: self::num(&row.ul2_total_accesses),
			source_csv:         self::text(&row.source_csv),
		}
	}

	/// Fields, in [`Self::HEADER`] order
	pub fn fields(&self) -> Vec<String> {
		let hit_rate = |stats: &SubCacheStats| fixed_field(stats.hit_rate, HIT_RATE_DECIMALS);
		vec![
			self.config.clone(),
			self.benchmark.clone(),
			self.mode.clone(),
			self.il1_miss_rate.text.clone(),
			self.dl1_miss_rate.text.clone(),
			self.ul2_miss_rate.text.clone(),
			self.sim_num_insn.text.clone(),
			self.sim_elapsed_time.text.clone(),
			self.sim_cpi.text.clone(),
			self.vc.lookups.text.clone(),
			self.vc.hits.text.clone(),
			hit_rate(&self.vc),
			self.mc.lookups.text.clone(),
			self.mc.hits.text.clone(),
			hit_rate(&self.mc),
			self.sb.lookups.text.clone(),
			self.sb.hits.text.clone(),
			hit_rate(&self.sb),
			self.sb_prefetches.text.clone(),
			self.ul2_d_accesses.text.clone(),
			self.ul2_i_accesses.text.clone(),
			self.ul2_total_accesses.to_field(),
			self.source_csv.clone(),
		]
	}
}

/// Metrics normalized against the baseline
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CacheMetrics {
	pub dl1_miss_rate: Option<f64>,
	pub ul2_miss_rate: Option<f64>,
	pub ul2_demand:    Option<f64>,
	pub cpi:           Option<f64>,
}

impl CacheMetrics {
	/// Gets the metrics of a record
	pub fn of(record: &SummaryRecord) -> Self {
		Self {
			dl1_miss_rate: record.dl1_miss_rate.value,
			ul2_miss_rate: record.ul2_miss_rate.value,
			ul2_demand:    record.ul2_total_accesses,
			cpi:           record.sim_cpi.value,
		}
	}

	/// Combines two metrics field-by-field
	pub fn zip_with(&self, other: &Self, mut f: impl FnMut(Option<f64>, Option<f64>) -> Option<f64>) -> Self {
		Self {
			dl1_miss_rate: f(self.dl1_miss_rate, other.dl1_miss_rate),
			ul2_miss_rate: f(self.ul2_miss_rate, other.ul2_miss_rate),
			ul2_demand:    f(self.ul2_demand, other.ul2_demand),
			cpi:           f(self.cpi, other.cpi),
		}
	}

	/// Fields, in order `dl1_miss_rate, ul2_miss_rate, ul2_demand, cpi`
	fn fields(&self) -> [String; 4] {
		[
			self.dl1_miss_rate.to_field(),
			self.ul2_miss_rate.to_field(),
			self.ul2_demand.to_field(),
			self.cpi.to_field(),
		]
	}
}

/// Normalized table record
#[derive(Clone, PartialEq, Debug)]
pub struct NormalizedRecord {
	/// Combined table record, with a normalized mode
	pub summary: SummaryRecord,

	/// Parsed configuration tag
	pub tag: ConfigTag,

	/// Baseline means at this record's cache point, if any baseline exists
	pub baseline: Option<CacheMetrics>,

	/// Metrics divided by the baseline means
	pub norm: CacheMetrics,
}

impl NormalizedRecord {
	/// Column names appended to [`SummaryRecord::HEADER`]
	pub const EXTRA_HEADER: [&'static str; 17] = [
		"dl1_cfg",
		"ul2_cfg",
		"dl1_bytes",
		"ul2_bytes",
		"vc_entries",
		"mc_entries",
		"sb_depth",
		"ul2_demand",
		"dl1_miss_base",
		"ul2_miss_base",
		"ul2_demand_base",
		"cpi_base",
		"dl1_miss_norm",
		"ul2_miss_norm",
		"ul2_demand_norm",
		"cpi_norm",
		"has_baseline_for_cachepoint",
	];

	/// All column names, in order
	pub fn header() -> impl Iterator<Item = &'static str> {
		SummaryRecord::HEADER.into_iter().chain(Self::EXTRA_HEADER)
	}

	/// Returns if this record's mode is `mode`
	pub fn is_mode(&self, mode: &str) -> bool {
		self.summary.mode == mode
	}

	/// Returns if a baseline exists at this record's cache point
	pub fn has_baseline(&self) -> bool {
		self.baseline.is_some()
	}

	/// Level-1 data cache capacity
	pub fn dl1_bytes(&self) -> Option<u64> {
		self.tag.dl1.as_ref()?.capacity
	}

	/// Level-2 unified cache capacity
	pub fn ul2_bytes(&self) -> Option<u64> {
		self.tag.ul2.as_ref()?.capacity
	}

	/// Level-1 data cache token
	pub fn dl1_cfg(&self) -> Option<&str> {
		self.tag.dl1.as_ref().map(|geometry| geometry.token.as_str())
	}

	/// Level-2 unified cache token
	pub fn ul2_cfg(&self) -> Option<&str> {
		self.tag.ul2.as_ref().map(|geometry| geometry.token.as_str())
	}

	/// Fields, in [`Self::header`] order
	pub fn fields(&self) -> Vec<String> {
		let baseline = self.baseline.unwrap_or_default();
		let mut fields = self.summary.fields();
		fields.extend([
			self.dl1_cfg().unwrap_or_default().to_owned(),
			self.ul2_cfg().unwrap_or_default().to_owned(),
			self.dl1_bytes().to_field(),
			self.ul2_bytes().to_field(),
			self.tag.knobs.vc_entries.to_field(),
			self.tag.knobs.mc_entries.to_field(),
			self.tag.knobs.sb_depth.to_field(),
			self.summary.ul2_total_accesses.to_field(),
		]);
		fields.extend(baseline.fields());
		fields.extend(self.norm.fields());
		fields.push(self.has_baseline().to_string());

		fields
	}
}
