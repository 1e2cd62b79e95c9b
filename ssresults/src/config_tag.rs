//! Configuration tag parsing.
//!
//! A configuration tag is the name of a run's result directory, e.g.
//! `victim_stream_vc8_d4__dl1:1024:32:1:l__ul2:16384:64:4:l`.
//! It may embed a geometry token for each cache level, and any number
//! of `<prefix><digits>` knob tokens.

// Imports
use {crate::mode::Knob, regex::Regex, ssresults_util::ParseField};

/// Cache level
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CacheLevel {
	/// Level-1 data cache
	Dl1,

	/// Level-2 unified cache
	Ul2,
}

impl CacheLevel {
	/// Token marker of this level
	pub const fn marker(self) -> &'static str {
		match self {
			Self::Dl1 => "dl1",
			Self::Ul2 => "ul2",
		}
	}
}

/// Cache geometry, `<name>:<sets>:<block-size>:<associativity>:<policy>`
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct CacheGeometry {
	/// Token, lowercased
	pub token: String,

	/// Capacity, in bytes.
	///
	/// `None` if any component overflows.
	pub capacity: Option<u64>,
}

impl CacheGeometry {
	/// Builds a geometry from a (lowercased) token.
	fn from_token(token: String) -> Self {
		let capacity = self::token_capacity(&token);
		Self { token, capacity }
	}
}

/// Computes `sets * block_size * associativity` from a geometry token
fn token_capacity(token: &str) -> Option<u64> {
	let mut parts = token.split(':').skip(1);
	let mut next = || parts.next()?.parse_field_u64();
	let (sets, block_size, assoc) = (next()?, next()?, next()?);

	sets.checked_mul(block_size)?.checked_mul(assoc)
}

/// Knob values
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct Knobs {
	/// Victim cache entries (`vc<N>`)
	pub vc_entries: Option<u64>,

	/// Miss cache entries (`mc<N>`)
	pub mc_entries: Option<u64>,

	/// Stream buffer depth (`d<N>`)
	pub sb_depth: Option<u64>,
}

impl Knobs {
	/// Returns the value of `knob`
	pub fn get(&self, knob: Knob) -> Option<u64> {
		match knob {
			Knob::VcEntries => self.vc_entries,
			Knob::McEntries => self.mc_entries,
			Knob::SbDepth => self.sb_depth,
		}
	}
}

/// Parsed configuration tag
#[derive(PartialEq, Eq, Clone, Default, Debug)]
pub struct ConfigTag {
	/// Level-1 data cache
	pub dl1: Option<CacheGeometry>,

	/// Level-2 unified cache
	pub ul2: Option<CacheGeometry>,

	/// Knobs
	pub knobs: Knobs,
}

/// Configuration tag parser
#[derive(Clone, Debug)]
pub struct ConfigTagParser {
	/// Geometry tokens of any level
	geometry: Regex,

	/// `vc<N>`
	vc_entries: Regex,

	/// `mc<N>`
	mc_entries: Regex,

	/// `d<N>`
	sb_depth: Regex,
}

impl ConfigTagParser {
	/// Creates the parser
	pub fn new() -> Self {
		let geometry = Regex::new(r"(?i)(dl1:\d+:\d+:\d+:[lfr])|(ul2:\d+:\d+:\d+:[lfr])").expect("Invalid geometry regex");
		let knob = |prefix: &str| {
			Regex::new(&format!(r"(?:^|_){prefix}(\d+)(?:_|$)")).expect("Invalid knob regex")
		};

		Self {
			geometry,
			vc_entries: knob("vc"),
			mc_entries: knob("mc"),
			sb_depth:   knob("d"),
		}
	}

	/// Parses a configuration tag.
	///
	/// Never fails: anything not found is left as `None`.
	pub fn parse(&self, tag: &str) -> ConfigTag {
		// Note: If a level appears more than once, the last token wins.
		let mut dl1 = None;
		let mut ul2 = None;
		for token in self.geometry.find_iter(tag) {
			let token = token.as_str().to_lowercase();
			if token.starts_with(CacheLevel::Dl1.marker()) {
				dl1 = Some(token);
			} else if token.starts_with(CacheLevel::Ul2.marker()) {
				ul2 = Some(token);
			}
		}

		let tag = tag.to_lowercase();
		let knob = |regex: &Regex| regex.captures(&tag)?.get(1)?.as_str().parse_field_u64();

		ConfigTag {
			dl1:   dl1.map(CacheGeometry::from_token),
			ul2:   ul2.map(CacheGeometry::from_token),
			knobs: Knobs {
				vc_entries: knob(&self.vc_entries),
				mc_entries: knob(&self.mc_entries),
				sb_depth:   knob(&self.sb_depth),
			},
		}
	}
}

impl Default for ConfigTagParser {
	fn default() -> Self {
		Self::new()
	}
}
