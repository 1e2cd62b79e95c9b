//! Experiment modes and mechanism knobs

/// Name of the baseline mode
pub const BASELINE: &str = "baseline";

/// Normalizes a mode name for comparison
pub fn normalize(mode: &str) -> String {
	mode.trim().to_lowercase()
}

/// Known mechanism combinations.
///
/// Other modes may appear in the data, they just don't have
/// any knobs we know to fix.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Mechanism {
	Baseline,
	Victim,
	Miss,
	Stream,
	VictimStream,
	MissStream,
}

impl Mechanism {
	/// All mechanisms, in canonical order
	pub const ALL: [Self; 6] = [
		Self::Baseline,
		Self::Victim,
		Self::Miss,
		Self::Stream,
		Self::VictimStream,
		Self::MissStream,
	];

	/// Gets the mechanism of a (normalized) mode
	pub fn from_mode(mode: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|mechanism| mechanism.name() == mode)
	}

	/// Returns the mode name of this mechanism
	pub const fn name(self) -> &'static str {
		match self {
			Self::Baseline => BASELINE,
			Self::Victim => "victim",
			Self::Miss => "miss",
			Self::Stream => "stream",
			Self::VictimStream => "victim_stream",
			Self::MissStream => "miss_stream",
		}
	}

	/// Returns the knobs this mechanism is parameterized by
	pub const fn knobs(self) -> &'static [Knob] {
		match self {
			Self::Baseline => &[],
			Self::Victim => &[Knob::VcEntries],
			Self::Miss => &[Knob::McEntries],
			Self::Stream => &[Knob::SbDepth],
			Self::VictimStream => &[Knob::VcEntries, Knob::SbDepth],
			Self::MissStream => &[Knob::McEntries, Knob::SbDepth],
		}
	}
}

/// Mechanism knob
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Knob {
	/// Victim cache entries
	VcEntries,

	/// Miss cache entries
	McEntries,

	/// Stream buffer depth
	SbDepth,
}

impl Knob {
	/// Column name
	pub const fn name(self) -> &'static str {
		match self {
			Self::VcEntries => "vc_entries",
			Self::McEntries => "mc_entries",
			Self::SbDepth => "sb_depth",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_trims_and_lowercases() {
		assert_eq!(normalize("  Victim_Stream \t"), "victim_stream");
		assert_eq!(normalize("BASELINE"), BASELINE);
	}

	#[test]
	fn mechanism_round_trips_names() {
		for mechanism in Mechanism::ALL {
			assert_eq!(Mechanism::from_mode(mechanism.name()), Some(mechanism));
		}
		assert_eq!(Mechanism::from_mode("stream_multi"), None);
	}
}
