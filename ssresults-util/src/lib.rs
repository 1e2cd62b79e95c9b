//! Utilities

// Modules
pub mod logger;

/// Extension trait for parsing a raw table field into a number
#[extend::ext(name = ParseField)]
pub impl str {
	/// Parses this field as a number.
	///
	/// Leading and trailing whitespace is ignored. Returns `None` if the
	/// field is empty, isn't a number, or is `NaN`.
	fn parse_field(&self) -> Option<f64> {
		let field = self.trim();
		if field.is_empty() {
			return None;
		}

		field.parse::<f64>().ok().filter(|value| !value.is_nan())
	}

	/// Parses this field as an unsigned integer.
	///
	/// Leading and trailing whitespace is ignored. Returns `None` if the
	/// trimmed field isn't a decimal integer that fits in a `u64`, which
	/// includes empty fields, signs other than `+`, fractions and `NaN`.
	fn parse_field_u64(&self) -> Option<u64> {
		self.trim().parse::<u64>().ok()
	}
}

/// Extension trait to write an optional number as a table field
#[extend::ext(name = FieldDisplay)]
pub impl<T: ToString> Option<T> {
	/// Formats this value, with `None` becoming the empty field
	fn to_field(&self) -> String {
		match self {
			Some(value) => value.to_string(),
			None => String::new(),
		}
	}
}

/// Formats `value` with a fixed number of decimals, with `None` becoming the empty field
#[must_use]
pub fn fixed_field(value: Option<f64>, decimals: usize) -> String {
	match value {
		Some(value) => format!("{value:.decimals$}"),
		None => String::new(),
	}
}
