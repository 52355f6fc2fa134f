use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Structural address of a verse, shared by every variant of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
	pub corpus_part: String,
	pub subpart_index: i32,
	pub item_index: i32,
}
impl LocationKey {
	pub fn new(corpus_part: impl Into<String>, subpart_index: i32, item_index: i32) -> Self {
		Self { corpus_part: corpus_part.into(), subpart_index, item_index }
	}
}
impl fmt::Display for LocationKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}:{}", self.corpus_part, self.subpart_index, self.item_index)
	}
}
impl FromStr for LocationKey {
	type Err = ParseLocationError;

	/// Parses `"<corpus part> <subpart>:<item>"`, e.g. `"1 John 4:8"`.
	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let trimmed = raw.trim();
		let Some((corpus_part, numbers)) = trimmed.rsplit_once(char::is_whitespace) else {
			return Err(ParseLocationError::MissingCorpusPart);
		};
		let corpus_part = corpus_part.split_whitespace().collect::<Vec<_>>().join(" ");

		if corpus_part.is_empty() || !corpus_part.chars().any(char::is_alphabetic) {
			return Err(ParseLocationError::MissingCorpusPart);
		}

		let Some((subpart, item)) = numbers.split_once(':') else {
			return Err(ParseLocationError::MissingSeparator);
		};
		let subpart_index = parse_index(subpart)?;
		let item_index = parse_index(item)?;

		Ok(Self { corpus_part, subpart_index, item_index })
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseLocationError {
	#[error("Location reference is missing a corpus part.")]
	MissingCorpusPart,
	#[error("Location reference must use <subpart>:<item>.")]
	MissingSeparator,
	#[error("Location index {0:?} must be a positive integer.")]
	InvalidIndex(String),
}

fn parse_index(raw: &str) -> Result<i32, ParseLocationError> {
	match raw.parse::<i32>() {
		Ok(value) if value >= 1 => Ok(value),
		_ => Err(ParseLocationError::InvalidIndex(raw.to_string())),
	}
}
