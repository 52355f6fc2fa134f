use serde::{Deserialize, Serialize};

use crate::LocationKey;

/// Relation type of references derived from a lemma shared by both locations.
pub const SHARED_LEMMA_RELATION: &str = "shared_lemma";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
	pub from_location: LocationKey,
	pub to_location: LocationKey,
	pub relation_type: String,
	pub note: Option<String>,
}
impl CrossReference {
	/// Identity used when merging lookups; the note does not participate.
	pub fn dedup_key(&self) -> (&LocationKey, &LocationKey, &str) {
		(&self.from_location, &self.to_location, self.relation_type.as_str())
	}
}
