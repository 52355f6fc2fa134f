use serde::{Deserialize, Serialize};

use crate::LocationKey;

/// One variant of one verse. `document_id` is unique per (location, variant_label).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
	pub document_id: String,
	pub location: LocationKey,
	pub variant_label: String,
	pub text: String,
}
