use serde::{Deserialize, Serialize};

/// Token-level linguistic record. `namespace` names the annotation system it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
	pub document_id: String,
	pub namespace: String,
	pub token_position: i32,
	pub token_text: String,
	pub lemma_id: String,
	pub gloss: Option<String>,
	pub morph_code: Option<String>,
}
