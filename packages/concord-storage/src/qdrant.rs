pub const PAYLOAD_DOCUMENT_ID: &str = "document_id";
pub const PAYLOAD_CORPUS_PART: &str = "corpus_part";
pub const PAYLOAD_SUBPART_INDEX: &str = "subpart_index";
pub const PAYLOAD_ITEM_INDEX: &str = "item_index";
pub const PAYLOAD_VARIANT_LABEL: &str = "variant_label";
pub const PAYLOAD_TEXT: &str = "text";

use crate::Result;

/// One client per process. Collections are addressed per query, so several vector sources can
/// share it.
pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
}
impl QdrantStore {
	pub fn new(cfg: &concord_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client })
	}
}
