use concord_domain::{Annotation, CrossReference, Document, LocationKey, SHARED_LEMMA_RELATION};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
	pub document_id: String,
	pub corpus_part: String,
	pub subpart_index: i32,
	pub item_index: i32,
	pub variant_label: String,
	pub text: String,
}
impl DocumentRow {
	pub fn into_document(self) -> Document {
		Document {
			document_id: self.document_id,
			location: LocationKey {
				corpus_part: self.corpus_part,
				subpart_index: self.subpart_index,
				item_index: self.item_index,
			},
			variant_label: self.variant_label,
			text: self.text,
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoredDocumentRow {
	#[sqlx(flatten)]
	pub document: DocumentRow,
	pub distance: f32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrossReferenceRow {
	pub from_corpus_part: String,
	pub from_subpart_index: i32,
	pub from_item_index: i32,
	pub to_corpus_part: String,
	pub to_subpart_index: i32,
	pub to_item_index: i32,
	pub relation_type: String,
	pub note: Option<String>,
}
impl CrossReferenceRow {
	pub fn into_cross_reference(self) -> CrossReference {
		CrossReference {
			from_location: LocationKey {
				corpus_part: self.from_corpus_part,
				subpart_index: self.from_subpart_index,
				item_index: self.from_item_index,
			},
			to_location: LocationKey {
				corpus_part: self.to_corpus_part,
				subpart_index: self.to_subpart_index,
				item_index: self.to_item_index,
			},
			relation_type: self.relation_type,
			note: self.note,
		}
	}
}

/// A location that shares `lemma_id` with the queried location.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SharedLemmaRow {
	pub corpus_part: String,
	pub subpart_index: i32,
	pub item_index: i32,
	pub lemma_id: String,
}
impl SharedLemmaRow {
	pub fn into_cross_reference(self, from: &LocationKey) -> CrossReference {
		CrossReference {
			from_location: from.clone(),
			to_location: LocationKey {
				corpus_part: self.corpus_part,
				subpart_index: self.subpart_index,
				item_index: self.item_index,
			},
			relation_type: SHARED_LEMMA_RELATION.to_string(),
			note: Some(self.lemma_id),
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnnotationRow {
	pub document_id: String,
	pub token_position: i32,
	pub token_text: String,
	pub lemma_id: String,
	pub gloss: Option<String>,
	pub morph_code: Option<String>,
}
impl AnnotationRow {
	pub fn into_annotation(self, namespace: &str) -> Annotation {
		Annotation {
			document_id: self.document_id,
			namespace: namespace.to_string(),
			token_position: self.token_position,
			token_text: self.token_text,
			lemma_id: self.lemma_id,
			gloss: self.gloss,
			morph_code: self.morph_code,
		}
	}
}
