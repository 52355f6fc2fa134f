use concord_domain::{CrossReference, Document, LocationKey, SHARED_LEMMA_RELATION};

#[test]
fn document_serializes_with_nested_location() {
	let doc = Document {
		document_id: "kjv:John.3.16".to_string(),
		location: LocationKey::new("John", 3, 16),
		variant_label: "KJV".to_string(),
		text: "For God so loved the world".to_string(),
	};
	let json = serde_json::to_value(&doc).expect("serialize failed");

	assert_eq!(json["location"]["corpus_part"], "John");
	assert_eq!(json["location"]["subpart_index"], 3);
	assert_eq!(json["location"]["item_index"], 16);
	assert_eq!(json["variant_label"], "KJV");
}

#[test]
fn cross_reference_dedup_key_ignores_note() {
	let left = CrossReference {
		from_location: LocationKey::new("John", 1, 1),
		to_location: LocationKey::new("Genesis", 1, 1),
		relation_type: SHARED_LEMMA_RELATION.to_string(),
		note: Some("G746".to_string()),
	};
	let mut right = left.clone();

	right.note = None;

	assert_eq!(left.dedup_key(), right.dedup_key());

	right.relation_type = "parallel".to_string();

	assert_ne!(left.dedup_key(), right.dedup_key());
}

#[test]
fn locations_order_by_part_then_indices() {
	let mut keys = vec![
		LocationKey::new("John", 3, 16),
		LocationKey::new("John", 1, 1),
		LocationKey::new("John", 3, 2),
	];

	keys.sort();

	assert_eq!(
		keys,
		vec![
			LocationKey::new("John", 1, 1),
			LocationKey::new("John", 3, 2),
			LocationKey::new("John", 3, 16),
		]
	);
}
