use concord_config::Postgres;
use concord_domain::{Annotation, CrossReference, Document, LocationKey, SHARED_LEMMA_RELATION};
use concord_storage::{
	db::Db,
	queries::{self, VectorDistance},
};
use concord_testkit::TestDatabase;

fn doc(id: &str, part: &str, sub: i32, item: i32, text: &str) -> Document {
	Document {
		document_id: id.to_string(),
		location: LocationKey::new(part, sub, item),
		variant_label: "KJV".to_string(),
		text: text.to_string(),
	}
}

fn token(document_id: &str, position: i32, text: &str, lemma: &str) -> Annotation {
	Annotation {
		document_id: document_id.to_string(),
		namespace: "greek".to_string(),
		token_position: position,
		token_text: text.to_string(),
		lemma_id: lemma.to_string(),
		gloss: None,
		morph_code: None,
	}
}

async fn seeded_db(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	concord_testkit::apply_schema(&db.pool, &["greek_tokens"], &[("verse_embeddings", 3)])
		.await
		.expect("Failed to apply fixture schema.");

	let docs = [
		doc("kjv:John.1.1", "John", 1, 1, "In the beginning was the Word"),
		doc("kjv:John.3.16", "John", 3, 16, "For God so loved the world"),
		doc("kjv:Gen.1.1", "Genesis", 1, 1, "In the beginning God created the heaven"),
	];

	for (ordinal, doc) in docs.iter().enumerate() {
		concord_testkit::insert_document(&db.pool, ordinal as i64, doc)
			.await
			.expect("Failed to insert document.");
	}

	concord_testkit::insert_reference(
		&db.pool,
		0,
		&CrossReference {
			from_location: LocationKey::new("John", 1, 1),
			to_location: LocationKey::new("Genesis", 1, 1),
			relation_type: "parallel".to_string(),
			note: None,
		},
	)
	.await
	.expect("Failed to insert reference.");

	for annotation in [
		token("kjv:John.1.1", 1, "Ἐν", "G1722"),
		token("kjv:John.1.1", 2, "ἀρχῇ", "G746"),
		token("kjv:Gen.1.1", 1, "ἐν", "G1722"),
	] {
		concord_testkit::insert_token(&db.pool, "greek_tokens", &annotation)
			.await
			.expect("Failed to insert token.");
	}

	for (id, vec) in [
		("kjv:John.1.1", [1.0_f32, 0.0, 0.0]),
		("kjv:John.3.16", [0.0, 1.0, 0.0]),
		("kjv:Gen.1.1", [0.9, 0.1, 0.0]),
	] {
		concord_testkit::insert_embedding(&db.pool, "verse_embeddings", id, &vec)
			.await
			.expect("Failed to insert embedding.");
	}

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CONCORD_PG_DSN to run."]
async fn keyword_and_location_lookups_follow_canonical_order() {
	let Some(base_dsn) = concord_testkit::env_dsn() else {
		eprintln!("Skipping keyword_and_location_lookups_follow_canonical_order; set CONCORD_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db).await;
	let keywords = vec!["beginning".to_string(), "god".to_string()];
	let rows = queries::match_documents(&db, &keywords, None, 10)
		.await
		.expect("Failed to match documents.");
	let ids: Vec<_> = rows.iter().map(|row| row.document_id.as_str()).collect();

	assert_eq!(ids, vec!["kjv:Gen.1.1"]);

	let rows = queries::match_documents(&db, &["the".to_string()], None, 10)
		.await
		.expect("Failed to match documents.");
	let ids: Vec<_> = rows.iter().map(|row| row.document_id.as_str()).collect();

	assert_eq!(ids, vec!["kjv:John.1.1", "kjv:John.3.16", "kjv:Gen.1.1"]);

	let rows = queries::documents_at_location(&db, &LocationKey::new("john", 3, 16), None, 10)
		.await
		.expect("Failed to look up location.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].document_id, "kjv:John.3.16");

	let rows = queries::documents_at_location(
		&db,
		&LocationKey::new("John", 3, 16),
		Some("ESV"),
		10,
	)
	.await
	.expect("Failed to look up location.");

	assert!(rows.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CONCORD_PG_DSN to run."]
async fn references_and_shared_lemmas_resolve() {
	let Some(base_dsn) = concord_testkit::env_dsn() else {
		eprintln!("Skipping references_and_shared_lemmas_resolve; set CONCORD_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db).await;
	let from = LocationKey::new("John", 1, 1);
	let refs = queries::references_from(&db, &from, 10).await.expect("Failed to load references.");

	assert_eq!(refs.len(), 1);
	assert_eq!(refs[0].clone().into_cross_reference().to_location, LocationKey::new("Genesis", 1, 1));

	let shared = queries::shared_lemma_locations(&db, "greek_tokens", &from, 10)
		.await
		.expect("Failed to load shared lemmas.");

	assert_eq!(shared.len(), 1);

	let reference = shared[0].clone().into_cross_reference(&from);

	assert_eq!(reference.to_location, LocationKey::new("Genesis", 1, 1));
	assert_eq!(reference.relation_type, SHARED_LEMMA_RELATION);
	assert_eq!(reference.note.as_deref(), Some("G1722"));

	let ids = vec!["kjv:John.1.1".to_string(), "kjv:John.3.16".to_string()];
	let annotations = queries::annotations_for_documents(&db, "greek_tokens", &ids)
		.await
		.expect("Failed to load annotations.");
	let positions: Vec<_> = annotations.iter().map(|row| row.token_position).collect();

	assert_eq!(positions, vec![1, 2]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CONCORD_PG_DSN to run."]
async fn nearest_documents_orders_by_distance() {
	let Some(base_dsn) = concord_testkit::env_dsn() else {
		eprintln!("Skipping nearest_documents_orders_by_distance; set CONCORD_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db).await;
	let rows = queries::nearest_documents(
		&db,
		"verse_embeddings",
		VectorDistance::Cosine,
		&[1.0, 0.0, 0.0],
		None,
		2,
	)
	.await
	.expect("Failed to query nearest documents.");
	let ids: Vec<_> = rows.iter().map(|row| row.document.document_id.as_str()).collect();

	assert_eq!(ids, vec!["kjv:John.1.1", "kjv:Gen.1.1"]);
	assert!(rows[0].distance.abs() < 1e-5);
	assert!(rows[0].distance <= rows[1].distance);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
