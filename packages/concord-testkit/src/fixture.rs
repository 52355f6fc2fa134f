use concord_domain::{Annotation, CrossReference, Document};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{Error, Result};

const BASE_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS documents (
	document_id TEXT PRIMARY KEY,
	ordinal BIGINT NOT NULL,
	corpus_part TEXT NOT NULL,
	subpart_index INTEGER NOT NULL,
	item_index INTEGER NOT NULL,
	variant_label TEXT NOT NULL,
	text TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS documents_location_idx
	ON documents (corpus_part, subpart_index, item_index);
CREATE TABLE IF NOT EXISTS cross_references (
	ordinal BIGINT NOT NULL,
	from_corpus_part TEXT NOT NULL,
	from_subpart_index INTEGER NOT NULL,
	from_item_index INTEGER NOT NULL,
	to_corpus_part TEXT NOT NULL,
	to_subpart_index INTEGER NOT NULL,
	to_item_index INTEGER NOT NULL,
	relation_type TEXT NOT NULL,
	note TEXT
);";

/// Namespace for deterministic Qdrant point ids derived from document ids.
const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x8f1c_55a2_3d0e_4b7a_9c61_2e4f_d0a3_b719);

/// Creates the read-side tables the search stack queries. `token_tables` get the annotation
/// layout and `vector_tables` get `(document_id, vec vector(dim))`.
pub async fn apply_schema(
	pool: &PgPool,
	token_tables: &[&str],
	vector_tables: &[(&str, u32)],
) -> Result<()> {
	sqlx::raw_sql(BASE_SCHEMA).execute(pool).await?;

	for table in token_tables {
		ensure_identifier(table)?;

		let sql = format!(
			"\
CREATE TABLE IF NOT EXISTS {table} (
	document_id TEXT NOT NULL REFERENCES documents (document_id),
	token_position INTEGER NOT NULL,
	token_text TEXT NOT NULL,
	lemma_id TEXT NOT NULL,
	gloss TEXT,
	morph_code TEXT,
	PRIMARY KEY (document_id, token_position)
);
CREATE INDEX IF NOT EXISTS {table}_lemma_idx ON {table} (lemma_id);"
		);

		sqlx::raw_sql(&sql).execute(pool).await?;
	}

	if !vector_tables.is_empty() {
		sqlx::raw_sql("CREATE EXTENSION IF NOT EXISTS vector;").execute(pool).await?;
	}

	for (table, dim) in vector_tables {
		ensure_identifier(table)?;

		let sql = format!(
			"\
CREATE TABLE IF NOT EXISTS {table} (
	document_id TEXT PRIMARY KEY REFERENCES documents (document_id),
	vec vector({dim}) NOT NULL
);"
		);

		sqlx::raw_sql(&sql).execute(pool).await?;
	}

	Ok(())
}

pub async fn insert_document(pool: &PgPool, ordinal: i64, doc: &Document) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO documents (document_id, ordinal, corpus_part, subpart_index, item_index, variant_label, text)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(doc.document_id.as_str())
	.bind(ordinal)
	.bind(doc.location.corpus_part.as_str())
	.bind(doc.location.subpart_index)
	.bind(doc.location.item_index)
	.bind(doc.variant_label.as_str())
	.bind(doc.text.as_str())
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn insert_reference(
	pool: &PgPool,
	ordinal: i64,
	reference: &CrossReference,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO cross_references (
	ordinal,
	from_corpus_part,
	from_subpart_index,
	from_item_index,
	to_corpus_part,
	to_subpart_index,
	to_item_index,
	relation_type,
	note
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
	)
	.bind(ordinal)
	.bind(reference.from_location.corpus_part.as_str())
	.bind(reference.from_location.subpart_index)
	.bind(reference.from_location.item_index)
	.bind(reference.to_location.corpus_part.as_str())
	.bind(reference.to_location.subpart_index)
	.bind(reference.to_location.item_index)
	.bind(reference.relation_type.as_str())
	.bind(reference.note.as_deref())
	.execute(pool)
	.await?;

	Ok(())
}

/// Inserts one token row. `annotation.namespace` is ignored; the table decides the namespace.
pub async fn insert_token(pool: &PgPool, table: &str, annotation: &Annotation) -> Result<()> {
	ensure_identifier(table)?;

	let sql = format!(
		"\
INSERT INTO {table} (document_id, token_position, token_text, lemma_id, gloss, morph_code)
VALUES ($1, $2, $3, $4, $5, $6)"
	);

	sqlx::query(&sql)
		.bind(annotation.document_id.as_str())
		.bind(annotation.token_position)
		.bind(annotation.token_text.as_str())
		.bind(annotation.lemma_id.as_str())
		.bind(annotation.gloss.as_deref())
		.bind(annotation.morph_code.as_deref())
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn insert_embedding(
	pool: &PgPool,
	table: &str,
	document_id: &str,
	vec: &[f32],
) -> Result<()> {
	ensure_identifier(table)?;

	let literal = format!(
		"[{}]",
		vec.iter().map(|value| value.to_string()).collect::<Vec<_>>().join(",")
	);
	let sql = format!("INSERT INTO {table} (document_id, vec) VALUES ($1, $2::text::vector)");

	sqlx::query(&sql).bind(document_id).bind(literal).execute(pool).await?;

	Ok(())
}

/// Stable Qdrant point id for a document id.
pub fn point_id(document_id: &str) -> Uuid {
	Uuid::new_v5(&POINT_NAMESPACE, document_id.as_bytes())
}

fn ensure_identifier(table: &str) -> Result<()> {
	let mut chars = table.chars();
	let valid = matches!(chars.next(), Some(ch) if ch.is_ascii_alphabetic() || ch == '_')
		&& chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');

	if valid {
		Ok(())
	} else {
		Err(Error::Message(format!("{table:?} is not a plain SQL identifier.")))
	}
}
