use concord_domain::LocationKey;

use crate::{
	Error, Result,
	db::Db,
	models::{AnnotationRow, CrossReferenceRow, DocumentRow, ScoredDocumentRow, SharedLemmaRow},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorDistance {
	Cosine,
	L2,
}
impl VectorDistance {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"cosine" => Some(Self::Cosine),
			"l2" => Some(Self::L2),
			_ => None,
		}
	}

	fn operator(self) -> &'static str {
		match self {
			Self::Cosine => "<=>",
			Self::L2 => "<->",
		}
	}
}

/// Documents whose text contains every keyword, case-insensitively, in canonical order.
pub async fn match_documents(
	db: &Db,
	keywords: &[String],
	variant_label: Option<&str>,
	limit: u32,
) -> Result<Vec<DocumentRow>> {
	if keywords.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}

	let patterns: Vec<String> =
		keywords.iter().map(|keyword| format!("%{}%", escape_like(keyword))).collect();
	let rows = sqlx::query_as::<_, DocumentRow>(
		"\
SELECT
	document_id,
	corpus_part,
	subpart_index,
	item_index,
	variant_label,
	text
FROM documents
WHERE text ILIKE ALL($1::text[])
	AND ($2::text IS NULL OR variant_label = $2)
ORDER BY ordinal, document_id
LIMIT $3",
	)
	.bind(&patterns)
	.bind(variant_label)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn documents_at_location(
	db: &Db,
	location: &LocationKey,
	variant_label: Option<&str>,
	limit: u32,
) -> Result<Vec<DocumentRow>> {
	let rows = sqlx::query_as::<_, DocumentRow>(
		"\
SELECT
	document_id,
	corpus_part,
	subpart_index,
	item_index,
	variant_label,
	text
FROM documents
WHERE lower(corpus_part) = lower($1)
	AND subpart_index = $2
	AND item_index = $3
	AND ($4::text IS NULL OR variant_label = $4)
ORDER BY ordinal, document_id
LIMIT $5",
	)
	.bind(location.corpus_part.as_str())
	.bind(location.subpart_index)
	.bind(location.item_index)
	.bind(variant_label)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// K nearest documents from a pgvector table with columns `(document_id, vec)`.
pub async fn nearest_documents(
	db: &Db,
	table: &str,
	distance: VectorDistance,
	vector: &[f32],
	variant_label: Option<&str>,
	limit: u32,
) -> Result<Vec<ScoredDocumentRow>> {
	ensure_identifier(table)?;

	let sql = format!(
		"\
SELECT
	d.document_id,
	d.corpus_part,
	d.subpart_index,
	d.item_index,
	d.variant_label,
	d.text,
	(e.vec {op} $1::text::vector)::real AS distance
FROM {table} e
JOIN documents d ON d.document_id = e.document_id
WHERE ($2::text IS NULL OR d.variant_label = $2)
ORDER BY distance, d.document_id
LIMIT $3",
		op = distance.operator(),
	);
	let rows = sqlx::query_as::<_, ScoredDocumentRow>(&sql)
		.bind(vector_to_pg(vector))
		.bind(variant_label)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn references_from(
	db: &Db,
	location: &LocationKey,
	limit: u32,
) -> Result<Vec<CrossReferenceRow>> {
	let rows = sqlx::query_as::<_, CrossReferenceRow>(
		"\
SELECT
	from_corpus_part,
	from_subpart_index,
	from_item_index,
	to_corpus_part,
	to_subpart_index,
	to_item_index,
	relation_type,
	note
FROM cross_references
WHERE from_corpus_part = $1
	AND from_subpart_index = $2
	AND from_item_index = $3
ORDER BY ordinal, relation_type, to_corpus_part, to_subpart_index, to_item_index
LIMIT $4",
	)
	.bind(location.corpus_part.as_str())
	.bind(location.subpart_index)
	.bind(location.item_index)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Other locations carrying a token with the same lemma as some token at `location`, one row per
/// related location, in canonical order.
pub async fn shared_lemma_locations(
	db: &Db,
	token_table: &str,
	location: &LocationKey,
	limit: u32,
) -> Result<Vec<SharedLemmaRow>> {
	ensure_identifier(token_table)?;

	let sql = format!(
		"\
SELECT corpus_part, subpart_index, item_index, lemma_id
FROM (
	SELECT DISTINCT ON (o.corpus_part, o.subpart_index, o.item_index)
		o.corpus_part,
		o.subpart_index,
		o.item_index,
		t.lemma_id,
		o.ordinal
	FROM documents d
	JOIN {token_table} t ON t.document_id = d.document_id
	JOIN {token_table} t2 ON t2.lemma_id = t.lemma_id
	JOIN documents o ON o.document_id = t2.document_id
	WHERE d.corpus_part = $1
		AND d.subpart_index = $2
		AND d.item_index = $3
		AND NOT (o.corpus_part = $1 AND o.subpart_index = $2 AND o.item_index = $3)
	ORDER BY o.corpus_part, o.subpart_index, o.item_index, o.ordinal, t.lemma_id
) related
ORDER BY ordinal, lemma_id
LIMIT $4"
	);
	let rows = sqlx::query_as::<_, SharedLemmaRow>(&sql)
		.bind(location.corpus_part.as_str())
		.bind(location.subpart_index)
		.bind(location.item_index)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn annotations_for_documents(
	db: &Db,
	token_table: &str,
	document_ids: &[String],
) -> Result<Vec<AnnotationRow>> {
	ensure_identifier(token_table)?;

	if document_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT
	document_id,
	token_position,
	token_text,
	lemma_id,
	gloss,
	morph_code
FROM {token_table}
WHERE document_id = ANY($1::text[])
ORDER BY document_id, token_position"
	);
	let rows = sqlx::query_as::<_, AnnotationRow>(&sql)
		.bind(document_ids)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

/// Renders a vector in pgvector's text input format.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

/// Escapes `%`, `_` and `\` so user input only ever matches literally.
pub fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

fn ensure_identifier(table: &str) -> Result<()> {
	if concord_config::is_sql_identifier(table) {
		return Ok(());
	}

	Err(Error::InvalidArgument(format!("{table:?} is not a plain SQL identifier.")))
}
