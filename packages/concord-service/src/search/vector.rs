use std::{collections::HashMap, sync::Arc, time::Duration};

use qdrant_client::qdrant::{Condition, Filter, Query, QueryPointsBuilder, Value, value::Kind};

use concord_config::VectorSource;
use concord_domain::{Document, LocationKey};
use concord_storage::{
	db::Db,
	qdrant::{
		PAYLOAD_CORPUS_PART, PAYLOAD_DOCUMENT_ID, PAYLOAD_ITEM_INDEX, PAYLOAD_SUBPART_INDEX,
		PAYLOAD_TEXT, PAYLOAD_VARIANT_LABEL, QdrantStore,
	},
	queries::{self, VectorDistance},
};

use crate::{
	BoxFuture, Error, Result, Retriever, SourceError,
	search::retrieval::{RetrievalHit, RetrievalQuery, ScoreConvention, ranked_hits},
};

pub enum VectorBackend {
	Qdrant { store: Arc<QdrantStore>, collection: String },
	Pgvector { db: Arc<Db>, table: String, distance: VectorDistance },
}

/// Nearest-neighbour search over one configured index.
pub struct VectorRetriever {
	name: String,
	embedding: String,
	vector_dim: u32,
	timeout: Duration,
	score: ScoreConvention,
	backend: VectorBackend,
}
impl VectorRetriever {
	pub fn from_config(
		source: &VectorSource,
		db: &Arc<Db>,
		qdrant: Option<&Arc<QdrantStore>>,
	) -> Result<Self> {
		let score = ScoreConvention::parse(&source.score, source.max_expected_distance)
			.ok_or_else(|| Error::Config {
				message: format!(
					"sources.vector.{}.score {:?} is not supported.",
					source.name, source.score
				),
			})?;
		let backend = match source.backend.as_str() {
			"qdrant" => {
				let (Some(store), Some(collection)) = (qdrant, source.collection.as_ref()) else {
					return Err(Error::Config {
						message: format!(
							"sources.vector.{} needs a Qdrant client and a collection.",
							source.name
						),
					});
				};

				VectorBackend::Qdrant { store: store.clone(), collection: collection.clone() }
			},
			"pgvector" => {
				let Some(table) = source.table.as_ref() else {
					return Err(Error::Config {
						message: format!("sources.vector.{}.table is required.", source.name),
					});
				};
				let distance = VectorDistance::parse(&source.distance).ok_or_else(|| {
					Error::Config {
						message: format!(
							"sources.vector.{}.distance {:?} is not supported.",
							source.name, source.distance
						),
					}
				})?;

				VectorBackend::Pgvector { db: db.clone(), table: table.clone(), distance }
			},
			other => {
				return Err(Error::Config {
					message: format!("Unknown vector backend {other:?} for {}.", source.name),
				});
			},
		};

		Ok(Self {
			name: source.name.clone(),
			embedding: source.embedding.clone(),
			vector_dim: source.vector_dim,
			timeout: Duration::from_millis(source.timeout_ms),
			score,
			backend,
		})
	}

	async fn search_qdrant(
		&self,
		store: &QdrantStore,
		collection: &str,
		vector: &[f32],
		variant_label: Option<&str>,
		k: u32,
	) -> Result<Vec<RetrievalHit>, SourceError> {
		let mut search = QueryPointsBuilder::new(collection.to_string())
			.query(Query::new_nearest(vector.to_vec()))
			.with_payload(true)
			.limit(u64::from(k));

		if let Some(variant_label) = variant_label {
			search = search.filter(Filter::must([Condition::matches(
				PAYLOAD_VARIANT_LABEL,
				variant_label.to_string(),
			)]));
		}

		let response = store
			.client
			.query(search)
			.await
			.map_err(|err| SourceError::Backend { message: err.to_string() })?;
		let scored = response.result.iter().filter_map(|point| {
			let Some(document) = document_from_payload(&point.payload) else {
				tracing::warn!(source = %self.name, "Vector hit is missing document payload.");

				return None;
			};

			Some((document, point.score))
		});

		Ok(ranked_hits(&self.name, scored, self.score))
	}

	async fn search_pgvector(
		&self,
		db: &Db,
		table: &str,
		distance: VectorDistance,
		vector: &[f32],
		variant_label: Option<&str>,
		k: u32,
	) -> Result<Vec<RetrievalHit>, SourceError> {
		let rows = queries::nearest_documents(db, table, distance, vector, variant_label, k).await?;
		let scored = rows.into_iter().map(|row| (row.document.into_document(), row.distance));

		Ok(ranked_hits(&self.name, scored, self.score))
	}
}
impl Retriever for VectorRetriever {
	fn name(&self) -> &str {
		&self.name
	}

	fn embedding(&self) -> Option<&str> {
		Some(&self.embedding)
	}

	fn timeout(&self) -> Duration {
		self.timeout
	}

	fn search<'a>(
		&'a self,
		query: &'a RetrievalQuery,
		k: u32,
	) -> BoxFuture<'a, Result<Vec<RetrievalHit>, SourceError>> {
		Box::pin(async move {
			let Some(vector) = query.vector.as_deref() else {
				return Err(SourceError::EmbeddingUnavailable { provider: self.embedding.clone() });
			};

			if vector.len() != self.vector_dim as usize {
				return Err(SourceError::DimensionMismatch {
					expected: self.vector_dim,
					actual: vector.len(),
				});
			}

			let variant_label = query.variant_label.as_deref();

			match &self.backend {
				VectorBackend::Qdrant { store, collection } =>
					self.search_qdrant(store, collection, vector, variant_label, k).await,
				VectorBackend::Pgvector { db, table, distance } =>
					self.search_pgvector(db, table, *distance, vector, variant_label, k).await,
			}
		})
	}
}

pub fn document_from_payload(payload: &HashMap<String, Value>) -> Option<Document> {
	let document_id = payload_string(payload, PAYLOAD_DOCUMENT_ID)?;
	let corpus_part = payload_string(payload, PAYLOAD_CORPUS_PART)?;
	let subpart_index = payload_i32(payload, PAYLOAD_SUBPART_INDEX)?;
	let item_index = payload_i32(payload, PAYLOAD_ITEM_INDEX)?;
	let variant_label = payload_string(payload, PAYLOAD_VARIANT_LABEL)?;
	let text = payload_string(payload, PAYLOAD_TEXT).unwrap_or_default();

	Some(Document {
		document_id,
		location: LocationKey { corpus_part, subpart_index, item_index },
		variant_label,
		text,
	})
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_i32(payload: &HashMap<String, Value>, key: &str) -> Option<i32> {
	match &payload.get(key)?.kind {
		Some(Kind::IntegerValue(value)) => i32::try_from(*value).ok(),
		Some(Kind::DoubleValue(value))
			if value.fract() == 0.0
				&& (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(value) =>
			Some(*value as i32),
		_ => None,
	}
}
