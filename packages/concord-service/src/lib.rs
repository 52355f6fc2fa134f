pub mod search;

mod error;

pub use error::{Error, Result, SourceError};
pub use search::{
	SearchOptions, SearchRequest, SearchResponse,
	fusion::FusedResult,
	retrieval::{RetrievalHit, RetrievalQuery},
};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use concord_config::{AnnotationNamespace, Config, EmbeddingProviderConfig};
use concord_domain::{Annotation, CrossReference, LocationKey};
use concord_providers::embedding;
use concord_storage::{db::Db, qdrant::QdrantStore};

use search::{
	annotations::StoreAnnotations, cross_references::StoreReferences, lexical::LexicalRetriever,
	vector::VectorRetriever,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// One retrieval source. The orchestrator treats every source alike and applies `timeout` to
/// each `search` call.
pub trait Retriever
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	/// Name of the embedding provider this source needs a query vector from.
	fn embedding(&self) -> Option<&str>;

	fn timeout(&self) -> Duration;

	fn search<'a>(
		&'a self,
		query: &'a RetrievalQuery,
		k: u32,
	) -> BoxFuture<'a, Result<Vec<RetrievalHit>, SourceError>>;
}

pub trait ReferenceSource
where
	Self: Send + Sync,
{
	fn references_from<'a>(
		&'a self,
		location: &'a LocationKey,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CrossReference>, SourceError>>;

	fn shared_lemma<'a>(
		&'a self,
		location: &'a LocationKey,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CrossReference>, SourceError>>;
}

pub trait AnnotationSource
where
	Self: Send + Sync,
{
	fn annotations<'a>(
		&'a self,
		namespace: &'a AnnotationNamespace,
		document_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Annotation>, SourceError>>;
}

#[derive(Clone)]
pub struct Components {
	pub embedding: Arc<dyn EmbeddingProvider>,
	/// In configured order; this order is also the order of `sources_used`.
	pub retrievers: Vec<Arc<dyn Retriever>>,
	pub references: Arc<dyn ReferenceSource>,
	pub annotations: Arc<dyn AnnotationSource>,
}

pub struct SearchService {
	pub cfg: Config,
	pub components: Components,
}
impl SearchService {
	/// Builds every adapter handle once: one Postgres pool, one Qdrant client when a Qdrant
	/// source is configured, and one retriever per enabled source.
	pub async fn connect(cfg: Config) -> Result<Self> {
		concord_config::validate(&cfg)?;

		let db = Arc::new(Db::connect(&cfg.storage.postgres).await?);
		let qdrant = if cfg.sources.vector.iter().any(|source| source.backend == "qdrant") {
			Some(Arc::new(QdrantStore::new(&cfg.storage.qdrant)?))
		} else {
			None
		};
		let mut retrievers: Vec<Arc<dyn Retriever>> = Vec::new();

		for source in &cfg.sources.vector {
			retrievers.push(Arc::new(VectorRetriever::from_config(source, &db, qdrant.as_ref())?));
		}

		if cfg.sources.lexical.enabled {
			retrievers.push(Arc::new(LexicalRetriever::new(&cfg.sources.lexical, db.clone())));
		}

		let token_tables = cfg
			.search
			.annotations
			.namespaces
			.iter()
			.map(|namespace| namespace.table.clone())
			.collect();
		let components = Components {
			embedding: Arc::new(DefaultProviders),
			retrievers,
			references: Arc::new(StoreReferences::new(db.clone(), token_tables)),
			annotations: Arc::new(StoreAnnotations::new(db)),
		};

		Ok(Self { cfg, components })
	}

	pub fn with_components(cfg: Config, components: Components) -> Self {
		Self { cfg, components }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
