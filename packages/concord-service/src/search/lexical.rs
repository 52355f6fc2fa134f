use std::{sync::Arc, time::Duration};

use concord_config::LexicalSource;
use concord_domain::query::QueryKind;
use concord_storage::{db::Db, queries};

use crate::{
	BoxFuture, Retriever, SourceError,
	search::retrieval::{RetrievalHit, RetrievalQuery, ScoreConvention, ranked_hits},
};

/// Keyword matching over the primary text store. A query that parses as a reference is resolved
/// by location instead. Every hit scores 1.0 and keeps the store's canonical order.
pub struct LexicalRetriever {
	name: String,
	timeout: Duration,
	db: Arc<Db>,
}
impl LexicalRetriever {
	pub fn new(cfg: &LexicalSource, db: Arc<Db>) -> Self {
		Self { name: cfg.name.clone(), timeout: Duration::from_millis(cfg.timeout_ms), db }
	}
}
impl Retriever for LexicalRetriever {
	fn name(&self) -> &str {
		&self.name
	}

	fn embedding(&self) -> Option<&str> {
		None
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
			let variant_label = query.variant_label.as_deref();
			let rows = match &query.kind {
				QueryKind::Reference(location) =>
					queries::documents_at_location(&self.db, location, variant_label, k).await?,
				QueryKind::Text { keywords } =>
					queries::match_documents(&self.db, keywords, variant_label, k).await?,
			};
			let matched = rows.into_iter().map(|row| (row.into_document(), 1.0));

			Ok(ranked_hits(&self.name, matched, ScoreConvention::Similarity))
		})
	}
}
