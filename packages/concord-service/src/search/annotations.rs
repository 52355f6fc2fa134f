use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{task::JoinSet, time};

use concord_config::AnnotationNamespace;
use concord_domain::Annotation;
use concord_storage::{db::Db, queries};

use crate::{AnnotationSource, BoxFuture, SourceError};

pub struct StoreAnnotations {
	db: Arc<Db>,
}
impl StoreAnnotations {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}
}
impl AnnotationSource for StoreAnnotations {
	fn annotations<'a>(
		&'a self,
		namespace: &'a AnnotationNamespace,
		document_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Annotation>, SourceError>> {
		Box::pin(async move {
			let rows =
				queries::annotations_for_documents(&self.db, &namespace.table, document_ids).await?;

			Ok(rows.into_iter().map(|row| row.into_annotation(&namespace.name)).collect())
		})
	}
}

pub struct AnnotationEnricher {
	source: Arc<dyn AnnotationSource>,
	namespaces: Vec<AnnotationNamespace>,
	timeout: Duration,
}
impl AnnotationEnricher {
	pub fn new(
		source: Arc<dyn AnnotationSource>,
		namespaces: Vec<AnnotationNamespace>,
		timeout: Duration,
	) -> Self {
		Self { source, namespaces, timeout }
	}

	/// Token annotations for `document_ids`, one independent lookup per namespace, run
	/// concurrently. Output is grouped by namespace in configured order, then by input document
	/// order, then by token position.
	pub async fn enrich(&self, document_ids: &[String]) -> Result<Vec<Annotation>, SourceError> {
		if document_ids.is_empty() || self.namespaces.is_empty() {
			return Ok(Vec::new());
		}

		let ids: Arc<[String]> = document_ids.into();
		let mut tasks = JoinSet::new();

		for (idx, namespace) in self.namespaces.iter().cloned().enumerate() {
			let source = self.source.clone();
			let ids = ids.clone();
			let timeout = self.timeout;

			tasks.spawn(async move {
				let lookup = source.annotations(&namespace, &ids);
				let result = match time::timeout(timeout, lookup).await {
					Ok(result) => result,
					Err(_) => Err(SourceError::Timeout { after_ms: timeout.as_millis() as u64 }),
				};

				(idx, result)
			});
		}

		let doc_order: HashMap<&str, usize> =
			document_ids.iter().enumerate().map(|(idx, id)| (id.as_str(), idx)).collect();
		let mut per_namespace = Vec::with_capacity(self.namespaces.len());

		while let Some(joined) = tasks.join_next().await {
			let (idx, result) =
				joined.map_err(|err| SourceError::Backend { message: err.to_string() })?;
			let mut annotations = result?;

			annotations.retain(|annotation| doc_order.contains_key(annotation.document_id.as_str()));
			annotations.sort_by_key(|annotation| {
				(doc_order[annotation.document_id.as_str()], annotation.token_position)
			});
			per_namespace.push((idx, annotations));
		}

		per_namespace.sort_by_key(|(idx, _)| *idx);

		Ok(per_namespace.into_iter().flat_map(|(_, annotations)| annotations).collect())
	}
}
