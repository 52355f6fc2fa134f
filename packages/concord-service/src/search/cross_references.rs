use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::{task::JoinSet, time};

use concord_domain::{CrossReference, LocationKey};
use concord_storage::{db::Db, queries};

use crate::{BoxFuture, ReferenceSource, SourceError};

/// Reference lookups over the relational store: the explicit reference table plus shared-lemma
/// relations found through every configured token table.
pub struct StoreReferences {
	db: Arc<Db>,
	token_tables: Vec<String>,
}
impl StoreReferences {
	pub fn new(db: Arc<Db>, token_tables: Vec<String>) -> Self {
		Self { db, token_tables }
	}
}
impl ReferenceSource for StoreReferences {
	fn references_from<'a>(
		&'a self,
		location: &'a LocationKey,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CrossReference>, SourceError>> {
		Box::pin(async move {
			let rows = queries::references_from(&self.db, location, limit).await?;

			Ok(rows.into_iter().map(|row| row.into_cross_reference()).collect())
		})
	}

	fn shared_lemma<'a>(
		&'a self,
		location: &'a LocationKey,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CrossReference>, SourceError>> {
		Box::pin(async move {
			let mut out = Vec::new();

			for table in &self.token_tables {
				if out.len() >= limit as usize {
					break;
				}

				let remaining = limit - out.len() as u32;
				let rows =
					queries::shared_lemma_locations(&self.db, table, location, remaining).await?;

				out.extend(rows.into_iter().map(|row| row.into_cross_reference(location)));
			}

			Ok(out)
		})
	}
}

pub struct CrossReferenceExpander {
	source: Arc<dyn ReferenceSource>,
	per_location_limit: u32,
	max_total: u32,
	timeout: Duration,
}
impl CrossReferenceExpander {
	pub fn new(
		source: Arc<dyn ReferenceSource>,
		per_location_limit: u32,
		max_total: u32,
		timeout: Duration,
	) -> Self {
		Self { source, per_location_limit, max_total, timeout }
	}

	/// Shared-lemma then explicit references for each distinct location, in input order,
	/// deduplicated by `(from, to, relation_type)` and capped at `max_total`. Any failed lookup
	/// fails the whole expansion.
	pub async fn expand(
		&self,
		locations: &[LocationKey],
	) -> Result<Vec<CrossReference>, SourceError> {
		let mut seen_locations = HashSet::new();
		let unique: Vec<LocationKey> =
			locations.iter().filter(|location| seen_locations.insert(*location)).cloned().collect();

		if unique.is_empty() || self.max_total == 0 {
			return Ok(Vec::new());
		}

		let mut tasks = JoinSet::new();

		for (idx, location) in unique.into_iter().enumerate() {
			let source = self.source.clone();
			let limit = self.per_location_limit;
			let timeout = self.timeout;

			tasks.spawn(async move {
				let (shared, explicit) = tokio::join!(
					bounded(timeout, source.shared_lemma(&location, limit)),
					bounded(timeout, source.references_from(&location, limit)),
				);

				(idx, shared, explicit)
			});
		}

		let mut per_location = Vec::new();

		while let Some(joined) = tasks.join_next().await {
			let (idx, shared, explicit) = joined
				.map_err(|err| SourceError::Backend { message: err.to_string() })?;
			let mut refs = take_limit(shared?, self.per_location_limit);

			refs.extend(take_limit(explicit?, self.per_location_limit));
			per_location.push((idx, refs));
		}

		per_location.sort_by_key(|(idx, _)| *idx);

		let mut seen = HashSet::new();
		let mut out = Vec::new();

		for reference in per_location.into_iter().flat_map(|(_, refs)| refs) {
			if out.len() >= self.max_total as usize {
				break;
			}

			let (from, to, relation_type) = reference.dedup_key();
			let key = (from.clone(), to.clone(), relation_type.to_string());

			if seen.insert(key) {
				out.push(reference);
			}
		}

		Ok(out)
	}
}

async fn bounded<T>(
	timeout: Duration,
	lookup: BoxFuture<'_, Result<T, SourceError>>,
) -> Result<T, SourceError> {
	match time::timeout(timeout, lookup).await {
		Ok(result) => result,
		Err(_) => Err(SourceError::Timeout { after_ms: timeout.as_millis() as u64 }),
	}
}

fn take_limit(mut refs: Vec<CrossReference>, limit: u32) -> Vec<CrossReference> {
	refs.truncate(limit as usize);

	refs
}
