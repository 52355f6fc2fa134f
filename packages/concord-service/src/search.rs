pub mod annotations;
pub mod cross_references;
pub mod fusion;
pub mod lexical;
pub mod retrieval;
pub mod vector;

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::{
	task::JoinSet,
	time::{self, Instant},
};

use concord_config::EmbeddingProviderConfig;
use concord_domain::{Annotation, CrossReference, LocationKey, query};

use crate::{EmbeddingProvider, Error, Result, Retriever, SearchService, SourceError};
use annotations::AnnotationEnricher;
use cross_references::CrossReferenceExpander;
use fusion::FusedResult;
use retrieval::{RetrievalHit, RetrievalQuery, SourceHits};

pub const CROSS_REFERENCES_SECTION: &str = "cross_references";
pub const ANNOTATIONS_SECTION: &str = "annotations";

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub variant_label: Option<String>,
	/// Defaults to `search.default_k` and is clamped to `search.max_k`.
	#[serde(default)]
	pub k: Option<u32>,
	#[serde(default)]
	pub options: SearchOptions,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
	pub expand_cross_refs: bool,
	pub enrich_annotations: bool,
}
impl Default for SearchOptions {
	fn default() -> Self {
		Self { expand_cross_refs: true, enrich_annotations: true }
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub results: Vec<FusedResult>,
	pub cross_references: Vec<CrossReference>,
	pub annotations: Vec<Annotation>,
	/// Sources that completed, in configured order. A source that returned no hits still counts.
	pub sources_used: Vec<String>,
	/// Enrichment sections that failed and were returned empty.
	pub partial_failures: Vec<String>,
	pub elapsed_ms: u64,
}

type SourceOutcome = Result<Vec<RetrievalHit>, SourceError>;

enum TaskOutput {
	Embedded { provider: String, vector: Result<Vec<f32>, SourceError> },
	Searched { source: String, outcome: SourceOutcome },
}

struct Enrichment {
	cross_references: Vec<CrossReference>,
	annotations: Vec<Annotation>,
	partial_failures: Vec<String>,
}

impl SearchService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let text = query::normalize_query(&req.query);

		self.validate_query(&text)?;

		let k = self.resolve_k(req.k)?;
		let variant_label = req
			.variant_label
			.map(|label| label.trim().to_string())
			.filter(|label| !label.is_empty());
		let retrieval_query =
			RetrievalQuery { kind: query::classify_query(&text), text, variant_label, vector: None };
		let mut sources_used = Vec::new();
		let mut failed_sources = Vec::new();
		let mut per_source = Vec::new();

		for (source, outcome) in self.retrieve(retrieval_query, k).await {
			match outcome {
				Ok(hits) => {
					sources_used.push(source.clone());
					per_source.push(SourceHits { source, hits });
				},
				Err(err) => {
					tracing::warn!(source = %source, error = %err, "Retrieval source failed.");

					failed_sources.push(source);
				},
			}
		}

		let results = fusion::fuse(&per_source, &self.cfg.search.fusion.source_weights, k);

		if results.is_empty() {
			tracing::warn!(
				failed_sources = failed_sources.len(),
				"No retrieval source returned results."
			);

			return Err(Error::NoResults { failed_sources });
		}

		let enrichment = self.enrich(&results, req.options).await;
		let elapsed_ms = started.elapsed().as_millis() as u64;

		tracing::info!(
			results = results.len(),
			sources_used = sources_used.len(),
			failed_sources = failed_sources.len(),
			elapsed_ms,
			"Search completed."
		);

		Ok(SearchResponse {
			results,
			cross_references: enrichment.cross_references,
			annotations: enrichment.annotations,
			sources_used,
			partial_failures: enrichment.partial_failures,
			elapsed_ms,
		})
	}

	fn validate_query(&self, text: &str) -> Result<()> {
		if text.is_empty() {
			return Err(Error::InvalidQuery { message: "query must be non-empty.".to_string() });
		}

		let max = self.cfg.search.max_query_chars;

		if text.chars().count() > max as usize {
			return Err(Error::InvalidQuery {
				message: format!("query must be at most {max} characters."),
			});
		}

		Ok(())
	}

	fn resolve_k(&self, requested: Option<u32>) -> Result<u32> {
		match requested {
			Some(0) =>
				Err(Error::InvalidQuery { message: "k must be greater than zero.".to_string() }),
			Some(k) => Ok(k.min(self.cfg.search.max_k)),
			None => Ok(self.cfg.search.default_k.min(self.cfg.search.max_k)),
		}
	}

	/// Runs every source concurrently and returns one outcome per retriever, in configured
	/// order. Query embeddings are requested once per provider alongside the sources that need
	/// none; vector sources start as soon as their provider answers. Whatever is still pending at
	/// the request deadline is aborted and reported as cancelled.
	async fn retrieve(&self, query: RetrievalQuery, k: u32) -> Vec<(String, SourceOutcome)> {
		let retrievers = &self.components.retrievers;
		let deadline = Instant::now() + Duration::from_millis(self.cfg.search.request_timeout_ms);
		let base = Arc::new(query);
		let mut outcomes: HashMap<String, SourceOutcome> = HashMap::new();
		let mut waiting: HashMap<String, Vec<Arc<dyn Retriever>>> = HashMap::new();
		let mut tasks = JoinSet::new();

		for retriever in retrievers {
			let Some(provider) = retriever.embedding() else {
				tasks.spawn(run_source(retriever.clone(), base.clone(), k));

				continue;
			};

			if !waiting.contains_key(provider) {
				let Some(provider_cfg) = self.provider_config(provider) else {
					outcomes.insert(
						retriever.name().to_string(),
						Err(SourceError::EmbeddingUnavailable { provider: provider.to_string() }),
					);

					continue;
				};

				tasks.spawn(embed_query(
					self.components.embedding.clone(),
					provider_cfg.clone(),
					base.text.clone(),
				));
			}

			waiting.entry(provider.to_string()).or_default().push(retriever.clone());
		}

		let mut deadline_hit = false;

		loop {
			let joined = match time::timeout_at(deadline, tasks.join_next()).await {
				Ok(Some(joined)) => joined,
				Ok(None) => break,
				Err(_) => {
					tracing::warn!(pending = tasks.len(), "Request deadline reached.");
					tasks.abort_all();

					deadline_hit = true;

					break;
				},
			};

			match joined {
				Ok(TaskOutput::Searched { source, outcome }) => {
					outcomes.insert(source, outcome);
				},
				Ok(TaskOutput::Embedded { provider, vector }) => {
					let members = waiting.remove(&provider).unwrap_or_default();

					match vector {
						Ok(vector) => {
							let query = Arc::new(RetrievalQuery {
								vector: Some(vector),
								..RetrievalQuery::clone(&base)
							});

							for retriever in members {
								tasks.spawn(run_source(retriever, query.clone(), k));
							}
						},
						Err(err) => {
							tracing::warn!(
								provider = %provider,
								error = %err,
								"Query embedding failed."
							);

							for retriever in members {
								outcomes.insert(
									retriever.name().to_string(),
									Err(SourceError::EmbeddingUnavailable {
										provider: provider.clone(),
									}),
								);
							}
						},
					}
				},
				Err(err) => {
					tracing::error!(error = %err, "Retrieval task failed to complete.");
				},
			}
		}

		retrievers
			.iter()
			.map(|retriever| {
				let name = retriever.name().to_string();
				let outcome = outcomes.remove(&name).unwrap_or_else(|| {
					if deadline_hit {
						Err(SourceError::Cancelled)
					} else {
						Err(SourceError::Backend {
							message: "Retrieval task ended without a result.".to_string(),
						})
					}
				});

				(name, outcome)
			})
			.collect()
	}

	fn provider_config(&self, name: &str) -> Option<&EmbeddingProviderConfig> {
		self.cfg.providers.embedding.iter().find(|provider| provider.name == name)
	}

	/// Cross references for the top `top_n` locations and annotations for the top `top_m`
	/// documents, run concurrently. A failed section comes back empty and is named in
	/// `partial_failures`.
	async fn enrich(&self, results: &[FusedResult], options: SearchOptions) -> Enrichment {
		let refs_cfg = &self.cfg.search.cross_references;
		let annotations_cfg = &self.cfg.search.annotations;
		let locations: Vec<LocationKey> = results
			.iter()
			.take(refs_cfg.top_n as usize)
			.map(|result| result.content.location.clone())
			.collect();
		let document_ids: Vec<String> = results
			.iter()
			.take(annotations_cfg.top_m as usize)
			.map(|result| result.document_id.clone())
			.collect();
		let expander = CrossReferenceExpander::new(
			self.components.references.clone(),
			refs_cfg.per_location_limit,
			refs_cfg.max_total,
			Duration::from_millis(refs_cfg.timeout_ms),
		);
		let enricher = AnnotationEnricher::new(
			self.components.annotations.clone(),
			annotations_cfg.namespaces.clone(),
			Duration::from_millis(annotations_cfg.timeout_ms),
		);
		let (references, annotations) = tokio::join!(
			async {
				if options.expand_cross_refs {
					Some(expander.expand(&locations).await)
				} else {
					None
				}
			},
			async {
				if options.enrich_annotations {
					Some(enricher.enrich(&document_ids).await)
				} else {
					None
				}
			},
		);
		let mut partial_failures = Vec::new();
		let cross_references = section(references, CROSS_REFERENCES_SECTION, &mut partial_failures);
		let annotations = section(annotations, ANNOTATIONS_SECTION, &mut partial_failures);

		Enrichment { cross_references, annotations, partial_failures }
	}
}

async fn embed_query(
	embedder: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
	text: String,
) -> TaskOutput {
	let texts = [text];
	let timeout = Duration::from_millis(cfg.timeout_ms);
	let vector = match time::timeout(timeout, embedder.embed(&cfg, &texts)).await {
		Ok(Ok(vectors)) => vectors.into_iter().next().ok_or_else(|| SourceError::Backend {
			message: "Embedding provider returned no vectors.".to_string(),
		}),
		Ok(Err(err)) => Err(SourceError::Backend { message: err.to_string() }),
		Err(_) => Err(SourceError::Timeout { after_ms: cfg.timeout_ms }),
	};

	TaskOutput::Embedded { provider: cfg.name, vector }
}

async fn run_source(
	retriever: Arc<dyn Retriever>,
	query: Arc<RetrievalQuery>,
	k: u32,
) -> TaskOutput {
	let timeout = retriever.timeout();
	let outcome = match time::timeout(timeout, retriever.search(&query, k)).await {
		Ok(outcome) => outcome,
		Err(_) => Err(SourceError::Timeout { after_ms: timeout.as_millis() as u64 }),
	};

	TaskOutput::Searched { source: retriever.name().to_string(), outcome }
}

fn section<T>(
	outcome: Option<Result<Vec<T>, SourceError>>,
	name: &str,
	partial_failures: &mut Vec<String>,
) -> Vec<T> {
	match outcome {
		None => Vec::new(),
		Some(Ok(items)) => items,
		Some(Err(err)) => {
			tracing::warn!(section = name, error = %err, "Enrichment failed.");
			partial_failures.push(name.to_string());

			Vec::new()
		},
	}
}
