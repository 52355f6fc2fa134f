use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub sources: Sources,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	/// Named embedding endpoints. Vector sources refer to them by `name`.
	pub embedding: Vec<EmbeddingProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub name: String,
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Sources {
	pub vector: Vec<VectorSource>,
	#[serde(default)]
	pub lexical: LexicalSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorSource {
	pub name: String,
	/// One of "qdrant" or "pgvector".
	pub backend: String,
	/// Name of the embedding provider whose vectors this index was built with.
	pub embedding: String,
	/// Qdrant collection. Required when `backend = "qdrant"`.
	pub collection: Option<String>,
	/// Postgres table holding a `vec` column. Required when `backend = "pgvector"`.
	pub table: Option<String>,
	pub vector_dim: u32,
	/// One of "cosine" or "l2".
	#[serde(default = "default_distance")]
	pub distance: String,
	/// One of "similarity" (bounded score, passed through) or "distance".
	#[serde(default = "default_score")]
	pub score: String,
	#[serde(default = "default_max_expected_distance")]
	pub max_expected_distance: f32,
	#[serde(default = "default_vector_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LexicalSource {
	pub name: String,
	pub enabled: bool,
	pub timeout_ms: u64,
}
impl Default for LexicalSource {
	fn default() -> Self {
		Self { name: "lexical".to_string(), enabled: true, timeout_ms: 5_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_k: u32,
	pub max_k: u32,
	pub max_query_chars: u32,
	/// Overall deadline for the retrieval fan-out. Pending sources are cancelled when it elapses.
	pub request_timeout_ms: u64,
	pub fusion: Fusion,
	pub cross_references: CrossReferences,
	pub annotations: Annotations,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_k: 10,
			max_k: 50,
			max_query_chars: 512,
			request_timeout_ms: 15_000,
			fusion: Fusion::default(),
			cross_references: CrossReferences::default(),
			annotations: Annotations::default(),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fusion {
	/// Per-source weight in the combined score. Sources not listed weigh 1.0.
	pub source_weights: HashMap<String, f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CrossReferences {
	pub top_n: u32,
	pub per_location_limit: u32,
	pub max_total: u32,
	pub timeout_ms: u64,
}
impl Default for CrossReferences {
	fn default() -> Self {
		Self { top_n: 5, per_location_limit: 5, max_total: 10, timeout_ms: 5_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Annotations {
	pub top_m: u32,
	pub timeout_ms: u64,
	pub namespaces: Vec<AnnotationNamespace>,
}
impl Default for Annotations {
	fn default() -> Self {
		Self {
			top_m: 3,
			timeout_ms: 5_000,
			namespaces: vec![
				AnnotationNamespace {
					name: "hebrew".to_string(),
					table: "hebrew_tokens".to_string(),
				},
				AnnotationNamespace { name: "greek".to_string(), table: "greek_tokens".to_string() },
			],
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationNamespace {
	pub name: String,
	pub table: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
	10_000
}

fn default_vector_timeout_ms() -> u64 {
	10_000
}

fn default_distance() -> String {
	"cosine".to_string()
}

fn default_score() -> String {
	"similarity".to_string()
}

fn default_max_expected_distance() -> f32 {
	2.0
}
