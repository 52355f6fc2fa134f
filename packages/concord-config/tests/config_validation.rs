use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use concord_config::{Config, Error};

const EXAMPLE_TOML: &str = include_str!("../../../concord.example.toml");

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("concord_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(EXAMPLE_TOML).expect("Failed to parse example config.")
}

fn expect_validation_error(cfg: &Config, needle: &str) {
	let err = concord_config::validate(cfg).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(err.to_string().contains(needle), "Unexpected error: {err}");
}

#[test]
fn concord_example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../concord.example.toml");

	concord_config::load(&path).expect("Expected concord.example.toml to be a valid config.");
}

#[test]
fn missing_file_reports_read_error() {
	let path = PathBuf::from("/nonexistent/concord.toml");
	let err = concord_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn malformed_toml_reports_parse_error() {
	let path = write_temp_config("[service\nlog_level = ");
	let result = concord_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn search_defaults_apply_when_section_is_omitted() {
	let payload = EXAMPLE_TOML.split("[search]").next().expect("Example must contain [search].");
	let path = write_temp_config(payload);
	let result = concord_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected config without [search] to load.");

	assert_eq!(cfg.search.default_k, 10);
	assert_eq!(cfg.search.max_k, 50);
	assert_eq!(cfg.search.cross_references.top_n, 5);
	assert_eq!(cfg.search.cross_references.max_total, 10);
	assert_eq!(cfg.search.annotations.top_m, 3);
	assert_eq!(cfg.search.annotations.namespaces.len(), 2);
	assert!(cfg.search.fusion.source_weights.is_empty());
}

#[test]
fn blank_collection_is_normalized_then_rejected() {
	let payload = EXAMPLE_TOML.replace("collection = \"verses_v1\"", "collection = \"  \"");
	let path = write_temp_config(&payload);
	let result = concord_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected missing collection error.");

	assert!(
		err.to_string().contains("sources.vector.verses_dense.collection is required"),
		"Unexpected error: {err}"
	);
}

#[test]
fn vector_source_must_reference_known_embedding_provider() {
	let mut cfg = base_config();

	cfg.sources.vector[0].embedding = "missing".to_string();

	expect_validation_error(&cfg, "refers to unknown provider \"missing\"");
}

#[test]
fn vector_dim_must_match_provider_dimensions() {
	let mut cfg = base_config();

	cfg.sources.vector[1].vector_dim = 768;

	expect_validation_error(
		&cfg,
		"sources.vector.verses_pg.vector_dim must match providers.embedding.lexicon.dimensions.",
	);
}

#[test]
fn source_names_must_be_unique_across_kinds() {
	let mut cfg = base_config();

	cfg.sources.vector[0].name = "lexical".to_string();

	expect_validation_error(&cfg, "Source name \"lexical\" is used more than once.");
}

#[test]
fn pgvector_table_must_be_plain_identifier() {
	let mut cfg = base_config();

	cfg.sources.vector[1].table = Some("verse_embeddings; DROP TABLE documents".to_string());

	expect_validation_error(&cfg, "sources.vector.verses_pg.table must be a plain SQL identifier.");
}

#[test]
fn pgvector_requires_distance_scores() {
	let mut cfg = base_config();

	cfg.sources.vector[1].score = "similarity".to_string();

	expect_validation_error(&cfg, "score must be distance for the pgvector backend.");
}

#[test]
fn unknown_backend_is_rejected() {
	let mut cfg = base_config();

	cfg.sources.vector[0].backend = "faiss".to_string();

	expect_validation_error(&cfg, "backend must be one of qdrant or pgvector.");
}

#[test]
fn max_expected_distance_must_be_positive() {
	let mut cfg = base_config();

	cfg.sources.vector[1].max_expected_distance = 0.0;

	expect_validation_error(&cfg, "max_expected_distance must be a finite number greater than zero.");
}

#[test]
fn source_weights_must_be_positive_and_known() {
	let mut cfg = base_config();

	cfg.search.fusion.source_weights.insert("lexical".to_string(), 0.0);

	expect_validation_error(&cfg, "search.fusion.source_weights.lexical must be a finite number");

	let mut cfg = base_config();

	cfg.search.fusion.source_weights.insert("bm25".to_string(), 1.0);

	expect_validation_error(&cfg, "refers to unknown source \"bm25\"");
}

#[test]
fn max_k_cannot_be_below_default_k() {
	let mut cfg = base_config();

	cfg.search.max_k = 5;

	expect_validation_error(
		&cfg,
		"search.max_k must be greater than or equal to search.default_k.",
	);
}

#[test]
fn cross_reference_cap_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.cross_references.max_total = 0;

	expect_validation_error(&cfg, "search.cross_references.max_total must be greater than zero.");
}

#[test]
fn annotation_namespaces_must_be_unique() {
	let mut cfg = base_config();
	let duplicate = cfg.search.annotations.namespaces[0].clone();

	cfg.search.annotations.namespaces.push(duplicate);

	expect_validation_error(&cfg, "Annotation namespace \"hebrew\" is duplicated.");
}

#[test]
fn at_least_one_source_is_required() {
	let mut cfg = base_config();

	cfg.sources.vector.clear();
	cfg.sources.lexical.enabled = false;
	cfg.search.fusion.source_weights.clear();

	expect_validation_error(&cfg, "At least one retrieval source must be configured.");
}

#[test]
fn sql_identifier_check() {
	assert!(concord_config::is_sql_identifier("greek_tokens"));
	assert!(concord_config::is_sql_identifier("_t1"));
	assert!(!concord_config::is_sql_identifier(""));
	assert!(!concord_config::is_sql_identifier("1tokens"));
	assert!(!concord_config::is_sql_identifier("public.tokens"));
	assert!(!concord_config::is_sql_identifier("tokens\""));
}
