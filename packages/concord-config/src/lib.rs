mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AnnotationNamespace, Annotations, Config, CrossReferences, EmbeddingProviderConfig, Fusion,
	LexicalSource, Postgres, Providers, Qdrant, Search, Service, Sources, Storage, VectorSource,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(validation("storage.postgres.dsn must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(validation("storage.postgres.pool_max_conns must be greater than zero."));
	}

	validate_providers(cfg)?;
	validate_sources(cfg)?;
	validate_search(cfg)?;

	Ok(())
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
pub fn is_sql_identifier(value: &str) -> bool {
	let mut chars = value.chars();
	let Some(first) = chars.next() else { return false };

	(first.is_ascii_alphabetic() || first == '_')
		&& chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
		&& value.len() <= 63
}

fn validate_providers(cfg: &Config) -> Result<()> {
	if cfg.providers.embedding.is_empty() && !cfg.sources.vector.is_empty() {
		return Err(validation(
			"providers.embedding must be non-empty when vector sources are configured.",
		));
	}

	let mut names = HashSet::new();

	for provider in &cfg.providers.embedding {
		if provider.name.is_empty() {
			return Err(validation("providers.embedding.name must be non-empty."));
		}
		if !names.insert(provider.name.as_str()) {
			return Err(Error::Validation {
				message: format!("providers.embedding name {:?} is duplicated.", provider.name),
			});
		}
		if provider.dimensions == 0 {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding.{}.dimensions must be greater than zero.",
					provider.name
				),
			});
		}
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {} api_key must be non-empty.", provider.name),
			});
		}
		if provider.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding.{}.timeout_ms must be greater than zero.",
					provider.name
				),
			});
		}
	}

	Ok(())
}

fn validate_sources(cfg: &Config) -> Result<()> {
	let lexical = &cfg.sources.lexical;

	if cfg.sources.vector.is_empty() && !lexical.enabled {
		return Err(validation("At least one retrieval source must be configured."));
	}

	let mut names = HashSet::new();

	if lexical.enabled {
		if lexical.name.is_empty() {
			return Err(validation("sources.lexical.name must be non-empty."));
		}
		if lexical.timeout_ms == 0 {
			return Err(validation("sources.lexical.timeout_ms must be greater than zero."));
		}

		names.insert(lexical.name.as_str());
	}

	for source in &cfg.sources.vector {
		let name = source.name.as_str();

		if name.is_empty() {
			return Err(validation("sources.vector.name must be non-empty."));
		}
		if !names.insert(name) {
			return Err(Error::Validation {
				message: format!("Source name {name:?} is used more than once."),
			});
		}

		let Some(provider) = cfg.providers.embedding.iter().find(|p| p.name == source.embedding)
		else {
			return Err(Error::Validation {
				message: format!(
					"sources.vector.{name}.embedding refers to unknown provider {:?}.",
					source.embedding
				),
			});
		};

		if source.vector_dim != provider.dimensions {
			return Err(Error::Validation {
				message: format!(
					"sources.vector.{name}.vector_dim must match providers.embedding.{}.dimensions.",
					provider.name
				),
			});
		}

		match source.backend.as_str() {
			"qdrant" =>
				if source.collection.is_none() {
					return Err(Error::Validation {
						message: format!(
							"sources.vector.{name}.collection is required for the qdrant backend."
						),
					});
				},
			"pgvector" => {
				let Some(table) = source.table.as_deref() else {
					return Err(Error::Validation {
						message: format!(
							"sources.vector.{name}.table is required for the pgvector backend."
						),
					});
				};

				if !is_sql_identifier(table) {
					return Err(Error::Validation {
						message: format!(
							"sources.vector.{name}.table must be a plain SQL identifier."
						),
					});
				}
				if source.score != "distance" {
					return Err(Error::Validation {
						message: format!(
							"sources.vector.{name}.score must be distance for the pgvector backend."
						),
					});
				}
			},
			_ => {
				return Err(Error::Validation {
					message: format!(
						"sources.vector.{name}.backend must be one of qdrant or pgvector."
					),
				});
			},
		}

		if !matches!(source.distance.as_str(), "cosine" | "l2") {
			return Err(Error::Validation {
				message: format!("sources.vector.{name}.distance must be one of cosine or l2."),
			});
		}
		if !matches!(source.score.as_str(), "similarity" | "distance") {
			return Err(Error::Validation {
				message: format!(
					"sources.vector.{name}.score must be one of similarity or distance."
				),
			});
		}
		if !source.max_expected_distance.is_finite() || source.max_expected_distance <= 0.0 {
			return Err(Error::Validation {
				message: format!(
					"sources.vector.{name}.max_expected_distance must be a finite number greater than zero."
				),
			});
		}
		if source.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("sources.vector.{name}.timeout_ms must be greater than zero."),
			});
		}
	}

	for (source, weight) in &cfg.search.fusion.source_weights {
		if !names.contains(source.as_str()) {
			return Err(Error::Validation {
				message: format!("search.fusion.source_weights refers to unknown source {source:?}."),
			});
		}
		if !weight.is_finite() || *weight <= 0.0 {
			return Err(Error::Validation {
				message: format!(
					"search.fusion.source_weights.{source} must be a finite number greater than zero."
				),
			});
		}
	}

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	if search.default_k == 0 {
		return Err(validation("search.default_k must be greater than zero."));
	}
	if search.max_k < search.default_k {
		return Err(validation("search.max_k must be greater than or equal to search.default_k."));
	}
	if search.max_query_chars == 0 {
		return Err(validation("search.max_query_chars must be greater than zero."));
	}
	if search.request_timeout_ms == 0 {
		return Err(validation("search.request_timeout_ms must be greater than zero."));
	}

	let cross_refs = &search.cross_references;

	for (label, value) in [
		("search.cross_references.top_n", cross_refs.top_n),
		("search.cross_references.per_location_limit", cross_refs.per_location_limit),
		("search.cross_references.max_total", cross_refs.max_total),
		("search.annotations.top_m", search.annotations.top_m),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if cross_refs.timeout_ms == 0 {
		return Err(validation("search.cross_references.timeout_ms must be greater than zero."));
	}
	if search.annotations.timeout_ms == 0 {
		return Err(validation("search.annotations.timeout_ms must be greater than zero."));
	}

	let mut namespaces = HashSet::new();

	for namespace in &search.annotations.namespaces {
		if namespace.name.is_empty() {
			return Err(validation("search.annotations.namespaces.name must be non-empty."));
		}
		if !namespaces.insert(namespace.name.as_str()) {
			return Err(Error::Validation {
				message: format!("Annotation namespace {:?} is duplicated.", namespace.name),
			});
		}
		if !is_sql_identifier(&namespace.table) {
			return Err(Error::Validation {
				message: format!(
					"search.annotations.namespaces.{}.table must be a plain SQL identifier.",
					namespace.name
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in &mut cfg.providers.embedding {
		provider.name = provider.name.trim().to_string();
	}
	for source in &mut cfg.sources.vector {
		source.name = source.name.trim().to_string();
		source.embedding = source.embedding.trim().to_string();

		if source.collection.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
			source.collection = None;
		}
		if source.table.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
			source.table = None;
		}
	}

	cfg.sources.lexical.name = cfg.sources.lexical.name.trim().to_string();

	for namespace in &mut cfg.search.annotations.namespaces {
		namespace.name = namespace.name.trim().to_string();
	}
}

fn validation(message: &str) -> Error {
	Error::Validation { message: message.to_string() }
}
