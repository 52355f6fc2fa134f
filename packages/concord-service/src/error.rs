pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
	#[error("No retrieval source returned results. Failed sources: {failed_sources:?}.")]
	NoResults { failed_sources: Vec<String> },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
}
impl From<concord_storage::Error> for Error {
	fn from(err: concord_storage::Error) -> Self {
		match err {
			concord_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			concord_storage::Error::InvalidArgument(message) => Self::Config { message },
			concord_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<concord_config::Error> for Error {
	fn from(err: concord_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

/// Why one retrieval source produced no usable hits. Recorded per source, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
	#[error("Timed out after {after_ms} ms.")]
	Timeout { after_ms: u64 },
	#[error("Backend failure: {message}")]
	Backend { message: String },
	#[error("No embedding available from provider {provider:?}.")]
	EmbeddingUnavailable { provider: String },
	#[error("Embedding has {actual} dimensions but the index expects {expected}.")]
	DimensionMismatch { expected: u32, actual: usize },
	#[error("Cancelled by the request deadline.")]
	Cancelled,
}
impl From<concord_storage::Error> for SourceError {
	fn from(err: concord_storage::Error) -> Self {
		Self::Backend { message: err.to_string() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn storage_errors_map_onto_service_errors() {
		let err = Error::from(concord_storage::Error::InvalidArgument("bad table".to_string()));

		assert!(matches!(err, Error::Config { ref message } if message == "bad table"));

		let source = SourceError::from(concord_storage::Error::InvalidArgument("bad".to_string()));

		assert!(matches!(source, SourceError::Backend { .. }));
	}
}
