use serde::Serialize;

use concord_domain::{Document, query::QueryKind};

/// What every retriever receives. `vector` is set only for sources backed by an embedding
/// provider, and only when that provider produced a vector.
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
	pub text: String,
	pub kind: QueryKind,
	pub variant_label: Option<String>,
	pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalHit {
	pub document: Document,
	pub source: String,
	/// Always within `[0, 1]`.
	pub similarity: f32,
	/// 1-based position in the source's own ordering.
	pub rank: u32,
}

/// One successful source's hits, in the source's order.
#[derive(Debug, Clone)]
pub struct SourceHits {
	pub source: String,
	pub hits: Vec<RetrievalHit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreConvention {
	/// Higher is better and already bounded.
	Similarity,
	/// Lower is better; mapped through `1 - d / max_expected`.
	Distance { max_expected: f32 },
}
impl ScoreConvention {
	pub fn parse(raw: &str, max_expected_distance: f32) -> Option<Self> {
		match raw {
			"similarity" => Some(Self::Similarity),
			"distance" => Some(Self::Distance { max_expected: max_expected_distance }),
			_ => None,
		}
	}

	pub fn similarity(self, raw: f32) -> f32 {
		if !raw.is_finite() {
			return 0.0;
		}

		let value = match self {
			Self::Similarity => raw,
			Self::Distance { max_expected } if max_expected > 0.0 => 1.0 - raw / max_expected,
			Self::Distance { .. } => 0.0,
		};

		value.clamp(0.0, 1.0)
	}
}

/// Numbers hits 1..n in the order given.
pub fn ranked_hits(
	source: &str,
	scored: impl IntoIterator<Item = (Document, f32)>,
	convention: ScoreConvention,
) -> Vec<RetrievalHit> {
	scored
		.into_iter()
		.enumerate()
		.map(|(idx, (document, raw))| RetrievalHit {
			document,
			source: source.to_string(),
			similarity: convention.similarity(raw),
			rank: idx as u32 + 1,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use concord_domain::LocationKey;

	use super::*;

	fn doc(id: &str) -> Document {
		Document {
			document_id: id.to_string(),
			location: LocationKey::new("John", 1, 1),
			variant_label: "KJV".to_string(),
			text: String::new(),
		}
	}

	#[test]
	fn distance_maps_into_unit_interval() {
		let convention = ScoreConvention::Distance { max_expected: 2.0 };

		assert_eq!(convention.similarity(0.0), 1.0);
		assert_eq!(convention.similarity(1.0), 0.5);
		assert_eq!(convention.similarity(2.0), 0.0);
		assert_eq!(convention.similarity(3.5), 0.0);
		assert_eq!(convention.similarity(-0.5), 1.0);
	}

	#[test]
	fn similarity_is_clamped() {
		let convention = ScoreConvention::Similarity;

		assert_eq!(convention.similarity(0.42), 0.42);
		assert_eq!(convention.similarity(-0.3), 0.0);
		assert_eq!(convention.similarity(1.0001), 1.0);
		assert_eq!(convention.similarity(f32::NAN), 0.0);
	}

	#[test]
	fn parses_score_names() {
		assert_eq!(ScoreConvention::parse("similarity", 2.0), Some(ScoreConvention::Similarity));
		assert_eq!(
			ScoreConvention::parse("distance", 4.0),
			Some(ScoreConvention::Distance { max_expected: 4.0 })
		);
		assert_eq!(ScoreConvention::parse("rank", 2.0), None);
	}

	#[test]
	fn ranks_follow_input_order() {
		let hits =
			ranked_hits("dense", [(doc("a"), 0.9), (doc("b"), 0.4)], ScoreConvention::Similarity);

		assert_eq!(hits[0].rank, 1);
		assert_eq!(hits[1].rank, 2);
		assert_eq!(hits[1].document.document_id, "b");
		assert_eq!(hits[0].source, "dense");
	}
}
