use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashMap},
};

use serde::Serialize;

use concord_domain::Document;

use crate::search::retrieval::SourceHits;

#[derive(Debug, Clone, Serialize)]
pub struct FusedResult {
	pub document_id: String,
	/// The document as supplied by the first source that returned it.
	pub content: Document,
	pub per_source_scores: BTreeMap<String, f32>,
	/// Weighted mean of the scores present in `per_source_scores`.
	pub combined_score: f32,
	/// Sources in the order they first contributed.
	pub contributing_sources: Vec<String>,
	pub best_rank: u32,
}

struct Accumulator {
	content: Document,
	scores: BTreeMap<String, f32>,
	ranks: HashMap<String, u32>,
	sources: Vec<String>,
}

/// Union fusion of per-source ranked lists.
///
/// Documents are folded by id. Within one source a repeated document keeps its first similarity
/// and takes the rank of its last occurrence. The output is ordered by combined score, then by
/// number of contributing sources, then by best rank, then by document id, and truncated to `k`.
pub fn fuse(sources: &[SourceHits], weights: &HashMap<String, f32>, k: u32) -> Vec<FusedResult> {
	if k == 0 {
		return Vec::new();
	}

	let mut order: Vec<Accumulator> = Vec::new();
	let mut by_id: HashMap<&str, usize> = HashMap::new();

	for source in sources {
		for hit in &source.hits {
			let idx = match by_id.get(hit.document.document_id.as_str()) {
				Some(idx) => *idx,
				None => {
					order.push(Accumulator {
						content: hit.document.clone(),
						scores: BTreeMap::new(),
						ranks: HashMap::new(),
						sources: Vec::new(),
					});
					by_id.insert(hit.document.document_id.as_str(), order.len() - 1);

					order.len() - 1
				},
			};
			let acc = &mut order[idx];

			if !acc.scores.contains_key(&source.source) {
				let similarity = if hit.similarity.is_nan() { 0.0 } else { hit.similarity };

				acc.scores.insert(source.source.clone(), similarity);
				acc.sources.push(source.source.clone());
			}

			acc.ranks.insert(source.source.clone(), hit.rank);
		}
	}

	let mut fused: Vec<FusedResult> = order
		.into_iter()
		.map(|acc| {
			let combined_score = weighted_mean(&acc.scores, weights);
			let best_rank = acc.ranks.values().copied().min().unwrap_or(u32::MAX);

			FusedResult {
				document_id: acc.content.document_id.clone(),
				content: acc.content,
				per_source_scores: acc.scores,
				combined_score,
				contributing_sources: acc.sources,
				best_rank,
			}
		})
		.collect();

	fused.sort_by(|left, right| {
		cmp_f32_desc(left.combined_score, right.combined_score)
			.then_with(|| right.contributing_sources.len().cmp(&left.contributing_sources.len()))
			.then_with(|| left.best_rank.cmp(&right.best_rank))
			.then_with(|| left.document_id.cmp(&right.document_id))
	});
	fused.truncate(k as usize);

	fused
}

pub fn source_weight(weights: &HashMap<String, f32>, source: &str) -> f32 {
	weights.get(source).copied().filter(|weight| weight.is_finite() && *weight > 0.0).unwrap_or(1.0)
}

fn weighted_mean(scores: &BTreeMap<String, f32>, weights: &HashMap<String, f32>) -> f32 {
	let mut total = 0.0_f32;
	let mut weight_sum = 0.0_f32;

	for (source, score) in scores {
		let weight = source_weight(weights, source);

		total += weight * score;
		weight_sum += weight;
	}

	if weight_sum <= 0.0 {
		return 0.0;
	}

	(total / weight_sum).clamp(0.0, 1.0)
}

fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
