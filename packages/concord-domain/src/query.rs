use std::collections::HashSet;

use crate::LocationKey;

pub const MAX_KEYWORDS: usize = 16;

/// How the lexical matcher should interpret a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryKind {
	/// The whole query is a verse reference such as `John 3:16`.
	Reference(LocationKey),
	/// Free text, matched by keywords.
	Text { keywords: Vec<String> },
}

/// Trims and collapses runs of whitespace.
pub fn normalize_query(raw: &str) -> String {
	raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn classify_query(query: &str) -> QueryKind {
	if let Ok(location) = query.parse::<LocationKey>() {
		return QueryKind::Reference(location);
	}

	QueryKind::Text { keywords: extract_keywords(query, MAX_KEYWORDS) }
}

/// Lowercased alphanumeric terms of at least two characters, deduplicated in first-seen order.
pub fn extract_keywords(query: &str, max_terms: usize) -> Vec<String> {
	let mut normalized = String::with_capacity(query.len());

	for ch in query.chars() {
		if ch.is_alphanumeric() {
			normalized.extend(ch.to_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for token in normalized.split_whitespace() {
		if out.len() >= max_terms {
			break;
		}
		if token.chars().count() < 2 {
			continue;
		}
		if seen.insert(token) {
			out.push(token.to_string());
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_whitespace() {
		assert_eq!(normalize_query("  God   so\tloved \n"), "God so loved");
	}

	#[test]
	fn classifies_reference_queries() {
		assert_eq!(
			classify_query("Romans 8:28"),
			QueryKind::Reference(LocationKey::new("Romans", 8, 28))
		);
	}

	#[test]
	fn extracts_unique_keywords_in_order() {
		assert_eq!(
			classify_query("Love is patient, love is kind!"),
			QueryKind::Text {
				keywords: vec![
					"love".to_string(),
					"is".to_string(),
					"patient".to_string(),
					"kind".to_string(),
				],
			}
		);
	}

	#[test]
	fn keeps_non_ascii_terms() {
		assert_eq!(extract_keywords("Ἐν ἀρχῇ ἦν ὁ λόγος", 16), vec!["ἐν", "ἀρχῇ", "ἦν", "λόγος"]);
	}

	#[test]
	fn caps_keyword_count() {
		let keywords = extract_keywords("aa bb cc dd ee", 3);

		assert_eq!(keywords, vec!["aa", "bb", "cc"]);
	}
}
