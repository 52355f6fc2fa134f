pub mod embedding;

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_bearer_and_default_headers() {
		let mut defaults = Map::new();

		defaults.insert("x-tenant".to_string(), Value::String("verses".to_string()));

		let headers = auth_headers("secret", &defaults).expect("headers failed");

		assert_eq!(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()), Some("Bearer secret"));
		assert_eq!(headers.get("x-tenant").and_then(|v| v.to_str().ok()), Some("verses"));
	}

	#[test]
	fn rejects_non_string_default_headers() {
		let mut defaults = Map::new();

		defaults.insert("x-retries".to_string(), Value::from(3));

		assert!(auth_headers("secret", &defaults).is_err());
	}
}
