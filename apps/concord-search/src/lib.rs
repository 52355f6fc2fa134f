use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use concord_service::{SearchOptions, SearchRequest, SearchService};

/// Runs one search against the configured sources and prints the response as JSON.
#[derive(Debug, Parser)]
#[command(
	version = concord_cli::VERSION,
	rename_all = "kebab",
	styles = concord_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Free text such as `love one another`, or a reference such as `John 3:16`.
	pub query: String,
	/// Restrict results to one corpus variant, e.g. `KJV`.
	#[arg(long, value_name = "LABEL")]
	pub variant: Option<String>,
	#[arg(long, short = 'k')]
	pub k: Option<u32>,
	#[arg(long)]
	pub no_cross_refs: bool,
	#[arg(long)]
	pub no_annotations: bool,
}
impl Args {
	pub fn request(&self) -> SearchRequest {
		SearchRequest {
			query: self.query.clone(),
			variant_label: self.variant.clone(),
			k: self.k,
			options: SearchOptions {
				expand_cross_refs: !self.no_cross_refs,
				enrich_annotations: !self.no_annotations,
			},
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = concord_config::load(&args.config)?;

	init_tracing(&config.service.log_level);

	let service = SearchService::connect(config).await?;
	let response = service.search(args.request()).await?;

	println!("{}", serde_json::to_string_pretty(&response)?);

	Ok(())
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	// Logs go to stderr so stdout stays valid JSON.
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	tracing::debug!(version = concord_cli::VERSION, "Tracing initialized.");
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_map_onto_the_request() {
		let args = Args::try_parse_from([
			"concord-search",
			"-c",
			"concord.toml",
			"--variant",
			"KJV",
			"-k",
			"5",
			"--no-annotations",
			"John 3:16",
		])
		.expect("Failed to parse arguments.");
		let req = args.request();

		assert_eq!(req.query, "John 3:16");
		assert_eq!(req.variant_label.as_deref(), Some("KJV"));
		assert_eq!(req.k, Some(5));
		assert!(req.options.expand_cross_refs);
		assert!(!req.options.enrich_annotations);
	}

	#[test]
	fn defaults_enable_enrichment() {
		let args = Args::try_parse_from(["concord-search", "--config", "c.toml", "grace"])
			.expect("Failed to parse arguments.");
		let req = args.request();

		assert_eq!(req.k, None);
		assert!(req.options.expand_cross_refs);
		assert!(req.options.enrich_annotations);
	}
}
