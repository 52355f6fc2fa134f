use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = concord_search::Args::parse();

	concord_search::run(args).await
}
