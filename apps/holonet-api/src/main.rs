use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = holonet_api::Args::parse();

	holonet_api::run(args).await
}
