use clap::Parser;
use cloudcfg_server::cli::Cli;
use cloudcfg_server::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;
    cloudcfg_server::run(cli).await
}
