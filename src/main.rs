use clap::Parser;
use keymzanzi_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Api => cli::api::run().await,
        Command::Serve => cli::serve::run().await,
    }
}
