use clap::Parser;
use zeebe_graphql_worker::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => cli::run::run().await,
        Command::Eval(args) => cli::eval::run(args),
    }
}
