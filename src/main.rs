use clap::Parser;
use purse::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    purse::logging::init(cli.verbose, cli.log_json);
    cli.run().await
}
