//! solx - Solidity compiler version manager CLI

use clap::Parser;

mod cli;
mod commands;
mod output;
mod style;
mod styles;
mod telemetry;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    telemetry::init(cli.global.verbose);

    let exit_code = commands::run(cli).await;
    std::process::exit(exit_code);
}
