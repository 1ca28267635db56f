mod cli;
mod platform;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    engine_logging::initialize(cli.log.destination(), cli.log_level.filter());
    platform::run(cli)
}
