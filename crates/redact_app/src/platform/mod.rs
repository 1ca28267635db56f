mod app;
mod audit;
mod effects;
mod export;
mod ui;

use crate::cli::{Cli, Command};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Open { path } => app::run_session(&cli, path),
        Command::Audit(args) => audit::run(&cli, args),
    }
}
