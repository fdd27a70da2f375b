use clap::{Parser, Subcommand};

use self::{auto_play::AutoPlayArg, config::ConfigArg, train::TrainArg};

mod auto_play;
mod config;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
struct CommandArgs {
    #[clap(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a headless game with the linear evaluator
    #[command(name = "auto-play")]
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Evolve a population of neural placement scorers
    Train(#[clap(flatten)] TrainArg),
    /// Print a default configuration as JSON
    Config(#[clap(flatten)] ConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let CommandArgs { mode } = CommandArgs::parse();

    match mode {
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
    }

    Ok(())
}
