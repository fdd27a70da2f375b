use std::path::PathBuf;

use anyhow::Context as _;
use blockfall_training::trainer::{Trainer, TrainingParams, TrainingStatus};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training parameters JSON file (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Penalty coefficients JSON file, overriding the config's penalties
    #[arg(long)]
    penalties: Option<PathBuf>,
    /// Number of agents per generation
    #[arg(long)]
    population: Option<usize>,
    /// Maximum number of generations
    #[arg(long)]
    generations: Option<usize>,
    /// Games played by each agent per generation
    #[arg(long)]
    games: Option<usize>,
    /// Pieces after which an evaluation game is cut off
    #[arg(long)]
    piece_limit: Option<usize>,
    /// Seed of the training random generator (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Stop once a single generation takes longer than this many seconds
    #[arg(long)]
    time_budget: Option<f64>,
    /// Output file for the training summary (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let params = training_params(arg)?;

    eprintln!(
        "Training {} agents ({}) for up to {} generations",
        params.population_size, params.topology, params.max_generations
    );
    let mut trainer = match arg.seed {
        Some(seed) => Trainer::with_seed(params, seed),
        None => Trainer::new(params),
    }
    .context("Failed to set up training")?;

    let summary = trainer.run().context("Training failed")?;

    match summary.status {
        TrainingStatus::Stopped(reason) => {
            eprintln!("Training stopped after {} generations: {reason}", summary.generations);
        }
        _ => eprintln!("Training finished after {} generations", summary.generations),
    }
    if let Some(best) = summary.best_fitness {
        eprintln!("  Best fitness: {best:.1}");
    }
    if let (Some(score), Some(lines)) = (summary.best_score, summary.best_lines_cleared) {
        eprintln!("  Final best agent: score={score:.1} lines={lines:.1}");
    }

    Output::save_json(&summary, arg.output.clone())
}

/// Loads the configuration file (if any) and applies command-line overrides.
fn training_params(arg: &TrainArg) -> anyhow::Result<TrainingParams> {
    let mut params = match &arg.config {
        Some(path) => util::read_training_params_file(path)?,
        None => TrainingParams::default(),
    };
    if let Some(path) = &arg.penalties {
        params.penalties = util::read_penalties_file(path)?;
    }
    if let Some(population) = arg.population {
        params.population_size = population;
    }
    if let Some(generations) = arg.generations {
        params.max_generations = generations;
    }
    if let Some(games) = arg.games {
        params.games_per_agent = games;
    }
    if let Some(piece_limit) = arg.piece_limit {
        params.piece_limit = Some(piece_limit);
    }
    if let Some(time_budget) = arg.time_budget {
        params.time_budget = Some(time_budget);
    }
    params.validate().context("Invalid training parameters")?;
    Ok(params)
}
