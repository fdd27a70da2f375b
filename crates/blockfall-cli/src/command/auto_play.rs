use std::path::PathBuf;

use blockfall_engine::{GameState, PieceSeed, Randomizer};
use blockfall_evaluator::{
    placement_evaluator::{LinearEvaluator, PenaltyWeights},
    turn_evaluator::{GameResult, TurnEvaluator},
};
use rand::Rng as _;
use serde::Serialize;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Seed of the piece sequence (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Penalty coefficients JSON file
    #[arg(long)]
    penalties: Option<PathBuf>,
    /// Stop after this many pieces (play until top-out when omitted)
    #[arg(long)]
    piece_limit: Option<usize>,
    /// Never use the hold slot
    #[arg(long)]
    no_hold: bool,
    /// Piece randomizer (uniform or bag)
    #[arg(long, default_value = "uniform")]
    randomizer: Randomizer,
    /// Output file for the game report (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct AutoPlayReport {
    seed: PieceSeed,
    randomizer: Randomizer,
    use_hold: bool,
    penalties: PenaltyWeights,
    result: GameResult,
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let penalties = match &arg.penalties {
        Some(path) => util::read_penalties_file(path)?,
        None => PenaltyWeights::default(),
    };
    let seed = match arg.seed {
        Some(seed) => PieceSeed::from_u64(seed),
        None => rand::rng().random(),
    };
    let use_hold = !arg.no_hold;

    let report = play(seed, arg.randomizer, use_hold, penalties, arg.piece_limit);
    let GameResult {
        score,
        lines_cleared,
        pieces,
        topped_out,
    } = report.result;
    eprintln!(
        "Game over: score={score} lines={lines_cleared} pieces={pieces} ({})",
        if topped_out { "topped out" } else { "piece limit" }
    );

    Output::save_json(&report, arg.output.clone())
}

fn play(
    seed: PieceSeed,
    randomizer: Randomizer,
    use_hold: bool,
    penalties: PenaltyWeights,
    piece_limit: Option<usize>,
) -> AutoPlayReport {
    log::info!("Playing headless game ({randomizer} randomizer, hold: {use_hold})");
    let evaluator = TurnEvaluator::new(Box::new(LinearEvaluator::new(penalties))).with_hold(use_hold);
    let result = evaluator.play_game(GameState::with_seed(seed, randomizer), piece_limit);
    AutoPlayReport {
        seed,
        randomizer,
        use_hold,
        penalties,
        result,
    }
}
