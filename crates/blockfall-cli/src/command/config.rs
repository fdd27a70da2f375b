use blockfall_evaluator::placement_evaluator::PenaltyWeights;
use blockfall_training::trainer::TrainingParams;

use crate::util::Output;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum ConfigKind {
    Penalties,
    #[default]
    Training,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Which configuration to print (penalties or training)
    #[arg(default_value = "training")]
    kind: ConfigKind,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    match arg.kind {
        ConfigKind::Penalties => Output::save_json(&PenaltyWeights::default(), None),
        ConfigKind::Training => Output::save_json(&TrainingParams::default(), None),
    }
}
