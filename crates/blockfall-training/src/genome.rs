//! Agent genomes: one evolvable network plus penalty configuration and game results.

use blockfall_evaluator::{
    board_feature::BoardFeatures,
    placement_evaluator::{PenaltyWeights, PlacementEvaluator},
    turn_evaluator::GameResult,
};
use rand::Rng;

use crate::network::{InvalidTopology, NeuralNetwork, ShapeMismatch, Topology};

/// Fitness credited per cleared line on top of the game score.
pub const LINE_FITNESS_BONUS: f32 = 100.0;

/// A single agent of the population.
///
/// The network is owned exclusively by this genome. `fitness`, `score` and
/// `lines_cleared` are per-game averages from the most recent evaluation, and zero for
/// genomes that have not been evaluated yet.
#[derive(Debug, Clone)]
pub struct AgentGenome {
    network: NeuralNetwork,
    penalties: PenaltyWeights,
    fitness: f32,
    score: f32,
    lines_cleared: f32,
}

impl AgentGenome {
    /// Creates a genome with a freshly initialized network.
    pub fn random<R>(
        topology: Topology,
        penalties: PenaltyWeights,
        rng: &mut R,
    ) -> Result<Self, InvalidTopology>
    where
        R: Rng + ?Sized,
    {
        Ok(Self::new(NeuralNetwork::random(topology, rng)?, penalties))
    }

    #[must_use]
    pub fn new(network: NeuralNetwork, penalties: PenaltyWeights) -> Self {
        Self {
            network,
            penalties,
            fitness: 0.0,
            score: 0.0,
            lines_cleared: 0.0,
        }
    }

    #[must_use]
    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    #[must_use]
    pub fn penalties(&self) -> &PenaltyWeights {
        &self.penalties
    }

    pub fn set_penalties(&mut self, penalties: PenaltyWeights) {
        self.penalties = penalties;
    }

    /// Average of `score + lines_cleared × 100` over the evaluated games.
    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    #[must_use]
    pub fn score(&self) -> f32 {
        self.score
    }

    #[must_use]
    pub fn lines_cleared(&self) -> f32 {
        self.lines_cleared
    }

    /// Creates an unevaluated child whose network mixes both parents.
    ///
    /// The child inherits `self`'s penalty configuration.
    pub fn crossover<R>(&self, partner: &Self, rng: &mut R) -> Result<Self, ShapeMismatch>
    where
        R: Rng + ?Sized,
    {
        let network = self.network.crossover(&partner.network, rng)?;
        Ok(Self::new(network, self.penalties))
    }

    pub fn mutate<R>(&mut self, rate: f32, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.network.mutate(rate, rng);
    }

    /// Returns the placement evaluator this genome plays with.
    ///
    /// With `penalty_shaping` the genome's linear penalty sum is added to the network
    /// output; otherwise the network scores alone.
    #[must_use]
    pub fn evaluator(&self, penalty_shaping: bool) -> GenomeEvaluator<'_> {
        GenomeEvaluator {
            network: &self.network,
            shaping: penalty_shaping.then_some(&self.penalties),
        }
    }

    /// Replaces the bookkeeping with the averages over `results`.
    ///
    /// An empty slice resets everything to zero.
    #[expect(clippy::cast_precision_loss)]
    pub fn record_results(&mut self, results: &[GameResult]) {
        if results.is_empty() {
            self.fitness = 0.0;
            self.score = 0.0;
            self.lines_cleared = 0.0;
            return;
        }
        let games = results.len() as f32;
        let score: usize = results.iter().map(|r| r.score).sum();
        let lines: usize = results.iter().map(|r| r.lines_cleared).sum();
        self.score = score as f32 / games;
        self.lines_cleared = lines as f32 / games;
        self.fitness = self.score + self.lines_cleared * LINE_FITNESS_BONUS;
    }
}

/// Placement evaluator borrowing a genome's network (and optionally its penalties).
#[derive(Debug, Clone, Copy)]
pub struct GenomeEvaluator<'g> {
    network: &'g NeuralNetwork,
    shaping: Option<&'g PenaltyWeights>,
}

impl PlacementEvaluator for GenomeEvaluator<'_> {
    fn evaluate_placement(&self, features: &BoardFeatures) -> f32 {
        let value = self.network.evaluate_placement(features);
        match self.shaping {
            Some(penalties) => value + penalties.score(features),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn genome(seed: u64) -> AgentGenome {
        let mut rng = Pcg32::seed_from_u64(seed);
        AgentGenome::random(Topology::default(), PenaltyWeights::default(), &mut rng).unwrap()
    }

    fn result(score: usize, lines_cleared: usize) -> GameResult {
        GameResult {
            score,
            lines_cleared,
            pieces: 10,
            topped_out: true,
        }
    }

    #[test]
    fn test_record_results_averages_games() {
        let mut genome = genome(0);
        assert!(genome.fitness().abs() < f32::EPSILON);
        genome.record_results(&[result(40, 1), result(140, 3)]);
        assert!((genome.score() - 90.0).abs() < f32::EPSILON);
        assert!((genome.lines_cleared() - 2.0).abs() < f32::EPSILON);
        assert!((genome.fitness() - 290.0).abs() < f32::EPSILON);

        genome.record_results(&[]);
        assert!(genome.fitness().abs() < f32::EPSILON);
    }

    #[test]
    fn test_child_is_unevaluated() {
        let mut a = genome(1);
        a.record_results(&[result(100, 2)]);
        let b = genome(2);
        let mut rng = Pcg32::seed_from_u64(3);
        let child = a.crossover(&b, &mut rng).unwrap();
        assert!(child.fitness().abs() < f32::EPSILON);
        assert_eq!(child.penalties(), a.penalties());
    }

    #[test]
    fn test_crossover_with_different_depth_fails() {
        let mut rng = Pcg32::seed_from_u64(4);
        let shallow = Topology {
            hidden_layers: 2,
            ..Topology::default()
        };
        let deep = Topology {
            hidden_layers: 3,
            ..Topology::default()
        };
        let a = AgentGenome::random(shallow, PenaltyWeights::default(), &mut rng).unwrap();
        let b = AgentGenome::random(deep, PenaltyWeights::default(), &mut rng).unwrap();
        assert!(a.crossover(&b, &mut rng).is_err());
    }

    #[test]
    fn test_penalty_shaping_adds_linear_score() {
        let genome = genome(5);
        let features = BoardFeatures {
            holes: 1,
            ..BoardFeatures::default()
        };
        let plain = genome.evaluator(false).evaluate_placement(&features);
        let shaped = genome.evaluator(true).evaluate_placement(&features);
        assert!((shaped - (plain - 10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_set_penalties_changes_shaping_only() {
        let mut genome = genome(6);
        let network = genome.network().clone();
        genome.set_penalties(PenaltyWeights {
            hole_penalty: -1.0,
            ..PenaltyWeights::default()
        });
        assert_eq!(genome.network(), &network);
        assert_eq!(genome.penalties().hole_penalty, -1.0);
    }
}
