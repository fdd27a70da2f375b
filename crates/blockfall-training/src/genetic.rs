//! Genetic algorithm over agent genomes.
//!
//! # Algorithm Overview
//!
//! 1. **Evaluate Fitness** - Every genome plays the same set of seeded games; its fitness
//!    is the average of `score + lines_cleared × 100`
//! 2. **Rank** - Genomes are sorted by fitness, best first
//! 3. **Elite Selection** - The top `elite_fraction × N` genomes are copied unchanged
//! 4. **Roulette Selection** - Two parents are drawn with probability proportional to
//!    fitness, from the *whole* ranked population
//! 5. **Crossover** - Each network entry comes from either parent with probability 0.5
//! 6. **Mutation** - Each entry is perturbed by `0.5 × N(0, 1)` with probability
//!    `mutation_rate`
//!
//! Steps 4-6 repeat until the next generation has `N` genomes.
//!
//! # Evaluation
//!
//! Genomes are evaluated one after another. Each evaluation borrows its own genome and
//! plays on private [`GameState`]s, so no state is shared between agents.

use blockfall_engine::{GameState, PieceSeed, Randomizer};
use blockfall_evaluator::{
    placement_evaluator::PenaltyWeights,
    turn_evaluator::{GameResult, TurnEvaluator},
};
use rand::{Rng, seq::IndexedRandom as _};

use crate::{
    genome::AgentGenome,
    network::{InvalidTopology, ShapeMismatch, Topology},
};

/// How each evaluation game is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub piece_limit: Option<usize>,
    pub randomizer: Randomizer,
    pub use_hold: bool,
    pub penalty_shaping: bool,
}

/// Fitness statistics of an evaluated population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessSummary {
    pub best: f32,
    pub average: f32,
    pub worst: f32,
}

/// A population of genomes sharing one network topology.
#[derive(Debug, Clone)]
pub struct Population {
    genomes: Vec<AgentGenome>,
}

impl Population {
    /// Creates `count` genomes with random networks.
    pub fn random<R>(
        topology: Topology,
        penalties: PenaltyWeights,
        count: usize,
        rng: &mut R,
    ) -> Result<Self, InvalidTopology>
    where
        R: Rng + ?Sized,
    {
        let genomes = (0..count)
            .map(|_| AgentGenome::random(topology, penalties, rng))
            .collect::<Result<_, _>>()?;
        Ok(Self { genomes })
    }

    #[must_use]
    pub fn from_genomes(genomes: Vec<AgentGenome>) -> Self {
        Self { genomes }
    }

    #[must_use]
    pub fn genomes(&self) -> &[AgentGenome] {
        &self.genomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns the first genome: the fittest one once the population has been evaluated.
    #[must_use]
    pub fn best(&self) -> Option<&AgentGenome> {
        self.genomes.first()
    }

    /// Replaces every genome's penalty configuration. Networks and fitness are kept.
    pub fn set_penalties(&mut self, penalties: PenaltyWeights) {
        for genome in &mut self.genomes {
            genome.set_penalties(penalties);
        }
    }

    /// Plays one game per seed with every genome and ranks them by fitness, best first.
    pub fn evaluate_fitness(&mut self, seeds: &[PieceSeed], settings: &GameSettings) {
        for genome in &mut self.genomes {
            let results: Vec<GameResult> = {
                let evaluator = TurnEvaluator::new(Box::new(
                    genome.evaluator(settings.penalty_shaping),
                ))
                .with_hold(settings.use_hold);
                seeds
                    .iter()
                    .map(|&seed| {
                        let state = GameState::with_seed(seed, settings.randomizer);
                        evaluator.play_game(state, settings.piece_limit)
                    })
                    .collect()
            };
            genome.record_results(&results);
        }

        // sort by fitness descending
        self.genomes
            .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
    }

    /// Returns best, average and worst fitness, or `None` for an empty population.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn fitness_summary(&self) -> Option<FitnessSummary> {
        let fitness = self.genomes.iter().map(AgentGenome::fitness);
        let best = fitness.clone().reduce(f32::max)?;
        let worst = fitness.clone().reduce(f32::min)?;
        let average = fitness.sum::<f32>() / self.genomes.len() as f32;
        Some(FitnessSummary {
            best,
            average,
            worst,
        })
    }
}

/// Controls how one generation turns into the next.
#[derive(Debug, Clone, Copy)]
pub struct PopulationEvolver {
    /// Fraction of the population copied unchanged (elitism).
    pub elite_fraction: f32,
    /// Per-entry mutation probability for children.
    pub mutation_rate: f32,
}

impl PopulationEvolver {
    /// Number of elites kept from a population of `population_size`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn elite_count(&self, population_size: usize) -> usize {
        let count = (self.elite_fraction.clamp(0.0, 1.0) * population_size as f32).floor();
        (count as usize).min(population_size)
    }

    /// Creates the next generation from a ranked population.
    ///
    /// # Panics
    ///
    /// Panics if `population` is not sorted by fitness, best first.
    pub fn evolve<R>(
        &self,
        population: &Population,
        rng: &mut R,
    ) -> Result<Population, ShapeMismatch>
    where
        R: Rng + ?Sized,
    {
        let genomes = &population.genomes;
        assert!(genomes.is_sorted_by(|a, b| a.fitness() >= b.fitness()));

        let mut next_genomes = Vec::with_capacity(genomes.len());
        next_genomes.extend(genomes[..self.elite_count(genomes.len())].iter().cloned());

        while next_genomes.len() < genomes.len() {
            let p1 = roulette_select(genomes, rng);
            let p2 = roulette_select(genomes, rng);
            let mut child = p1.crossover(p2, rng)?;
            child.mutate(self.mutation_rate, rng);
            next_genomes.push(child);
        }

        Ok(Population {
            genomes: next_genomes,
        })
    }
}

/// Selects a genome with probability proportional to its fitness.
///
/// Negative fitness counts as zero. When the total is zero every genome is equally
/// likely.
///
/// # Panics
///
/// Panics if `genomes` is empty.
fn roulette_select<'a, R>(genomes: &'a [AgentGenome], rng: &mut R) -> &'a AgentGenome
where
    R: Rng + ?Sized,
{
    let total: f32 = genomes.iter().map(|g| g.fitness().max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return genomes.choose(rng).expect("population should not be empty");
    }
    let mut remaining = rng.random_range(0.0..total);
    for genome in genomes {
        remaining -= genome.fitness().max(0.0);
        if remaining < 0.0 {
            return genome;
        }
    }
    // rounding can leave a tiny remainder
    genomes.last().expect("population should not be empty")
}
