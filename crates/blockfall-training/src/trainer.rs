//! Training control: the generation loop and its observable state.
//!
//! A [`Trainer`] owns the population and the generator every random decision is drawn
//! from. Each [`step`](Trainer::step) runs exactly one generation:
//!
//! 1. evolve the previous generation (skipped for the first one)
//! 2. draw `games_per_agent` piece seeds shared by all genomes
//! 3. evaluate and rank the population
//! 4. record a [`GenerationReport`]
//!
//! [`run_with`](Trainer::run_with) loops until the generation limit, a stop request from
//! a [`StopHandle`], or the per-generation time budget. Stop requests and the budget are
//! only looked at between generations, so the population is always a fully evaluated,
//! ranked snapshot when the loop returns.
//!
//! # Example
//!
//! ```
//! use blockfall_training::trainer::{Trainer, TrainingParams, TrainingStatus};
//!
//! let params = TrainingParams {
//!     population_size: 4,
//!     max_generations: 2,
//!     games_per_agent: 1,
//!     piece_limit: Some(10),
//!     ..TrainingParams::default()
//! };
//! let mut trainer = Trainer::with_seed(params, 42).unwrap();
//! let summary = trainer.run().unwrap();
//!
//! assert_eq!(summary.generations, 2);
//! assert_eq!(summary.status, TrainingStatus::Finished);
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use blockfall_engine::{PieceSeed, Randomizer};
use blockfall_evaluator::{board_feature::FEATURE_COUNT, placement_evaluator::PenaltyWeights};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    genetic::{GameSettings, Population, PopulationEvolver},
    network::{InvalidTopology, ShapeMismatch, Topology},
};

/// Parameters of a training run.
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub population_size: usize,
    pub max_generations: usize,
    pub games_per_agent: usize,
    pub mutation_rate: f32,
    pub elite_fraction: f32,
    pub topology: Topology,
    /// Pieces after which an evaluation game is cut off.
    pub piece_limit: Option<usize>,
    pub randomizer: Randomizer,
    pub use_hold: bool,
    /// Add each genome's linear penalty sum to its network output.
    pub penalty_shaping: bool,
    pub penalties: PenaltyWeights,
    /// Wall-clock budget per generation, in seconds.
    pub time_budget: Option<f64>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 1000,
            games_per_agent: 5,
            mutation_rate: 0.1,
            elite_fraction: 0.1,
            topology: Topology::default(),
            piece_limit: Some(500),
            randomizer: Randomizer::Uniform,
            use_hold: true,
            penalty_shaping: false,
            penalties: PenaltyWeights::default(),
            time_budget: None,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.population_size == 0 {
            return Err(TrainingError::InvalidParams("population_size must be positive"));
        }
        if self.games_per_agent == 0 {
            return Err(TrainingError::InvalidParams("games_per_agent must be positive"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(TrainingError::InvalidParams("mutation_rate must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.elite_fraction) {
            return Err(TrainingError::InvalidParams("elite_fraction must be within [0, 1]"));
        }
        if self
            .time_budget
            .is_some_and(|secs| !secs.is_finite() || secs <= 0.0)
        {
            return Err(TrainingError::InvalidParams("time_budget must be a positive number"));
        }
        self.topology.validate()?;
        if self.topology.input_nodes != FEATURE_COUNT {
            return Err(TrainingError::InvalidTopology(InvalidTopology {
                topology: self.topology,
                reason: "input_nodes must match the board feature count",
            }));
        }
        Ok(())
    }

    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            piece_limit: self.piece_limit,
            randomizer: self.randomizer,
            use_hold: self.use_hold,
            penalty_shaping: self.penalty_shaping,
        }
    }

    #[must_use]
    pub fn evolver(&self) -> PopulationEvolver {
        PopulationEvolver {
            elite_fraction: self.elite_fraction,
            mutation_rate: self.mutation_rate,
        }
    }

    fn time_budget_duration(&self) -> Option<Duration> {
        self.time_budget.map(Duration::from_secs_f64)
    }
}

/// Failure of a training run.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TrainingError {
    #[display("invalid training parameters: {_0}")]
    InvalidParams(#[error(not(source))] &'static str),
    #[display("{_0}")]
    InvalidTopology(InvalidTopology),
    #[display("{_0}")]
    ShapeMismatch(ShapeMismatch),
}

impl From<InvalidTopology> for TrainingError {
    fn from(err: InvalidTopology) -> Self {
        Self::InvalidTopology(err)
    }
}

impl From<ShapeMismatch> for TrainingError {
    fn from(err: ShapeMismatch) -> Self {
        Self::ShapeMismatch(err)
    }
}

/// Cloneable flag asking a running [`Trainer`] to stop after the current generation.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clears a previous request so the trainer can be resumed.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a run stopped before the generation limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    #[display("stop requested")]
    StopRequested,
    #[display("time budget exceeded")]
    TimeBudget,
}

/// Lifecycle of a [`Trainer`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Idle,
    Running,
    /// Interrupted; [`Trainer::run_with`] may be called again to resume.
    Stopped(StopReason),
    /// The generation limit was reached.
    Finished,
}

/// Fitness statistics of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// 1-based index of the generation.
    pub generation: usize,
    pub best: f32,
    pub average: f32,
    pub worst: f32,
}

/// Report-only snapshot of a trainer's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingProgress {
    /// Generations evaluated so far.
    pub generation: usize,
    /// Best fitness seen in any generation.
    pub best_fitness: Option<f32>,
    /// Average fitness of the latest generation.
    pub average_fitness: Option<f32>,
    pub running: bool,
}

/// Serializable outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub generations: usize,
    pub status: TrainingStatus,
    pub best_fitness: Option<f32>,
    /// Average score and lines of the current best genome.
    pub best_score: Option<f32>,
    pub best_lines_cleared: Option<f32>,
    pub history: Vec<GenerationReport>,
}

/// Drives the evolution loop.
#[derive(Debug)]
pub struct Trainer {
    params: TrainingParams,
    rng: Pcg32,
    population: Population,
    history: Vec<GenerationReport>,
    best_fitness: Option<f32>,
    needs_evolve: bool,
    status: TrainingStatus,
    stop: StopHandle,
}

impl Trainer {
    /// Creates a trainer seeded from the thread-local RNG.
    pub fn new(params: TrainingParams) -> Result<Self, TrainingError> {
        Self::with_rng(params, Pcg32::from_rng(&mut rand::rng()))
    }

    /// Creates a trainer whose every random decision derives from `seed`.
    pub fn with_seed(params: TrainingParams, seed: u64) -> Result<Self, TrainingError> {
        Self::with_rng(params, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(params: TrainingParams, mut rng: Pcg32) -> Result<Self, TrainingError> {
        params.validate()?;
        let population = Population::random(
            params.topology,
            params.penalties,
            params.population_size,
            &mut rng,
        )?;
        Ok(Self {
            params,
            rng,
            population,
            history: vec![],
            best_fitness: None,
            needs_evolve: false,
            status: TrainingStatus::Idle,
            stop: StopHandle::default(),
        })
    }

    #[must_use]
    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Returns a handle that stops [`run_with`](Self::run_with) between generations.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Replaces the penalty coefficients of the parameters and of every genome.
    ///
    /// Networks, fitness and the generation counter are left as they are.
    pub fn set_penalties(&mut self, penalties: PenaltyWeights) {
        self.params.penalties = penalties;
        self.population.set_penalties(penalties);
    }

    /// Current population; ranked best first once a generation has been evaluated.
    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn history(&self) -> &[GenerationReport] {
        &self.history
    }

    #[must_use]
    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    #[must_use]
    pub fn progress(&self) -> TrainingProgress {
        TrainingProgress {
            generation: self.history.len(),
            best_fitness: self.best_fitness,
            average_fitness: self.history.last().map(|report| report.average),
            running: self.status.is_running(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> TrainingSummary {
        let best = self.population.best().filter(|_| !self.history.is_empty());
        TrainingSummary {
            generations: self.history.len(),
            status: self.status,
            best_fitness: self.best_fitness,
            best_score: best.map(|genome| genome.score()),
            best_lines_cleared: best.map(|genome| genome.lines_cleared()),
            history: self.history.clone(),
        }
    }

    /// Runs one generation. Returns `None` once the generation limit has been reached.
    pub fn step(&mut self) -> Result<Option<GenerationReport>, TrainingError> {
        if self.status.is_finished() {
            return Ok(None);
        }
        if self.history.len() >= self.params.max_generations {
            self.status = TrainingStatus::Finished;
            return Ok(None);
        }

        if self.needs_evolve {
            self.population = self.params.evolver().evolve(&self.population, &mut self.rng)?;
        }
        let seeds: Vec<PieceSeed> = (0..self.params.games_per_agent)
            .map(|_| self.rng.random())
            .collect();
        self.population
            .evaluate_fitness(&seeds, &self.params.game_settings());
        self.needs_evolve = true;

        let Some(fitness) = self.population.fitness_summary() else {
            return Ok(None);
        };
        let report = GenerationReport {
            generation: self.history.len() + 1,
            best: fitness.best,
            average: fitness.average,
            worst: fitness.worst,
        };
        self.best_fitness = Some(self.best_fitness.map_or(report.best, |b| b.max(report.best)));
        self.history.push(report);
        log::info!(
            "generation {}/{}: best={:.1} average={:.1} worst={:.1}",
            report.generation,
            self.params.max_generations,
            report.best,
            report.average,
            report.worst
        );

        if self.history.len() >= self.params.max_generations {
            self.status = TrainingStatus::Finished;
        }
        Ok(Some(report))
    }

    /// Runs generations until completion or interruption, returning the summary.
    pub fn run(&mut self) -> Result<TrainingSummary, TrainingError> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), calling `on_generation` after every generation.
    pub fn run_with<F>(&mut self, mut on_generation: F) -> Result<TrainingSummary, TrainingError>
    where
        F: FnMut(&GenerationReport),
    {
        let budget = self.params.time_budget_duration();
        while !self.status.is_finished() {
            if self.stop.is_requested() {
                log::warn!("stop requested after {} generations", self.history.len());
                self.status = TrainingStatus::Stopped(StopReason::StopRequested);
                break;
            }
            self.status = TrainingStatus::Running;

            let started = Instant::now();
            let Some(report) = self.step()? else {
                break;
            };
            on_generation(&report);

            if let Some(budget) = budget {
                let elapsed = started.elapsed();
                if elapsed > budget && !self.status.is_finished() {
                    log::warn!(
                        "generation {} took {:.2}s (budget {:.2}s), stopping",
                        report.generation,
                        elapsed.as_secs_f64(),
                        budget.as_secs_f64()
                    );
                    self.status = TrainingStatus::Stopped(StopReason::TimeBudget);
                    break;
                }
            }
        }
        Ok(self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TrainingParams {
        TrainingParams {
            population_size: 6,
            max_generations: 3,
            games_per_agent: 1,
            piece_limit: Some(20),
            ..TrainingParams::default()
        }
    }

    #[test]
    fn test_default_params() {
        let params = TrainingParams::default();
        assert_eq!(params.population_size, 100);
        assert_eq!(params.max_generations, 1000);
        assert_eq!(params.games_per_agent, 5);
        assert_eq!(params.evolver().elite_count(params.population_size), 10);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_from_partial_json() {
        let params: TrainingParams =
            serde_json::from_str(r#"{"population_size": 20, "topology": {"hidden_layers": 2}}"#)
                .unwrap();
        assert_eq!(params.population_size, 20);
        assert_eq!(params.topology.hidden_layers, 2);
        assert_eq!(params.topology.hidden_nodes, 4);
        assert_eq!(params.mutation_rate, 0.1);
    }

    #[test]
    fn test_invalid_params() {
        let cases = [
            TrainingParams {
                population_size: 0,
                ..params()
            },
            TrainingParams {
                games_per_agent: 0,
                ..params()
            },
            TrainingParams {
                mutation_rate: 1.5,
                ..params()
            },
            TrainingParams {
                elite_fraction: -0.1,
                ..params()
            },
            TrainingParams {
                time_budget: Some(0.0),
                ..params()
            },
        ];
        for params in cases {
            assert!(matches!(
                Trainer::new(params),
                Err(TrainingError::InvalidParams(_))
            ));
        }

        let bad_topology = TrainingParams {
            topology: Topology {
                hidden_nodes: 0,
                ..Topology::default()
            },
            ..params()
        };
        assert!(matches!(
            Trainer::new(bad_topology),
            Err(TrainingError::InvalidTopology(_))
        ));

        let wrong_inputs: TrainingParams = serde_json::from_str(
            r#"{"population_size": 2, "max_generations": 1, "games_per_agent": 1,
                "piece_limit": 5, "topology": {"input_nodes": 5}}"#,
        )
        .unwrap();
        assert!(matches!(
            wrong_inputs.validate(),
            Err(TrainingError::InvalidTopology(InvalidTopology { reason, .. }))
                if reason.contains("input_nodes")
        ));
        assert!(Trainer::with_seed(wrong_inputs, 1).is_err());
    }

    #[test]
    fn test_run_to_generation_limit() {
        let mut trainer = Trainer::with_seed(params(), 1).unwrap();
        assert_eq!(trainer.status(), TrainingStatus::Idle);
        let mut seen = vec![];
        let summary = trainer.run_with(|report| seen.push(report.generation)).unwrap();

        assert_eq!(seen, [1, 2, 3]);
        assert_eq!(summary.generations, 3);
        assert_eq!(summary.status, TrainingStatus::Finished);
        assert_eq!(trainer.population().len(), 6);
        assert!(trainer.step().unwrap().is_none());

        let progress = trainer.progress();
        assert_eq!(progress.generation, 3);
        assert!(!progress.running);
        let best = trainer
            .history()
            .iter()
            .map(|r| r.best)
            .fold(f32::MIN, f32::max);
        assert_eq!(progress.best_fitness, Some(best));
        assert_eq!(progress.average_fitness, Some(trainer.history()[2].average));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = Trainer::with_seed(params(), 7).unwrap().run().unwrap();
        let b = Trainer::with_seed(params(), 7).unwrap().run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_step_by_step() {
        let mut trainer = Trainer::with_seed(params(), 2).unwrap();
        let report = trainer.step().unwrap().unwrap();
        assert_eq!(report.generation, 1);
        assert!(report.worst <= report.average && report.average <= report.best);
        let best = trainer.population().best().unwrap();
        assert!((best.fitness() - report.best).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stop_handle() {
        let mut trainer = Trainer::with_seed(params(), 3).unwrap();
        let handle = trainer.stop_handle();
        handle.stop();
        let summary = trainer.run().unwrap();
        assert_eq!(summary.generations, 0);
        assert_eq!(
            summary.status,
            TrainingStatus::Stopped(StopReason::StopRequested)
        );
        assert!(summary.best_fitness.is_none());

        handle.reset();
        let summary = trainer.run().unwrap();
        assert_eq!(summary.generations, 3);
        assert_eq!(summary.status, TrainingStatus::Finished);
    }

    #[test]
    fn test_stop_from_callback_finishes_generation() {
        let mut trainer = Trainer::with_seed(params(), 4).unwrap();
        let handle = trainer.stop_handle();
        let summary = trainer.run_with(|_| handle.stop()).unwrap();
        assert_eq!(summary.generations, 1);
        assert_eq!(
            summary.status,
            TrainingStatus::Stopped(StopReason::StopRequested)
        );
        assert!(
            trainer
                .population()
                .genomes()
                .is_sorted_by(|a, b| a.fitness() >= b.fitness())
        );
    }

    #[test]
    fn test_time_budget_stops_after_generation() {
        let params = TrainingParams {
            time_budget: Some(1e-9),
            ..params()
        };
        let summary = Trainer::with_seed(params, 5).unwrap().run().unwrap();
        assert_eq!(summary.generations, 1);
        assert_eq!(summary.status, TrainingStatus::Stopped(StopReason::TimeBudget));
    }

    #[test]
    fn test_set_penalties_keeps_progress() {
        let mut trainer = Trainer::with_seed(params(), 6).unwrap();
        trainer.step().unwrap();
        let penalties = PenaltyWeights {
            hole_penalty: -50.0,
            ..PenaltyWeights::default()
        };
        trainer.set_penalties(penalties);
        assert_eq!(trainer.params().penalties, penalties);
        assert_eq!(trainer.history().len(), 1);
        assert!(
            trainer
                .population()
                .genomes()
                .iter()
                .all(|g| g.penalties() == &penalties)
        );
    }

    #[test]
    fn test_summary_serializes() {
        let mut trainer = Trainer::with_seed(params(), 8).unwrap();
        trainer.step().unwrap();
        let json = serde_json::to_string(&trainer.summary()).unwrap();
        assert!(json.contains("\"generations\":1"));
        assert!(json.contains("\"status\":\"idle\""));
        let summary: TrainingSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary.history.len(), 1);
    }
}
