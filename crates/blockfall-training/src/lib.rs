//! Evolution of neural placement scorers with a genetic algorithm.
//!
//! # How Training Works
//!
//! 1. **Population** - Create agents, each owning a randomly initialized network
//! 2. **Evaluation** - Every agent plays the same seeded games, choosing each placement
//!    with its network as the placement evaluator
//! 3. **Fitness** - Average of `score + lines_cleared × 100` over the games
//! 4. **Selection** - Elites survive unchanged; parents are drawn by roulette
//! 5. **Reproduction** - Children come from uniform crossover plus Gaussian mutation
//! 6. **Repeat** - Until the generation limit or an external stop
//!
//! # Architecture
//!
//! ```text
//! Trainer (generation loop, stop handle, history)
//!     ↓ drives
//! Population / PopulationEvolver (genetic)
//!     ↓ evolves
//! AgentGenome (network + penalties + results)
//!     ↓ scores placements through
//! TurnEvaluator (blockfall-evaluator)
//! ```
//!
//! # Modules
//!
//! - [`weights`] - flat parameter vector operators (init, crossover, mutation)
//! - [`network`] - the feed-forward network and its topology
//! - [`genome`] - agents and their placement evaluator
//! - [`genetic`] - population evaluation and evolution
//! - [`trainer`] - training parameters and control surface
//!
//! Trained networks live only in memory; nothing is persisted between runs.

pub mod genetic;
pub mod genome;
pub mod network;
pub mod trainer;
pub mod weights;
