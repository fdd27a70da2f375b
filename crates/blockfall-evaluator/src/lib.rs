//! Evaluator system for scoring placements and choosing moves.
//!
//! The crate is layered bottom-up:
//!
//! 1. **Board Features** ([`board_feature`]) - A fixed six-value summary of a settled
//!    board: bumpiness, holes, closed holes, max/min column height and cleared rows.
//!
//! 2. **Placement Evaluation** ([`placement_evaluator`]) - Scores one resulting board
//!    from its features. [`LinearEvaluator`](placement_evaluator::LinearEvaluator) is the
//!    weighted penalty sum; other crates plug in their own scorers (e.g. a network).
//!
//! 3. **Turn Evaluation** ([`turn_evaluator`]) - Enumerates every rotation × column
//!    (optionally after a hold), simulates each on a throwaway snapshot and keeps the
//!    best-scoring one. Also drives whole headless games.
//!
//! # Architecture
//!
//! ```text
//! Turn Evaluation (select best placement, play games)
//!     ↓ uses
//! Placement Evaluation (score single placement)
//!     ↓ uses
//! Board Features (summarize a board)
//! ```
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{GameState, PieceSeed, Randomizer};
//! use blockfall_evaluator::{
//!     placement_evaluator::{LinearEvaluator, PenaltyWeights},
//!     turn_evaluator::TurnEvaluator,
//! };
//!
//! let evaluator = TurnEvaluator::new(Box::new(LinearEvaluator::new(PenaltyWeights::default())));
//! let state = GameState::with_seed(PieceSeed::from_u64(3), Randomizer::Bag);
//!
//! let result = evaluator.play_game(state, Some(50));
//! assert!(result.pieces <= 50);
//! ```

pub mod board_feature;
pub mod placement_evaluator;
pub mod turn_evaluator;
