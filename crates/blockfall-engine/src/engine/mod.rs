//! Game engine: the [`GameState`] snapshot and the rules that transform it.
//!
//! - [`GameState`] - board, falling piece, hold slot, upcoming queue and statistics
//! - [`Command`] - the discrete input commands (move, rotate, drop, hold)
//! - [`GameStats`] - score, lines cleared, piece count and clear histogram
//! - [`PieceQueue`] - fixed-length lookahead queue fed by a seeded [`Randomizer`]
//! - [`PieceSeed`] - seed for deterministic piece generation
//!
//! # Game Flow
//!
//! 1. Create a [`GameState`] from a seed (or from a caller-supplied RNG)
//! 2. Apply commands; each returns a new snapshot
//! 3. A blocked downward move or a hard drop locks the piece, clears full rows,
//!    scores, and spawns the next piece from the queue
//! 4. The game ends when a lock leaves the next piece colliding at spawn

pub use self::{command::*, game_state::*, game_stats::*, piece_queue::*};

mod command;
mod game_state;
mod game_stats;
mod piece_queue;
