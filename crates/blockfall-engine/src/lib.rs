//! Deterministic falling-block game engine.
//!
//! The crate is split in two layers:
//!
//! - [`core`] - pure data: the 10×20 [`Board`], the seven [`PieceKind`]s with their
//!   shape matrices, and board [`Position`]s.
//! - [`engine`] - the [`GameState`] snapshot and the operations that transform it
//!   (move, rotate, hold, hard drop, lock, line clear).
//!
//! Every engine operation takes `&GameState` and returns a new `GameState`; the input
//! is never mutated. The piece generator lives inside the snapshot, so cloning a state
//! and replaying the same commands always yields the same result.
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{Command, GameState, PieceSeed, Randomizer};
//!
//! let state = GameState::with_seed(PieceSeed::from_u64(7), Randomizer::Uniform);
//! let moved = state.apply(Command::MoveLeft).apply(Command::Rotate);
//! let dropped = moved.apply(Command::HardDrop);
//!
//! assert_eq!(dropped.stats().completed_pieces(), 1);
//! assert!(!dropped.is_game_over());
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// A command was issued against a snapshot whose game is already over.
///
/// Input and the automatic fall timer race each other, so callers using the plain
/// command methods never see this error: those return the state unchanged. The
/// `try_*` family surfaces it for callers that want to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("command issued after game over")]
pub struct InvalidMove;

/// Failure to build a [`Board`] from its text form.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardParseError {
    #[display("too many rows: {rows} (board has {max})")]
    TooManyRows { rows: usize, max: usize },
    #[display("row {row} has width {width} (expected {expected})")]
    RowWidth {
        row: usize,
        width: usize,
        expected: usize,
    },
    #[display("invalid cell character {ch:?} in row {row}")]
    InvalidCell { row: usize, ch: char },
}
