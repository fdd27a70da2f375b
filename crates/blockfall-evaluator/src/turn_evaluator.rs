//! Turn evaluation: selecting the best placement for the current piece.
//!
//! # How It Works
//!
//! 1. **Enumerate Placements** - Every distinct rotation (0 to 3 clockwise turns) of
//!    the falling piece × every target column 0..9, then the same for the piece a hold
//!    would bring in.
//! 2. **Simulate** - Each candidate is played on a throwaway copy of the snapshot with
//!    the engine's own operations: hold, rotations, one-column moves, hard drop.
//!    Candidates with a rejected step, or whose drop ends the game, are discarded.
//! 3. **Select Best** - The resulting board's features are scored by the placement
//!    evaluator; the highest score wins.
//!
//! # Tie-Breaking
//!
//! Candidates are visited without hold first, then rotation count ascending, then target
//! column ascending. Only a strictly greater score replaces the current best, so among
//! equal scores the first one visited wins.
//!
//! # Design: Greedy One-Step Lookahead
//!
//! Only the immediate placement is considered, never the pieces in the queue. At most
//! 80 simulations are run per turn.

use arrayvec::ArrayVec;
use blockfall_engine::{Board, GameState, PieceKind, Shape};
use serde::Serialize;

use crate::{board_feature::BoardFeatures, placement_evaluator::PlacementEvaluator};

/// A complete action plan for a single turn.
///
/// `column` is the final x-offset of the rotated shape's left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPlan {
    pub use_hold: bool,
    pub rotation: u8,
    pub column: i32,
}

impl TurnPlan {
    /// Plays this plan on a copy of `state` and returns the snapshot after the drop.
    ///
    /// Returns `None` if any step is rejected by the engine: the hold is unavailable,
    /// a rotation collides, or a one-column move is blocked on the way.
    #[must_use]
    pub fn apply(&self, state: &GameState) -> Option<GameState> {
        if state.is_game_over() {
            return None;
        }
        let mut state = state.clone();
        if self.use_hold {
            if !state.can_hold() {
                return None;
            }
            state = state.hold();
            if state.can_hold() {
                return None;
            }
        }

        let mut expected = *state.current_tetromino().shape();
        for _ in 0..self.rotation {
            expected = expected.rotated_clockwise();
            state = state.rotate();
            if *state.current_tetromino().shape() != expected {
                return None;
            }
        }

        let step = (self.column - state.current_position().x).signum();
        while state.current_position().x != self.column {
            let x = state.current_position().x;
            state = state.move_by(step, 0);
            if state.current_position().x == x {
                return None;
            }
        }

        Some(state.hard_drop())
    }
}

/// Outcome of one headless game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub score: usize,
    pub lines_cleared: usize,
    /// Pieces locked during the game.
    pub pieces: usize,
    /// Whether the game ended by topping out (as opposed to hitting the piece limit).
    pub topped_out: bool,
}

impl GameResult {
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self {
            score: state.score(),
            lines_cleared: state.lines_cleared(),
            pieces: state.stats().completed_pieces(),
            topped_out: state.is_game_over(),
        }
    }
}

/// Evaluates and selects the best placement for the current turn.
#[derive(Debug)]
pub struct TurnEvaluator<'a> {
    placement_evaluator: Box<dyn PlacementEvaluator + 'a>,
    use_hold: bool,
}

impl<'a> TurnEvaluator<'a> {
    /// Creates a turn evaluator that also considers hold candidates.
    #[must_use]
    pub fn new(placement_evaluator: Box<dyn PlacementEvaluator + 'a>) -> Self {
        Self {
            placement_evaluator,
            use_hold: true,
        }
    }

    /// Enables or disables hold candidates.
    #[must_use]
    pub fn with_hold(mut self, use_hold: bool) -> Self {
        self.use_hold = use_hold;
        self
    }

    #[must_use]
    pub fn placement_evaluator(&self) -> &(dyn PlacementEvaluator + 'a) {
        self.placement_evaluator.as_ref()
    }

    /// Selects the best turn for the current snapshot.
    ///
    /// Returns the plan together with the snapshot it produces, or `None` if no
    /// candidate survives simulation (the game is over or about to be).
    #[must_use]
    pub fn select_best_turn(&self, state: &GameState) -> Option<(TurnPlan, GameState)> {
        let mut best_score = f32::NEG_INFINITY;
        let mut best_result = None;

        for (plan, next) in available_turns(state, self.use_hold) {
            let features = BoardFeatures::from_state(&next);
            let score = self.placement_evaluator.evaluate_placement(&features);
            if best_result.is_none() || score > best_score {
                best_score = score;
                best_result = Some((plan, next));
            }
        }

        best_result
    }

    /// Plays `state` to the end, always taking the best turn.
    ///
    /// The game stops when it tops out or, with `piece_limit`, once that many pieces
    /// have been locked. When no candidate survives the piece is hard-dropped where it
    /// is, which ends the game or at least locks one more piece.
    #[must_use]
    pub fn play_game(&self, mut state: GameState, piece_limit: Option<usize>) -> GameResult {
        let limit = piece_limit.unwrap_or(usize::MAX);
        while !state.is_game_over() && state.stats().completed_pieces() < limit {
            state = match self.select_best_turn(&state) {
                Some((_plan, next)) => next,
                None => state.hard_drop(),
            };
        }
        let result = GameResult::from_state(&state);
        log::debug!(
            "game finished: score={} lines={} pieces={} topped_out={}",
            result.score,
            result.lines_cleared,
            result.pieces,
            result.topped_out
        );
        result
    }
}

fn available_turns(state: &GameState, use_hold: bool) -> Vec<(TurnPlan, GameState)> {
    let mut turns = Vec::new();
    if state.is_game_over() {
        return turns;
    }

    let mut sources = ArrayVec::<(bool, PieceKind), 2>::new();
    sources.push((false, state.current_tetromino().kind()));
    if use_hold && state.can_hold() {
        let held = state.hold();
        if !held.can_hold() {
            sources.push((true, held.current_tetromino().kind()));
        }
    }

    for (hold, kind) in sources {
        for rotation in distinct_rotations(kind) {
            for column in 0..Board::WIDTH {
                #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let plan = TurnPlan {
                    use_hold: hold,
                    rotation,
                    column: column as i32,
                };
                let Some(next) = plan.apply(state) else {
                    continue;
                };
                if next.is_game_over() {
                    continue;
                }
                turns.push((plan, next));
            }
        }
    }
    turns
}

/// Rotation counts giving pairwise distinct shapes, in ascending order.
fn distinct_rotations(kind: PieceKind) -> ArrayVec<u8, 4> {
    let mut seen = ArrayVec::<Shape, 4>::new();
    let mut rotations = ArrayVec::new();
    let mut shape = kind.shape();
    for rotation in 0..4 {
        if !seen.contains(&shape) {
            seen.push(shape);
            rotations.push(rotation);
        }
        shape = shape.rotated_clockwise();
    }
    rotations
}
