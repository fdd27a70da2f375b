//! Board features: the numeric summary a placement is scored on.
//!
//! Every feature is computed from column heights and a single top-down scan per column,
//! so extraction is linear in the board area and has no side effects.
//!
//! | Index | Feature | Meaning |
//! |-------|---------|---------|
//! | 0 | `height_differences` | Σ \|h(x) − h(x+1)\| over adjacent columns (bumpiness) |
//! | 1 | `holes` | Empty cells with an occupied cell somewhere above in the same column |
//! | 2 | `closed_holes` | Holes whose left and right neighbours are both blocked |
//! | 3 | `max_height` | Tallest column |
//! | 4 | `min_height` | Shortest column |
//! | 5 | `cleared_lines` | Rows cleared by the last lock plus rows currently full |
//!
//! A column's height is `Board::HEIGHT - y` for its topmost occupied row `y`, or 0 if
//! the column is empty. A neighbour outside the board counts as blocked, so a hole
//! against a wall is closed when its other side is occupied.

use blockfall_engine::{Board, GameState};

/// Number of values in [`BoardFeatures::to_array`].
pub const FEATURE_COUNT: usize = 6;

/// Feature values of one board.
///
/// # Example
///
/// ```
/// use blockfall_engine::Board;
/// use blockfall_evaluator::board_feature::BoardFeatures;
///
/// let board = Board::from_rows(&["OO........", "OO.T......"]).unwrap();
/// let features = BoardFeatures::from_board(&board, 0);
/// assert_eq!(features.max_height, 2);
/// assert_eq!(features.min_height, 0);
/// assert_eq!(features.holes, 0);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoardFeatures {
    pub height_differences: usize,
    pub holes: usize,
    pub closed_holes: usize,
    pub max_height: usize,
    pub min_height: usize,
    pub cleared_lines: usize,
}

impl BoardFeatures {
    /// Extracts the features of a snapshot, counting its most recent line clear.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self::from_board(state.board(), state.last_cleared_lines())
    }

    /// Extracts the features of `board`.
    ///
    /// `last_cleared_lines` is added to the number of rows currently full: a board that
    /// went through a lock never holds full rows, so the clear is only visible there.
    #[must_use]
    pub fn from_board(board: &Board, last_cleared_lines: usize) -> Self {
        let heights = board.column_heights();
        let height_differences = heights
            .windows(2)
            .map(|pair| pair[0].abs_diff(pair[1]))
            .sum();

        let blocked = |x: Option<usize>, y: usize| {
            x.filter(|&x| x < Board::WIDTH)
                .is_none_or(|x| !board.cell(x, y).is_empty())
        };

        let mut holes = 0;
        let mut closed_holes = 0;
        for (x, &height) in heights.iter().enumerate() {
            for y in (Board::HEIGHT - height)..Board::HEIGHT {
                if !board.cell(x, y).is_empty() {
                    continue;
                }
                holes += 1;
                if blocked(x.checked_sub(1), y) && blocked(Some(x + 1), y) {
                    closed_holes += 1;
                }
            }
        }

        Self {
            height_differences,
            holes,
            closed_holes,
            max_height: heights.iter().copied().max().unwrap_or(0),
            min_height: heights.iter().copied().min().unwrap_or(0),
            cleared_lines: last_cleared_lines + board.full_rows(),
        }
    }

    /// Returns the features in index order, as network input.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.height_differences as f32,
            self.holes as f32,
            self.closed_holes as f32,
            self.max_height as f32,
            self.min_height as f32,
            self.cleared_lines as f32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{PieceKind, PieceSeed, Randomizer};

    use super::*;

    #[test]
    fn test_empty_board() {
        let features = BoardFeatures::from_board(&Board::EMPTY, 0);
        assert_eq!(features, BoardFeatures::default());
    }

    #[test]
    fn test_mixed_board() {
        let board = Board::from_rows(&[
            "II........", //
            "I.I..T....",
            "III.O.....",
        ])
        .unwrap();
        let features = BoardFeatures::from_board(&board, 0);
        assert_eq!(
            features,
            BoardFeatures {
                height_differences: 7,
                holes: 2,
                closed_holes: 1,
                max_height: 3,
                min_height: 0,
                cleared_lines: 0,
            }
        );
        assert_eq!(features.to_array(), [7.0, 2.0, 1.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_wall_blocks_hole() {
        let open = Board::from_rows(&["I.........", ".........."]).unwrap();
        let features = BoardFeatures::from_board(&open, 0);
        assert_eq!((features.holes, features.closed_holes), (1, 0));

        let closed = Board::from_rows(&["I.........", ".J........"]).unwrap();
        let features = BoardFeatures::from_board(&closed, 0);
        assert_eq!((features.holes, features.closed_holes), (1, 1));
    }

    #[test]
    fn test_deep_column_counts_every_empty_cell_below_top() {
        let board = Board::from_rows(&["....S.....", "..........", ".........."]).unwrap();
        let features = BoardFeatures::from_board(&board, 0);
        assert_eq!(features.holes, 2);
        assert_eq!(features.closed_holes, 0);
    }

    #[test]
    fn test_full_rows_and_last_clear_add_up() {
        let board = Board::from_rows(&["ZZZZZZZZZZ", "ZZZZZZZZZZ"]).unwrap();
        let features = BoardFeatures::from_board(&board, 1);
        assert_eq!(features.cleared_lines, 3);
        assert_eq!(features.min_height, 2);
    }

    #[test]
    fn test_from_state_uses_last_clear() {
        let board = Board::from_rows(&["JJJ....LLL"]).unwrap();
        let state = GameState::with_seed(PieceSeed::from_u64(8), Randomizer::Uniform)
            .with_board(board)
            .with_current_piece(PieceKind::I)
            .hard_drop();
        let features = BoardFeatures::from_state(&state);
        assert_eq!(features.cleared_lines, 1);
        assert_eq!(features.max_height, 0);
    }
}
