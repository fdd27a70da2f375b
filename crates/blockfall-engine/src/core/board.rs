use std::fmt;

use crate::BoardParseError;

use super::piece::{PieceKind, Position, Shape, Tetromino};

/// Number of columns.
pub const BOARD_WIDTH: usize = 10;
/// Number of rows.
pub const BOARD_HEIGHT: usize = 20;

/// A single cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Block {
    /// Empty cell (no piece).
    #[default]
    Empty,
    /// Locked cell tagged with the kind of piece that filled it.
    Piece(PieceKind),
}

impl Block {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Block::Empty
    }

    #[must_use]
    pub fn piece(self) -> Option<PieceKind> {
        match self {
            Block::Empty => None,
            Block::Piece(kind) => Some(kind),
        }
    }
}

type BoardRow = [Block; BOARD_WIDTH];

const EMPTY_ROW: BoardRow = [Block::Empty; BOARD_WIDTH];

fn is_filled(row: &BoardRow) -> bool {
    row.iter().all(|b| !b.is_empty())
}

/// The fixed 10×20 playfield.
///
/// Row 0 is the top row; row `BOARD_HEIGHT - 1` is the bottom. The dimensions never
/// change, and each cell is either empty or holds exactly one piece tag.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Block, Board, PieceKind};
///
/// let board = Board::from_rows(&["IIII.IIIII"]).unwrap();
/// assert_eq!(board.cell(0, Board::HEIGHT - 1), Block::Piece(PieceKind::I));
/// assert!(board.cell(4, Board::HEIGHT - 1).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [BoardRow; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Board {
    pub const WIDTH: usize = BOARD_WIDTH;
    pub const HEIGHT: usize = BOARD_HEIGHT;

    pub const EMPTY: Self = Self {
        rows: [EMPTY_ROW; BOARD_HEIGHT],
    };

    /// Builds a board from text rows, aligned to the bottom of the board.
    ///
    /// Each row must be exactly [`Board::WIDTH`] characters: `.` for an empty cell or
    /// a piece letter (`I`, `O`, `T`, `L`, `J`, `S`, `Z`) for an occupied one.
    pub fn from_rows(rows: &[&str]) -> Result<Self, BoardParseError> {
        if rows.len() > BOARD_HEIGHT {
            return Err(BoardParseError::TooManyRows {
                rows: rows.len(),
                max: BOARD_HEIGHT,
            });
        }
        let mut board = Self::EMPTY;
        let top = BOARD_HEIGHT - rows.len();
        for (i, text) in rows.iter().enumerate() {
            let width = text.chars().count();
            if width != BOARD_WIDTH {
                return Err(BoardParseError::RowWidth {
                    row: i,
                    width,
                    expected: BOARD_WIDTH,
                });
            }
            for (x, ch) in text.chars().enumerate() {
                board.rows[top + i][x] = match ch {
                    '.' => Block::Empty,
                    _ => PieceKind::from_char(ch)
                        .map(Block::Piece)
                        .ok_or(BoardParseError::InvalidCell { row: i, ch })?,
                };
            }
        }
        Ok(board)
    }

    /// Returns the cell at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the board.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Block {
        self.rows[y][x]
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Block; BOARD_WIDTH]> {
        self.rows.iter()
    }

    /// Returns whether `shape` placed at `position` collides with the board.
    ///
    /// A cell collides when it is left or right of the board, at or below the bottom
    /// edge, or on an occupied cell. Cells above the top row never collide, so a piece
    /// may stick out above the board while spawning.
    #[must_use]
    pub fn is_colliding(&self, shape: &Shape, position: Position) -> bool {
        shape.occupied_offsets().any(|(dx, dy)| {
            let Ok(col) = usize::try_from(position.x + dx) else {
                return true;
            };
            if col >= BOARD_WIDTH {
                return true;
            }
            // above the top row
            let Ok(row) = usize::try_from(position.y + dy) else {
                return false;
            };
            row >= BOARD_HEIGHT || !self.rows[row][col].is_empty()
        })
    }

    #[must_use]
    pub fn is_valid(&self, shape: &Shape, position: Position) -> bool {
        !self.is_colliding(shape, position)
    }

    /// Stamps the tetromino's occupied cells onto the board using its kind as tag.
    ///
    /// Cells that fall outside the board (above the top row) are dropped.
    pub fn fill_piece(&mut self, tetromino: &Tetromino, position: Position) {
        let block = Block::Piece(tetromino.kind());
        for (dx, dy) in tetromino.shape().occupied_offsets() {
            let (Ok(x), Ok(y)) = (
                usize::try_from(position.x + dx),
                usize::try_from(position.y + dy),
            ) else {
                continue;
            };
            if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = block;
            }
        }
    }

    /// Returns the number of rows whose every cell is occupied.
    #[must_use]
    pub fn full_rows(&self) -> usize {
        self.rows.iter().filter(|row| is_filled(row)).count()
    }

    /// Clears filled lines and returns the number of lines cleared.
    ///
    /// All full rows are removed at once; the remaining rows shift down keeping their
    /// relative order and the top is padded with the same number of empty rows.
    pub fn clear_lines(&mut self) -> usize {
        let mut count = 0;
        for y in (0..BOARD_HEIGHT).rev() {
            if is_filled(&self.rows[y]) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = self.rows[y];
            }
        }
        self.rows[..count].fill(EMPTY_ROW);
        count
    }

    /// Returns the number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|block| !block.is_empty())
            .count()
    }

    /// Returns the height of every column.
    ///
    /// A column's height is `BOARD_HEIGHT - y` where `y` is its topmost occupied row;
    /// an empty column has height 0.
    #[must_use]
    pub fn column_heights(&self) -> [usize; BOARD_WIDTH] {
        let mut heights = [0; BOARD_WIDTH];
        for (x, height) in heights.iter_mut().enumerate() {
            *height = (0..BOARD_HEIGHT)
                .find(|&y| !self.rows[y][x].is_empty())
                .map_or(0, |y| BOARD_HEIGHT - y);
        }
        heights
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for block in row {
                let ch = block.piece().map_or('.', PieceKind::as_char);
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "IIIIIIIIII";

    #[test]
    fn test_initial_board_is_empty() {
        let board = Board::EMPTY;
        assert_eq!(board.rows().count(), BOARD_HEIGHT);
        assert_eq!(board.occupied_count(), 0);
        assert_eq!(board.column_heights(), [0; BOARD_WIDTH]);
    }

    #[test]
    fn test_from_rows_is_bottom_aligned() {
        let board = Board::from_rows(&["T.........", "TT........"]).unwrap();
        assert_eq!(board.cell(0, BOARD_HEIGHT - 2), Block::Piece(PieceKind::T));
        assert_eq!(board.cell(1, BOARD_HEIGHT - 1), Block::Piece(PieceKind::T));
        assert_eq!(board.occupied_count(), 3);
    }

    #[test]
    fn test_from_rows_errors() {
        assert_eq!(
            Board::from_rows(&["...."]),
            Err(BoardParseError::RowWidth {
                row: 0,
                width: 4,
                expected: BOARD_WIDTH
            })
        );
        assert_eq!(
            Board::from_rows(&["X........."]),
            Err(BoardParseError::InvalidCell { row: 0, ch: 'X' })
        );
        let rows = vec![".........."; BOARD_HEIGHT + 1];
        assert!(matches!(
            Board::from_rows(&rows),
            Err(BoardParseError::TooManyRows { .. })
        ));
    }

    #[test]
    fn test_collision_bounds() {
        let board = Board::EMPTY;
        let o = PieceKind::O.shape();
        assert!(board.is_valid(&o, Position::new(0, 0)));
        assert!(board.is_valid(&o, Position::new(8, 18)));
        assert!(board.is_colliding(&o, Position::new(-1, 0)));
        assert!(board.is_colliding(&o, Position::new(9, 0)));
        assert!(board.is_colliding(&o, Position::new(0, 19)));
        // Above the top row is never out of bounds.
        assert!(board.is_valid(&o, Position::new(4, -2)));
        assert!(board.is_valid(&o, Position::new(4, -1)));
    }

    #[test]
    fn test_collision_with_blocks() {
        let board = Board::from_rows(&["....O....."]).unwrap();
        let o = PieceKind::O.shape();
        assert!(board.is_colliding(&o, Position::new(4, 18)));
        assert!(board.is_colliding(&o, Position::new(3, 18)));
        assert!(board.is_valid(&o, Position::new(4, 17)));
        assert!(board.is_valid(&o, Position::new(5, 18)));
    }

    #[test]
    fn test_fill_piece_skips_cells_above_top() {
        let mut board = Board::EMPTY;
        let i = Tetromino::new(PieceKind::I).rotated();
        board.fill_piece(&i, Position::new(0, -2));
        assert_eq!(board.occupied_count(), 2);
        assert_eq!(board.cell(0, 0), Block::Piece(PieceKind::I));
        assert_eq!(board.cell(0, 1), Block::Piece(PieceKind::I));
    }

    #[test]
    fn test_clear_lines_basic() {
        let mut board = Board::from_rows(&["T.........", FULL]).unwrap();
        assert_eq!(board.full_rows(), 1);
        assert_eq!(board.clear_lines(), 1);
        assert_eq!(board.cell(0, BOARD_HEIGHT - 1), Block::Piece(PieceKind::T));
        assert_eq!(board.occupied_count(), 1);
        assert_eq!(board.full_rows(), 0);
    }

    #[test]
    fn test_clear_lines_preserves_order_of_remaining_rows() {
        let mut board = Board::from_rows(&[
            "J.........",
            FULL,
            ".S........",
            FULL,
            "..Z.......",
        ])
        .unwrap();
        assert_eq!(board.clear_lines(), 2);
        let expected = Board::from_rows(&["J.........", ".S........", "..Z......."]).unwrap();
        assert_eq!(board, expected);
    }

    #[test]
    fn test_clear_lines_removes_width_cells_per_line() {
        for k in 0..=4 {
            let mut rows = vec!["L........."];
            rows.extend(std::iter::repeat_n(FULL, k));
            let mut board = Board::from_rows(&rows).unwrap();
            let before = board.occupied_count();
            assert_eq!(board.clear_lines(), k);
            assert_eq!(before - board.occupied_count(), k * BOARD_WIDTH);
        }
    }

    #[test]
    fn test_clear_lines_partial_row_stays() {
        let mut board = Board::from_rows(&["IIIIIIIII."]).unwrap();
        assert_eq!(board.clear_lines(), 0);
        assert_eq!(board.occupied_count(), BOARD_WIDTH - 1);
    }

    #[test]
    fn test_column_heights() {
        let board = Board::from_rows(&["O.........", "O.......T.", "O..J....TT"]).unwrap();
        assert_eq!(board.column_heights(), [3, 0, 0, 1, 0, 0, 0, 0, 2, 1]);
    }

    #[test]
    fn test_display_round_trips_through_from_rows() {
        let board = Board::from_rows(&["S........Z"]).unwrap();
        let text = board.to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(Board::from_rows(&rows).unwrap(), board);
    }
}
