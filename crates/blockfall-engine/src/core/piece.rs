use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::board::BOARD_WIDTH;

/// Largest side of any tetromino bounding box.
pub const MAX_SHAPE_SIZE: usize = 4;

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// T-piece.
    T = 2,
    /// L-piece.
    L = 3,
    /// J-piece.
    J = 4,
    /// S-piece.
    S = 5,
    /// Z-piece.
    Z = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Returns the canonical (spawn orientation) shape of this kind.
    #[must_use]
    pub const fn shape(self) -> Shape {
        SHAPES[self as usize]
    }

    #[must_use]
    pub const fn color(self) -> PieceColor {
        match self {
            PieceKind::I => PieceColor::Cyan,
            PieceKind::O => PieceColor::Yellow,
            PieceKind::T => PieceColor::Purple,
            PieceKind::L => PieceColor::Orange,
            PieceKind::J => PieceColor::Blue,
            PieceKind::S => PieceColor::Green,
            PieceKind::Z => PieceColor::Red,
        }
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('O'), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'T' => Some(PieceKind::T),
            'L' => Some(PieceKind::L),
            'J' => Some(PieceKind::J),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            _ => None,
        }
    }
}

/// Display color associated with a piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PieceColor {
    #[display("cyan")]
    Cyan,
    #[display("yellow")]
    Yellow,
    #[display("purple")]
    Purple,
    #[display("orange")]
    Orange,
    #[display("blue")]
    Blue,
    #[display("green")]
    Green,
    #[display("red")]
    Red,
}

/// Rectangular occupancy matrix of a piece.
///
/// The matrix is stored as `height` rows of `width` cells inside a fixed 4×4 array;
/// cells outside the rectangle are always empty so that equality compares shapes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    width: u8,
    height: u8,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    #[must_use]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    /// Returns whether the cell at column `x`, row `y` of the matrix is occupied.
    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.cells[y][x]
    }

    /// Returns the `(dx, dy)` offsets of occupied cells, row by row.
    pub fn occupied_offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height()).flat_map(move |y| {
            (0..self.width())
                .filter(move |&x| self.cells[y][x])
                .map(move |x| (offset(x), offset(y)))
        })
    }

    /// Rotates the matrix 90° clockwise (transpose, then reverse each row).
    ///
    /// A `w×h` matrix becomes `h×w`. Applying this four times gives back the original
    /// matrix for every shape, since no padding is involved.
    #[must_use]
    pub fn rotated_clockwise(&self) -> Self {
        let (width, height) = (self.width(), self.height());
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in cells.iter_mut().enumerate().take(width) {
            for (x, cell) in row.iter_mut().enumerate().take(height) {
                *cell = self.cells[height - 1 - x][y];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            cells,
        }
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn offset(v: usize) -> i32 {
    v as i32
}

#[expect(clippy::cast_possible_truncation)]
const fn shape(rows: &[&[u8]]) -> Shape {
    let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
    let mut y = 0;
    while y < rows.len() {
        let mut x = 0;
        while x < rows[y].len() {
            cells[y][x] = rows[y][x] != 0;
            x += 1;
        }
        y += 1;
    }
    Shape {
        width: rows[0].len() as u8,
        height: rows.len() as u8,
        cells,
    }
}

const SHAPES: [Shape; PieceKind::LEN] = [
    // I-piece
    shape(&[&[1, 1, 1, 1]]),
    // O-piece
    shape(&[&[1, 1], &[1, 1]]),
    // T-piece
    shape(&[&[0, 1, 0], &[1, 1, 1]]),
    // L-piece
    shape(&[&[0, 0, 1], &[1, 1, 1]]),
    // J-piece
    shape(&[&[1, 0, 0], &[1, 1, 1]]),
    // S-piece
    shape(&[&[0, 1, 1], &[1, 1, 0]]),
    // Z-piece
    shape(&[&[1, 1, 0], &[0, 1, 1]]),
];

/// A piece kind together with its working (possibly rotated) shape.
///
/// Rotation always produces a new value; the canonical shape table is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tetromino {
    kind: PieceKind,
    shape: Shape,
}

impl Tetromino {
    /// Creates a tetromino in its spawn orientation.
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn color(&self) -> PieceColor {
        self.kind.color()
    }

    #[must_use]
    pub fn rotated(&self) -> Self {
        Self {
            kind: self.kind,
            shape: self.shape.rotated_clockwise(),
        }
    }
}

/// Offset of a shape matrix's top-left corner relative to the board's top-left.
///
/// `y` may be negative while a piece is partially above the visible board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Spawn position for a shape: horizontally centered on row 0.
    #[must_use]
    pub fn spawn(shape: &Shape) -> Self {
        Self::new(offset(BOARD_WIDTH / 2) - offset(shape.width() / 2), 0)
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_rotations_restore_every_shape() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            let mut rotated = shape;
            for _ in 0..4 {
                rotated = rotated.rotated_clockwise();
            }
            assert_eq!(rotated, shape, "{kind:?} did not close after 4 rotations");
        }
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let i = PieceKind::I.shape().rotated_clockwise();
        assert_eq!((i.width(), i.height()), (1, 4));
        let t = PieceKind::T.shape().rotated_clockwise();
        assert_eq!((t.width(), t.height()), (2, 3));
    }

    #[test]
    fn test_rotation_is_clockwise() {
        // T pointing up becomes T pointing right:
        // X.
        // XX
        // X.
        let t = PieceKind::T.shape().rotated_clockwise();
        let cells: Vec<_> = t.occupied_offsets().collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 1), (0, 2)]);
    }

    #[test]
    fn test_rotation_leaves_canonical_shape_untouched() {
        let tetromino = Tetromino::new(PieceKind::L);
        let rotated = tetromino.rotated();
        assert_ne!(rotated.shape(), tetromino.shape());
        assert_eq!(Tetromino::new(PieceKind::L).shape(), &PieceKind::L.shape());
    }

    #[test]
    fn test_every_shape_has_four_cells() {
        for kind in PieceKind::ALL {
            assert_eq!(kind.shape().occupied_offsets().count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn test_spawn_is_centered() {
        assert_eq!(Position::spawn(&PieceKind::O.shape()), Position::new(4, 0));
        assert_eq!(Position::spawn(&PieceKind::I.shape()), Position::new(3, 0));
        assert_eq!(Position::spawn(&PieceKind::T.shape()), Position::new(4, 0));
    }

    #[test]
    fn test_piece_kind_char_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
    }

    #[test]
    fn test_piece_colors() {
        assert_eq!(PieceKind::I.color().to_string(), "cyan");
        assert_eq!(Tetromino::new(PieceKind::Z).color(), PieceColor::Red);
    }
}
