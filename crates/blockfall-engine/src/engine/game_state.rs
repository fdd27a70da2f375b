use rand::Rng;

use crate::{
    InvalidMove,
    core::{
        board::Board,
        piece::{PieceKind, Position, Tetromino},
    },
};

use super::{
    game_stats::GameStats,
    piece_queue::{PieceQueue, PieceSeed, Randomizer},
};

/// Immutable snapshot of a game in progress.
///
/// Every operation returns a new snapshot and leaves `self` untouched. While the game
/// is not over the falling piece's position is always valid on the board.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Board, GameState, PieceKind, PieceSeed, Randomizer};
///
/// let state = GameState::with_seed(PieceSeed::from_u64(1), Randomizer::Uniform)
///     .with_current_piece(PieceKind::O);
/// let next_kind = state.next_pieces().next().unwrap();
///
/// let dropped = state.hard_drop();
/// assert_eq!(dropped.board().occupied_count(), 4);
/// assert_eq!(dropped.current_tetromino().kind(), next_kind);
/// assert_eq!(state.board().occupied_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    current: Tetromino,
    position: Position,
    queue: PieceQueue,
    held: Option<PieceKind>,
    can_hold: bool,
    stats: GameStats,
    last_cleared_lines: usize,
    is_game_over: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Starts a new game with a piece seed taken from the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(&mut rand::rng(), Randomizer::default())
    }

    /// Starts a new game with a piece seed drawn from `rng`.
    pub fn from_rng<R>(rng: &mut R, randomizer: Randomizer) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::with_seed(rng.random(), randomizer)
    }

    /// Starts a new game: empty board, first piece centered on row 0, full lookahead.
    #[must_use]
    pub fn with_seed(seed: PieceSeed, randomizer: Randomizer) -> Self {
        let mut queue = PieceQueue::with_seed(seed, randomizer);
        let current = Tetromino::new(queue.pop_next());
        Self {
            board: Board::EMPTY,
            position: Position::spawn(current.shape()),
            current,
            queue,
            held: None,
            can_hold: true,
            stats: GameStats::new(),
            last_cleared_lines: 0,
            is_game_over: false,
        }
    }

    /// Replaces the board, keeping pieces and statistics.
    ///
    /// If the falling piece collides with the new board the game is over.
    #[must_use]
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self.check_spawn();
        self
    }

    /// Replaces the falling piece with a fresh `kind` at its spawn position.
    ///
    /// If the piece collides at spawn the game is over.
    #[must_use]
    pub fn with_current_piece(mut self, kind: PieceKind) -> Self {
        self.spawn(kind);
        self
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn current_tetromino(&self) -> &Tetromino {
        &self.current
    }

    #[must_use]
    pub fn current_position(&self) -> Position {
        self.position
    }

    /// Returns the upcoming pieces, next first. Always [`QUEUE_LEN`](super::QUEUE_LEN) long.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.upcoming()
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held
    }

    #[must_use]
    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.stats.score()
    }

    #[must_use]
    pub fn lines_cleared(&self) -> usize {
        self.stats.lines_cleared()
    }

    /// Number of rows removed by the most recent lock.
    #[must_use]
    pub fn last_cleared_lines(&self) -> usize {
        self.last_cleared_lines
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    fn ensure_playing(&self) -> Result<(), InvalidMove> {
        if self.is_game_over {
            return Err(InvalidMove);
        }
        Ok(())
    }

    /// Moves the falling piece by `(dx, dy)`.
    ///
    /// A blocked move with `dy > 0` locks the piece; any other blocked move is a no-op.
    #[must_use]
    pub fn move_by(&self, dx: i32, dy: i32) -> Self {
        self.try_move_by(dx, dy)
            .unwrap_or_else(|InvalidMove| self.clone())
    }

    pub fn try_move_by(&self, dx: i32, dy: i32) -> Result<Self, InvalidMove> {
        self.ensure_playing()?;
        let candidate = self.position.offset(dx, dy);
        if self.board.is_valid(self.current.shape(), candidate) {
            return Ok(Self {
                position: candidate,
                ..self.clone()
            });
        }
        if dy > 0 {
            return Ok(self.clone().locked());
        }
        Ok(self.clone())
    }

    /// Rotates the falling piece 90° clockwise in place.
    ///
    /// There are no wall kicks: if the rotated shape collides at the current position
    /// the state is returned unchanged.
    #[must_use]
    pub fn rotate(&self) -> Self {
        self.try_rotate().unwrap_or_else(|InvalidMove| self.clone())
    }

    pub fn try_rotate(&self) -> Result<Self, InvalidMove> {
        self.ensure_playing()?;
        let rotated = self.current.rotated();
        if self.board.is_colliding(rotated.shape(), self.position) {
            return Ok(self.clone());
        }
        Ok(Self {
            current: rotated,
            ..self.clone()
        })
    }

    /// Returns the row the falling piece would occupy after a hard drop.
    #[must_use]
    pub fn shadow_position(&self) -> i32 {
        let shape = self.current.shape();
        let mut y = self.position.y;
        while self
            .board
            .is_valid(shape, Position::new(self.position.x, y + 1))
        {
            y += 1;
        }
        y
    }

    /// Drops the falling piece as far as it goes and locks it there.
    #[must_use]
    pub fn hard_drop(&self) -> Self {
        self.try_hard_drop()
            .unwrap_or_else(|InvalidMove| self.clone())
    }

    pub fn try_hard_drop(&self) -> Result<Self, InvalidMove> {
        self.ensure_playing()?;
        let mut dropped = self.clone();
        dropped.position.y = self.shadow_position();
        Ok(dropped.locked())
    }

    /// Swaps the falling piece with the held one (or the queue head when nothing is held).
    ///
    /// Allowed once per piece: a no-op while [`can_hold`](Self::can_hold) is false, and
    /// also a no-op when the incoming piece would collide at its spawn position.
    #[must_use]
    pub fn hold(&self) -> Self {
        self.try_hold().unwrap_or_else(|InvalidMove| self.clone())
    }

    pub fn try_hold(&self) -> Result<Self, InvalidMove> {
        self.ensure_playing()?;
        if !self.can_hold {
            return Ok(self.clone());
        }
        let incoming = self.held.unwrap_or_else(|| self.queue.peek());
        let incoming_shape = incoming.shape();
        if self
            .board
            .is_colliding(&incoming_shape, Position::spawn(&incoming_shape))
        {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        if next.held.is_none() {
            next.queue.pop_next();
        }
        next.held = Some(self.current.kind());
        next.spawn(incoming);
        next.can_hold = false;
        Ok(next)
    }

    fn spawn(&mut self, kind: PieceKind) {
        self.current = Tetromino::new(kind);
        self.position = Position::spawn(self.current.shape());
        self.check_spawn();
    }

    fn check_spawn(&mut self) {
        if self.board.is_colliding(self.current.shape(), self.position) {
            self.is_game_over = true;
        }
    }

    fn locked(mut self) -> Self {
        let blocked_before_lock = self.board.is_colliding(self.current.shape(), self.position);
        self.board.fill_piece(&self.current, self.position);
        if blocked_before_lock && self.position.y <= 0 {
            log::trace!("piece locked over occupied spawn cells, game over");
            self.is_game_over = true;
            return self;
        }

        let cleared_lines = self.board.clear_lines();
        self.stats.complete_piece_drop(cleared_lines);
        self.last_cleared_lines = cleared_lines;

        let next = self.queue.pop_next();
        self.spawn(next);
        self.can_hold = true;
        if self.is_game_over {
            log::trace!(
                "{:?} collides at spawn after {} pieces, game over",
                next,
                self.stats.completed_pieces()
            );
        }
        self
    }
}
