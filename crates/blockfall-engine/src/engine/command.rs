use crate::InvalidMove;

use super::GameState;

/// A discrete input command. Each maps to exactly one [`GameState`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `move_by(-1, 0)`
    MoveLeft,
    /// `move_by(1, 0)`
    MoveRight,
    /// `move_by(0, 1)`; locks the piece when it cannot fall further.
    SoftDrop,
    /// `rotate()`
    Rotate,
    /// `hard_drop()`
    HardDrop,
    /// `hold()`
    Hold,
}

impl GameState {
    /// Applies a command, returning the state unchanged once the game is over.
    #[must_use]
    pub fn apply(&self, command: Command) -> Self {
        self.try_apply(command).unwrap_or_else(|InvalidMove| self.clone())
    }

    /// Applies a command, failing with [`InvalidMove`] once the game is over.
    pub fn try_apply(&self, command: Command) -> Result<Self, InvalidMove> {
        match command {
            Command::MoveLeft => self.try_move_by(-1, 0),
            Command::MoveRight => self.try_move_by(1, 0),
            Command::SoftDrop => self.try_move_by(0, 1),
            Command::Rotate => self.try_rotate(),
            Command::HardDrop => self.try_hard_drop(),
            Command::Hold => self.try_hold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{PieceKind, PieceSeed, Position, Randomizer};

    use super::*;

    fn state() -> GameState {
        GameState::with_seed(PieceSeed::from_u64(3), Randomizer::Uniform)
            .with_current_piece(PieceKind::T)
    }

    #[test]
    fn test_commands_map_to_operations() {
        let state = state();
        assert_eq!(state.apply(Command::MoveLeft), state.move_by(-1, 0));
        assert_eq!(state.apply(Command::MoveRight), state.move_by(1, 0));
        assert_eq!(state.apply(Command::SoftDrop), state.move_by(0, 1));
        assert_eq!(state.apply(Command::Rotate), state.rotate());
        assert_eq!(state.apply(Command::HardDrop), state.hard_drop());
        assert_eq!(state.apply(Command::Hold), state.hold());
    }

    #[test]
    fn test_soft_drop_advances_one_row() {
        let state = state();
        let dropped = state.apply(Command::SoftDrop);
        assert_eq!(
            dropped.current_position(),
            Position::new(state.current_position().x, 1)
        );
    }

    #[test]
    fn test_commands_after_game_over_are_ignored() {
        let mut state = state();
        while !state.is_game_over() {
            state = state.apply(Command::HardDrop);
        }
        for command in [
            Command::MoveLeft,
            Command::MoveRight,
            Command::SoftDrop,
            Command::Rotate,
            Command::HardDrop,
            Command::Hold,
        ] {
            assert_eq!(state.apply(command), state);
            assert_eq!(state.try_apply(command), Err(InvalidMove));
        }
    }
}
