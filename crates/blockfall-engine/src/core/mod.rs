//! Grid and piece model: plain data with no game rules attached.

pub use self::{board::*, piece::*};

pub(crate) mod board;
pub(crate) mod piece;
