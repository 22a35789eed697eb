pub mod ai;
pub mod board;
pub mod interaction;
pub mod observation;
pub mod session;
pub mod tile;

pub use board::{neighbors_within, random_bomb_list, Board, BoardError, Point};
pub use observation::Observation;
pub use session::{GameOverHook, Session, SessionError, SessionState, DEFAULT_MOVE_LIMIT};
pub use tile::{ClickOutcome, Scoring, Tile};

/// Maps an encoded board to the next cell to click. A trained network, a
/// scripted policy, and a human input loop are all just implementations.
pub trait MoveSelector {
    fn select_move(&mut self, observation: &Observation) -> Point;
}

impl<T: MoveSelector + ?Sized> MoveSelector for &mut T {
    fn select_move(&mut self, observation: &Observation) -> Point {
        (**self).select_move(observation)
    }
}

impl<T: MoveSelector + ?Sized> MoveSelector for Box<T> {
    fn select_move(&mut self, observation: &Observation) -> Point {
        (**self).select_move(observation)
    }
}
