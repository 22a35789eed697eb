use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Board, BoardError, Point};
use crate::observation::Observation;
use crate::tile::{ClickOutcome, Scoring};
use crate::MoveSelector;

pub const DEFAULT_MOVE_LIMIT: u32 = 20;

/// Called exactly once per session, with the final fitness and the opaque
/// session index the caller handed in.
pub type GameOverHook<'a> = Box<dyn FnMut(i64, usize) + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Won,
    Lost,
    MoveLimitExceeded,
}

impl SessionState {
    pub fn is_over(self) -> bool {
        !matches!(self, SessionState::Running)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("selector chose ({}, {}), outside the {rows}x{columns} grid", target.0, target.1)]
    TargetOutOfBounds {
        target: Point,
        rows: usize,
        columns: usize,
    },
}

/// One playthrough: a board, an injected move selector, and the running
/// fitness total, driven a step at a time until a terminal state.
pub struct Session<'a, S> {
    board: Board,
    selector: S,
    scoring: Scoring,
    move_limit: u32,
    fitness: i64,
    moves: u32,
    index: usize,
    state: SessionState,
    on_game_over: GameOverHook<'a>,
}

impl<'a, S: MoveSelector> Session<'a, S> {
    pub fn new(
        rows: usize,
        columns: usize,
        bombs: &[Point],
        index: usize,
        selector: S,
        on_game_over: GameOverHook<'a>,
    ) -> Result<Session<'a, S>, SessionError> {
        Session::with_rules(
            rows,
            columns,
            bombs,
            index,
            selector,
            on_game_over,
            Scoring::default(),
            DEFAULT_MOVE_LIMIT,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_rules(
        rows: usize,
        columns: usize,
        bombs: &[Point],
        index: usize,
        selector: S,
        on_game_over: GameOverHook<'a>,
        scoring: Scoring,
        move_limit: u32,
    ) -> Result<Session<'a, S>, SessionError> {
        let board = Board::with_bombs(rows, columns, bombs)?;
        let mut session = Session {
            board,
            selector,
            scoring,
            move_limit,
            fitness: 0,
            moves: 0,
            index,
            state: SessionState::Running,
            on_game_over,
        };
        debug!(index, rows, columns, bombs = bombs.len(), "session created");
        session.open();
        Ok(session)
    }

    // The forced opening: every game starts on the first zero-touching tile
    // so the agent sees an informative board instead of a blank one. The
    // seed's own click is scored; the cascade it sets off is not.
    fn open(&mut self) {
        let seed = match self.board.first_zero_tile() {
            Some(point) => point,
            None => return,
        };
        let outcome = self.board.tile_mut(seed).click();
        self.fitness += self.scoring.click_delta(outcome);
        self.board.reveal_from(seed, &self.scoring);
        debug!(index = self.index, row = seed.0, column = seed.1, "auto-opened");
        self.check_win();
    }

    /// One counted move: charge the move penalty, enforce the move limit,
    /// then let the selector pick a cell and resolve the click. A no-op once
    /// the session is over. The terminating step never resolves a click.
    pub fn step(&mut self) -> Result<SessionState, SessionError> {
        if self.state.is_over() {
            return Ok(self.state);
        }
        self.moves += 1;
        self.fitness += self.scoring.move_penalty;
        if self.moves > self.move_limit {
            self.finish(SessionState::MoveLimitExceeded);
            return Ok(self.state);
        }
        let observation = Observation::from_board(&self.board);
        let target = self.selector.select_move(&observation);
        self.apply_click(target)
    }

    /// Resolves a click without consuming a move: the event-driven entry a
    /// human front end uses. Rejects off-grid targets rather than clamping
    /// them, so a buggy selector surfaces immediately.
    pub fn apply_click(&mut self, target: Point) -> Result<SessionState, SessionError> {
        if self.state.is_over() {
            return Ok(self.state);
        }
        if !self.board.contains(target) {
            return Err(SessionError::TargetOutOfBounds {
                target,
                rows: self.board.rows(),
                columns: self.board.columns(),
            });
        }
        if self.board.tile(target).touching() == 0 {
            let cascade = self.board.reveal_from(target, &self.scoring);
            self.fitness += cascade;
        }
        let outcome = self.board.tile_mut(target).click();
        self.fitness += self.scoring.click_delta(outcome);
        if outcome == ClickOutcome::Detonated {
            self.board.reveal_all();
            self.finish(SessionState::Lost);
            return Ok(self.state);
        }
        self.check_win();
        Ok(self.state)
    }

    /// Flags cost nothing and consume no moves; ignored once the game is over
    /// or for off-grid cells.
    pub fn toggle_flag(&mut self, target: Point) {
        if self.state.is_over() || !self.board.contains(target) {
            return;
        }
        self.board.toggle_flag(target);
    }

    pub fn run_to_completion(&mut self) -> Result<SessionState, SessionError> {
        while !self.state.is_over() {
            self.step()?;
        }
        Ok(self.state)
    }

    fn check_win(&mut self) {
        if self.state.is_over() {
            return;
        }
        if self.board.is_cleared() {
            self.fitness += self.scoring.win_bonus;
            self.finish(SessionState::Won);
        }
    }

    fn finish(&mut self, terminal: SessionState) {
        self.state = terminal;
        info!(
            index = self.index,
            fitness = self.fitness,
            moves = self.moves,
            state = ?terminal,
            "session over"
        );
        (self.on_game_over)(self.fitness, self.index);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fitness(&self) -> i64 {
        self.fitness
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Point>);

    impl Scripted {
        fn new(moves: &[Point]) -> Scripted {
            Scripted(moves.iter().copied().collect())
        }

        fn idle() -> Scripted {
            Scripted(VecDeque::new())
        }
    }

    impl MoveSelector for Scripted {
        fn select_move(&mut self, _observation: &Observation) -> Point {
            self.0.pop_front().expect("script ran out of moves")
        }
    }

    #[test]
    fn one_by_one_empty_board_wins_at_construction() {
        let calls = Cell::new(0);
        let reported = Cell::new(None);
        let session = Session::new(
            1,
            1,
            &[],
            7,
            Scripted::idle(),
            Box::new(|fitness, index| {
                calls.set(calls.get() + 1);
                reported.set(Some((fitness, index)));
            }),
        )
        .unwrap();
        assert_eq!(session.state(), SessionState::Won);
        assert_eq!(session.fitness(), 102);
        assert_eq!(calls.get(), 1);
        assert_eq!(reported.get(), Some((102, 7)));
    }

    #[test]
    fn opening_counts_the_seed_click_but_not_its_cascade() {
        // the lone corner bomb leaves a zero region covering the whole board,
        // so the forced opening clears it outright
        let session = Session::new(3, 3, &[Point(2, 2)], 0, Scripted::idle(), Box::new(|_, _| {}))
            .unwrap();
        assert_eq!(session.state(), SessionState::Won);
        assert_eq!(session.fitness(), 102);
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn boards_without_a_zero_tile_skip_the_auto_open() {
        let mut session = Session::new(
            3,
            3,
            &[Point(1, 1)],
            0,
            Scripted::new(&[Point(0, 0)]),
            Box::new(|_, _| {}),
        )
        .unwrap();
        assert_eq!(session.board().revealed_safe_tiles(), 0);
        session.step().unwrap();
        assert_eq!(session.fitness(), 2);
        assert_eq!(session.moves(), 1);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn clicking_a_bomb_loses_and_reveals_everything() {
        let reported = Cell::new(None);
        let mut session = Session::new(
            3,
            3,
            &[Point(1, 1)],
            3,
            Scripted::new(&[Point(1, 1)]),
            Box::new(|fitness, index| reported.set(Some((fitness, index)))),
        )
        .unwrap();
        session.step().unwrap();
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.fitness(), -5);
        // the hook sees the bomb penalty already applied
        assert_eq!(reported.get(), Some((-5, 3)));
        let board = session.board();
        assert!(board.points().iter().all(|&p| board.tile(p).is_revealed()));
    }

    #[test]
    fn winning_through_play_adds_the_bonus_once() {
        let calls = Cell::new(0);
        let mut session = Session::new(
            1,
            3,
            &[Point(0, 1)],
            0,
            Scripted::new(&[Point(0, 0), Point(0, 2)]),
            Box::new(|_, _| calls.set(calls.get() + 1)),
        )
        .unwrap();
        session.step().unwrap();
        assert_eq!(session.state(), SessionState::Running);
        session.step().unwrap();
        assert_eq!(session.state(), SessionState::Won);
        assert_eq!(session.fitness(), 2 + 2 + 100);
        assert_eq!(session.moves(), 2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exceeding_the_move_limit_terminates_without_resolving_the_click() {
        let reported = Cell::new(None);
        let mut session = Session::with_rules(
            3,
            3,
            &[Point(1, 1)],
            0,
            Scripted::new(&[Point(0, 0); 4]),
            Box::new(|fitness, _| reported.set(Some(fitness))),
            Scoring::default(),
            3,
        )
        .unwrap();
        session.step().unwrap(); // reveals (0,0): +2
        session.step().unwrap(); // already revealed: -2
        session.step().unwrap(); // already revealed: -2
        assert_eq!(session.fitness(), -2);
        let state = session.step().unwrap();
        assert_eq!(state, SessionState::MoveLimitExceeded);
        assert_eq!(session.moves(), 4);
        assert_eq!(session.fitness(), -2);
        assert_eq!(reported.get(), Some(-2));
    }

    #[test]
    fn terminated_sessions_ignore_further_activity() {
        let calls = Cell::new(0);
        let mut session = Session::new(
            3,
            3,
            &[Point(1, 1)],
            0,
            Scripted::new(&[Point(1, 1)]),
            Box::new(|_, _| calls.set(calls.get() + 1)),
        )
        .unwrap();
        session.step().unwrap();
        assert_eq!(session.state(), SessionState::Lost);
        let fitness = session.fitness();
        let moves = session.moves();

        session.step().unwrap();
        session.apply_click(Point(0, 0)).unwrap();
        session.toggle_flag(Point(0, 0));
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.fitness(), fitness);
        assert_eq!(session.moves(), moves);
        assert_eq!(calls.get(), 1);
        assert!(!session.board().tile(Point(0, 0)).is_flagged());
    }

    #[test]
    fn off_grid_selections_fail_loudly_and_leave_the_session_running() {
        let mut session = Session::new(
            2,
            2,
            &[Point(0, 0)],
            0,
            Scripted::new(&[Point(5, 5)]),
            Box::new(|_, _| {}),
        )
        .unwrap();
        let error = session.step().unwrap_err();
        assert!(matches!(
            error,
            SessionError::TargetOutOfBounds {
                target: Point(5, 5),
                rows: 2,
                columns: 2
            }
        ));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.moves(), 1);
    }

    #[test]
    fn flagged_tiles_are_protected_until_unflagged() {
        let mut session = Session::new(
            3,
            3,
            &[Point(1, 1)],
            0,
            Scripted::new(&[Point(0, 0), Point(0, 0)]),
            Box::new(|_, _| {}),
        )
        .unwrap();
        session.toggle_flag(Point(0, 0));
        session.step().unwrap();
        assert_eq!(session.fitness(), 0);
        assert!(!session.board().tile(Point(0, 0)).is_revealed());

        session.toggle_flag(Point(0, 0));
        session.step().unwrap();
        assert_eq!(session.fitness(), 2);
        assert!(session.board().tile(Point(0, 0)).is_revealed());
    }

    #[test]
    fn invalid_bomb_lists_never_produce_a_session() {
        let result = Session::new(
            2,
            2,
            &[Point(0, 0), Point(0, 0)],
            0,
            Scripted::idle(),
            Box::new(|_, _| {}),
        );
        assert!(matches!(
            result.err(),
            Some(SessionError::Board(BoardError::DuplicateBomb { .. }))
        ));
    }

    #[test]
    fn run_to_completion_always_reaches_a_terminal_state() {
        let calls = Cell::new(0);
        let mut session = Session::with_rules(
            3,
            3,
            &[Point(1, 1)],
            0,
            Scripted::new(&[Point(0, 0); 6]),
            Box::new(|_, _| calls.set(calls.get() + 1)),
            Scoring::default(),
            5,
        )
        .unwrap();
        let state = session.run_to_completion().unwrap();
        assert_eq!(state, SessionState::MoveLimitExceeded);
        assert_eq!(session.moves(), 6);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn move_penalty_lands_on_every_step_attempt() {
        let scoring = Scoring {
            move_penalty: -1,
            ..Scoring::default()
        };
        let mut session = Session::with_rules(
            3,
            3,
            &[Point(1, 1)],
            0,
            Scripted::new(&[Point(0, 0); 3]),
            Box::new(|_, _| {}),
            scoring,
            2,
        )
        .unwrap();
        session.step().unwrap(); // -1 + 2
        session.step().unwrap(); // -1 - 2
        let state = session.step().unwrap(); // -1, then the limit trips
        assert_eq!(state, SessionState::MoveLimitExceeded);
        assert_eq!(session.fitness(), -3);
    }
}
