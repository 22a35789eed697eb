use crate::board::{Board, Point};

/// Row-major snapshot of everything an outside decision-maker may see:
/// each tile's touching count if revealed, −1 otherwise. Carries the grid
/// dimensions so a selector can reshape the flat vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    rows: usize,
    columns: usize,
    cells: Vec<i8>,
}

impl Observation {
    pub fn from_board(board: &Board) -> Observation {
        let cells = board
            .points()
            .iter()
            .map(|&point| board.tile(point).visible())
            .collect();
        Observation {
            rows: board.rows(),
            columns: board.columns(),
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    pub fn get(&self, point: Point) -> i8 {
        self.cells[point.0 * self.columns + point.1]
    }

    /// Cells paired with their grid positions, in row-major order.
    pub fn indexed(&self) -> impl Iterator<Item = (Point, i8)> + '_ {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &value)| (Point(i / columns, i % columns), value))
    }
}
