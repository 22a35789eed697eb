use std::collections::HashSet;
use std::fmt;

use itertools::iproduct;
use rand::seq::SliceRandom;
use rand::thread_rng;
use thiserror::Error;

use crate::tile::{Scoring, Tile, BOMB_SENTINEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point(pub usize, pub usize);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must have at least one row and one column")]
    EmptyGrid,
    #[error("bomb at ({}, {}) is outside the {rows}x{columns} grid", bomb.0, bomb.1)]
    BombOutOfBounds {
        bomb: Point,
        rows: usize,
        columns: usize,
    },
    #[error("bomb at ({}, {}) listed more than once", bomb.0, bomb.1)]
    DuplicateBomb { bomb: Point },
    #[error("cannot place {requested} bombs on a board with {capacity} tiles")]
    TooManyBombs { requested: usize, capacity: usize },
}

/// In-bounds 8-neighborhood of a point, scanned row-major, center excluded.
/// No wraparound at the edges.
pub fn neighbors_within(point: Point, rows: usize, columns: usize) -> Vec<Point> {
    iproduct!(-1i64..=1, -1i64..=1)
        .filter(|&(dr, dc)| dr != 0 || dc != 0)
        .map(|(dr, dc)| (point.0 as i64 + dr, point.1 as i64 + dc))
        .filter(|&(r, c)| r >= 0 && c >= 0 && r < rows as i64 && c < columns as i64)
        .map(|(r, c)| Point(r as usize, c as usize))
        .collect()
}

#[derive(Debug)]
pub struct Board {
    rows: usize,
    columns: usize,
    tiles: Vec<Vec<Tile>>,
    bombs: Vec<Point>,
}

impl Board {
    pub fn new(rows: usize, columns: usize) -> Result<Board, BoardError> {
        if rows == 0 || columns == 0 {
            return Err(BoardError::EmptyGrid);
        }
        let tiles = (0..rows).map(|_| vec![Tile::new(); columns]).collect();
        Ok(Board {
            rows,
            columns,
            tiles,
            bombs: Vec::new(),
        })
    }

    pub fn with_bombs(rows: usize, columns: usize, bombs: &[Point]) -> Result<Board, BoardError> {
        let mut board = Board::new(rows, columns)?;
        board.place_bombs(bombs)?;
        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn area(&self) -> usize {
        self.rows * self.columns
    }

    pub fn bomb_count(&self) -> usize {
        self.bombs.len()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.0 < self.rows && point.1 < self.columns
    }

    pub fn tile(&self, point: Point) -> &Tile {
        &self.tiles[point.0][point.1]
    }

    pub(crate) fn tile_mut(&mut self, point: Point) -> &mut Tile {
        &mut self.tiles[point.0][point.1]
    }

    pub fn points(&self) -> Vec<Point> {
        iproduct!(0..self.rows, 0..self.columns)
            .map(|(r, c)| Point(r, c))
            .collect()
    }

    pub fn neighbor_points(&self, point: Point) -> Vec<Point> {
        neighbors_within(point, self.rows, self.columns)
    }

    /// Marks every listed position as a bomb, then assigns adjacency for the
    /// whole grid. The list is validated up front so a rejected board is left
    /// untouched.
    pub fn place_bombs(&mut self, bombs: &[Point]) -> Result<(), BoardError> {
        if self.bombs.len() + bombs.len() > self.area() {
            return Err(BoardError::TooManyBombs {
                requested: self.bombs.len() + bombs.len(),
                capacity: self.area(),
            });
        }
        let mut seen = HashSet::with_capacity(bombs.len());
        for &bomb in bombs {
            if !self.contains(bomb) {
                return Err(BoardError::BombOutOfBounds {
                    bomb,
                    rows: self.rows,
                    columns: self.columns,
                });
            }
            if !seen.insert(bomb) || self.tile(bomb).is_bomb() {
                return Err(BoardError::DuplicateBomb { bomb });
            }
        }
        for &bomb in bombs {
            self.tile_mut(bomb).set_bomb();
            self.bombs.push(bomb);
        }
        // counts are only correct once every bomb is on the board
        self.assign_adjacency();
        Ok(())
    }

    fn assign_adjacency(&mut self) {
        for point in self.points() {
            let touching = if self.tile(point).is_bomb() {
                BOMB_SENTINEL
            } else {
                self.neighbor_points(point)
                    .iter()
                    .filter(|&&neighbor| self.tile(neighbor).is_bomb())
                    .count() as i8
            };
            self.tile_mut(point).set_touching(touching);
        }
    }

    /// Flood-fill from a zero-touching seed: clicks every hidden neighbor,
    /// recursing through the zero-touching ones, and returns the accumulated
    /// fitness delta. The seed itself is not clicked here (it may still be
    /// revealed through a zero-touching neighbor, as in the classic cascade).
    /// Detonation outcomes are scored but never acted on; by construction a
    /// bomb cannot border a zero-touching tile.
    pub fn reveal_from(&mut self, seed: Point, scoring: &Scoring) -> i64 {
        let mut visited = HashSet::with_capacity(16);
        visited.insert(seed);
        self.cascade(seed, scoring, &mut visited)
    }

    fn cascade(&mut self, from: Point, scoring: &Scoring, visited: &mut HashSet<Point>) -> i64 {
        let mut delta = 0;
        for neighbor in self.neighbor_points(from) {
            if self.tile(neighbor).is_revealed() {
                continue;
            }
            let outcome = self.tile_mut(neighbor).click();
            delta += scoring.click_delta(outcome);
            // a flagged zero tile stays hidden but still propagates; the
            // visited set keeps that from looping forever
            if self.tile(neighbor).touching() == 0 && visited.insert(neighbor) {
                delta += self.cascade(neighbor, scoring, visited);
            }
        }
        delta
    }

    /// Force-reveals the whole grid; used once, when the game ends.
    pub fn reveal_all(&mut self) {
        for row in &mut self.tiles {
            for tile in row {
                tile.reveal();
            }
        }
    }

    /// First zero-touching tile in row-major order, the seed every session
    /// opens on. Deliberately the first rather than a random one.
    pub fn first_zero_tile(&self) -> Option<Point> {
        self.points()
            .into_iter()
            .find(|&point| self.tile(point).touching() == 0)
    }

    pub fn revealed_safe_tiles(&self) -> usize {
        self.tiles
            .iter()
            .flatten()
            .filter(|tile| tile.is_revealed() && !tile.is_bomb())
            .count()
    }

    pub fn is_cleared(&self) -> bool {
        self.revealed_safe_tiles() == self.area() - self.bomb_count()
    }

    pub fn toggle_flag(&mut self, point: Point) {
        self.tile_mut(point).flag();
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for column in 0..self.columns {
            write!(f, "{}", column % 10)?;
        }
        writeln!(f)?;
        for (row_index, row) in self.tiles.iter().enumerate() {
            write!(f, "{} ", row_index % 10)?;
            for tile in row {
                write!(f, "{}", tile.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Uniform bomb layout without replacement: shuffle the cell indices and
/// keep the first `count`.
pub fn random_bomb_list(
    rows: usize,
    columns: usize,
    count: usize,
) -> Result<Vec<Point>, BoardError> {
    if rows == 0 || columns == 0 {
        return Err(BoardError::EmptyGrid);
    }
    let capacity = rows * columns;
    if count > capacity {
        return Err(BoardError::TooManyBombs {
            requested: count,
            capacity,
        });
    }
    let mut indices: Vec<usize> = (0..capacity).collect();
    indices.shuffle(&mut thread_rng());
    Ok(indices
        .into_iter()
        .take(count)
        .map(|i| Point(i / columns, i % columns))
        .collect())
}

#[cfg(test)]
use proptest::prelude::*;
