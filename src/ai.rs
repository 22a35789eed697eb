use crate::board::{neighbors_within, Point};
use crate::observation::Observation;
use crate::MoveSelector;

/// A policy that emits one score per cell, row-major — the shape a
/// feed-forward network's output layer has.
pub trait CellScorer {
    fn score_cells(&mut self, observation: &Observation) -> Vec<f64>;
}

/// Turns a per-cell scorer into a move selector: the cell with the
/// strictly-greatest score wins, scanning row-major and keeping the first
/// tile encountered on ties.
pub struct ScoredSelector<S> {
    scorer: S,
}

impl<S> ScoredSelector<S> {
    pub fn new(scorer: S) -> ScoredSelector<S> {
        ScoredSelector { scorer }
    }
}

impl<S: CellScorer> MoveSelector for ScoredSelector<S> {
    fn select_move(&mut self, observation: &Observation) -> Point {
        let scores = self.scorer.score_cells(observation);
        debug_assert_eq!(scores.len(), observation.len());
        let mut best = Point(0, 0);
        let mut best_score = match scores.first() {
            Some(&score) => score,
            None => return best,
        };
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > best_score {
                best_score = score;
                best = Point(i / observation.columns(), i % observation.columns());
            }
        }
        best
    }
}

/// Deterministic heuristic standing in for a trained network. For each
/// hidden cell it takes the most pessimistic local bomb estimate its
/// revealed neighbors offer: a revealed count of n spread over u hidden
/// neighbors puts n/u odds on each of them. Cells nobody has information
/// about get a flat prior, and re-clicking a revealed cell is never worth it.
pub struct FrontierScorer {
    pub unseen_prior: f64,
}

impl Default for FrontierScorer {
    fn default() -> FrontierScorer {
        FrontierScorer { unseen_prior: 0.5 }
    }
}

impl CellScorer for FrontierScorer {
    fn score_cells(&mut self, observation: &Observation) -> Vec<f64> {
        let rows = observation.rows();
        let columns = observation.columns();
        observation
            .indexed()
            .map(|(point, value)| {
                if value >= 0 {
                    return f64::NEG_INFINITY;
                }
                let mut risk: Option<f64> = None;
                for neighbor in neighbors_within(point, rows, columns) {
                    let seen = observation.get(neighbor);
                    if seen < 0 {
                        continue;
                    }
                    // the hidden cell itself is among the neighbor's unknowns,
                    // so the divisor is never zero
                    let unknowns = neighbors_within(neighbor, rows, columns)
                        .iter()
                        .filter(|&&q| observation.get(q) < 0)
                        .count();
                    let local = f64::from(seen) / unknowns as f64;
                    risk = Some(match risk {
                        Some(worst) => worst.max(local),
                        None => local,
                    });
                }
                match risk {
                    Some(worst) => -worst,
                    None => -self.unseen_prior,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod selector_tests {
    use super::*;
    use crate::board::Board;

    struct Fixed(Vec<f64>);

    impl CellScorer for Fixed {
        fn score_cells(&mut self, _observation: &Observation) -> Vec<f64> {
            self.0.clone()
        }
    }

    fn hidden_observation(rows: usize, columns: usize) -> Observation {
        Observation::from_board(&Board::new(rows, columns).unwrap())
    }

    #[test]
    fn the_greatest_score_wins() {
        let observation = hidden_observation(2, 3);
        let mut selector = ScoredSelector::new(Fixed(vec![0.1, 0.2, 0.9, 0.3, 0.0, 0.4]));
        assert_eq!(selector.select_move(&observation), Point(0, 2));
    }

    #[test]
    fn ties_keep_the_first_cell_in_row_major_order() {
        let observation = hidden_observation(2, 2);
        let mut selector = ScoredSelector::new(Fixed(vec![0.5, 0.5, 0.5, 0.5]));
        for _ in 0..5 {
            assert_eq!(selector.select_move(&observation), Point(0, 0));
        }
    }

    #[test]
    fn a_later_equal_score_never_displaces_the_first_maximum() {
        let observation = hidden_observation(2, 3);
        let mut selector = ScoredSelector::new(Fixed(vec![0.1, 0.8, 0.2, 0.3, 0.8, 0.1]));
        assert_eq!(selector.select_move(&observation), Point(0, 1));
    }

    #[test]
    fn frontier_scorer_never_reclicks_a_revealed_cell() {
        let mut board = Board::with_bombs(3, 3, &[Point(1, 1)]).unwrap();
        board.tile_mut(Point(0, 0)).reveal();
        let observation = Observation::from_board(&board);
        let scores = FrontierScorer::default().score_cells(&observation);
        assert_eq!(scores[0], f64::NEG_INFINITY);
        assert!(scores[1..].iter().all(|&score| score > f64::NEG_INFINITY));
    }

    #[test]
    fn frontier_scorer_prefers_informed_cells_over_the_prior() {
        let mut board = Board::with_bombs(3, 3, &[Point(1, 1)]).unwrap();
        board.tile_mut(Point(0, 0)).reveal();
        let observation = Observation::from_board(&board);
        // (0,1) borders the revealed count of 1 spread over 3 unknowns; that
        // beats the 0.5 prior of the far cells, and it is the first such cell
        let mut selector = ScoredSelector::new(FrontierScorer::default());
        assert_eq!(selector.select_move(&observation), Point(0, 1));
    }

    #[test]
    fn frontier_scorer_is_deterministic() {
        let mut board = Board::with_bombs(4, 4, &[Point(3, 0)]).unwrap();
        board.tile_mut(Point(2, 1)).reveal();
        let observation = Observation::from_board(&board);
        let mut scorer = FrontierScorer::default();
        let first = scorer.score_cells(&observation);
        let second = scorer.score_cells(&observation);
        assert_eq!(first, second);
    }
}
