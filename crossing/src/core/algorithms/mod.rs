//! The five crossing strategies.
//!
//! Each strategy is a pure function `(grid, start_row) -> Path`. They agree on
//! the optimal *cost*; when several optimal paths exist they all prefer the
//! earliest candidate in up, same, down order, but callers must only rely on
//! cost equality across strategies.

mod backtracking;
mod brute_force;
mod divide_and_conquer;
mod memoization;
mod tabulation;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::core::grid::Grid;
use crate::core::path::{Path, Step};

pub use backtracking::backtracking;
pub use brute_force::brute_force;
pub use divide_and_conquer::divide_and_conquer;
pub use memoization::memoization;
pub use tabulation::tabulation;

/// Strategy selector. The serialized names are stable and used on the CLI,
/// in the worker protocol and in persisted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Algorithm {
    /// Exhaustive search, no pruning.
    BruteForce,
    /// Branch-and-bound search over a non-negative shifted grid.
    Backtracking,
    /// Recursive best-suffix without caching.
    DivideAndConquer,
    /// Recursive best-suffix with an R x C cache.
    Memoization,
    /// Bottom-up cost table, no recursion.
    Tabulation,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::BruteForce,
        Algorithm::Backtracking,
        Algorithm::DivideAndConquer,
        Algorithm::Memoization,
        Algorithm::Tabulation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::BruteForce => "brute_force",
            Algorithm::Backtracking => "backtracking",
            Algorithm::DivideAndConquer => "divide_and_conquer",
            Algorithm::Memoization => "memoization",
            Algorithm::Tabulation => "tabulation",
        }
    }

    /// Validate `start_row` and run the strategy.
    ///
    /// The empty grid always yields the empty path, whatever the start row.
    pub fn solve(self, grid: &Grid, start_row: usize) -> Result<Path> {
        if grid.is_empty() {
            return Ok(Path::new());
        }
        if start_row >= grid.rows() {
            bail!(
                "start row {start_row} out of range for grid with {} rows",
                grid.rows()
            );
        }
        let path = match self {
            Algorithm::BruteForce => brute_force(grid, start_row),
            Algorithm::Backtracking => backtracking(grid, start_row),
            Algorithm::DivideAndConquer => divide_and_conquer(grid, start_row),
            Algorithm::Memoization => memoization(grid, start_row),
            Algorithm::Tabulation => tabulation(grid, start_row),
        };
        Ok(path)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Algorithm::ALL.iter().map(|a| a.as_str()).collect();
                anyhow!("unknown algorithm '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Best complete path seen so far by the depth-first strategies.
///
/// Owned by the top-level call and threaded through the recursion by `&mut`.
/// Only a strictly cheaper path replaces the current one, so among equal costs
/// the first discovered wins.
#[derive(Debug)]
struct BestPath {
    cost: f64,
    path: Path,
}

impl BestPath {
    fn new() -> Self {
        Self {
            cost: f64::INFINITY,
            path: Path::new(),
        }
    }

    fn offer(&mut self, cost: f64, trail: &[Step]) {
        if cost < self.cost {
            self.cost = cost;
            self.path.clear();
            self.path.extend_from_slice(trail);
        }
    }
}

/// Index of the cheapest of three candidates; ties go to the earliest.
fn cheapest(costs: [f64; 3]) -> usize {
    let mut best = 0;
    for (index, cost) in costs.iter().enumerate().skip(1) {
        if *cost < costs[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::core::path::validate_path;
    use crate::test_support::{grid, uniform};

    const EPSILON: f64 = 1e-9;

    fn solve_all(grid: &Grid, start_row: usize) -> Vec<(Algorithm, Path)> {
        Algorithm::ALL
            .into_iter()
            .map(|algorithm| {
                let path = algorithm.solve(grid, start_row).expect("solve");
                (algorithm, path)
            })
            .collect()
    }

    fn assert_cost_for_all(grid: &Grid, start_row: usize, expected: f64) {
        for (algorithm, path) in solve_all(grid, start_row) {
            let errors = validate_path(grid, &path);
            assert!(errors.is_empty(), "{algorithm}: illegal path {errors:?}");
            assert_eq!(path[0], Step::new(0, start_row), "{algorithm}: wrong start");
            let cost = grid.path_cost(&path);
            assert!(
                (cost - expected).abs() < EPSILON,
                "{algorithm}: cost {cost}, expected {expected}"
            );
        }
    }

    #[test]
    fn names_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<Algorithm>().expect("parse"), algorithm);
            let json = serde_json::to_string(&algorithm).expect("serialize");
            assert_eq!(json, format!("\"{algorithm}\""));
        }
        assert!("dijkstra".parse::<Algorithm>().is_err());
    }

    #[test]
    fn cheapest_prefers_first_on_ties() {
        assert_eq!(cheapest([1.0, 1.0, 1.0]), 0);
        assert_eq!(cheapest([2.0, 1.0, 1.0]), 1);
        assert_eq!(cheapest([2.0, 2.0, 1.0]), 2);
    }

    #[test]
    fn empty_grid_yields_empty_path() {
        for (_, path) in solve_all(&Grid::empty(), 0) {
            assert!(path.is_empty());
        }
        for algorithm in Algorithm::ALL {
            assert!(algorithm.solve(&Grid::empty(), 7).expect("solve").is_empty());
        }
    }

    #[test]
    fn single_cells() {
        let positive = grid(&[&[7.0]]);
        for (_, path) in solve_all(&positive, 0) {
            assert_eq!(path, vec![Step::new(0, 0)]);
        }
        assert_cost_for_all(&positive, 0, 7.0);
        assert_cost_for_all(&grid(&[&[-9.0]]), 0, -9.0);
    }

    #[test]
    fn single_column_returns_start_cell() {
        let g = grid(&[&[1.0], &[0.0], &[-1.0], &[2.0]]);
        for start_row in 0..4 {
            for (algorithm, path) in solve_all(&g, start_row) {
                assert_eq!(path, vec![Step::new(0, start_row)], "{algorithm}");
            }
        }
    }

    #[test]
    fn single_row_walks_straight() {
        let g = grid(&[&[1.0, -1.0, 1.0, -1.0, 1.0]]);
        for (_, path) in solve_all(&g, 0) {
            assert!(path.iter().all(|step| step.row == 0));
        }
        assert_cost_for_all(&g, 0, 1.0);
    }

    #[test]
    fn uniform_grids_cost_value_times_columns() {
        for rows in 1..=4 {
            for value in [2.0, 0.0, -3.5] {
                let g = uniform(rows, 5, value);
                for start_row in 0..rows {
                    assert_cost_for_all(&g, start_row, value * 5.0);
                }
            }
        }
    }

    #[test]
    fn uniform_grid_paths_follow_tie_break_order() {
        // Every move ties, so each strategy keeps choosing "up".
        let g = uniform(3, 4, 2.0);
        let expected = vec![Step::new(0, 1), Step::new(1, 0), Step::new(2, 2), Step::new(3, 1)];
        for (algorithm, path) in solve_all(&g, 1) {
            assert_eq!(path, expected, "{algorithm}");
        }
    }

    #[test]
    fn all_negative_grid() {
        let g = grid(&[&[-5.0, -5.0, -5.0], &[-5.0, -5.0, -5.0]]);
        assert_cost_for_all(&g, 0, -15.0);
    }

    #[test]
    fn start_row_out_of_range_is_an_error() {
        let g = grid(&[&[1.0, 2.0], &[3.0, 4.0]]);
        for algorithm in Algorithm::ALL {
            let err = algorithm.solve(&g, 2).unwrap_err();
            assert!(err.to_string().contains("start row 2 out of range"));
        }
    }

    #[test]
    fn reference_grids_from_row_zero() {
        let cases: Vec<(Vec<Vec<f64>>, f64)> = vec![
            (
                vec![
                    vec![3.0, 4.0, 1.0, 2.0, 8.0, 6.0],
                    vec![6.0, 1.0, 8.0, 2.0, 7.0, 4.0],
                    vec![5.0, 9.0, 3.0, 9.0, 9.0, 5.0],
                    vec![8.0, 4.0, 1.0, 3.0, 2.0, 6.0],
                    vec![3.0, 7.0, 2.0, 8.0, 6.0, 4.0],
                ],
                16.0,
            ),
            (
                vec![
                    vec![3.0, 4.0, 1.0, 2.0, 8.0, 6.0],
                    vec![6.0, 1.0, 8.0, 2.0, 7.0, 4.0],
                    vec![5.0, 9.0, 3.0, 9.0, 9.0, 5.0],
                    vec![8.0, 4.0, 1.0, 3.0, 2.0, 6.0],
                    vec![3.0, 7.0, 2.0, 1.0, 2.0, 3.0],
                ],
                11.0,
            ),
            (
                vec![vec![5.0, -4.0, 6.0], vec![-3.0, 10.0, -1.0], vec![2.0, -2.0, 1.0]],
                0.0,
            ),
            (
                vec![
                    vec![1e6, -1e6, 1e6],
                    vec![-1e6, 1e6, -1e6],
                ],
                -1e6,
            ),
            (
                vec![
                    vec![1.0, -1.0, 1.0, -1.0, 1.0],
                    vec![-1.0, 1.0, -1.0, 1.0, -1.0],
                    vec![1.0, -1.0, 1.0, -1.0, 1.0],
                ],
                -3.0,
            ),
            (
                vec![vec![20.0; 4], vec![20.0; 4], vec![1.0; 4]],
                23.0,
            ),
            (
                vec![
                    vec![1.0, 10.0, 10.0, 10.0],
                    vec![20.0, 20.0, 20.0, 20.0],
                    vec![2.0, 1.0, 1.0, 1.0],
                ],
                4.0,
            ),
            (
                vec![
                    vec![1.0, 100.0, 1.0, 100.0, 1.0],
                    vec![100.0, 1.0, 100.0, 1.0, 100.0],
                    vec![1.0, 100.0, 1.0, 100.0, 1.0],
                ],
                5.0,
            ),
            (vec![vec![5.0, 3.0], vec![2.0, 7.0], vec![4.0, 1.0]], 6.0),
            (
                vec![
                    vec![-1.0, -1.0, 100.0, -1.0],
                    vec![100.0, -1.0, -1.0, 100.0],
                    vec![-1.0, 100.0, -1.0, -1.0],
                ],
                -4.0,
            ),
            (
                vec![vec![1.5, 2.3, 0.5], vec![3.2, 0.1, 2.8], vec![0.7, 4.2, 1.1]],
                2.1,
            ),
            (
                vec![
                    vec![100.0; 4],
                    vec![100.0, 0.0, 100.0, 100.0],
                    vec![100.0; 4],
                ],
                300.0,
            ),
        ];
        for (rows, expected) in cases {
            let g = Grid::from_rows(&rows).expect("grid");
            assert_cost_for_all(&g, 0, expected);
        }
    }

    #[test]
    fn diagonal_grid_follows_the_diagonal() {
        let g = Grid::from_rows(
            &(0..10)
                .map(|row| {
                    (0..10)
                        .map(|col| if row == col { 1.0 } else { 5.0 })
                        .collect()
                })
                .collect::<Vec<Vec<f64>>>(),
        )
        .expect("grid");
        for (algorithm, path) in solve_all(&g, 0) {
            let expected: Path = (0..10).map(|i| Step::new(i, i)).collect();
            assert_eq!(path, expected, "{algorithm}");
        }
    }

    fn small_grid() -> impl Strategy<Value = (Vec<Vec<f64>>, usize)> {
        (1usize..=4, 1usize..=6).prop_flat_map(|(rows, cols)| {
            (
                prop::collection::vec(prop::collection::vec(-20i32..20, cols), rows)
                    .prop_map(|rows| {
                        rows.into_iter()
                            .map(|row| row.into_iter().map(f64::from).collect())
                            .collect()
                    }),
                0..rows,
            )
        })
    }

    proptest! {
        #[test]
        fn strategies_agree_on_optimal_cost((rows, start_row) in small_grid()) {
            let g = Grid::from_rows(&rows).expect("grid");
            let memo = g.path_cost(&memoization(&g, start_row));
            let table = g.path_cost(&tabulation(&g, start_row));
            prop_assert!((memo - table).abs() < EPSILON);
            for (algorithm, path) in solve_all(&g, start_row) {
                prop_assert!(validate_path(&g, &path).is_empty(), "{} illegal", algorithm);
                prop_assert_eq!(path[0], Step::new(0, start_row));
                let cost = g.path_cost(&path);
                prop_assert!(cost >= memo - EPSILON, "{} beat the optimum", algorithm);
                prop_assert!((cost - memo).abs() < EPSILON, "{} is suboptimal", algorithm);
            }
        }
    }
}
