//! Visiting-order optimization for a single (date, group) batch.
//!
//! The route is an open path that starts at node 0 and visits every node
//! once; there is no depot and no return leg. Solvers are interchangeable
//! strategies. Whatever a solver returns is checked, and anything that is not
//! a permutation of `0..n` is replaced by the identity order, so ordering
//! never fails once the matrix itself is valid.

pub mod exact;
pub mod local_search;
pub mod nearest_neighbor;

use crate::cancel::CancellationToken;
use crate::config::TspConfig;
use crate::error::ScheduleError;
use crate::geo;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use self::exact::HeldKarp;
use self::local_search::LocalSearch;
use self::nearest_neighbor::NearestNeighbor;

/// Square matrix of non-negative travel costs.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Build a matrix from rows, rejecting ragged or invalid input.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ScheduleError> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(ScheduleError::MatrixShape {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(ScheduleError::MatrixValue { row, col });
            }
            data.extend(values);
        }

        Ok(DistanceMatrix { size, data })
    }

    /// Great-circle distances in meters between locations.
    ///
    /// Pairs involving a missing location cost nothing, so unlocated shops
    /// never push the route around.
    pub fn from_locations(locations: &[Option<(f64, f64)>]) -> Self {
        let size = locations.len();
        let mut data = vec![0.0; size * size];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i == j {
                    continue;
                }
                if let (Some(from), Some(to)) = (from, to) {
                    data[i * size + j] = geo::distance_between(*from, *to) * 1000.0;
                }
            }
        }

        DistanceMatrix { size, data }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Cost of following `order` from its first node to its last.
    pub fn path_length(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|pair| self.get(pair[0], pair[1])).sum()
    }
}

/// Available route-ordering strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TspStrategy {
    /// Held-Karp for small batches, local search above the size limit.
    Exact,
    /// Cheapest-arc construction improved by 2-opt and or-opt moves.
    LocalSearch,
    /// Greedy nearest unvisited node.
    NearestNeighbor,
}

/// Time and cancellation limits for one solve.
pub struct SolveBudget<'a> {
    deadline: Instant,
    cancel: &'a CancellationToken,
}

impl<'a> SolveBudget<'a> {
    pub fn new(time_limit: Duration, cancel: &'a CancellationToken) -> Self {
        SolveBudget {
            deadline: Instant::now() + time_limit,
            cancel,
        }
    }

    /// True once the time limit passed or the run was cancelled.
    pub fn exhausted(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }
}

/// A route-ordering algorithm.
///
/// Returns `None` when no order could be produced; the caller falls back.
pub trait TspSolver: Sync {
    fn solve(&self, matrix: &DistanceMatrix, budget: &SolveBudget) -> Option<Vec<usize>>;
}

/// Result of ordering one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TspSolution {
    /// Visiting order as indices into the matrix
    pub order: Vec<usize>,
    /// Path cost in matrix units
    pub distance: f64,
    pub solve_time: Duration,
    /// The solver result was unusable and the identity order was returned
    pub fallback: bool,
}

/// Runs the configured strategy and guards its output.
pub struct RouteOptimizer {
    pub config: TspConfig,
}

impl RouteOptimizer {
    pub fn new(config: TspConfig) -> Self {
        RouteOptimizer { config }
    }

    fn solver(&self) -> Box<dyn TspSolver> {
        match self.config.strategy {
            TspStrategy::Exact => Box::new(HeldKarp::new(self.config.exact_max_nodes)),
            TspStrategy::LocalSearch => Box::new(LocalSearch::new()),
            TspStrategy::NearestNeighbor => Box::new(NearestNeighbor),
        }
    }

    /// Order the nodes of `matrix`, starting at node 0.
    pub fn solve(&self, matrix: &DistanceMatrix, cancel: &CancellationToken) -> TspSolution {
        let start = Instant::now();
        let n = matrix.len();

        if n <= 1 {
            return TspSolution {
                order: (0..n).collect(),
                distance: 0.0,
                solve_time: start.elapsed(),
                fallback: false,
            };
        }

        let budget = SolveBudget::new(self.config.time_limit, cancel);
        let (order, fallback) = match self.solver().solve(matrix, &budget) {
            Some(order) if is_valid_route(&order, n) => (order, false),
            Some(order) => {
                log::warn!(
                    "{:?} solver returned an invalid route of length {} for {} nodes, using input order",
                    self.config.strategy,
                    order.len(),
                    n
                );
                ((0..n).collect(), true)
            }
            None => {
                log::warn!("{:?} solver found no route for {} nodes, using input order", self.config.strategy, n);
                ((0..n).collect(), true)
            }
        };

        TspSolution {
            distance: matrix.path_length(&order),
            order,
            solve_time: start.elapsed(),
            fallback,
        }
    }
}

/// Order a raw distance matrix with the default settings.
pub fn solve_tsp(rows: Vec<Vec<f64>>) -> Result<Vec<usize>, ScheduleError> {
    let matrix = DistanceMatrix::new(rows)?;
    let optimizer = RouteOptimizer::new(TspConfig::default());
    Ok(optimizer.solve(&matrix, &CancellationToken::new()).order)
}

/// Check that `order` starts at node 0 and visits each of `0..n` exactly once.
pub fn is_valid_route(order: &[usize], n: usize) -> bool {
    if order.len() != n || (n > 0 && order[0] != 0) {
        return false;
    }
    let mut seen = vec![false; n];
    for &node in order {
        if node >= n || seen[node] {
            return false;
        }
        seen[node] = true;
    }
    true
}
