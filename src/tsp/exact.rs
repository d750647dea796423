//! Exact ordering by dynamic programming over subsets (Held-Karp).

use super::local_search::LocalSearch;
use super::{DistanceMatrix, SolveBudget, TspSolver};

/// Exact open-path solver for small batches.
///
/// Memory and time grow as `2^n * n`, so batches above `max_nodes` are handed
/// to [`LocalSearch`].
#[derive(Debug, Clone, Copy)]
pub struct HeldKarp {
    pub max_nodes: usize,
}

impl HeldKarp {
    pub fn new(max_nodes: usize) -> Self {
        // Keep the table within a few hundred megabytes at most.
        HeldKarp {
            max_nodes: max_nodes.min(20),
        }
    }

    fn shortest_path(matrix: &DistanceMatrix, budget: &SolveBudget) -> Option<Vec<usize>> {
        let n = matrix.len();
        if budget.exhausted() {
            return None;
        }
        if n <= 2 {
            return Some((0..n).collect());
        }

        // Node k (1..n) maps to bit k - 1.
        let m = n - 1;
        let full = 1usize << m;
        let mut cost = vec![f64::INFINITY; full * m];
        let mut parent = vec![usize::MAX; full * m];

        for k in 0..m {
            cost[(1 << k) * m + k] = matrix.get(0, k + 1);
        }

        for mask in 1..full {
            if mask & 0xff == 0 && budget.exhausted() {
                return None;
            }
            for last in 0..m {
                if mask & (1 << last) == 0 {
                    continue;
                }
                let here = cost[mask * m + last];
                if !here.is_finite() {
                    continue;
                }
                for next in 0..m {
                    if mask & (1 << next) != 0 {
                        continue;
                    }
                    let next_mask = mask | (1 << next);
                    let candidate = here + matrix.get(last + 1, next + 1);
                    let slot = next_mask * m + next;
                    if candidate < cost[slot] {
                        cost[slot] = candidate;
                        parent[slot] = last;
                    }
                }
            }
        }

        let all = full - 1;
        let mut last = (0..m).min_by(|&a, &b| cost[all * m + a].total_cmp(&cost[all * m + b]))?;

        let mut route = Vec::with_capacity(n);
        let mut mask = all;
        loop {
            route.push(last + 1);
            let previous = parent[mask * m + last];
            mask &= !(1 << last);
            if previous == usize::MAX {
                break;
            }
            last = previous;
        }
        route.push(0);
        route.reverse();

        Some(route)
    }
}

impl TspSolver for HeldKarp {
    fn solve(&self, matrix: &DistanceMatrix, budget: &SolveBudget) -> Option<Vec<usize>> {
        if matrix.len() > self.max_nodes {
            log::debug!(
                "{} nodes exceed the exact limit of {}, using local search",
                matrix.len(),
                self.max_nodes
            );
            return LocalSearch::new().solve(matrix, budget);
        }
        Self::shortest_path(matrix, budget)
    }
}
