//! Local search improvement of an open route.

use super::nearest_neighbor::NearestNeighbor;
use super::{DistanceMatrix, SolveBudget, TspSolver};

/// Smallest cost change accepted as an improvement.
const EPSILON: f64 = 1e-6;

/// Cheapest-arc construction followed by 2-opt and or-opt until no move
/// improves the route or the budget runs out. Node 0 never moves.
#[derive(Debug, Clone, Copy)]
pub struct LocalSearch {
    /// Longest segment relocated by or-opt
    pub max_segment: usize,
}

impl Default for LocalSearch {
    fn default() -> Self {
        LocalSearch { max_segment: 3 }
    }
}

impl LocalSearch {
    pub fn new() -> Self {
        LocalSearch::default()
    }

    /// Improve `route` in place.
    pub fn improve(&self, route: &mut Vec<usize>, matrix: &DistanceMatrix, budget: &SolveBudget) {
        let mut improvement = true;
        while improvement && !budget.exhausted() {
            improvement = false;
            improvement |= self.two_opt_neighborhood(route, matrix, budget);
            improvement |= self.or_opt_neighborhood(route, matrix, budget);
        }
    }

    /// Reverse segments while that shortens the route.
    pub fn two_opt_neighborhood(&self, route: &mut [usize], matrix: &DistanceMatrix, budget: &SolveBudget) -> bool {
        let n = route.len();
        if n < 3 {
            return false;
        }

        let mut improvement = false;
        for i in 0..n - 2 {
            if budget.exhausted() {
                break;
            }
            for j in i + 2..n {
                let delta = Self::evaluate_two_opt(route, matrix, i, j);
                if delta < -EPSILON {
                    Self::apply_two_opt(route, i, j);
                    improvement = true;
                }
            }
        }

        improvement
    }

    /// Cost change of reversing `route[i + 1..=j]`.
    fn evaluate_two_opt(route: &[usize], matrix: &DistanceMatrix, i: usize, j: usize) -> f64 {
        let a = route[i];
        let b = route[i + 1];
        let c = route[j];
        let d = route.get(j + 1).copied();

        let mut old_cost = matrix.get(a, b);
        let mut new_cost = matrix.get(a, c);
        if let Some(d) = d {
            old_cost += matrix.get(c, d);
            new_cost += matrix.get(b, d);
        }

        // Inner arcs flip direction; only matters for asymmetric costs.
        for k in i + 1..j {
            old_cost += matrix.get(route[k], route[k + 1]);
            new_cost += matrix.get(route[k + 1], route[k]);
        }

        new_cost - old_cost
    }

    fn apply_two_opt(route: &mut [usize], i: usize, j: usize) {
        route[i + 1..=j].reverse();
    }

    /// Move short segments to a cheaper position.
    pub fn or_opt_neighborhood(&self, route: &mut Vec<usize>, matrix: &DistanceMatrix, budget: &SolveBudget) -> bool {
        let n = route.len();
        if n < 3 {
            return false;
        }

        let mut improvement = false;
        let mut current = matrix.path_length(route);

        for len in 1..=self.max_segment.min(n - 2) {
            let mut start = 1;
            while start + len <= n {
                if budget.exhausted() {
                    return improvement;
                }

                let mut rest: Vec<usize> = route[..start].to_vec();
                rest.extend_from_slice(&route[start + len..]);
                let segment = &route[start..start + len];

                let mut best: Option<(f64, Vec<usize>)> = None;
                for insert_at in 1..=rest.len() {
                    if insert_at == start {
                        continue;
                    }
                    let mut candidate = Vec::with_capacity(n);
                    candidate.extend_from_slice(&rest[..insert_at]);
                    candidate.extend_from_slice(segment);
                    candidate.extend_from_slice(&rest[insert_at..]);

                    let cost = matrix.path_length(&candidate);
                    if cost < current - EPSILON && best.as_ref().map_or(true, |(b, _)| cost < *b) {
                        best = Some((cost, candidate));
                    }
                }

                if let Some((cost, candidate)) = best {
                    *route = candidate;
                    current = cost;
                    improvement = true;
                }
                start += 1;
            }
        }

        improvement
    }
}

impl TspSolver for LocalSearch {
    fn solve(&self, matrix: &DistanceMatrix, budget: &SolveBudget) -> Option<Vec<usize>> {
        let mut route = NearestNeighbor::order(matrix);
        self.improve(&mut route, matrix, budget);
        Some(route)
    }
}
