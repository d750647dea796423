//! Greedy nearest-neighbor ordering.

use super::{DistanceMatrix, SolveBudget, TspSolver};

/// Start at node 0 and always move to the nearest unvisited node.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighbor;

impl NearestNeighbor {
    /// Build the greedy order. Ties go to the lowest index.
    pub fn order(matrix: &DistanceMatrix) -> Vec<usize> {
        let n = matrix.len();
        if n == 0 {
            return Vec::new();
        }

        let mut visited = vec![false; n];
        let mut route = Vec::with_capacity(n);
        let mut current = 0;
        visited[0] = true;
        route.push(0);

        for _ in 1..n {
            let mut nearest: Option<(usize, f64)> = None;
            for (j, seen) in visited.iter().enumerate() {
                if *seen {
                    continue;
                }
                let dist = matrix.get(current, j);
                if nearest.map_or(true, |(_, best)| dist < best) {
                    nearest = Some((j, dist));
                }
            }

            match nearest {
                Some((j, _)) => {
                    visited[j] = true;
                    route.push(j);
                    current = j;
                }
                None => break,
            }
        }

        route
    }
}

impl TspSolver for NearestNeighbor {
    fn solve(&self, matrix: &DistanceMatrix, _budget: &SolveBudget) -> Option<Vec<usize>> {
        Some(Self::order(matrix))
    }
}
