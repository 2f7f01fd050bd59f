//! Pairwise distances and the K-nearest-site index used to sparsify the model.

use rayon::prelude::*;
use std::cmp::Ordering;

/// Above this many matrix cells the work is split across threads.
const PARALLEL_THRESHOLD: usize = 10000;

/// Dense, symmetric N x N distance matrix in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.values[from * self.size + to]
    }

    pub fn row(&self, from: usize) -> &[f64] {
        &self.values[from * self.size..(from + 1) * self.size]
    }
}

/// Compute Euclidean distance matrix between all points
pub fn euclidean_matrix(x: &[f64], y: &[f64]) -> DistanceMatrix {
    let n = x.len().min(y.len());

    let cell = |i: usize, j: usize| {
        let dx = x[i] - x[j];
        let dy = y[i] - y[j];
        (dx * dx + dy * dy).sqrt()
    };

    // Each row is computed independently, so the parallel result is identical
    let values: Vec<f64> = if n * n > PARALLEL_THRESHOLD {
        (0..n).into_par_iter().flat_map_iter(|i| (0..n).map(move |j| cell(i, j))).collect()
    } else {
        let mut values = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                values.push(cell(i, j));
            }
        }
        values
    };

    DistanceMatrix { size: n, values }
}

/// Euclidean distance between two points.
pub fn euclidean(from: (f64, f64), to: (f64, f64)) -> f64 {
    (to.0 - from.0).hypot(to.1 - from.1)
}

/// For every point, up to `cutoff` nearest candidate sites ranked by ascending
/// distance, ties broken by ascending index.
///
/// Stored as a ragged array: the neighbors of `n` are
/// `sites[offsets[n]..offsets[n + 1]]`. A position in `sites` is a *pair index*
/// and identifies the `(n, j)` assignment pair.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborIndex {
    offsets: Vec<usize>,
    sites: Vec<usize>,
}

impl NeighborIndex {
    /// Builds the index from a distance matrix.
    pub fn new(distances: &DistanceMatrix, cutoff: usize) -> Self {
        let n = distances.len();
        let rank = |from: usize| nearest_sites(distances.row(from), cutoff);

        let rows: Vec<Vec<usize>> = if n * n > PARALLEL_THRESHOLD {
            (0..n).into_par_iter().map(rank).collect()
        } else {
            (0..n).map(rank).collect()
        };

        let mut offsets = Vec::with_capacity(n + 1);
        let mut sites = Vec::with_capacity(rows.iter().map(|row| row.len()).sum());
        offsets.push(0);
        for row in rows {
            sites.extend(row);
            offsets.push(sites.len());
        }

        log::debug!("neighbor index: points={} cutoff={} pairs={}", n, cutoff, sites.len());

        Self { offsets, sites }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of `(n, j)` pairs.
    pub fn pair_count(&self) -> usize {
        self.sites.len()
    }

    /// Candidate sites of `point`, nearest first.
    pub fn neighbors(&self, point: usize) -> &[usize] {
        &self.sites[self.offsets[point]..self.offsets[point + 1]]
    }

    /// Pair index of the first neighbor of `point`.
    pub fn first_pair(&self, point: usize) -> usize {
        self.offsets[point]
    }

    /// Iterates `(n, j, pair)` over all pairs in pair order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.len()).flat_map(move |point| {
            let start = self.offsets[point];
            self.neighbors(point).iter().enumerate().map(move |(k, &site)| (point, site, start + k))
        })
    }
}

fn nearest_sites(row: &[f64], cutoff: usize) -> Vec<usize> {
    let by_distance = |a: &usize, b: &usize| -> Ordering { row[*a].total_cmp(&row[*b]).then(a.cmp(b)) };

    let mut order: Vec<usize> = (0..row.len()).collect();
    if cutoff < order.len() {
        if cutoff == 0 {
            return Vec::new();
        }
        order.select_nth_unstable_by(cutoff - 1, by_distance);
        order.truncate(cutoff);
    }
    order.sort_unstable_by(by_distance);

    order
}
