//! Capacitated, population-weighted P-Center Problem
//!
//! Open exactly M sites, assign every community to one open site among its
//! nearest candidates, keep the population served by each site within the
//! shared capacity, and minimize the largest population x distance product.

use crate::distance::{DistanceMatrix, NeighborIndex};
use crate::instance::Instance;
use crate::locate::solver::{MipModel, RowKind, RowSense, VarKind};

/// Default scale applied to Z in the objective. It only rescales the reported
/// objective value; the optimum is the same as for minimizing Z alone.
pub const DEFAULT_OBJECTIVE_SCALE: f64 = 1_000_000.;

/// Column layout of the model:
/// Z at 0, D[j] at `1 + j`, T[n][j] at `1 + N + pair` where `pair` is the
/// position of `(n, j)` in the neighbor index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    size: usize,
}

impl ColumnLayout {
    pub fn bottleneck(&self) -> usize {
        0
    }

    pub fn open(&self, site: usize) -> usize {
        1 + site
    }

    pub fn assign(&self, pair: usize) -> usize {
        1 + self.size + pair
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// A built model together with the layout needed to decode its solution.
#[derive(Clone, Debug)]
pub struct CenterModel {
    pub model: MipModel,
    pub layout: ColumnLayout,
    pub objective_scale: f64,
}

/// Builds the facility-location MIP over the neighbor-restricted pairs.
///
/// Returns `None` for an empty instance. Infeasibility (M > N or total
/// population above M x C) is not checked here: the solver reports it.
pub fn build_model(
    instance: &Instance,
    distances: &DistanceMatrix,
    neighbors: &NeighborIndex,
    objective_scale: f64,
) -> Option<CenterModel> {
    let n_sites = instance.len();
    if n_sites == 0 {
        return None;
    }

    let layout = ColumnLayout { size: n_sites };
    let populations = instance.populations();
    let capacity = instance.capacity as f64;

    let weighted = |n: usize, j: usize| populations[n] as f64 * distances.get(n, j);
    let max_weighted = neighbors.pairs().map(|(n, j, _)| weighted(n, j)).fold(0., f64::max);

    let mut model = MipModel::default();

    // Variables:
    // Z = maximum weighted distance (continuous, bounded by the largest candidate product)
    // D[j] = 1 if site j is opened
    // T[n][j] = 1 if community n is served by site j, only for j in neighbors(n)
    model.add_column(objective_scale, 0., max_weighted, VarKind::Continuous);
    for _ in 0..n_sites {
        model.add_column(0., 0., 1., VarKind::Binary);
    }
    for _ in 0..neighbors.pair_count() {
        model.add_column(0., 0., 1., VarKind::Binary);
    }

    // 1. sum_j T[n][j] = 1 for all n
    for n in 0..n_sites {
        let start = neighbors.first_pair(n);
        let terms = (0..neighbors.neighbors(n).len()).map(|k| (layout.assign(start + k), 1.)).collect();
        model.add_row(RowKind::Assign(n), terms, RowSense::Equal, 1.);
    }

    // 2. T[n][j] <= D[j]
    for (n, j, pair) in neighbors.pairs() {
        model.add_row(
            RowKind::AssignOpen(n, j),
            vec![(layout.assign(pair), 1.), (layout.open(j), -1.)],
            RowSense::Less,
            0.,
        );
    }

    // 3. sum_j D[j] = M
    let terms = (0..n_sites).map(|j| (layout.open(j), 1.)).collect();
    model.add_row(RowKind::FacilityCount, terms, RowSense::Equal, instance.facility_count as f64);

    // 4. sum_n P[n] T[n][j] - C D[j] <= 0, only for sites someone considers
    let mut served_by: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_sites];
    for (n, j, pair) in neighbors.pairs() {
        served_by[j].push((layout.assign(pair), populations[n] as f64));
    }
    for (j, mut terms) in served_by.into_iter().enumerate() {
        if terms.is_empty() {
            continue;
        }
        terms.push((layout.open(j), -capacity));
        model.add_row(RowKind::Capacity(j), terms, RowSense::Less, 0.);
    }

    // 5. P[n] d[n][j] T[n][j] - Z <= 0 (min-max linearization)
    for (n, j, pair) in neighbors.pairs() {
        model.add_row(
            RowKind::Bottleneck(n, j),
            vec![(layout.assign(pair), weighted(n, j)), (layout.bottleneck(), -1.)],
            RowSense::Less,
            0.,
        );
    }

    log::info!(
        "built model: communities={} facilities={} columns={} rows={}",
        n_sites,
        instance.facility_count,
        model.num_columns(),
        model.num_rows()
    );

    Some(CenterModel { model, layout, objective_scale })
}
