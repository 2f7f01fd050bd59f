//! Decodes solver values into a deployment and checks its invariants.

use crate::distance::{DistanceMatrix, NeighborIndex};
use crate::error::{PlanError, PlanResult};
use crate::instance::Instance;
use crate::locate::capacitated_center::CenterModel;
use crate::locate::solver::{SolveResult, SolveStatus};
use serde::Serialize;

/// Binary values above this are read as 1. Solvers return values such as
/// 0.9999997 for integral variables.
const BINARY_THRESHOLD: f64 = 0.5;

/// Relative tolerance used when comparing Z with the recomputed bottleneck.
const BOTTLENECK_TOLERANCE: f64 = 1e-6;

/// A stage-1 deployment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Solution {
    pub status: SolveStatus,
    /// Opened sites in ascending order.
    pub facilities: Vec<usize>,
    /// Site serving each community, indexed by community.
    pub assignment: Vec<usize>,
    /// Value of Z: the largest population-weighted distance.
    pub bottleneck: f64,
    /// Solver objective (scaled Z).
    pub objective: f64,
}

impl Solution {
    /// Deployment of an empty instance.
    pub fn empty() -> Self {
        let status = SolveStatus::Optimal;
        Self { status, facilities: Vec::new(), assignment: Vec::new(), bottleneck: 0., objective: 0. }
    }

    /// Communities served by `site`, ascending.
    pub fn members(&self, site: usize) -> Vec<usize> {
        self.assignment.iter().enumerate().filter(|(_, &j)| j == site).map(|(n, _)| n).collect()
    }

    /// Served population per opened site, in `facilities` order.
    pub fn demands(&self, instance: &Instance) -> Vec<(usize, u64)> {
        let mut served = vec![0_u64; instance.len()];
        for (n, &site) in self.assignment.iter().enumerate() {
            served[site] += instance.communities[n].population;
        }

        self.facilities.iter().map(|&site| (site, served[site])).collect()
    }

    /// Largest population x distance over the actual assignment.
    pub fn recompute_bottleneck(&self, instance: &Instance, distances: &DistanceMatrix) -> f64 {
        self.assignment
            .iter()
            .enumerate()
            .map(|(n, &site)| instance.communities[n].population as f64 * distances.get(n, site))
            .fold(0., f64::max)
    }

    /// Returns a description of every violated invariant; empty when valid.
    pub fn validate(&self, instance: &Instance, distances: &DistanceMatrix) -> Vec<String> {
        let mut violations = Vec::new();

        if self.facilities.len() != instance.facility_count {
            violations.push(format!(
                "expected {} healthcenters, found {}",
                instance.facility_count,
                self.facilities.len()
            ));
        }

        if self.assignment.len() != instance.len() {
            violations.push(format!(
                "assignment covers {} of {} communities",
                self.assignment.len(),
                instance.len()
            ));
            return violations;
        }

        let mut is_open = vec![false; instance.len()];
        self.facilities.iter().for_each(|&site| is_open[site] = true);
        for (n, &site) in self.assignment.iter().enumerate() {
            if !is_open[site] {
                violations.push(format!("community {} is assigned to closed site {}", n, site));
            }
        }

        for (site, demand) in self.demands(instance) {
            if demand > instance.capacity {
                violations.push(format!("site {} serves {} above capacity {}", site, demand, instance.capacity));
            }
        }

        let actual = self.recompute_bottleneck(instance, distances);
        if (self.bottleneck - actual).abs() > BOTTLENECK_TOLERANCE * actual.max(1.) {
            violations.push(format!("bottleneck {} differs from recomputed {}", self.bottleneck, actual));
        }

        violations
    }
}

/// Decodes a solve result of `built` into a deployment.
///
/// Fails with `Infeasible` or `TimeoutWithoutIncumbent` when the solver has no
/// solution to offer; a timed-out incumbent that does not decode into a
/// complete assignment counts as no incumbent.
pub fn extract_solution(result: &SolveResult, built: &CenterModel, neighbors: &NeighborIndex) -> PlanResult<Solution> {
    if !result.has_incumbent() {
        return Err(match result.status {
            SolveStatus::Infeasible => PlanError::Infeasible,
            SolveStatus::Timeout | SolveStatus::Suboptimal => PlanError::TimeoutWithoutIncumbent,
            SolveStatus::Optimal => PlanError::Solver("optimal status without solution values".to_string()),
        });
    }

    let inconsistent = |message: String| match result.status {
        SolveStatus::Suboptimal => {
            log::warn!("discarding incumbent: {}", message);
            PlanError::TimeoutWithoutIncumbent
        }
        _ => PlanError::Solver(message),
    };

    let layout = built.layout;
    if result.values.len() != built.model.num_columns() {
        return Err(inconsistent(format!(
            "expected {} values, got {}",
            built.model.num_columns(),
            result.values.len()
        )));
    }

    let is_set = |column: usize| result.values[column] > BINARY_THRESHOLD;

    let facilities: Vec<usize> = (0..layout.size()).filter(|&site| is_set(layout.open(site))).collect();

    let mut assignment = Vec::with_capacity(layout.size());
    for n in 0..layout.size() {
        let start = neighbors.first_pair(n);
        let chosen: Vec<usize> = neighbors
            .neighbors(n)
            .iter()
            .enumerate()
            .filter(|(k, _)| is_set(layout.assign(start + k)))
            .map(|(_, &site)| site)
            .collect();

        match chosen.as_slice() {
            [site] => assignment.push(*site),
            _ => return Err(inconsistent(format!("community {} has {} assignments", n, chosen.len()))),
        }
    }

    Ok(Solution {
        status: result.status,
        facilities,
        assignment,
        bottleneck: result.values[layout.bottleneck()],
        objective: result.objective,
    })
}
