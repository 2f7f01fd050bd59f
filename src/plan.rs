//! The two-stage planning pipeline.
//!
//! Stage 1 deploys healthcenters by solving the capacitated center model,
//! stage 2 packs the opened healthcenters into ambulance routes. Each stage
//! consumes the previous one's output by value and can be run on its own.

use crate::distance::{euclidean_matrix, DistanceMatrix, NeighborIndex};
use crate::error::PlanResult;
use crate::instance::Instance;
use crate::locate::capacitated_center::{build_model, DEFAULT_OBJECTIVE_SCALE};
use crate::locate::solution::{extract_solution, Solution};
use crate::locate::solver::{MipSolver, SolverConfig};
use crate::route::packing::{plan_routes, RoutePlan};
use serde::Serialize;

/// Default number of nearest sites a community may be assigned to.
pub const DEFAULT_NEIGHBOR_CUTOFF: usize = 2000;

/// Default ambulance capacity.
pub const DEFAULT_VEHICLE_CAPACITY: u64 = 10000;

/// Settings of a planning run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanConfig {
    pub neighbor_cutoff: usize,
    pub vehicle_capacity: u64,
    pub objective_scale: f64,
    pub solver: SolverConfig,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            neighbor_cutoff: DEFAULT_NEIGHBOR_CUTOFF,
            vehicle_capacity: DEFAULT_VEHICLE_CAPACITY,
            objective_scale: DEFAULT_OBJECTIVE_SCALE,
            solver: SolverConfig::default(),
        }
    }
}

impl PlanConfig {
    pub fn with_neighbor_cutoff(mut self, cutoff: usize) -> Self {
        self.neighbor_cutoff = cutoff;
        self
    }

    pub fn with_vehicle_capacity(mut self, capacity: u64) -> Self {
        self.vehicle_capacity = capacity;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// Output of stage 1 together with the geometry it was computed on.
#[derive(Clone, Debug)]
pub struct Deployment {
    pub distances: DistanceMatrix,
    pub neighbors: NeighborIndex,
    pub solution: Solution,
}

/// Final result of both stages.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Plan {
    pub solution: Solution,
    pub routes: RoutePlan,
}

/// Stage 1: geometry, model, solve, extract.
pub fn deploy<S: MipSolver>(instance: &Instance, config: &PlanConfig, solver: &S) -> PlanResult<Deployment> {
    let distances = euclidean_matrix(&instance.xs(), &instance.ys());
    let neighbors = NeighborIndex::new(&distances, config.neighbor_cutoff);

    let Some(built) = build_model(instance, &distances, &neighbors, config.objective_scale) else {
        log::info!("empty instance, nothing to deploy");
        return Ok(Deployment { distances, neighbors, solution: Solution::empty() });
    };

    let params = config.solver.params_for(instance.len());
    log::info!(
        "solving with {} profile: time limit {:?}, gap {:?}",
        if config.solver.is_large(instance.len()) { "large instance" } else { "default" },
        params.time_limit,
        params.mip_rel_gap
    );

    let result = solver.solve(&built.model, &params)?;
    log::info!("solver status {:?}, objective {}", result.status, result.objective);

    let solution = extract_solution(&result, &built, &neighbors)?;
    for violation in solution.validate(instance, &distances) {
        log::warn!("deployment check: {}", violation);
    }

    Ok(Deployment { distances, neighbors, solution })
}

/// Stage 2: route packing over the deployed healthcenters.
pub fn route(instance: &Instance, solution: &Solution, vehicle_capacity: u64) -> RoutePlan {
    let locations: Vec<(f64, f64)> = instance.communities.iter().map(|c| (c.x, c.y)).collect();
    let depot = (instance.depot.x, instance.depot.y);

    plan_routes(&solution.demands(instance), &locations, depot, vehicle_capacity)
}

/// Runs both stages. A stage-1 failure is returned as is and stage 2 is skipped.
pub fn plan<S: MipSolver>(instance: &Instance, config: &PlanConfig, solver: &S) -> PlanResult<Plan> {
    let deployment = deploy(instance, config, solver)?;
    let routes = route(instance, &deployment.solution, config.vehicle_capacity);

    Ok(Plan { solution: deployment.solution, routes })
}
