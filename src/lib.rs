//! Healthcenter deployment and ambulance routing.
//!
//! Stage 1 opens M healthcenters among N communities, assigns every community
//! to one open healthcenter within its K nearest sites, respects a shared
//! population capacity and minimizes the worst population-weighted distance.
//! The model is a MIP solved by HiGHS (or any [`locate::solver::MipSolver`]).
//!
//! Stage 2 packs the opened healthcenters into depot round trips with a greedy
//! first-fit-decreasing rule under an ambulance capacity.
//!
//! ```no_run
//! use healthcenter::instance::parse_instance;
//! use healthcenter::locate::solver::HighsSolver;
//! use healthcenter::plan::{plan, PlanConfig};
//!
//! let instance = parse_instance("2 1\n0 0 0\n1 0 0 10 4\n2 3 4 10 5\n").unwrap();
//! let plan = plan(&instance, &PlanConfig::default(), &HighsSolver::default()).unwrap();
//! println!("Z = {}, routes = {}", plan.solution.bottleneck, plan.routes.routes.len());
//! ```

pub mod distance;
pub mod error;
pub mod instance;
pub mod locate;
pub mod plan;
pub mod route;

#[cfg(test)]
mod helpers;

pub use error::{PlanError, PlanResult};
