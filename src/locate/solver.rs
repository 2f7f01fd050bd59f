//! HiGHS MIP solver interface
//!
//! Holds a solver-independent sparse model, the tuning configuration passed
//! through to the solver, and a wrapper around HiGHS that solves the model.

use crate::error::{PlanError, PlanResult};
use highs::{Col, HighsModelStatus, RowProblem, Sense};
use serde::Serialize;
use std::time::Duration;

/// Variable domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Continuous,
}

/// A model column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub objective: f64,
    pub lower: f64,
    pub upper: f64,
    pub kind: VarKind,
}

/// Row sense, applied as `terms (sense) rhs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowSense {
    Less,
    Greater,
    Equal,
}

/// What a row expresses, kept for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// Community `n` is assigned exactly once.
    Assign(usize),
    /// Community `n` may use site `j` only if it is open.
    AssignOpen(usize, usize),
    /// Exactly M sites are open.
    FacilityCount,
    /// Population served by site `j` fits its capacity.
    Capacity(usize),
    /// Weighted distance of pair `(n, j)` bounds the bottleneck.
    Bottleneck(usize, usize),
}

/// A sparse model row.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub terms: Vec<(usize, f64)>,
    pub sense: RowSense,
    pub rhs: f64,
}

/// A minimization MIP in row form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MipModel {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl MipModel {
    /// Adds a column and returns its index.
    pub fn add_column(&mut self, objective: f64, lower: f64, upper: f64, kind: VarKind) -> usize {
        self.columns.push(Column { objective, lower, upper, kind });
        self.columns.len() - 1
    }

    pub fn add_row(&mut self, kind: RowKind, terms: Vec<(usize, f64)>, sense: RowSense, rhs: f64) {
        self.rows.push(Row { kind, terms, sense, rhs });
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome category reported by a solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// Proven optimal within the configured gap.
    Optimal,
    /// A limit was reached but an incumbent exists.
    Suboptimal,
    /// No feasible solution exists.
    Infeasible,
    /// A limit was reached with no incumbent.
    Timeout,
}

/// Result of solving a MIP problem
#[derive(Clone, Debug, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective: f64,
    /// One value per column; empty when there is no incumbent.
    pub values: Vec<f64>,
}

impl SolveResult {
    pub fn without_incumbent(status: SolveStatus) -> Self {
        Self { status, objective: f64::NAN, values: Vec::new() }
    }

    pub fn has_incumbent(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Suboptimal) && !self.values.is_empty()
    }
}

/// Resolved solver options for one solve.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverParams {
    pub time_limit: Option<Duration>,
    pub mip_rel_gap: Option<f64>,
    pub presolve: bool,
    pub heuristic_effort: Option<f64>,
    pub primal_feasibility_tolerance: f64,
    pub dual_feasibility_tolerance: f64,
    pub mip_feasibility_tolerance: f64,
}

/// Tuning intent for the solver. Advisory: it never changes the model.
///
/// Instances with at least `large_threshold` communities switch to a looser,
/// heuristic-heavy profile so the run time stays bounded.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    pub time_limit: Option<Duration>,
    pub mip_rel_gap: Option<f64>,
    pub large_threshold: usize,
    pub large_time_limit: Duration,
    pub large_mip_rel_gap: f64,
    pub large_heuristic_effort: f64,
    pub primal_feasibility_tolerance: f64,
    pub dual_feasibility_tolerance: f64,
    pub mip_feasibility_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            mip_rel_gap: None,
            large_threshold: 500,
            large_time_limit: Duration::from_secs(3600),
            large_mip_rel_gap: 0.2,
            large_heuristic_effort: 0.1,
            primal_feasibility_tolerance: 1e-9,
            dual_feasibility_tolerance: 1e-9,
            mip_feasibility_tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_mip_rel_gap(mut self, gap: f64) -> Self {
        self.mip_rel_gap = Some(gap);
        self
    }

    pub fn with_large_threshold(mut self, threshold: usize) -> Self {
        self.large_threshold = threshold;
        self
    }

    pub fn is_large(&self, size: usize) -> bool {
        size >= self.large_threshold
    }

    /// Resolves the options for an instance with `size` communities.
    /// Explicit time limit and gap always win over the profile.
    pub fn params_for(&self, size: usize) -> SolverParams {
        let large = self.is_large(size);

        SolverParams {
            time_limit: self.time_limit.or(if large { Some(self.large_time_limit) } else { None }),
            mip_rel_gap: self.mip_rel_gap.or(if large { Some(self.large_mip_rel_gap) } else { None }),
            presolve: true,
            heuristic_effort: if large { Some(self.large_heuristic_effort) } else { None },
            primal_feasibility_tolerance: self.primal_feasibility_tolerance,
            dual_feasibility_tolerance: self.dual_feasibility_tolerance,
            mip_feasibility_tolerance: self.mip_feasibility_tolerance,
        }
    }
}

/// A MIP solving capability. Implementations must honor the time limit and
/// report whatever status they reach rather than retrying.
pub trait MipSolver {
    fn solve(&self, model: &MipModel, params: &SolverParams) -> PlanResult<SolveResult>;
}

/// Solves models with the bundled HiGHS solver.
#[derive(Clone, Debug, Default)]
pub struct HighsSolver {
    /// Keeps the HiGHS log on stdout.
    pub verbose: bool,
}

impl MipSolver for HighsSolver {
    fn solve(&self, model: &MipModel, params: &SolverParams) -> PlanResult<SolveResult> {
        solve_mip(model, params, self.verbose)
    }
}

/// Solve a MIP problem using HiGHS
pub fn solve_mip(model: &MipModel, params: &SolverParams, verbose: bool) -> PlanResult<SolveResult> {
    let mut pb = RowProblem::new();

    // integrality must be set when adding the column
    let cols: Vec<Col> = model
        .columns()
        .iter()
        .map(|column| {
            let is_integer = column.kind == VarKind::Binary;
            pb.add_column_with_integrality(column.objective, column.lower..=column.upper, is_integer)
        })
        .collect();

    for row in model.rows() {
        let terms: Vec<(Col, f64)> =
            row.terms.iter().filter(|(_, coef)| coef.abs() > 1e-10).map(|&(idx, coef)| (cols[idx], coef)).collect();

        let rhs = row.rhs;
        match row.sense {
            RowSense::Less => {
                pb.add_row(..=rhs, terms);
            }
            RowSense::Greater => {
                pb.add_row(rhs.., terms);
            }
            RowSense::Equal => {
                pb.add_row(rhs..=rhs, terms);
            }
        }
    }

    let mut highs = pb.optimise(Sense::Minimise);
    highs.set_option("output_flag", verbose);
    highs.set_option("presolve", if params.presolve { "on" } else { "off" });
    highs.set_option("primal_feasibility_tolerance", params.primal_feasibility_tolerance);
    highs.set_option("dual_feasibility_tolerance", params.dual_feasibility_tolerance);
    highs.set_option("mip_feasibility_tolerance", params.mip_feasibility_tolerance);
    if let Some(limit) = params.time_limit {
        highs.set_option("time_limit", limit.as_secs_f64());
    }
    if let Some(gap) = params.mip_rel_gap {
        highs.set_option("mip_rel_gap", gap);
    }
    if let Some(effort) = params.heuristic_effort {
        highs.set_option("mip_heuristic_effort", effort);
    }

    let solved = highs.solve();
    let status = solved.status();
    log::info!("HiGHS finished with status {:?}", status);

    let incumbent = || {
        let objective = solved.objective_value();
        let values = solved.get_solution().columns().to_vec();
        (objective, values)
    };

    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => {
            let (objective, values) = incumbent();
            Ok(SolveResult { status: SolveStatus::Optimal, objective, values })
        }
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            Ok(SolveResult::without_incumbent(SolveStatus::Infeasible))
        }
        HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
            // an infinite objective means no feasible point was ever found
            let (objective, values) = incumbent();
            if objective.is_finite() && values.len() == model.num_columns() {
                Ok(SolveResult { status: SolveStatus::Suboptimal, objective, values })
            } else {
                Ok(SolveResult::without_incumbent(SolveStatus::Timeout))
            }
        }
        other => Err(PlanError::Solver(format!("HiGHS returned status {:?}", other))),
    }
}
