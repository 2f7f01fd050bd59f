//! Test helpers.

use crate::error::{PlanError, PlanResult};
use crate::locate::solver::{MipModel, MipSolver, RowSense, SolveResult, SolveStatus, SolverParams, VarKind};

const EPSILON: f64 = 1e-9;

/// Exact solver for tiny models: enumerates every binary assignment and sets
/// the single continuous column to its smallest feasible value.
pub struct EnumeratingSolver;

impl MipSolver for EnumeratingSolver {
    fn solve(&self, model: &MipModel, _: &SolverParams) -> PlanResult<SolveResult> {
        let columns = model.columns();
        let binaries: Vec<usize> = (0..columns.len()).filter(|&c| columns[c].kind == VarKind::Binary).collect();
        let continuous: Vec<usize> = (0..columns.len()).filter(|&c| columns[c].kind == VarKind::Continuous).collect();
        if binaries.len() > 24 || continuous.len() > 1 {
            return Err(PlanError::Solver("model too large for enumeration".to_string()));
        }

        let mut best: Option<(f64, Vec<f64>)> = None;
        let mut values = vec![0.; columns.len()];

        for mask in 0_u64..(1 << binaries.len()) {
            for (bit, &column) in binaries.iter().enumerate() {
                values[column] = ((mask >> bit) & 1) as f64;
            }

            let Some(z) = smallest_feasible(model, &values, continuous.first().copied()) else {
                continue;
            };
            if let Some(&column) = continuous.first() {
                values[column] = z;
            }

            let objective: f64 = columns.iter().zip(values.iter()).map(|(c, v)| c.objective * v).sum();
            if best.as_ref().map_or(true, |(value, _)| objective < *value - EPSILON) {
                best = Some((objective, values.clone()));
            }
        }

        Ok(match best {
            Some((objective, values)) => SolveResult { status: SolveStatus::Optimal, objective, values },
            None => SolveResult::without_incumbent(SolveStatus::Infeasible),
        })
    }
}

/// Checks all rows for fixed binaries and returns the smallest feasible value
/// of continuous column `z` (0 without one), if any.
fn smallest_feasible(model: &MipModel, values: &[f64], z: Option<usize>) -> Option<f64> {
    let (mut lower, mut upper) = z.map_or((0., 0.), |z| (model.columns()[z].lower, model.columns()[z].upper));

    for row in model.rows() {
        let mut fixed = 0.;
        let mut coef = 0.;
        for &(idx, value) in &row.terms {
            if Some(idx) == z {
                coef += value;
            } else {
                fixed += value * values[idx];
            }
        }

        if coef == 0. {
            let satisfied = match row.sense {
                RowSense::Less => fixed <= row.rhs + EPSILON,
                RowSense::Greater => fixed >= row.rhs - EPSILON,
                RowSense::Equal => (fixed - row.rhs).abs() <= EPSILON,
            };
            if !satisfied {
                return None;
            }
            continue;
        }

        let bound = (row.rhs - fixed) / coef;
        match (row.sense, coef > 0.) {
            (RowSense::Less, true) | (RowSense::Greater, false) => upper = upper.min(bound),
            (RowSense::Less, false) | (RowSense::Greater, true) => lower = lower.max(bound),
            (RowSense::Equal, _) => {
                lower = lower.max(bound);
                upper = upper.min(bound);
            }
        }
    }

    (lower <= upper + EPSILON).then_some(lower)
}
