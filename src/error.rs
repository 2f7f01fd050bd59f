//! Error taxonomy for the planning pipeline.

use std::fmt;

/// A type alias for result type with `PlanError`.
pub type PlanResult<T> = Result<T, PlanError>;

/// Failures that abort a planning run.
///
/// Input errors come only from the loader. The remaining variants are
/// terminal stage-1 failures: stage 2 never runs after one of them.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanError {
    /// Malformed or inconsistent instance records (1-based line number).
    Input { line: usize, message: String },
    /// The solver proved that no feasible deployment exists.
    Infeasible,
    /// The time limit was hit before any feasible deployment was found.
    /// Not a proof of infeasibility.
    TimeoutWithoutIncumbent,
    /// The solver failed for another reason (bad model, numerical trouble).
    Solver(String),
}

impl PlanError {
    pub fn input(line: usize, message: impl Into<String>) -> Self {
        Self::Input { line, message: message.into() }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input { line, message } => write!(f, "invalid instance at line {}: {}", line, message),
            Self::Infeasible => write!(f, "model is infeasible: no deployment satisfies capacity and facility count"),
            Self::TimeoutWithoutIncumbent => {
                write!(f, "time limit reached before a feasible deployment was found")
            }
            Self::Solver(msg) => write!(f, "solver failure: {}", msg),
        }
    }
}

impl std::error::Error for PlanError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_distinguish_timeout_from_infeasibility() {
        assert_ne!(PlanError::Infeasible, PlanError::TimeoutWithoutIncumbent);
        assert_ne!(PlanError::Infeasible.to_string(), PlanError::TimeoutWithoutIncumbent.to_string());
    }

    #[test]
    fn can_format_input_error_with_line() {
        let err = PlanError::input(4, "expected 5 fields");

        assert_eq!(err.to_string(), "invalid instance at line 4: expected 5 fields");
    }
}
