//! Facility location models and the MIP solver they are handed to.

pub mod capacitated_center;
pub mod solution;
pub mod solver;
