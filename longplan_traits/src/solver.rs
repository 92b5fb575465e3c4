//! The optimizer seam.
//!
//! The solver is stateless between calls from the planner's point of view: every
//! request carries the starting state and the feasible acceleration box, and the
//! planner guarantees `a_min <= a_ego <= a_max` (within its margin).

use serde::{Deserialize, Serialize};

use crate::BoxError;
use crate::types::{CarState, ControlMode, LeadState};

/// Constraint the solver reports as dominant in its solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverSource {
    #[default]
    Cruise,
    Lead0,
    Lead1,
    E2e,
}

/// One optimization problem.
#[derive(Debug, Clone, Copy)]
pub struct SolverRequest<'a> {
    pub mode: ControlMode,
    pub a_min: f32,
    pub a_max: f32,
    /// Starting velocity (filtered, warm-started).
    pub v_ego: f32,
    /// Starting acceleration (warm-started).
    pub a_ego: f32,
    pub car: &'a CarState,
    pub lead: &'a LeadState,
    /// Arbitrated cruise velocity target (m/s).
    pub v_cruise: f32,
    /// Reference trajectories on the solver grid.
    pub x_ref: &'a [f32],
    pub v_ref: &'a [f32],
    pub a_ref: &'a [f32],
    pub j_ref: &'a [f32],
    /// Penalize deviation from the previous acceleration.
    pub prev_accel_constraint: bool,
    /// Desired time gap to the lead (s).
    pub desired_follow_time: f32,
}

/// Solver output on the solver grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverSolution {
    /// One sample per solver grid point.
    pub v: Vec<f32>,
    /// One sample per solver grid point.
    pub a: Vec<f32>,
    /// One sample per solver interval (grid points minus one).
    pub j: Vec<f32>,
    /// Cycles the collision constraint has been violated in a row.
    pub crash_cnt: u32,
    /// Execution time of the solve (s).
    pub solve_time: f32,
    pub source: SolverSource,
}

pub trait LongitudinalSolver {
    fn solve(&mut self, request: &SolverRequest<'_>) -> Result<SolverSolution, BoxError>;
}

impl<T: LongitudinalSolver + ?Sized> LongitudinalSolver for Box<T> {
    fn solve(&mut self, request: &SolverRequest<'_>) -> Result<SolverSolution, BoxError> {
        (**self).solve(request)
    }
}
