//! The fixed time grids the planner moves data between.
//!
//! - model grid: 33 quadratically spaced points over 10 s
//! - solver grid: 13 quadratically spaced points over 10 s (jerk lives on the
//!   first 12, one per interval)
//! - output grid: the first 17 points of the model grid

use std::sync::LazyLock;

/// Samples per model trajectory.
pub const MODEL_N: usize = 33;
/// Samples published per plan.
pub const CONTROL_N: usize = 17;
/// Solver intervals; the solver grid has `SOLVER_N + 1` points.
pub const SOLVER_N: usize = 12;
/// Horizon of both grids (s).
pub const MAX_T: f32 = 10.0;

#[inline]
fn index_function(idx: usize, max_val: f32, max_idx: usize) -> f32 {
    let r = idx as f32 / max_idx as f32;
    max_val * r * r
}

/// Model reference grid.
pub static T_IDXS: LazyLock<[f32; MODEL_N]> =
    LazyLock::new(|| std::array::from_fn(|i| index_function(i, MAX_T, MODEL_N - 1)));

/// Solver grid.
pub static T_IDXS_SOLVER: LazyLock<[f32; SOLVER_N + 1]> =
    LazyLock::new(|| std::array::from_fn(|i| index_function(i, MAX_T, SOLVER_N)));

/// Output grid (prefix of the model grid).
#[inline]
pub fn output_grid() -> &'static [f32] {
    &T_IDXS[..CONTROL_N]
}
