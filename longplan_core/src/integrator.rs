//! Velocity smoothing, model reference shaping, resampling and the warm-start
//! seed carried between solver calls.

use longplan_traits::{ModelReference, SolverSolution};

use crate::config::IntegratorCfg;
use crate::error::PlannerError;
use crate::grids::{CONTROL_N, MODEL_N, SOLVER_N, T_IDXS, T_IDXS_SOLVER, output_grid};
use crate::limits::AccelLimits;
use crate::util::{interp, interp_into};

/// Discrete first-order low-pass filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderFilter {
    x: f32,
    alpha: f32,
}

impl FirstOrderFilter {
    /// `alpha = dt / (rc + dt)`.
    pub fn new(x0: f32, rc: f32, dt: f32) -> Self {
        Self {
            x: x0,
            alpha: dt / (rc + dt),
        }
    }

    pub fn update(&mut self, input: f32) -> f32 {
        self.x = (1.0 - self.alpha) * self.x + self.alpha * input;
        self.x
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn set(&mut self, x: f32) {
        self.x = x;
    }
}

/// Reference trajectories on the solver grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceTrajectory {
    pub x: [f32; SOLVER_N + 1],
    pub v: [f32; SOLVER_N + 1],
    pub a: [f32; SOLVER_N + 1],
    pub j: [f32; SOLVER_N + 1],
}

impl ReferenceTrajectory {
    pub const ZERO: Self = Self {
        x: [0.0; SOLVER_N + 1],
        v: [0.0; SOLVER_N + 1],
        a: [0.0; SOLVER_N + 1],
        j: [0.0; SOLVER_N + 1],
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Resample the model prediction onto the solver grid, removing the
/// velocity bias. Malformed predictions yield an all-zero reference.
pub fn shape_reference(model: &ModelReference, v_model_error: f32) -> ReferenceTrajectory {
    let well_formed = model.position.len() == MODEL_N
        && model.velocity.len() == MODEL_N
        && model.acceleration.len() == MODEL_N;
    if !well_formed {
        tracing::warn!(
            position = model.position.len(),
            velocity = model.velocity.len(),
            acceleration = model.acceleration.len(),
            "malformed model reference; using zero reference"
        );
        return ReferenceTrajectory::ZERO;
    }
    let mut r = ReferenceTrajectory::ZERO;
    for (i, &t) in T_IDXS_SOLVER.iter().enumerate() {
        r.x[i] = interp(t, &T_IDXS[..], &model.position) - v_model_error * t;
        r.v[i] = interp(t, &T_IDXS[..], &model.velocity) - v_model_error;
        r.a[i] = interp(t, &T_IDXS[..], &model.acceleration);
    }
    r
}

/// Published trajectories on the output grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputTrajectory {
    pub v: [f32; CONTROL_N],
    pub a: [f32; CONTROL_N],
    pub j: [f32; CONTROL_N],
}

impl Default for OutputTrajectory {
    fn default() -> Self {
        Self {
            v: [0.0; CONTROL_N],
            a: [0.0; CONTROL_N],
            j: [0.0; CONTROL_N],
        }
    }
}

fn check_len(field: &'static str, got: usize, expected: usize) -> Result<(), PlannerError> {
    if got == expected {
        Ok(())
    } else {
        Err(PlannerError::SolverOutput {
            field,
            expected,
            got,
        })
    }
}

/// Interpolate a solver solution onto the output grid.
pub fn resample(solution: &SolverSolution) -> Result<OutputTrajectory, PlannerError> {
    check_len("v", solution.v.len(), SOLVER_N + 1)?;
    check_len("a", solution.a.len(), SOLVER_N + 1)?;
    check_len("j", solution.j.len(), SOLVER_N)?;

    let grid = output_grid();
    let mut out = OutputTrajectory::default();
    interp_into(grid, &T_IDXS_SOLVER[..], &solution.v, &mut out.v);
    interp_into(grid, &T_IDXS_SOLVER[..], &solution.a, &mut out.a);
    interp_into(grid, &T_IDXS_SOLVER[..SOLVER_N], &solution.j, &mut out.j);
    Ok(out)
}

/// State carried across cycles: filtered velocity, model bias, desired accel
/// and the last published trajectories.
#[derive(Debug, Clone)]
pub struct TrajectoryIntegrator {
    dt: f32,
    filter: FirstOrderFilter,
    v_model_error: f32,
    a_desired: f32,
    traj: OutputTrajectory,
}

impl TrajectoryIntegrator {
    pub fn new(cfg: IntegratorCfg, init_v: f32, init_a: f32) -> Self {
        Self {
            dt: cfg.dt_s,
            filter: FirstOrderFilter::new(init_v, cfg.time_constant_s, cfg.dt_s),
            v_model_error: 0.0,
            a_desired: init_a,
            traj: OutputTrajectory {
                v: [init_v; CONTROL_N],
                a: [init_a; CONTROL_N],
                j: [0.0; CONTROL_N],
            },
        }
    }

    /// Snap to the measured state.
    pub fn reset(&mut self, v_ego: f32, a_ego: f32, limits: AccelLimits) {
        self.filter.set(v_ego);
        self.a_desired = limits.clamp(a_ego);
    }

    /// Smooth in the measured speed; the result is floored at zero.
    pub fn smooth(&mut self, v_ego: f32) -> f32 {
        let x = self.filter.update(v_ego).max(0.0);
        self.filter.set(x);
        x
    }

    /// Refresh the velocity bias from the short-horizon pose sample.
    pub fn observe_model(&mut self, model: &ModelReference, v_ego: f32) {
        if let Some(&trans) = model.temporal_trans.first() {
            self.v_model_error = trans - v_ego;
        }
    }

    pub fn reference(&self, model: &ModelReference) -> ReferenceTrajectory {
        shape_reference(model, self.v_model_error)
    }

    /// Store the trajectory and advance the seed by one period.
    pub fn advance(&mut self, traj: OutputTrajectory) {
        let a_prev = self.a_desired;
        self.a_desired = interp(self.dt, output_grid(), &traj.a);
        let v = self.filter.x() + self.dt * (self.a_desired + a_prev) / 2.0;
        self.filter.set(v);
        self.traj = traj;
    }

    pub fn v_filtered(&self) -> f32 {
        self.filter.x()
    }

    pub fn a_desired(&self) -> f32 {
        self.a_desired
    }

    pub fn v_model_error(&self) -> f32 {
        self.v_model_error
    }

    pub fn trajectory(&self) -> &OutputTrajectory {
        &self.traj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution_from(f: impl Fn(f32) -> f32) -> SolverSolution {
        SolverSolution {
            v: T_IDXS_SOLVER.iter().map(|&t| f(t)).collect(),
            a: T_IDXS_SOLVER.iter().map(|&t| f(t) * 0.1).collect(),
            j: T_IDXS_SOLVER[..SOLVER_N].iter().map(|_| 0.0).collect(),
            ..SolverSolution::default()
        }
    }

    #[test]
    fn filter_converges_monotonically() {
        let mut f = FirstOrderFilter::new(0.0, 2.0, 0.05);
        let mut prev = f.x();
        for _ in 0..500 {
            let x = f.update(10.0);
            assert!(x >= prev && x <= 10.0);
            prev = x;
        }
        assert!((10.0 - prev).abs() < 0.01);
    }

    #[test]
    fn smooth_floors_at_zero() {
        let mut it = TrajectoryIntegrator::new(IntegratorCfg::default(), 0.0, 0.0);
        assert_eq!(it.smooth(-3.0), 0.0);
    }

    #[test]
    fn resample_keeps_values_at_shared_points() {
        let sol = solution_from(|t| 3.0 + 2.0 * t);
        let out = resample(&sol).unwrap();
        // both grids start at t = 0
        assert_eq!(out.v[0], sol.v[0]);
        assert_eq!(out.a[0], sol.a[0]);
        // linear input stays linear
        for (i, &t) in output_grid().iter().enumerate() {
            assert!((out.v[i] - (3.0 + 2.0 * t)).abs() < 1e-4);
        }
    }

    #[test]
    fn resample_rejects_short_solution() {
        let mut sol = solution_from(|t| t);
        sol.j.pop();
        let err = resample(&sol).unwrap_err();
        assert_eq!(
            err,
            PlannerError::SolverOutput {
                field: "j",
                expected: SOLVER_N,
                got: SOLVER_N - 1
            }
        );
    }

    #[test]
    fn malformed_model_degrades_to_zero() {
        let model = ModelReference {
            position: vec![1.0; 20],
            velocity: vec![1.0; MODEL_N],
            acceleration: vec![1.0; MODEL_N],
            temporal_trans: vec![],
        };
        assert!(shape_reference(&model, 0.3).is_zero());
    }

    #[test]
    fn bias_shifts_position_and_velocity_only() {
        let model = ModelReference {
            position: T_IDXS.iter().map(|&t| 10.0 * t).collect(),
            velocity: vec![10.0; MODEL_N],
            acceleration: vec![0.5; MODEL_N],
            temporal_trans: vec![],
        };
        let r = shape_reference(&model, 1.0);
        for (i, &t) in T_IDXS_SOLVER.iter().enumerate() {
            assert!((r.x[i] - 9.0 * t).abs() < 1e-3);
            assert!((r.v[i] - 9.0).abs() < 1e-6);
            assert_eq!(r.a[i], 0.5);
            assert_eq!(r.j[i], 0.0);
        }
    }

    #[test]
    fn bias_persists_without_pose_sample() {
        let mut it = TrajectoryIntegrator::new(IntegratorCfg::default(), 0.0, 0.0);
        let mut model = ModelReference {
            temporal_trans: vec![10.5],
            ..ModelReference::default()
        };
        it.observe_model(&model, 10.0);
        assert!((it.v_model_error() - 0.5).abs() < 1e-6);
        model.temporal_trans.clear();
        it.observe_model(&model, 12.0);
        assert!((it.v_model_error() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn advance_integrates_trapezoid() {
        let mut it = TrajectoryIntegrator::new(IntegratorCfg::default(), 10.0, 0.0);
        let traj = OutputTrajectory {
            a: [1.0; CONTROL_N],
            ..OutputTrajectory::default()
        };
        it.advance(traj);
        assert_eq!(it.a_desired(), 1.0);
        // 10 + 0.05 * (1 + 0) / 2
        assert!((it.v_filtered() - 10.025).abs() < 1e-5);
    }

    #[test]
    fn reset_clamps_accel_into_limits() {
        let mut it = TrajectoryIntegrator::new(IntegratorCfg::default(), 0.0, 0.0);
        it.reset(7.0, 3.0, AccelLimits::new(-1.2, 1.6));
        assert_eq!(it.v_filtered(), 7.0);
        assert_eq!(it.a_desired(), 1.6);
    }
}
