//! A kinematic stand-in for the trajectory optimizer.
//!
//! Integrates a jerk-limited proportional speed controller over the solver
//! grid. It is not optimal; it only has to honour the contract: respect the
//! bounds, start from the requested state, return 13/13/12 samples.

use std::time::Instant;

use longplan_core::grids::{SOLVER_N, T_IDXS_SOLVER};
use longplan_traits::{
    BoxError, ControlMode, LongitudinalSolver, SolverRequest, SolverSolution, SolverSource,
};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicCfg {
    /// Speed error gain (1/s).
    pub k_v: f32,
    /// Gap error gain (1/s).
    pub k_gap: f32,
    /// Jerk limit (m/s³).
    pub j_max: f32,
    /// Gap kept at standstill (m).
    pub stop_distance_m: f32,
    /// Predicted gaps below this count as a crash (m).
    pub min_gap_m: f32,
}

impl Default for KinematicCfg {
    fn default() -> Self {
        Self {
            k_v: 0.6,
            k_gap: 0.25,
            j_max: 4.0,
            stop_distance_m: 6.0,
            min_gap_m: 2.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct KinematicSolver {
    cfg: KinematicCfg,
    crash_cnt: u32,
}

impl KinematicSolver {
    pub fn new(cfg: KinematicCfg) -> Self {
        Self { cfg, crash_cnt: 0 }
    }

    pub fn crash_cnt(&self) -> u32 {
        self.crash_cnt
    }
}

impl LongitudinalSolver for KinematicSolver {
    fn solve(&mut self, r: &SolverRequest<'_>) -> Result<SolverSolution, BoxError> {
        let started = Instant::now();
        if !(r.v_ego.is_finite() && r.a_ego.is_finite()) {
            return Err(SimError::NonFinite("initial state").into());
        }
        if r.a_min.is_nan() || r.a_max.is_nan() || r.a_min > r.a_max {
            return Err(SimError::Infeasible {
                a_min: r.a_min,
                a_max: r.a_max,
            }
            .into());
        }

        let t = &*T_IDXS_SOLVER;
        let cfg = self.cfg;
        let lead_v = (r.car.v_ego + r.lead.v_rel).max(0.0);

        let mut v = vec![0.0f32; SOLVER_N + 1];
        let mut a = vec![0.0f32; SOLVER_N + 1];
        let mut j = vec![0.0f32; SOLVER_N];
        v[0] = r.v_ego.max(0.0);
        a[0] = r.a_ego;

        let mut source = match r.mode {
            ControlMode::Acc => SolverSource::Cruise,
            ControlMode::Blended => SolverSource::E2e,
        };
        let mut x_ego = 0.0f32;
        let mut x_lead = r.lead.d_rel;
        let mut min_gap = f32::INFINITY;

        for k in 0..SOLVER_N {
            let dt = t[k + 1] - t[k];
            let mut v_tgt = match r.mode {
                ControlMode::Acc => r.v_cruise,
                ControlMode::Blended => r
                    .v_ref
                    .get(k + 1)
                    .copied()
                    .unwrap_or(r.v_cruise)
                    .min(r.v_cruise),
            };
            if r.lead.status {
                let desired = cfg.stop_distance_m + lead_v * r.desired_follow_time;
                let v_follow = (lead_v + cfg.k_gap * (x_lead - x_ego - desired)).max(0.0);
                if v_follow < v_tgt {
                    v_tgt = v_follow;
                    if k == 0 {
                        source = SolverSource::Lead0;
                    }
                }
            }

            let a_cmd = (cfg.k_v * (v_tgt - v[k])).clamp(r.a_min, r.a_max);
            let step = cfg.j_max * dt;
            let da = (a_cmd - a[k]).clamp(-step, step);
            j[k] = da / dt;
            a[k + 1] = a[k] + da;
            v[k + 1] = (v[k] + dt * (a[k] + a[k + 1]) / 2.0).max(0.0);

            x_ego += dt * (v[k] + v[k + 1]) / 2.0;
            x_lead += dt * lead_v;
            min_gap = min_gap.min(x_lead - x_ego);
        }

        if r.lead.status && min_gap < cfg.min_gap_m {
            self.crash_cnt = self.crash_cnt.saturating_add(1);
            tracing::trace!(min_gap, crash_cnt = self.crash_cnt, "predicted gap below minimum");
        } else {
            self.crash_cnt = 0;
        }

        Ok(SolverSolution {
            v,
            a,
            j,
            crash_cnt: self.crash_cnt,
            solve_time: started.elapsed().as_secs_f32(),
            source,
        })
    }
}
