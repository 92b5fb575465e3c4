#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use longplan_core::grids::{MODEL_N, SOLVER_N, T_IDXS, T_IDXS_SOLVER};
use longplan_core::{LongitudinalPlanner, PlannerOptions, VehicleParams, build_planner};
use longplan_traits::{
    AdvisoryContext, AdvisoryOutput, AdvisoryPhase, BoxError, CarState, ControlMode,
    ControlsState, CycleInputs, LeadState, LongitudinalSolver, ModelReference, ParamStore,
    SolverRequest, SolverSolution, SolverSource, SpeedAdvisor,
};

/// What the planner handed to the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub mode: ControlMode,
    pub a_min: f32,
    pub a_max: f32,
    pub v_ego: f32,
    pub a_ego: f32,
    pub v_cruise: f32,
    pub x_ref: Vec<f32>,
    pub v_ref: Vec<f32>,
    pub a_ref: Vec<f32>,
    pub prev_accel_constraint: bool,
    pub desired_follow_time: f32,
}

/// Holds the starting acceleration over the whole horizon.
#[derive(Debug, Default)]
pub struct EchoSolver {
    pub seen: Vec<Seen>,
    pub crash_cnt: u32,
    pub source: SolverSource,
    /// Overrides the held acceleration when set.
    pub accel: Option<f32>,
    pub fail: bool,
    pub short_output: bool,
}

impl LongitudinalSolver for EchoSolver {
    fn solve(&mut self, r: &SolverRequest<'_>) -> Result<SolverSolution, BoxError> {
        self.seen.push(Seen {
            mode: r.mode,
            a_min: r.a_min,
            a_max: r.a_max,
            v_ego: r.v_ego,
            a_ego: r.a_ego,
            v_cruise: r.v_cruise,
            x_ref: r.x_ref.to_vec(),
            v_ref: r.v_ref.to_vec(),
            a_ref: r.a_ref.to_vec(),
            prev_accel_constraint: r.prev_accel_constraint,
            desired_follow_time: r.desired_follow_time,
        });
        if self.fail {
            return Err("solver diverged".into());
        }
        let a = self.accel.unwrap_or(r.a_ego).clamp(r.a_min, r.a_max);
        let n = if self.short_output { SOLVER_N } else { SOLVER_N + 1 };
        Ok(SolverSolution {
            v: T_IDXS_SOLVER[..n].iter().map(|&t| (r.v_ego + a * t).max(0.0)).collect(),
            a: vec![a; n],
            j: vec![0.0; SOLVER_N],
            crash_cnt: self.crash_cnt,
            solve_time: 0.001,
            source: self.source,
        })
    }
}

impl EchoSolver {
    pub fn last(&self) -> &Seen {
        self.seen.last().unwrap()
    }
}

/// Advisor with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvisor {
    pub active: bool,
    pub a_target: f32,
    pub v_target: f32,
}

impl SpeedAdvisor for FixedAdvisor {
    fn update(&mut self, _ctx: &AdvisoryContext<'_>) -> AdvisoryOutput {
        AdvisoryOutput {
            active: self.active,
            phase: if self.active {
                AdvisoryPhase::Active
            } else {
                AdvisoryPhase::Inactive
            },
            a_target: self.a_target,
            v_target: self.v_target,
            distance: 0.0,
            ..AdvisoryOutput::default()
        }
    }
}

/// Param store that counts reads and can be told to fail. Clones share state,
/// so a test can keep a handle after moving one into the planner.
#[derive(Debug, Default, Clone)]
pub struct CountingParams {
    pub experimental: Rc<Cell<Option<bool>>>,
    pub fail: Rc<Cell<bool>>,
    pub reads: Rc<Cell<u32>>,
}

impl CountingParams {
    pub fn with_experimental(flag: bool) -> Self {
        let p = Self::default();
        p.experimental.set(Some(flag));
        p
    }
}

impl ParamStore for CountingParams {
    fn get_bool(&self, _key: &str) -> Result<Option<bool>, BoxError> {
        self.reads.set(self.reads.get() + 1);
        if self.fail.get() {
            return Err("store offline".into());
        }
        Ok(self.experimental.get())
    }
}

/// Model prediction at constant speed.
pub fn model_at(v: f32) -> ModelReference {
    ModelReference {
        position: T_IDXS.iter().map(|&t| v * t).collect(),
        velocity: vec![v; MODEL_N],
        acceleration: vec![0.0; MODEL_N],
        temporal_trans: vec![v],
    }
}

/// Engaged, cruising at `v` with a 100 km/h set-speed and no lead.
pub fn cruising(v: f32) -> CycleInputs {
    CycleInputs {
        car: CarState {
            v_ego: v,
            a_ego: 0.0,
            standstill: v < 0.01,
            steering_angle_deg: 0.0,
        },
        controls: ControlsState {
            v_cruise_kph: 100.0,
            enabled: true,
            long_control_off: false,
            force_decel: false,
        },
        lead: LeadState::default(),
        model: model_at(v),
        settings: Default::default(),
    }
}

pub fn with_lead(mut inputs: CycleInputs, d_rel: f32) -> CycleInputs {
    inputs.lead = LeadState {
        status: true,
        d_rel,
        v_rel: 0.0,
    };
    inputs
}

pub fn planner_with(solver: EchoSolver, opts: PlannerOptions) -> LongitudinalPlanner<EchoSolver> {
    build_planner(solver, VehicleParams::default(), opts).unwrap()
}

pub fn planner(init_v: f32) -> LongitudinalPlanner<EchoSolver> {
    planner_with(
        EchoSolver::default(),
        PlannerOptions {
            init_v,
            ..PlannerOptions::default()
        },
    )
}
