//! The per-cycle planning engine.
//!
//! One call to [`LongitudinalPlanner::update`] runs the whole pipeline:
//! mode → reseed → smoothing → advisory arbitration → bounds → solver →
//! resampling → watchdog → warm-start advance.

use eyre::WrapErr;

use longplan_traits::{
    AdvisoryContext, ControlMode, CycleInputs, LongitudinalSolver, ParamStore, SolverRequest,
};

use crate::arbitration::SpeedArbiter;
use crate::config::VehicleParams;
use crate::error::{PlannerError, Result};
use crate::following::desired_follow_time;
use crate::integrator::{OutputTrajectory, TrajectoryIntegrator, resample};
use crate::limits::{AccelProfile, LimitComputer, LimitRequest};
use crate::mode::{ModeArbiter, ModeInputs, ModeState};
use crate::plan::{AdvisoryDiagnostics, LongitudinalPlan, PlanSource};
use crate::util::{KPH_TO_MS, V_CRUISE_MAX_KPH};
use crate::watchdog::CollisionWatchdog;

pub struct LongitudinalPlanner<S: LongitudinalSolver> {
    pub(crate) solver: S,
    pub(crate) params: Box<dyn ParamStore>,
    pub(crate) vehicle: VehicleParams,
    pub(crate) mode: ModeArbiter,
    pub(crate) limits: LimitComputer,
    pub(crate) arbiter: SpeedArbiter,
    pub(crate) integrator: TrajectoryIntegrator,
    pub(crate) watchdog: CollisionWatchdog,
    pub(crate) fcw: bool,
    pub(crate) source: PlanSource,
    pub(crate) solve_time: f32,
    pub(crate) cycles: u64,
}

impl<S: LongitudinalSolver> core::fmt::Debug for LongitudinalPlanner<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LongitudinalPlanner")
            .field("mode", &self.mode.mode())
            .field("v_filtered", &self.integrator.v_filtered())
            .field("a_desired", &self.integrator.a_desired())
            .field("fcw", &self.fcw)
            .field("source", &self.source)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl<S: LongitudinalSolver> LongitudinalPlanner<S> {
    /// One planning cycle, reading the persisted mode when due.
    pub fn update(&mut self, inputs: &CycleInputs) -> Result<LongitudinalPlan> {
        self.update_with(inputs, true)
    }

    /// One planning cycle. `read_params = false` suppresses the persisted
    /// mode read for this cycle (the decimation counter still advances).
    ///
    /// On error the seed is not advanced; trajectory, fcw flag and source keep
    /// their previous values.
    pub fn update_with(&mut self, inputs: &CycleInputs, read_params: bool) -> Result<LongitudinalPlan> {
        let car = &inputs.car;
        let controls = &inputs.controls;
        let settings = &inputs.settings;

        if !(car.v_ego.is_finite() && car.a_ego.is_finite()) {
            return Err(eyre::Report::new(PlannerError::State(
                "non-finite ego speed or acceleration".into(),
            )));
        }
        // `f32::min` would turn a NaN set-speed into the cap.
        if !controls.v_cruise_kph.is_finite() {
            return Err(eyre::Report::new(PlannerError::State(
                "non-finite cruise set-speed".into(),
            )));
        }

        // ── Mode ─────────────────────────────────────────────────────────────
        let mode_reset = if settings.conditional_blended {
            let mi = ModeInputs::from_cycle(inputs, self.mode.cfg());
            self.mode.update_conditional(&mi)
        } else {
            self.mode.poll_persisted(
                &*self.params,
                self.vehicle.openpilot_longitudinal_control,
                read_params,
            );
            false
        };
        let mode = self.mode.mode();

        let v_ego = car.v_ego;
        let v_cruise = controls.v_cruise_kph.min(V_CRUISE_MAX_KPH) * KPH_TO_MS;

        // Disengaged, or the driver is controlling the speed.
        let reset = if self.vehicle.openpilot_longitudinal_control {
            controls.long_control_off
        } else {
            !controls.enabled
        };
        let prev_accel_constraint = !(reset || car.standstill);

        let profile = settings
            .accel_profile_ctrl
            .then(|| AccelProfile::from_selector(settings.accel_profile));

        // ── Reseed ───────────────────────────────────────────────────────────
        if reset || mode_reset || car.standstill {
            let base = self.limits.base(v_ego, profile);
            self.integrator.reset(v_ego, car.a_ego, base);
            if reset || mode_reset {
                tracing::debug!(reset, mode_reset, v_ego, "planner state reseeded");
            }
        }

        let v_filtered = self.integrator.smooth(v_ego);
        self.integrator.observe_model(&inputs.model, v_ego);
        let a_desired = self.integrator.a_desired();

        // ── Advisories and bounds ────────────────────────────────────────────
        let arb = self.arbiter.update(&AdvisoryContext {
            enabled: !reset,
            v_ego: v_filtered,
            a_ego: a_desired,
            v_cruise,
            inputs,
        });

        let limits = self.limits.compute(&LimitRequest {
            v_ego,
            steering_angle_deg: car.steering_angle_deg,
            profile,
            force_decel: controls.force_decel,
            a_desired,
            a_min_sol: arb.a_min,
        });

        // ── Solve ────────────────────────────────────────────────────────────
        let reference = self.integrator.reference(&inputs.model);
        let request = SolverRequest {
            mode,
            a_min: limits.min,
            a_max: limits.max,
            v_ego: v_filtered,
            a_ego: a_desired,
            car,
            lead: &inputs.lead,
            v_cruise: arb.chosen.v_target,
            x_ref: &reference.x,
            v_ref: &reference.v,
            a_ref: &reference.a,
            j_ref: &reference.j,
            prev_accel_constraint,
            desired_follow_time: desired_follow_time(v_ego, settings, mode),
        };
        let solution = self
            .solver
            .solve(&request)
            .map_err(|e| eyre::Report::new(PlannerError::Solver(e.to_string())))
            .wrap_err("solver update")?;
        let traj = resample(&solution)
            .map_err(eyre::Report::new)
            .wrap_err("resampling solver output")?;

        // ── Publish and advance ──────────────────────────────────────────────
        let fcw = self.watchdog.evaluate(solution.crash_cnt, car.standstill);
        if fcw && !self.fcw {
            tracing::info!(crash_cnt = solution.crash_cnt, v_ego, "FCW triggered");
        }

        self.integrator.advance(traj);
        self.fcw = fcw;
        self.source = PlanSource::resolve(solution.source, arb.chosen.source);
        self.solve_time = solution.solve_time;
        self.cycles = self.cycles.wrapping_add(1);

        Ok(LongitudinalPlan {
            speeds: traj.v,
            accels: traj.a,
            jerks: traj.j,
            has_lead: inputs.lead.status,
            source: self.source,
            fcw,
            solver_execution_time: solution.solve_time,
            mode,
            is_blended: mode.is_blended(),
            reset: reset || mode_reset,
            accel_limits: limits,
            v_cruise: arb.chosen.v_target,
            advisories: AdvisoryDiagnostics::from(&arb.reports),
        })
    }

    pub fn mode(&self) -> ControlMode {
        self.mode.mode()
    }

    pub fn mode_state(&self) -> &ModeState {
        self.mode.state()
    }

    pub fn fcw(&self) -> bool {
        self.fcw
    }

    pub fn source(&self) -> PlanSource {
        self.source
    }

    pub fn solver_execution_time(&self) -> f32 {
        self.solve_time
    }

    /// Warm-start velocity for the next cycle.
    pub fn v_filtered(&self) -> f32 {
        self.integrator.v_filtered()
    }

    /// Warm-start acceleration for the next cycle.
    pub fn a_desired(&self) -> f32 {
        self.integrator.a_desired()
    }

    pub fn v_model_error(&self) -> f32 {
        self.integrator.v_model_error()
    }

    pub fn trajectory(&self) -> &OutputTrajectory {
        self.integrator.trajectory()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn vehicle(&self) -> &VehicleParams {
        &self.vehicle
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }
}
