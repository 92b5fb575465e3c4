//! Type-state builder for `Planner` and the generic `build_planner` constructor.
//!
//! The builder enforces at compile time that a solver and the vehicle
//! parameters are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;

use longplan_traits::{LongitudinalSolver, ParamStore, SpeedAdvisor};

use crate::arbitration::SpeedArbiter;
use crate::config::*;
use crate::error::{BuildError, Result};
use crate::integrator::TrajectoryIntegrator;
use crate::limits::LimitComputer;
use crate::mocks::{InactiveAdvisor, NoParams};
use crate::mode::ModeArbiter;
use crate::plan::PlanSource;
use crate::planner::LongitudinalPlanner;
use crate::watchdog::CollisionWatchdog;

/// Dynamically dispatched planner.
pub type Planner = LongitudinalPlanner<Box<dyn LongitudinalSolver>>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Everything optional when constructing a planner.
pub struct PlannerOptions {
    pub mode: ModeCfg,
    pub limits: LimitCfg,
    pub integrator: IntegratorCfg,
    pub watchdog: WatchdogCfg,
    pub params: Option<Box<dyn ParamStore>>,
    pub vision_turn: Option<Box<dyn SpeedAdvisor>>,
    pub speed_limit: Option<Box<dyn SpeedAdvisor>>,
    pub turn_speed: Option<Box<dyn SpeedAdvisor>>,
    pub init_v: f32,
    pub init_a: f32,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            mode: ModeCfg::default(),
            limits: LimitCfg::default(),
            integrator: IntegratorCfg::default(),
            watchdog: WatchdogCfg::default(),
            params: None,
            vision_turn: None,
            speed_limit: None,
            turn_speed: None,
            init_v: 0.0,
            init_a: 0.0,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate configuration and construct the engine.
///
/// Single source of truth for validation, used by both
/// `PlannerBuilder::try_build()` and `build_planner()`.
fn validate_and_build<S: LongitudinalSolver>(
    solver: S,
    vehicle: VehicleParams,
    opts: PlannerOptions,
) -> Result<LongitudinalPlanner<S>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if !(vehicle.steer_ratio.is_finite() && vehicle.steer_ratio > 0.0) {
        return Err(invalid("steer_ratio must be > 0"));
    }
    if !(vehicle.wheelbase.is_finite() && vehicle.wheelbase > 0.0) {
        return Err(invalid("wheelbase must be > 0"));
    }
    if opts.mode.lead_debounce_cycles == 0
        || opts.mode.stop_and_go_cycles == 0
        || opts.mode.param_read_every == 0
    {
        return Err(invalid("mode cycle counts must be >= 1"));
    }
    if !(opts.mode.lead_distance_m.is_finite() && opts.mode.lead_distance_m > 0.0) {
        return Err(invalid("lead_distance_m must be > 0"));
    }
    if !(0.0..=0.5).contains(&opts.limits.margin) {
        return Err(invalid("margin must be in [0, 0.5]"));
    }
    if !(opts.limits.force_decel.is_finite() && opts.limits.force_decel <= 0.0) {
        return Err(invalid("force_decel must be <= 0"));
    }
    if !(opts.integrator.dt_s > 0.0 && opts.integrator.dt_s <= 1.0) {
        return Err(invalid("dt_s must be in (0, 1]"));
    }
    if !(opts.integrator.time_constant_s.is_finite() && opts.integrator.time_constant_s > 0.0) {
        return Err(invalid("time_constant_s must be > 0"));
    }
    if !(opts.init_v.is_finite() && opts.init_v >= 0.0) {
        return Err(invalid("initial velocity must be finite and >= 0"));
    }
    if !opts.init_a.is_finite() {
        return Err(invalid("initial acceleration must be finite"));
    }

    // ── Assemble ─────────────────────────────────────────────────────────────
    let params: Box<dyn ParamStore> = opts.params.unwrap_or_else(|| Box::new(NoParams));
    let arbiter = SpeedArbiter::new(
        opts.vision_turn.unwrap_or_else(|| Box::new(InactiveAdvisor)),
        opts.speed_limit.unwrap_or_else(|| Box::new(InactiveAdvisor)),
        opts.turn_speed.unwrap_or_else(|| Box::new(InactiveAdvisor)),
    );

    let mut mode = ModeArbiter::new(opts.mode);
    mode.read_persisted(&*params, vehicle.openpilot_longitudinal_control);

    Ok(LongitudinalPlanner {
        solver,
        params,
        vehicle,
        mode,
        limits: LimitComputer::new(opts.limits, vehicle),
        arbiter,
        integrator: TrajectoryIntegrator::new(opts.integrator, opts.init_v, opts.init_a),
        watchdog: CollisionWatchdog::new(opts.watchdog),
        fcw: false,
        source: PlanSource::Cruise,
        solve_time: 0.0,
        cycles: 0,
    })
}

/// Builder for `Planner`. All fields are validated on `build()`.
pub struct PlannerBuilder<S, V> {
    solver: Option<Box<dyn LongitudinalSolver>>,
    vehicle: Option<VehicleParams>,
    opts: PlannerOptions,
    _s: PhantomData<S>,
    _v: PhantomData<V>,
}

impl Default for PlannerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            solver: None,
            vehicle: None,
            opts: PlannerOptions::default(),
            _s: PhantomData,
            _v: PhantomData,
        }
    }
}

impl Planner {
    /// Start building a Planner.
    pub fn builder() -> PlannerBuilder<Missing, Missing> {
        PlannerBuilder::default()
    }
}

impl<S, V> PlannerBuilder<S, V> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Planner> {
        let solver = self
            .solver
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSolver))?;
        let vehicle = self
            .vehicle
            .ok_or_else(|| eyre::Report::new(BuildError::MissingVehicle))?;
        validate_and_build(solver, vehicle, self.opts)
    }
}

/// Chainable setters that do not affect type-state.
impl<S, V> PlannerBuilder<S, V> {
    pub fn with_mode_cfg(mut self, cfg: ModeCfg) -> Self {
        self.opts.mode = cfg;
        self
    }
    pub fn with_limit_cfg(mut self, cfg: LimitCfg) -> Self {
        self.opts.limits = cfg;
        self
    }
    pub fn with_integrator_cfg(mut self, cfg: IntegratorCfg) -> Self {
        self.opts.integrator = cfg;
        self
    }
    pub fn with_watchdog_cfg(mut self, cfg: WatchdogCfg) -> Self {
        self.opts.watchdog = cfg;
        self
    }
    /// Persisted-mode store; defaults to an empty store (ACC).
    pub fn with_params(mut self, params: impl ParamStore + 'static) -> Self {
        self.opts.params = Some(Box::new(params));
        self
    }
    pub fn with_vision_turn(mut self, advisor: impl SpeedAdvisor + 'static) -> Self {
        self.opts.vision_turn = Some(Box::new(advisor));
        self
    }
    pub fn with_speed_limit(mut self, advisor: impl SpeedAdvisor + 'static) -> Self {
        self.opts.speed_limit = Some(Box::new(advisor));
        self
    }
    pub fn with_turn_speed(mut self, advisor: impl SpeedAdvisor + 'static) -> Self {
        self.opts.turn_speed = Some(Box::new(advisor));
        self
    }
    /// Seed the filtered velocity and desired acceleration.
    pub fn with_initial_state(mut self, v: f32, a: f32) -> Self {
        self.opts.init_v = v;
        self.opts.init_a = a;
        self
    }
}

// Setters that advance type-state
impl<V> PlannerBuilder<Missing, V> {
    pub fn with_solver(
        self,
        solver: impl LongitudinalSolver + 'static,
    ) -> PlannerBuilder<Set, V> {
        PlannerBuilder {
            solver: Some(Box::new(solver)),
            vehicle: self.vehicle,
            opts: self.opts,
            _s: PhantomData,
            _v: PhantomData,
        }
    }
}

impl<S> PlannerBuilder<S, Missing> {
    pub fn with_vehicle(self, vehicle: VehicleParams) -> PlannerBuilder<S, Set> {
        PlannerBuilder {
            solver: self.solver,
            vehicle: Some(vehicle),
            opts: self.opts,
            _s: PhantomData,
            _v: PhantomData,
        }
    }
}

impl PlannerBuilder<Set, Set> {
    /// Validate and build the Planner. Only available when solver and vehicle are set.
    pub fn build(self) -> Result<Planner> {
        self.try_build()
    }
}

/// Build a statically-dispatched planner from a concrete solver.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_planner<S>(
    solver: S,
    vehicle: VehicleParams,
    opts: PlannerOptions,
) -> Result<LongitudinalPlanner<S>>
where
    S: LongitudinalSolver,
{
    validate_and_build(solver, vehicle, opts)
}
