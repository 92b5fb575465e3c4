//! Closed-loop vehicle and lead models.

use longplan_core::grids::{MODEL_N, T_IDXS, output_grid};
use longplan_core::util::{KPH_TO_MS, interp};
use longplan_core::{CycleSource, LongitudinalPlan};
use longplan_traits::{
    CarState, ControlsState, CycleInputs, DriverSettings, LeadState, ModelReference,
};

use crate::error::{Result, SimError};

/// Below this speed (m/s) the vehicle reports standstill.
const STANDSTILL_V: f32 = 0.01;
/// Leads further than this (m) are not tracked.
const LEAD_RANGE_M: f32 = 150.0;

/// Ego vehicle with a first-order actuator lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimVehicle {
    pub x: f32,
    pub v: f32,
    pub a: f32,
    pub lag_s: f32,
}

impl SimVehicle {
    pub fn new(v: f32, lag_s: f32) -> Self {
        Self {
            x: 0.0,
            v,
            a: 0.0,
            lag_s,
        }
    }

    pub fn step(&mut self, a_cmd: f32, dt: f32) {
        let alpha = dt / (self.lag_s + dt);
        self.a += alpha * (a_cmd - self.a);
        let v_next = (self.v + self.a * dt).max(0.0);
        if v_next == 0.0 && self.a < 0.0 {
            self.a = 0.0;
        }
        self.x += dt * (self.v + v_next) / 2.0;
        self.v = v_next;
    }

    pub fn standstill(&self) -> bool {
        self.v < STANDSTILL_V
    }
}

/// Scripted lead vehicle: constant speed, optionally braking at a set time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimLead {
    pub x: f32,
    pub v: f32,
    pub brake_at_s: Option<f32>,
    /// Deceleration magnitude once braking (m/s²).
    pub brake_decel: f32,
}

impl SimLead {
    pub fn step(&mut self, t: f32, dt: f32) {
        if self.brake_at_s.is_some_and(|at| t >= at) {
            self.v = (self.v - self.brake_decel * dt).max(0.0);
        }
        self.x += self.v * dt;
    }
}

/// Model prediction that extrapolates the current acceleration, with speed
/// kept inside `[0, v_max]`.
pub fn extrapolate_model(v: f32, a: f32, v_max: f32) -> ModelReference {
    let v_max = v_max.max(v);
    let mut position = Vec::with_capacity(MODEL_N);
    let mut velocity = Vec::with_capacity(MODEL_N);
    let mut acceleration = Vec::with_capacity(MODEL_N);
    let (mut x, mut t_prev, mut v_prev) = (0.0f32, 0.0f32, v);
    for &t in T_IDXS.iter() {
        let v_t = (v + a * t).clamp(0.0, v_max);
        x += (t - t_prev) * (v_prev + v_t) / 2.0;
        position.push(x);
        velocity.push(v_t);
        acceleration.push(if v_t > 0.0 && v_t < v_max { a } else { 0.0 });
        t_prev = t;
        v_prev = v_t;
    }
    ModelReference {
        position,
        velocity,
        acceleration,
        temporal_trans: vec![v],
    }
}

/// A closed-loop drive: the plan's next-step acceleration is fed to the
/// vehicle, and the resulting state becomes the next cycle's inputs.
#[derive(Debug, Clone)]
pub struct Scenario {
    vehicle: SimVehicle,
    lead: Option<SimLead>,
    settings: DriverSettings,
    v_cruise_kph: f32,
    dt: f32,
    steps: u64,
    max_steps: u64,
    min_gap: f32,
}

impl Scenario {
    pub fn new(
        vehicle: SimVehicle,
        lead: Option<SimLead>,
        settings: DriverSettings,
        v_cruise_kph: f32,
        dt: f32,
        duration_s: f32,
    ) -> Result<Self> {
        if !(dt > 0.0 && dt <= 1.0) {
            return Err(SimError::InvalidScenario(format!("dt {dt} not in (0, 1]")));
        }
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(SimError::InvalidScenario("duration must be > 0".into()));
        }
        if !(vehicle.v.is_finite() && vehicle.v >= 0.0) {
            return Err(SimError::InvalidScenario("initial speed must be >= 0".into()));
        }
        if lead.is_some_and(|l| l.x <= vehicle.x) {
            return Err(SimError::InvalidScenario("lead must start ahead of ego".into()));
        }
        Ok(Self {
            vehicle,
            lead,
            settings,
            v_cruise_kph,
            dt,
            steps: 0,
            max_steps: (duration_s / dt).round() as u64,
            min_gap: f32::INFINITY,
        })
    }

    /// Scenario from the `[sim]` and `[settings]` config sections.
    pub fn from_config(
        sim: &longplan_config::SimCfg,
        settings: DriverSettings,
        dt: f32,
    ) -> Result<Self> {
        let lead = sim.lead.as_ref().map(|l| SimLead {
            x: l.d_rel_m,
            v: l.v_mps,
            brake_at_s: l.brake_at_s,
            brake_decel: l.brake_decel,
        });
        Self::new(
            SimVehicle::new(sim.v_init_mps, sim.actuator_lag_s),
            lead,
            settings,
            sim.v_cruise_kph,
            dt,
            sim.duration_s,
        )
    }

    pub fn vehicle(&self) -> &SimVehicle {
        &self.vehicle
    }

    pub fn lead(&self) -> Option<&SimLead> {
        self.lead.as_ref()
    }

    /// Simulated time (s).
    pub fn time(&self) -> f32 {
        self.steps as f32 * self.dt
    }

    /// Smallest gap to the lead seen so far (m).
    pub fn min_gap(&self) -> f32 {
        self.min_gap
    }

    fn advance(&mut self, plan: &LongitudinalPlan) {
        let t = self.time();
        let a_cmd = interp(self.dt, output_grid(), &plan.accels);
        self.vehicle.step(a_cmd, self.dt);
        if let Some(lead) = self.lead.as_mut() {
            lead.step(t, self.dt);
        }
        self.steps += 1;
    }

    fn observe(&mut self) -> CycleInputs {
        let lead = match self.lead {
            Some(l) => {
                let d_rel = l.x - self.vehicle.x;
                self.min_gap = self.min_gap.min(d_rel);
                if d_rel < 0.0 {
                    tracing::warn!(t = self.time(), d_rel, "ego passed the lead");
                }
                LeadState {
                    status: d_rel < LEAD_RANGE_M,
                    d_rel,
                    v_rel: l.v - self.vehicle.v,
                }
            }
            None => LeadState::default(),
        };
        CycleInputs {
            car: CarState {
                v_ego: self.vehicle.v,
                a_ego: self.vehicle.a,
                standstill: self.vehicle.standstill(),
                steering_angle_deg: 0.0,
            },
            controls: ControlsState {
                v_cruise_kph: self.v_cruise_kph,
                enabled: true,
                long_control_off: false,
                force_decel: false,
            },
            lead,
            model: extrapolate_model(self.vehicle.v, self.vehicle.a, self.v_cruise_kph * KPH_TO_MS),
            settings: self.settings,
        }
    }
}

impl CycleSource for Scenario {
    fn next_cycle(&mut self, last_plan: Option<&LongitudinalPlan>) -> Option<CycleInputs> {
        if let Some(plan) = last_plan {
            self.advance(plan);
        }
        if self.steps >= self.max_steps {
            return None;
        }
        Some(self.observe())
    }
}
