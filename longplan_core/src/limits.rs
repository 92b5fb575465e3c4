//! Feasible acceleration bounds.
//!
//! Each derivation step keeps `min <= max`; the last step widens the box so the
//! solver's fixed starting acceleration lies inside it.

use serde::Serialize;

use crate::config::{LimitCfg, VehicleParams};
use crate::util::{DEG_TO_RAD, interp};

/// Ordered acceleration bounds (m/s²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccelLimits {
    pub min: f32,
    pub max: f32,
}

impl AccelLimits {
    /// Build normalized bounds.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }.normalized()
    }

    /// Pull `min` down to `max` if the pair is inverted.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            min: self.min.min(self.max),
            max: self.max,
        }
    }

    /// Clip `a` into the bounds.
    #[inline]
    pub fn clamp(&self, a: f32) -> f32 {
        a.max(self.min).min(self.max)
    }

    /// `a` lies inside the bounds widened by `eps` on both sides.
    pub fn brackets(&self, a: f32, eps: f32) -> bool {
        self.min <= a + eps && self.max >= a - eps
    }
}

/// Driver-selectable acceleration personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelProfile {
    Eco,
    Normal,
    Sport,
}

impl AccelProfile {
    /// 0 = eco, 2 = sport; anything else is normal.
    pub fn from_selector(sel: u8) -> Self {
        match sel {
            0 => AccelProfile::Eco,
            2 => AccelProfile::Sport,
            _ => AccelProfile::Normal,
        }
    }

    fn max_table(self) -> &'static [f32; 10] {
        match self {
            AccelProfile::Eco => &MAX_ECO,
            AccelProfile::Normal => &MAX_NORMAL,
            AccelProfile::Sport => &MAX_SPORT,
        }
    }
}

// Default cruise limits.
const A_CRUISE_MIN: f32 = -1.2;
const A_CRUISE_MAX_BP: [f32; 4] = [0.0, 10.0, 25.0, 40.0];
const A_CRUISE_MAX_V: [f32; 4] = [1.6, 1.2, 0.8, 0.6];

// Profile tables share breakpoints; the decel side is flat.
const PROFILE_MIN_BP: [f32; 10] = [0.0, 0.07, 6.0, 8.0, 11.0, 15.0, 20.0, 25.0, 30.0, 55.0];
const PROFILE_MIN_V: [f32; 10] = [-1.0; 10];
const PROFILE_MAX_BP: [f32; 10] = [0.0, 3.0, 6.0, 8.0, 11.0, 15.0, 20.0, 25.0, 30.0, 55.0];
const MAX_ECO: [f32; 10] = [2.5, 1.3, 1.2, 0.7, 0.48, 0.35, 0.25, 0.15, 0.12, 0.06];
const MAX_NORMAL: [f32; 10] = [3.5, 1.7, 1.31, 0.95, 0.77, 0.67, 0.55, 0.47, 0.31, 0.13];
const MAX_SPORT: [f32; 10] = [3.5, 3.5, 2.5, 1.5, 2.0, 2.0, 2.0, 1.5, 1.0, 0.5];

// Total (combined) acceleration budget in turns.
const A_TOTAL_MAX_BP: [f32; 2] = [20.0, 40.0];
const A_TOTAL_MAX_V: [f32; 2] = [1.7, 3.2];

/// Default limits used when profile selection is off.
pub fn default_limits(v_ego: f32) -> AccelLimits {
    AccelLimits::new(A_CRUISE_MIN, interp(v_ego, &A_CRUISE_MAX_BP, &A_CRUISE_MAX_V))
}

pub fn profile_limits(v_ego: f32, profile: AccelProfile) -> AccelLimits {
    AccelLimits::new(
        interp(v_ego, &PROFILE_MIN_BP, &PROFILE_MIN_V),
        interp(v_ego, &PROFILE_MAX_BP, profile.max_table()),
    )
}

/// Cap the upper bound at the longitudinal headroom left by lateral load.
///
/// Lateral acceleration is approximated from the steering angle as
/// `v² · angle / (steer_ratio · wheelbase)`.
pub fn limit_accel_in_turns(
    v_ego: f32,
    angle_deg: f32,
    limits: AccelLimits,
    vehicle: &VehicleParams,
) -> AccelLimits {
    let a_total_max = interp(v_ego, &A_TOTAL_MAX_BP, &A_TOTAL_MAX_V);
    let a_y = v_ego * v_ego * angle_deg * DEG_TO_RAD / (vehicle.steer_ratio * vehicle.wheelbase);
    let a_x_allowed = (a_total_max * a_total_max - a_y * a_y).max(0.0).sqrt();
    AccelLimits::new(limits.min, limits.max.min(a_x_allowed))
}

/// Derives the bounds handed to the solver each cycle.
#[derive(Debug, Clone, Copy)]
pub struct LimitComputer {
    cfg: LimitCfg,
    vehicle: VehicleParams,
}

impl LimitComputer {
    pub fn new(cfg: LimitCfg, vehicle: VehicleParams) -> Self {
        Self { cfg, vehicle }
    }

    pub fn margin(&self) -> f32 {
        self.cfg.margin
    }

    /// Speed-dependent bounds before any derating.
    pub fn base(&self, v_ego: f32, profile: Option<AccelProfile>) -> AccelLimits {
        match profile {
            Some(p) => profile_limits(v_ego, p),
            None => default_limits(v_ego),
        }
    }

    pub fn derate_for_turn(&self, v_ego: f32, angle_deg: f32, limits: AccelLimits) -> AccelLimits {
        limit_accel_in_turns(v_ego, angle_deg, limits, &self.vehicle)
    }

    /// Force a mild deceleration.
    pub fn force_decel(&self, limits: AccelLimits) -> AccelLimits {
        let max = limits.max.min(self.cfg.force_decel);
        AccelLimits {
            min: limits.min.min(max),
            max,
        }
    }

    /// Widen the bounds so `a_desired` (± margin) and the tightest advisory
    /// accel target are inside.
    pub fn clip_feasible(&self, limits: AccelLimits, a_desired: f32, a_min_sol: f32) -> AccelLimits {
        let min = limits.min.min(a_desired + self.cfg.margin).min(a_min_sol);
        let max = limits.max.max(a_desired - self.cfg.margin);
        AccelLimits::new(min, max)
    }

    /// The whole chain: base → turn → override → feasibility.
    pub fn compute(&self, req: &LimitRequest) -> AccelLimits {
        let mut limits = self.derate_for_turn(
            req.v_ego,
            req.steering_angle_deg,
            self.base(req.v_ego, req.profile),
        );
        if req.force_decel {
            limits = self.force_decel(limits);
        }
        self.clip_feasible(limits, req.a_desired, req.a_min_sol)
    }
}

/// Inputs of [`LimitComputer::compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitRequest {
    pub v_ego: f32,
    pub steering_angle_deg: f32,
    pub profile: Option<AccelProfile>,
    pub force_decel: bool,
    pub a_desired: f32,
    /// Tightest accel target across active advisory candidates (`+inf` if none).
    pub a_min_sol: f32,
}
