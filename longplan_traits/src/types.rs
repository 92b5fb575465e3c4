//! Per-cycle observation types consumed by the planner.
//!
//! Units: metres, seconds, m/s, m/s², degrees for the steering angle and km/h for
//! the cruise set-speed (as reported by the cruise controller).

use serde::{Deserialize, Serialize};

/// Cost-function regime requested from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Follow the cruise set-speed and the lead vehicle.
    #[default]
    Acc,
    /// Follow the model-predicted trajectory.
    Blended,
}

impl ControlMode {
    pub fn is_blended(self) -> bool {
        matches!(self, ControlMode::Blended)
    }
}

/// Ego kinematic state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarState {
    pub v_ego: f32,
    pub a_ego: f32,
    pub standstill: bool,
    pub steering_angle_deg: f32,
}

/// Cruise/engagement state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlsState {
    /// Cruise set-speed in km/h.
    pub v_cruise_kph: f32,
    pub enabled: bool,
    /// Longitudinal controller reports the `off` state.
    pub long_control_off: bool,
    /// Forced slow deceleration (e.g. driver-attention timeout).
    pub force_decel: bool,
}

/// Closest tracked lead.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeadState {
    pub status: bool,
    /// Relative distance (m).
    pub d_rel: f32,
    /// Relative speed (m/s, lead minus ego).
    pub v_rel: f32,
}

/// Model-predicted longitudinal trajectory on the fixed 33-point model grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReference {
    pub position: Vec<f32>,
    pub velocity: Vec<f32>,
    pub acceleration: Vec<f32>,
    /// Short-horizon translation sample of the temporal pose; may be empty.
    pub temporal_trans: Vec<f32>,
}

/// Driver-selected settings, re-sent with every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    pub accel_profile_ctrl: bool,
    /// 0 = eco, 1 = normal, 2 = sport.
    pub accel_profile: u8,
    pub following_profile_ctrl: bool,
    /// 0, 1 or 2; larger means a longer follow time.
    pub following_profile: u8,
    /// Adaptive ACC/BLENDED switching.
    pub conditional_blended: bool,
    /// Set-speed (km/h) at or below which BLENDED is preferred without a lead.
    pub conditional_speed_kph: f32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            accel_profile_ctrl: false,
            accel_profile: 1,
            following_profile_ctrl: false,
            following_profile: 1,
            conditional_blended: false,
            conditional_speed_kph: 60.0,
        }
    }
}

/// Everything the planner reads in one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleInputs {
    pub car: CarState,
    pub controls: ControlsState,
    pub lead: LeadState,
    pub model: ModelReference,
    pub settings: DriverSettings,
}
