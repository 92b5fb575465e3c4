//! Runtime configuration for the planner stages.
//!
//! These are the structs the engine runs on. They are separate from the
//! TOML-deserialized config in `longplan_config`; see `conversions`.

/// Vehicle geometry and ownership of longitudinal control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleParams {
    pub steer_ratio: f32,
    /// Wheelbase in metres.
    pub wheelbase: f32,
    /// The planner owns longitudinal control. Disengagement is then read from
    /// the longitudinal controller state instead of the enabled flag.
    pub openpilot_longitudinal_control: bool,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            steer_ratio: 15.3,
            wheelbase: 2.7,
            openpilot_longitudinal_control: true,
        }
    }
}

/// Mode arbitration thresholds (in planning cycles unless stated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeCfg {
    /// Raw lead flag must hold this many cycles before it is committed.
    pub lead_debounce_cycles: u32,
    /// Only leads closer than this (m) count.
    pub lead_distance_m: f32,
    /// BLENDED hold after a standstill → moving transition.
    pub stop_and_go_cycles: u32,
    /// Persisted experimental toggle is re-read every N cycles.
    pub param_read_every: u32,
}

impl Default for ModeCfg {
    fn default() -> Self {
        Self {
            lead_debounce_cycles: 50,
            lead_distance_m: 50.0,
            stop_and_go_cycles: 250,
            param_read_every: 50,
        }
    }
}

/// Acceleration limit shaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitCfg {
    /// Slack kept around the current desired acceleration (m/s²).
    pub margin: f32,
    /// Upper bound while a slow deceleration is forced (m/s²).
    pub force_decel: f32,
}

impl Default for LimitCfg {
    fn default() -> Self {
        Self {
            margin: 0.05,
            force_decel: -0.2,
        }
    }
}

/// Velocity filter and warm-start integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorCfg {
    pub time_constant_s: f32,
    pub dt_s: f32,
}

impl Default for IntegratorCfg {
    fn default() -> Self {
        Self {
            time_constant_s: 2.0,
            dt_s: crate::util::DT_MDL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchdogCfg {
    /// FCW fires when the solver crash counter is strictly above this.
    pub crash_count_threshold: u32,
}

impl Default for WatchdogCfg {
    fn default() -> Self {
        Self {
            crash_count_threshold: 2,
        }
    }
}
