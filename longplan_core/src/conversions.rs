//! `From` implementations bridging `longplan_config` types to runtime types.

use longplan_traits::DriverSettings;

use crate::config::{IntegratorCfg, LimitCfg, ModeCfg, VehicleParams, WatchdogCfg};

// ── VehicleParams ────────────────────────────────────────────────────────────

impl From<&longplan_config::VehicleCfg> for VehicleParams {
    fn from(c: &longplan_config::VehicleCfg) -> Self {
        Self {
            steer_ratio: c.steer_ratio,
            wheelbase: c.wheelbase,
            openpilot_longitudinal_control: c.openpilot_longitudinal_control,
        }
    }
}

// ── ModeCfg ──────────────────────────────────────────────────────────────────

impl From<&longplan_config::ModeCfg> for ModeCfg {
    fn from(c: &longplan_config::ModeCfg) -> Self {
        Self {
            lead_debounce_cycles: c.lead_debounce_cycles,
            lead_distance_m: c.lead_distance_m,
            stop_and_go_cycles: c.stop_and_go_cycles,
            param_read_every: c.param_read_every,
        }
    }
}

// ── LimitCfg ─────────────────────────────────────────────────────────────────

impl From<&longplan_config::LimitsCfg> for LimitCfg {
    fn from(c: &longplan_config::LimitsCfg) -> Self {
        Self {
            margin: c.margin,
            force_decel: c.force_decel,
        }
    }
}

// ── IntegratorCfg ────────────────────────────────────────────────────────────

impl From<&longplan_config::IntegratorCfg> for IntegratorCfg {
    fn from(c: &longplan_config::IntegratorCfg) -> Self {
        Self {
            time_constant_s: c.time_constant_s,
            dt_s: c.dt_s,
        }
    }
}

// ── WatchdogCfg ──────────────────────────────────────────────────────────────

impl From<&longplan_config::WatchdogCfg> for WatchdogCfg {
    fn from(c: &longplan_config::WatchdogCfg) -> Self {
        Self {
            crash_count_threshold: c.crash_count_threshold,
        }
    }
}

// ── DriverSettings ───────────────────────────────────────────────────────────

/// The persisted experimental toggle is not a per-cycle setting and is
/// dropped here; it seeds the param store instead.
pub fn driver_settings(c: &longplan_config::SettingsCfg) -> DriverSettings {
    DriverSettings {
        accel_profile_ctrl: c.accel_profile_ctrl,
        accel_profile: c.accel_profile,
        following_profile_ctrl: c.following_profile_ctrl,
        following_profile: c.following_profile,
        conditional_blended: c.conditional_blended,
        conditional_speed_kph: c.conditional_speed_kph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree_across_layers() {
        let file = longplan_config::Config::default();
        assert_eq!(VehicleParams::from(&file.vehicle), VehicleParams::default());
        assert_eq!(ModeCfg::from(&file.mode), ModeCfg::default());
        assert_eq!(LimitCfg::from(&file.limits), LimitCfg::default());
        assert_eq!(IntegratorCfg::from(&file.integrator), IntegratorCfg::default());
        assert_eq!(WatchdogCfg::from(&file.watchdog), WatchdogCfg::default());
        assert_eq!(driver_settings(&file.settings), DriverSettings::default());
    }
}
