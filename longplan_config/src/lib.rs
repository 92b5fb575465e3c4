#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and drive-log parsing for the longitudinal planner.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has defaults, so an empty file is a valid config.
//! - The drive-log CSV loader enforces the exact header row used by `replay`.
use serde::Deserialize;

/// Drive-log CSV schema (one row per planning cycle).
///
/// Expected headers:
/// t,v_ego,a_ego,standstill,steering_deg,v_cruise_kph,enabled,long_off,force_decel,lead_status,lead_d_rel,lead_v_rel
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct DriveLogRow {
    pub t: f32,
    pub v_ego: f32,
    pub a_ego: f32,
    pub standstill: bool,
    pub steering_deg: f32,
    pub v_cruise_kph: f32,
    pub enabled: bool,
    pub long_off: bool,
    pub force_decel: bool,
    pub lead_status: bool,
    pub lead_d_rel: f32,
    pub lead_v_rel: f32,
}

pub const DRIVE_LOG_HEADERS: [&str; 12] = [
    "t",
    "v_ego",
    "a_ego",
    "standstill",
    "steering_deg",
    "v_cruise_kph",
    "enabled",
    "long_off",
    "force_decel",
    "lead_status",
    "lead_d_rel",
    "lead_v_rel",
];

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VehicleCfg {
    pub steer_ratio: f32,
    /// Wheelbase in metres.
    pub wheelbase: f32,
    /// The planner owns longitudinal control (as opposed to the stock cruise).
    pub openpilot_longitudinal_control: bool,
}

impl Default for VehicleCfg {
    fn default() -> Self {
        Self {
            steer_ratio: 15.3,
            wheelbase: 2.7,
            openpilot_longitudinal_control: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModeCfg {
    /// Cycles the raw lead flag must hold before the committed flag follows it.
    pub lead_debounce_cycles: u32,
    /// A lead closer than this (m) counts for mode selection.
    pub lead_distance_m: f32,
    /// Cycles BLENDED is held after pulling away from standstill.
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LimitsCfg {
    /// Slack (m/s²) kept around the current desired acceleration.
    pub margin: f32,
    /// Upper bound enforced while a slow deceleration is forced.
    pub force_decel: f32,
}

impl Default for LimitsCfg {
    fn default() -> Self {
        Self {
            margin: 0.05,
            force_decel: -0.2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegratorCfg {
    /// Low-pass time constant of the velocity filter (s).
    pub time_constant_s: f32,
    /// Loop period (s).
    pub dt_s: f32,
}

impl Default for IntegratorCfg {
    fn default() -> Self {
        Self {
            time_constant_s: 2.0,
            dt_s: 0.05,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchdogCfg {
    /// FCW fires once the solver crash counter exceeds this value.
    pub crash_count_threshold: u32,
}

impl Default for WatchdogCfg {
    fn default() -> Self {
        Self {
            crash_count_threshold: 2,
        }
    }
}

/// Driver settings applied to every cycle of a replay or simulation.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettingsCfg {
    pub accel_profile_ctrl: bool,
    pub accel_profile: u8,
    pub following_profile_ctrl: bool,
    pub following_profile: u8,
    pub conditional_blended: bool,
    pub conditional_speed_kph: f32,
    /// Persisted experimental toggle seen by the param store.
    pub experimental_mode: bool,
}

impl Default for SettingsCfg {
    fn default() -> Self {
        Self {
            accel_profile_ctrl: false,
            accel_profile: 1,
            following_profile_ctrl: false,
            following_profile: 1,
            conditional_blended: false,
            conditional_speed_kph: 60.0,
            experimental_mode: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunnerCfg {
    /// Sleep to the loop period between cycles (real-time pacing).
    pub pace: bool,
    /// Stop after this many cycles (absent = run until the source ends).
    pub max_cycles: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SimLeadCfg {
    /// Initial gap (m).
    pub d_rel_m: f32,
    /// Lead speed (m/s).
    pub v_mps: f32,
    /// Optional braking event: start time (s) and deceleration (m/s², positive).
    #[serde(default)]
    pub brake_at_s: Option<f32>,
    #[serde(default)]
    pub brake_decel: f32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SimSpeedLimitCfg {
    /// Distance travelled (m) after which the limit applies.
    pub at_m: f32,
    pub limit_kph: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    pub duration_s: f32,
    pub v_init_mps: f32,
    pub v_cruise_kph: f32,
    /// First-order actuator lag of the simulated vehicle (s).
    pub actuator_lag_s: f32,
    pub lead: Option<SimLeadCfg>,
    pub speed_limit: Option<SimSpeedLimitCfg>,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            duration_s: 30.0,
            v_init_mps: 0.0,
            v_cruise_kph: 90.0,
            actuator_lag_s: 0.3,
            lead: None,
            speed_limit: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub vehicle: VehicleCfg,
    pub mode: ModeCfg,
    pub limits: LimitsCfg,
    pub integrator: IntegratorCfg,
    pub watchdog: WatchdogCfg,
    pub settings: SettingsCfg,
    pub runner: RunnerCfg,
    pub sim: SimCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_drive_log_csv(path: &std::path::Path) -> eyre::Result<Vec<DriveLogRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open drive log CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != DRIVE_LOG_HEADERS {
        eyre::bail!(
            "drive log CSV must have headers '{}', got: {}",
            DRIVE_LOG_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows: Vec<DriveLogRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<DriveLogRow>().enumerate() {
        match rec {
            Ok(row) => {
                if let Some(prev) = rows.last()
                    && row.t <= prev.t
                {
                    eyre::bail!(
                        "drive log timestamps must be strictly increasing (row {})",
                        idx + 2
                    );
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    if rows.is_empty() {
        eyre::bail!("drive log {:?} has no rows", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Vehicle
        if !(self.vehicle.steer_ratio.is_finite() && self.vehicle.steer_ratio > 0.0) {
            eyre::bail!("vehicle.steer_ratio must be > 0");
        }
        if !(self.vehicle.wheelbase.is_finite() && self.vehicle.wheelbase > 0.0) {
            eyre::bail!("vehicle.wheelbase must be > 0");
        }

        // Mode
        if self.mode.lead_debounce_cycles == 0 {
            eyre::bail!("mode.lead_debounce_cycles must be >= 1");
        }
        if !(self.mode.lead_distance_m.is_finite() && self.mode.lead_distance_m > 0.0) {
            eyre::bail!("mode.lead_distance_m must be > 0");
        }
        if self.mode.stop_and_go_cycles == 0 {
            eyre::bail!("mode.stop_and_go_cycles must be >= 1");
        }
        if self.mode.param_read_every == 0 {
            eyre::bail!("mode.param_read_every must be >= 1");
        }

        // Limits
        if !(0.0..=0.5).contains(&self.limits.margin) {
            eyre::bail!("limits.margin must be in [0.0, 0.5]");
        }
        if !(self.limits.force_decel.is_finite() && self.limits.force_decel <= 0.0) {
            eyre::bail!("limits.force_decel must be <= 0.0");
        }

        // Integrator
        if !(self.integrator.time_constant_s.is_finite() && self.integrator.time_constant_s > 0.0)
        {
            eyre::bail!("integrator.time_constant_s must be > 0");
        }
        if !(self.integrator.dt_s > 0.0 && self.integrator.dt_s <= 1.0) {
            eyre::bail!("integrator.dt_s must be in (0.0, 1.0]");
        }

        // Settings
        if self.settings.accel_profile > 2 {
            eyre::bail!("settings.accel_profile must be 0 (eco), 1 (normal) or 2 (sport)");
        }
        if self.settings.following_profile > 2 {
            eyre::bail!("settings.following_profile must be 0, 1 or 2");
        }
        if self.settings.conditional_speed_kph.is_sign_negative() {
            eyre::bail!("settings.conditional_speed_kph must be >= 0");
        }

        // Sim
        if !(self.sim.duration_s.is_finite() && self.sim.duration_s > 0.0) {
            eyre::bail!("sim.duration_s must be > 0");
        }
        if self.sim.v_init_mps.is_sign_negative() {
            eyre::bail!("sim.v_init_mps must be >= 0");
        }
        if self.sim.actuator_lag_s.is_sign_negative() {
            eyre::bail!("sim.actuator_lag_s must be >= 0");
        }
        if let Some(lead) = self.sim.lead {
            if lead.d_rel_m <= 0.0 {
                eyre::bail!("sim.lead.d_rel_m must be > 0");
            }
            if lead.brake_decel.is_sign_negative() {
                eyre::bail!("sim.lead.brake_decel must be >= 0 (magnitude)");
            }
        }
        if let Some(limit) = self.sim.speed_limit
            && limit.limit_kph <= 0.0
        {
            eyre::bail!("sim.speed_limit.limit_kph must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
