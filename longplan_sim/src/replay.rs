//! Open-loop playback of a recorded drive log.

use longplan_config::DriveLogRow;
use longplan_core::util::{KPH_TO_MS, V_CRUISE_MAX_KPH};
use longplan_core::{CycleSource, LongitudinalPlan};
use longplan_traits::{CarState, ControlsState, CycleInputs, DriverSettings, LeadState};

use crate::vehicle::extrapolate_model;

/// Convert one logged row. The model reference is synthesized by
/// extrapolating the logged acceleration.
pub fn row_to_inputs(row: &DriveLogRow, settings: DriverSettings) -> CycleInputs {
    let v_max = row.v_cruise_kph.min(V_CRUISE_MAX_KPH) * KPH_TO_MS;
    CycleInputs {
        car: CarState {
            v_ego: row.v_ego,
            a_ego: row.a_ego,
            standstill: row.standstill,
            steering_angle_deg: row.steering_deg,
        },
        controls: ControlsState {
            v_cruise_kph: row.v_cruise_kph,
            enabled: row.enabled,
            long_control_off: row.long_off,
            force_decel: row.force_decel,
        },
        lead: LeadState {
            status: row.lead_status,
            d_rel: row.lead_d_rel,
            v_rel: row.lead_v_rel,
        },
        model: extrapolate_model(row.v_ego, row.a_ego, v_max),
        settings,
    }
}

#[derive(Debug)]
pub struct DriveLogReplay {
    rows: std::vec::IntoIter<DriveLogRow>,
    settings: DriverSettings,
}

impl DriveLogReplay {
    pub fn new(rows: Vec<DriveLogRow>, settings: DriverSettings) -> Self {
        Self {
            rows: rows.into_iter(),
            settings,
        }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl CycleSource for DriveLogReplay {
    fn next_cycle(&mut self, _last_plan: Option<&LongitudinalPlan>) -> Option<CycleInputs> {
        self.rows
            .next()
            .map(|row| row_to_inputs(&row, self.settings))
    }
}
