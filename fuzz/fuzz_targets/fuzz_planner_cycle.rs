#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

use longplan_core::{PlannerOptions, VehicleParams, build_planner};
use longplan_sim::{KinematicSolver, extrapolate_model};
use longplan_traits::{CarState, ControlsState, CycleInputs, DriverSettings, LeadState};

#[derive(Debug, Arbitrary)]
struct Cycle {
    v_ego: f32,
    a_ego: f32,
    standstill: bool,
    steering_deg: f32,
    v_cruise_kph: f32,
    enabled: bool,
    long_off: bool,
    force_decel: bool,
    lead: Option<(f32, f32)>,
    accel_profile: u8,
    following_profile: u8,
    conditional: bool,
}

fuzz_target!(|cycles: Vec<Cycle>| {
    let Ok(mut planner) = build_planner(
        KinematicSolver::default(),
        VehicleParams::default(),
        PlannerOptions::default(),
    ) else {
        return;
    };
    for c in cycles.iter().take(256) {
        let inputs = CycleInputs {
            car: CarState {
                v_ego: c.v_ego,
                a_ego: c.a_ego,
                standstill: c.standstill,
                steering_angle_deg: c.steering_deg,
            },
            controls: ControlsState {
                v_cruise_kph: c.v_cruise_kph,
                enabled: c.enabled,
                long_control_off: c.long_off,
                force_decel: c.force_decel,
            },
            lead: c.lead.map_or_else(LeadState::default, |(d_rel, v_rel)| LeadState {
                status: true,
                d_rel,
                v_rel,
            }),
            model: extrapolate_model(c.v_ego, c.a_ego, 40.0),
            settings: DriverSettings {
                accel_profile_ctrl: true,
                accel_profile: c.accel_profile,
                following_profile_ctrl: true,
                following_profile: c.following_profile,
                conditional_blended: c.conditional,
                ..DriverSettings::default()
            },
        };
        // Errors are a valid outcome for garbage input; a published plan
        // must still hand the solver ordered bounds.
        if let Ok(plan) = planner.update(&inputs) {
            assert!(plan.accel_limits.min <= plan.accel_limits.max);
        }
    }
});
