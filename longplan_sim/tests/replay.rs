use std::io::Write;

use longplan_core::{OpenLoop, PlannerOptions, RunParams, VehicleParams, build_planner, run};
use longplan_sim::{DriveLogReplay, KinematicSolver, row_to_inputs};
use longplan_traits::{DriverSettings, ManualClock};

const LOG: &str = "\
t,v_ego,a_ego,standstill,steering_deg,v_cruise_kph,enabled,long_off,force_decel,lead_status,lead_d_rel,lead_v_rel
0.00,0.0,0.0,true,0.0,40.0,true,false,false,true,8.0,0.0
0.05,0.0,0.0,true,0.0,40.0,true,false,false,true,8.0,0.0
0.10,0.3,0.6,false,0.0,40.0,true,false,false,true,8.2,0.2
0.15,0.6,0.6,false,0.0,40.0,true,false,false,true,8.4,0.2
0.20,0.9,0.6,false,2.0,40.0,true,false,true,true,8.6,0.2
";

fn rows() -> Vec<longplan_config::DriveLogRow> {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(LOG.as_bytes()).unwrap();
    longplan_config::load_drive_log_csv(f.path()).unwrap()
}

#[test]
fn row_maps_every_field() {
    let rows = rows();
    let i = row_to_inputs(&rows[4], DriverSettings::default());
    assert_eq!(i.car.v_ego, 0.9);
    assert_eq!(i.car.steering_angle_deg, 2.0);
    assert!(i.controls.force_decel);
    assert!(i.lead.status);
    assert_eq!(i.lead.d_rel, 8.6);
    assert_eq!(i.model.velocity.len(), 33);
}

#[test]
fn replays_every_row_once() {
    let mut p = build_planner(
        KinematicSolver::default(),
        VehicleParams::default(),
        PlannerOptions::default(),
    )
    .unwrap();
    let mut src = DriveLogReplay::new(rows(), DriverSettings::default());
    assert_eq!(src.remaining(), 5);
    let mut forced = Vec::new();
    let s = run(
        &mut p,
        &mut src,
        |_, plan| {
            forced.push(plan.accel_limits.max);
            Ok(())
        },
        &RunParams::default(),
        &ManualClock::new(),
        None,
    )
    .unwrap();
    assert_eq!(s.cycles, 5);
    // force-decel row caps the upper bound near the desired acceleration
    assert!(forced[4] < forced[3]);
}

#[test]
fn open_loop_adapter_accepts_converted_rows() {
    let settings = DriverSettings {
        conditional_blended: true,
        ..DriverSettings::default()
    };
    let inputs: Vec<_> = rows().iter().map(|r| row_to_inputs(r, settings)).collect();
    let mut p = build_planner(
        KinematicSolver::default(),
        VehicleParams::default(),
        PlannerOptions::default(),
    )
    .unwrap();
    let mut modes = Vec::new();
    run(
        &mut p,
        &mut OpenLoop(inputs.into_iter()),
        |_, plan| {
            modes.push(plan.mode);
            Ok(())
        },
        &RunParams::default(),
        &ManualClock::new(),
        None,
    )
    .unwrap();
    // standstill, then the stop-and-go window
    assert!(modes.iter().all(|m| m.is_blended()));
}
