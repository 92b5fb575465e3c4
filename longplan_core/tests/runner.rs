mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::*;
use longplan_core::{CycleSource, LongitudinalPlan, OpenLoop, RunParams, run};
use longplan_traits::{ControlMode, CycleInputs, DriverSettings, ManualClock};

fn discard(_: &CycleInputs, _: &LongitudinalPlan) -> longplan_core::Result<()> {
    Ok(())
}

#[test]
fn runs_until_source_is_exhausted() {
    let mut p = planner(10.0);
    let mut src = OpenLoop(std::iter::repeat_n(cruising(10.0), 25));
    let clock = ManualClock::new();
    let s = run(&mut p, &mut src, discard, &RunParams::default(), &clock, None).unwrap();
    assert_eq!(s.cycles, 25);
    assert_eq!(s.fcw_cycles, 0);
    assert_eq!(s.missed_deadlines, 0);
    assert_eq!(s.final_mode, ControlMode::Acc);
    assert!(!s.interrupted);
}

#[test]
fn max_cycles_stops_early() {
    let mut p = planner(10.0);
    let mut src = OpenLoop(std::iter::repeat(cruising(10.0)));
    let params = RunParams {
        max_cycles: Some(7),
        ..RunParams::default()
    };
    let s = run(&mut p, &mut src, discard, &params, &ManualClock::new(), None).unwrap();
    assert_eq!(s.cycles, 7);
}

#[test]
fn shutdown_flag_interrupts() {
    let mut p = planner(10.0);
    let mut src = OpenLoop(std::iter::repeat(cruising(10.0)));
    let stop = AtomicBool::new(false);
    let mut seen = 0;
    let s = run(
        &mut p,
        &mut src,
        |_, _| {
            seen += 1;
            if seen == 3 {
                stop.store(true, Ordering::Relaxed);
            }
            Ok(())
        },
        &RunParams::default(),
        &ManualClock::new(),
        Some(&stop),
    )
    .unwrap();
    assert_eq!(s.cycles, 3);
    assert!(s.interrupted);
}

#[test]
fn paced_run_advances_virtual_time_by_period() {
    let mut p = planner(10.0);
    let mut src = OpenLoop(std::iter::repeat_n(cruising(10.0), 20));
    let clock = ManualClock::new();
    let params = RunParams {
        pace: true,
        ..RunParams::default()
    };
    run(&mut p, &mut src, discard, &params, &clock, None).unwrap();
    assert_eq!(clock.elapsed(), Duration::from_millis(1000));
}

#[test]
fn counts_mode_switches_and_fcw() {
    let mut p = planner_with(
        EchoSolver {
            crash_cnt: 4,
            ..EchoSolver::default()
        },
        Default::default(),
    );
    let settings = DriverSettings {
        conditional_blended: true,
        ..DriverSettings::default()
    };
    let mut stopped = cruising(0.0);
    stopped.settings = settings;
    let mut moving = cruising(10.0);
    moving.settings = settings;
    // ACC → BLENDED at standstill, back to ACC after the stop-and-go window
    let inputs: Vec<CycleInputs> = std::iter::once(stopped)
        .chain(std::iter::repeat_n(moving, 300))
        .collect();
    let mut src = OpenLoop(inputs.into_iter());
    let s = run(&mut p, &mut src, discard, &RunParams::default(), &ManualClock::new(), None).unwrap();
    assert_eq!(s.cycles, 301);
    assert_eq!(s.mode_switches, 2);
    assert_eq!(s.resets, 2);
    assert_eq!(s.fcw_cycles, 300);
    assert_eq!(s.final_mode, ControlMode::Acc);
}

#[test]
fn switch_on_first_cycle_is_counted() {
    let mut p = planner(0.0);
    let mut stopped = cruising(0.0);
    stopped.settings = DriverSettings {
        conditional_blended: true,
        ..DriverSettings::default()
    };
    let mut src = OpenLoop(std::iter::once(stopped));
    let s = run(&mut p, &mut src, discard, &RunParams::default(), &ManualClock::new(), None).unwrap();
    assert_eq!(s.cycles, 1);
    assert_eq!(s.final_mode, ControlMode::Blended);
    assert_eq!(s.mode_switches, 1);
    assert_eq!(s.resets, 1);
}

#[test]
fn sink_error_aborts_run() {
    let mut p = planner(10.0);
    let mut src = OpenLoop(std::iter::repeat(cruising(10.0)));
    let err = run(
        &mut p,
        &mut src,
        |_, _| Err(eyre::eyre!("sink closed")),
        &RunParams::default(),
        &ManualClock::new(),
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("sink closed"));
}

#[test]
fn planner_error_carries_cycle_index() {
    let mut p = planner(10.0);
    p.solver_mut().fail = true;
    let mut src = OpenLoop(std::iter::repeat(cruising(10.0)));
    let err = run(&mut p, &mut src, discard, &RunParams::default(), &ManualClock::new(), None)
        .unwrap_err();
    assert!(err.to_string().contains("planning cycle 0"));
}

/// Feeds back the first planned speed as the next measured speed.
struct Feedback {
    v: f32,
    left: u32,
}

impl CycleSource for Feedback {
    fn next_cycle(&mut self, last: Option<&LongitudinalPlan>) -> Option<CycleInputs> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        if let Some(plan) = last {
            self.v = plan.speeds[1];
        }
        Some(cruising(self.v))
    }
}

#[test]
fn closed_loop_source_sees_previous_plan() {
    let mut p = planner_with(
        EchoSolver {
            accel: Some(1.0),
            ..EchoSolver::default()
        },
        longplan_core::PlannerOptions {
            init_v: 5.0,
            ..Default::default()
        },
    );
    let mut src = Feedback { v: 5.0, left: 20 };
    run(&mut p, &mut src, discard, &RunParams::default(), &ManualClock::new(), None).unwrap();
    assert!(src.v > 5.0);
}
