//! Command execution: config mapping, planner assembly, and run reporting.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use longplan_config::Config;
use longplan_core::conversions::driver_settings;
use longplan_core::util::{KPH_TO_MS, period_us};
use longplan_core::{
    CycleSource, LongitudinalPlan, LongitudinalPlanner, PlannerOptions, Result as CoreResult,
    RunParams, RunSummary, VehicleParams, build_planner, run,
};
use longplan_sim::{DriveLogReplay, KinematicSolver, MemoryParams, Scenario, ScriptedAdvisor};
use longplan_traits::{
    Clock, CycleInputs, EXPERIMENTAL_MODE_KEY, LongitudinalSolver, ManualClock, MonotonicClock,
};
use serde_json::json;

/// Runner overrides taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    pub max_cycles: Option<u64>,
    pub pace: bool,
}

/// Planner options from the typed config; advisors and the param store are
/// left for the caller.
pub fn planner_options(cfg: &Config) -> PlannerOptions {
    PlannerOptions {
        mode: (&cfg.mode).into(),
        limits: (&cfg.limits).into(),
        integrator: (&cfg.integrator).into(),
        watchdog: (&cfg.watchdog).into(),
        params: Some(Box::new(
            MemoryParams::new().with(EXPERIMENTAL_MODE_KEY, cfg.settings.experimental_mode),
        )),
        ..PlannerOptions::default()
    }
}

pub fn run_params(cfg: &Config, overrides: RunOverrides) -> RunParams {
    RunParams {
        period: Duration::from_micros(period_us(cfg.integrator.dt_s)),
        pace: overrides.pace || cfg.runner.pace,
        max_cycles: overrides.max_cycles.or(cfg.runner.max_cycles),
    }
}

/// Replay a drive log open-loop and report.
pub fn run_replay(
    cfg: &Config,
    log: &Path,
    overrides: RunOverrides,
    json_out: bool,
    shutdown: &AtomicBool,
) -> eyre::Result<RunSummary> {
    let rows = longplan_config::load_drive_log_csv(log).wrap_err("invalid drive log")?;
    let (v0, a0) = rows.first().map_or((0.0, 0.0), |r| (r.v_ego, r.a_ego));
    tracing::info!(rows = rows.len(), path = %log.display(), "drive log loaded");

    let mut source = DriveLogReplay::new(rows, driver_settings(&cfg.settings));
    let mut planner = build_planner(
        KinematicSolver::default(),
        VehicleParams::from(&cfg.vehicle),
        PlannerOptions {
            init_v: v0,
            init_a: a0,
            ..planner_options(cfg)
        },
    )?;

    let params = run_params(cfg, overrides);
    let summary = drive(
        &mut planner,
        &mut source,
        &params,
        &MonotonicClock::new(),
        json_out,
        Some(shutdown),
    )?;
    report(&summary, json_out, None);
    Ok(summary)
}

/// Closed-loop simulation from the `[sim]` section.
pub fn run_sim(
    cfg: &Config,
    overrides: RunOverrides,
    json_out: bool,
    shutdown: &AtomicBool,
) -> eyre::Result<RunSummary> {
    let dt = cfg.integrator.dt_s;
    let mut scenario = Scenario::from_config(&cfg.sim, driver_settings(&cfg.settings), dt)
        .map_err(eyre::Report::new)
        .wrap_err("building sim scenario")?;

    let mut opts = PlannerOptions {
        init_v: cfg.sim.v_init_mps,
        ..planner_options(cfg)
    };
    if let Some(sl) = cfg.sim.speed_limit {
        opts.speed_limit = Some(Box::new(ScriptedAdvisor::speed_limit(
            sl.at_m,
            sl.limit_kph * KPH_TO_MS,
            dt,
        )));
    }
    let mut planner = build_planner(
        KinematicSolver::default(),
        VehicleParams::from(&cfg.vehicle),
        opts,
    )?;

    let params = run_params(cfg, overrides);
    let summary = drive(
        &mut planner,
        &mut scenario,
        &params,
        &MonotonicClock::new(),
        json_out,
        Some(shutdown),
    )?;

    let min_gap = scenario.lead().map(|_| scenario.min_gap());
    tracing::info!(
        final_v = scenario.vehicle().v,
        min_gap = ?min_gap,
        crashes = planner.solver_mut().crash_cnt(),
        "sim complete"
    );
    let sim = json!({
        "final_v_mps": scenario.vehicle().v,
        "distance_m": scenario.vehicle().x,
        "min_gap_m": min_gap,
    });
    report(&summary, json_out, Some(sim));
    Ok(summary)
}

/// Build a planner from the config and drive one simulated second at the
/// configured set speed; every published plan must be finite.
pub fn self_check(cfg: &Config, json_out: bool) -> eyre::Result<()> {
    let dt = cfg.integrator.dt_s;
    let mut scenario = Scenario::new(
        longplan_sim::SimVehicle::new(cfg.sim.v_init_mps, cfg.sim.actuator_lag_s),
        None,
        driver_settings(&cfg.settings),
        cfg.sim.v_cruise_kph,
        dt,
        1.0,
    )
    .map_err(eyre::Report::new)
    .wrap_err("building self-check scenario")?;
    let mut planner = build_planner(
        KinematicSolver::default(),
        VehicleParams::from(&cfg.vehicle),
        PlannerOptions {
            init_v: cfg.sim.v_init_mps,
            ..planner_options(cfg)
        },
    )?;

    let mut non_finite = 0_u64;
    let summary = run(
        &mut planner,
        &mut scenario,
        |_: &CycleInputs, plan: &LongitudinalPlan| {
            let finite = plan
                .speeds
                .iter()
                .chain(plan.accels.iter())
                .chain(plan.jerks.iter())
                .all(|x| x.is_finite());
            if !finite {
                non_finite += 1;
            }
            Ok(())
        },
        &run_params(cfg, RunOverrides::default()),
        &ManualClock::new(),
        None,
    )?;
    if summary.cycles == 0 || non_finite > 0 {
        eyre::bail!(
            "self-check failed: {} cycles, {non_finite} with non-finite trajectories",
            summary.cycles
        );
    }

    if json_out {
        println!(
            "{}",
            json!({ "self_check": "ok", "cycles": summary.cycles, "mode": summary.final_mode })
        );
    } else {
        println!("Self-check OK ({} cycles, mode {:?})", summary.cycles, summary.final_mode);
    }
    Ok(())
}

fn drive<S, C>(
    planner: &mut LongitudinalPlanner<S>,
    source: &mut C,
    params: &RunParams,
    clock: &dyn Clock,
    json_out: bool,
    shutdown: Option<&AtomicBool>,
) -> CoreResult<RunSummary>
where
    S: LongitudinalSolver,
    C: CycleSource + ?Sized,
{
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = run(
        planner,
        source,
        |_: &CycleInputs, plan: &LongitudinalPlan| {
            if json_out {
                serde_json::to_writer(&mut out, plan).wrap_err("serialize plan")?;
                writeln!(out).wrap_err("write plan")?;
            }
            Ok(())
        },
        params,
        clock,
        shutdown,
    )?;
    out.flush().wrap_err("flush stdout")?;
    Ok(summary)
}

fn report(summary: &RunSummary, json_out: bool, sim: Option<serde_json::Value>) {
    if json_out {
        let mut obj = json!({ "summary": summary });
        if let (Some(sim), Some(map)) = (sim, obj.as_object_mut()) {
            map.insert("sim".to_string(), sim);
        }
        println!("{obj}");
        return;
    }

    println!("Run complete: {} cycles", summary.cycles);
    println!("Final mode: {:?}", summary.final_mode);
    println!(
        "FCW cycles: {}  mode switches: {}  resets: {}",
        summary.fcw_cycles, summary.mode_switches, summary.resets
    );
    println!(
        "Latency mean/max (us): {} / {}  missed deadlines: {}",
        summary.mean_latency_us, summary.max_latency_us, summary.missed_deadlines
    );
    if let Some(sim) = sim {
        println!("Sim: {sim}");
    }
    if summary.interrupted {
        println!("Interrupted before the source was exhausted");
    }
}
