//! Drives a planner at a fixed period.
//!
//! The loop is single-threaded: pull one cycle of inputs, plan, hand the plan
//! to a sink, optionally sleep until the next deadline. Late cycles are
//! counted, never compensated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use serde::Serialize;

use longplan_traits::{Clock, ControlMode, CycleInputs, LongitudinalSolver};

use crate::error::Result;
use crate::plan::LongitudinalPlan;
use crate::planner::LongitudinalPlanner;

/// Where per-cycle inputs come from.
///
/// Closed-loop sources see the previous plan; open-loop ones ignore it.
pub trait CycleSource {
    /// `None` ends the run.
    fn next_cycle(&mut self, last_plan: Option<&LongitudinalPlan>) -> Option<CycleInputs>;
}

/// Adapts any iterator of inputs into an open-loop source.
#[derive(Debug)]
pub struct OpenLoop<I>(pub I);

impl<I: Iterator<Item = CycleInputs>> CycleSource for OpenLoop<I> {
    fn next_cycle(&mut self, _last_plan: Option<&LongitudinalPlan>) -> Option<CycleInputs> {
        self.0.next()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub period: Duration,
    /// Sleep until each deadline instead of running flat out.
    pub pace: bool,
    pub max_cycles: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            period: Duration::from_micros(crate::util::period_us(crate::util::DT_MDL)),
            pace: false,
            max_cycles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub fcw_cycles: u64,
    pub mode_switches: u64,
    pub resets: u64,
    /// Cycles whose planning latency exceeded the period.
    pub missed_deadlines: u64,
    pub max_latency_us: u64,
    pub mean_latency_us: u64,
    pub final_mode: ControlMode,
    /// Stopped early by the shutdown flag.
    pub interrupted: bool,
}

/// Run until the source is exhausted, `max_cycles` is reached or `shutdown`
/// is raised. The first planner or sink error aborts the run.
pub fn run<S, C, F>(
    planner: &mut LongitudinalPlanner<S>,
    source: &mut C,
    mut sink: F,
    params: &RunParams,
    clock: &dyn Clock,
    shutdown: Option<&AtomicBool>,
) -> Result<RunSummary>
where
    S: LongitudinalSolver,
    C: CycleSource + ?Sized,
    F: FnMut(&CycleInputs, &LongitudinalPlan) -> Result<()>,
{
    let period_us = u64::try_from(params.period.as_micros()).unwrap_or(u64::MAX).max(1);
    let epoch = clock.now();
    let mut summary = RunSummary {
        final_mode: planner.mode(),
        ..RunSummary::default()
    };
    let mut total_latency_us: u64 = 0;
    let mut last_plan: Option<LongitudinalPlan> = None;

    tracing::info!(period_us, pace = params.pace, max_cycles = ?params.max_cycles, "planner run start");

    loop {
        if shutdown.is_some_and(|f| f.load(Ordering::Relaxed)) {
            summary.interrupted = true;
            tracing::info!(cycles = summary.cycles, "shutdown requested");
            break;
        }
        if params.max_cycles.is_some_and(|max| summary.cycles >= max) {
            break;
        }
        let Some(inputs) = source.next_cycle(last_plan.as_ref()) else {
            break;
        };

        let started = clock.us_since(epoch);
        let plan = planner
            .update(&inputs)
            .wrap_err_with(|| format!("planning cycle {}", summary.cycles))?;
        let latency_us = clock.us_since(epoch).saturating_sub(started);

        total_latency_us = total_latency_us.saturating_add(latency_us);
        summary.max_latency_us = summary.max_latency_us.max(latency_us);
        if latency_us > period_us {
            summary.missed_deadlines += 1;
            tracing::warn!(latency_us, period_us, cycle = summary.cycles, "planning cycle overran its period");
        }
        if plan.fcw {
            summary.fcw_cycles += 1;
        }
        if plan.reset {
            summary.resets += 1;
        }
        // final_mode holds the previous cycle's mode, seeded from the planner
        if plan.mode != summary.final_mode {
            summary.mode_switches += 1;
        }

        sink(&inputs, &plan)?;
        summary.cycles += 1;
        summary.final_mode = plan.mode;
        last_plan = Some(plan);

        if params.pace {
            let deadline = epoch + Duration::from_micros(period_us.saturating_mul(summary.cycles));
            clock.sleep_until(deadline);
        }
    }

    if summary.cycles > 0 {
        summary.mean_latency_us = total_latency_us / summary.cycles;
    }
    tracing::info!(
        cycles = summary.cycles,
        fcw_cycles = summary.fcw_cycles,
        mode_switches = summary.mode_switches,
        missed = summary.missed_deadlines,
        "planner run end"
    );
    Ok(summary)
}
