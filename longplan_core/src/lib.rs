#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Longitudinal planning engine (solver-agnostic).
//!
//! This crate turns one cycle of vehicle, cruise, lead and model observations
//! into a velocity/acceleration/jerk plan. The trajectory optimizer, the
//! advisory speed controllers and the persisted param store are reached
//! through the traits in `longplan_traits`.
//!
//! ## Architecture
//!
//! - **Mode**: debounced ACC/BLENDED state machine (`mode` module)
//! - **Limits**: profile tables, turn derating, force-decel, feasibility (`limits`)
//! - **Arbitration**: minimum-velocity selection over advisory targets (`arbitration`)
//! - **Integration**: velocity filter, model bias, resampling, warm start (`integrator`)
//! - **Watchdog**: level-triggered forward-collision warning (`watchdog`)
//! - **Planner**: the per-cycle pipeline (`planner`), built via `builder`
//! - **Runner**: fixed-period loop with latency stats (`runner`)
//!
//! ## Time grids
//!
//! The model reference arrives on a 33-point grid, the solver works on a
//! 13-point grid and the plan is published on the first 17 model grid points.
//! See `grids`.

pub mod arbitration;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod following;
pub mod grids;
pub mod integrator;
pub mod limits;
pub mod mocks;
pub mod mode;
pub mod plan;
pub mod planner;
pub mod runner;
pub mod util;
pub mod watchdog;

pub use arbitration::{CandidateSpeed, CruiseSource, SpeedArbiter};
pub use builder::{Missing, Planner, PlannerBuilder, PlannerOptions, Set, build_planner};
pub use config::{IntegratorCfg, LimitCfg, ModeCfg, VehicleParams, WatchdogCfg};
pub use error::{BuildError, PlannerError, Result};
pub use limits::{AccelLimits, AccelProfile, LimitComputer};
pub use mode::{ModeArbiter, ModeInputs, ModeState, ModeTransition};
pub use plan::{LongitudinalPlan, PlanSource};
pub use planner::LongitudinalPlanner;
pub use runner::{CycleSource, OpenLoop, RunParams, RunSummary, run};
pub use watchdog::CollisionWatchdog;
