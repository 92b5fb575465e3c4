//! Simulated collaborators for the longitudinal planner: a kinematic solver,
//! a lagged vehicle with a scripted lead, distance-triggered advisors, an
//! in-memory param store and drive-log playback.
pub mod advisor;
pub mod error;
pub mod params;
pub mod replay;
pub mod solver;
pub mod vehicle;

pub use advisor::{ScriptKind, ScriptedAdvisor};
pub use error::SimError;
pub use params::MemoryParams;
pub use replay::{DriveLogReplay, row_to_inputs};
pub use solver::{KinematicCfg, KinematicSolver};
pub use vehicle::{Scenario, SimLead, SimVehicle, extrapolate_model};
