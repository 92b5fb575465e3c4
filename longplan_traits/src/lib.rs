//! Collaborator seams for the longitudinal planner.
//!
//! The planner core never talks to a concrete optimizer, advisory controller or
//! parameter store; it goes through the traits defined here. Errors crossing
//! these boundaries are boxed so implementations stay free to pick their own
//! error types.
pub mod advisor;
pub mod clock;
pub mod solver;
pub mod types;

pub use advisor::{AdvisoryContext, AdvisoryDetail, AdvisoryOutput, AdvisoryPhase, SpeedAdvisor};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use solver::{LongitudinalSolver, SolverRequest, SolverSolution, SolverSource};
pub use types::{
    CarState, ControlMode, ControlsState, CycleInputs, DriverSettings, LeadState, ModelReference,
};

/// Boxed error used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Key of the persisted "experimental mode" toggle.
pub const EXPERIMENTAL_MODE_KEY: &str = "ExperimentalMode";

/// Persisted configuration store (read-only from the planner's point of view).
pub trait ParamStore {
    /// Read a boolean parameter. `Ok(None)` means the key is not set.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, BoxError>;
}

impl<T: ParamStore + ?Sized> ParamStore for Box<T> {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, BoxError> {
        (**self).get_bool(key)
    }
}
