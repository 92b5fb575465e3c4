use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    #[error("solver error: {0}")]
    Solver(String),
    #[error("solver returned {got} samples for `{field}`, expected {expected}")]
    SolverOutput {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("missing solver")]
    MissingSolver,
    #[error("missing vehicle parameters")]
    MissingVehicle,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
