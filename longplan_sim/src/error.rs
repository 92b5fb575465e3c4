use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("infeasible bounds: a_min {a_min} > a_max {a_max}")]
    Infeasible { a_min: f32, a_max: f32 },
    #[error("non-finite solver input: {0}")]
    NonFinite(&'static str),
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("param store unavailable")]
    ParamsUnavailable,
}

pub type Result<T> = std::result::Result<T, SimError>;
