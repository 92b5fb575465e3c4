//! Stand-in collaborators for planners built without advisors or a param store.

use longplan_traits::{AdvisoryContext, AdvisoryOutput, BoxError, ParamStore, SpeedAdvisor};

/// An advisor that never constrains the speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct InactiveAdvisor;

impl SpeedAdvisor for InactiveAdvisor {
    fn update(&mut self, ctx: &AdvisoryContext<'_>) -> AdvisoryOutput {
        AdvisoryOutput {
            a_target: f32::INFINITY,
            v_target: ctx.v_cruise,
            ..AdvisoryOutput::default()
        }
    }
}

/// A param store with no keys set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

impl ParamStore for NoParams {
    fn get_bool(&self, _key: &str) -> Result<Option<bool>, BoxError> {
        Ok(None)
    }
}
