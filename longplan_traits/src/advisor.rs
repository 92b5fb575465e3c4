//! Advisory speed sub-controllers (curve speed, posted limit, turn speed).

use serde::Serialize;

use crate::types::CycleInputs;

/// Diagnostic state tag of an advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvisoryPhase {
    #[default]
    Disabled,
    Inactive,
    TempInactive,
    Adapting,
    Active,
    Entering,
    Turning,
    Leaving,
}

/// Controller-specific diagnostic fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AdvisoryDetail {
    #[default]
    None,
    SpeedLimit {
        limit: f32,
        offset: f32,
        from_map: bool,
    },
    Turn {
        sign: i8,
    },
}

/// Result of one advisor update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AdvisoryOutput {
    pub active: bool,
    pub phase: AdvisoryPhase,
    /// May be `f32::INFINITY` (unconstrained).
    pub a_target: f32,
    pub v_target: f32,
    /// Distance to the trigger point (m); 0 when not applicable.
    pub distance: f32,
    pub detail: AdvisoryDetail,
}

/// What every advisor sees once per cycle.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    pub enabled: bool,
    /// Filtered ego speed (m/s).
    pub v_ego: f32,
    /// Current desired acceleration (m/s²).
    pub a_ego: f32,
    /// Cruise set-speed (m/s).
    pub v_cruise: f32,
    pub inputs: &'a CycleInputs,
}

pub trait SpeedAdvisor {
    fn update(&mut self, ctx: &AdvisoryContext<'_>) -> AdvisoryOutput;
}

impl<T: SpeedAdvisor + ?Sized> SpeedAdvisor for Box<T> {
    fn update(&mut self, ctx: &AdvisoryContext<'_>) -> AdvisoryOutput {
        (**self).update(ctx)
    }
}
