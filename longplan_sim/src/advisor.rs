//! Advisory controllers driven by distance travelled.

use longplan_traits::{AdvisoryContext, AdvisoryDetail, AdvisoryOutput, AdvisoryPhase, SpeedAdvisor};

/// Distance ahead (m) from which an upcoming trigger is announced.
const LOOKAHEAD_M: f32 = 200.0;
/// Length (m) of a scripted curve.
const CURVE_LENGTH_M: f32 = 150.0;
/// Strongest deceleration an advisor asks for (m/s²).
const MAX_DECEL: f32 = -3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Posted limit that holds from the trigger point on.
    SpeedLimit,
    /// A curve of fixed length starting at the trigger point.
    Curve,
}

/// Advisor that targets `v_target` once `at_m` metres have been driven.
#[derive(Debug, Clone)]
pub struct ScriptedAdvisor {
    kind: ScriptKind,
    at_m: f32,
    v_target: f32,
    dt: f32,
    travelled: f32,
}

impl ScriptedAdvisor {
    pub fn speed_limit(at_m: f32, v_target: f32, dt: f32) -> Self {
        Self::new(ScriptKind::SpeedLimit, at_m, v_target, dt)
    }

    pub fn curve(at_m: f32, v_target: f32, dt: f32) -> Self {
        Self::new(ScriptKind::Curve, at_m, v_target, dt)
    }

    fn new(kind: ScriptKind, at_m: f32, v_target: f32, dt: f32) -> Self {
        Self {
            kind,
            at_m,
            v_target,
            dt,
            travelled: 0.0,
        }
    }

    pub fn travelled(&self) -> f32 {
        self.travelled
    }

    fn detail(&self) -> AdvisoryDetail {
        match self.kind {
            ScriptKind::SpeedLimit => AdvisoryDetail::SpeedLimit {
                limit: self.v_target,
                offset: 0.0,
                from_map: true,
            },
            ScriptKind::Curve => AdvisoryDetail::Turn { sign: 1 },
        }
    }

    /// Deceleration that reaches the target at the trigger point.
    fn approach_decel(&self, v: f32, dist: f32) -> f32 {
        if v <= self.v_target {
            return f32::INFINITY;
        }
        ((self.v_target * self.v_target - v * v) / (2.0 * dist.max(1.0))).max(MAX_DECEL)
    }

    fn hold_decel(&self, v: f32) -> f32 {
        if v <= self.v_target {
            return f32::INFINITY;
        }
        (0.5 * (self.v_target - v)).max(MAX_DECEL)
    }
}

impl SpeedAdvisor for ScriptedAdvisor {
    fn update(&mut self, ctx: &AdvisoryContext<'_>) -> AdvisoryOutput {
        self.travelled += ctx.inputs.car.v_ego.max(0.0) * self.dt;
        let idle = AdvisoryOutput {
            a_target: f32::INFINITY,
            v_target: ctx.v_cruise,
            detail: self.detail(),
            ..AdvisoryOutput::default()
        };
        if !ctx.enabled {
            return idle;
        }

        let dist = self.at_m - self.travelled;
        let v = ctx.v_ego;
        let (phase, a_target) = match self.kind {
            _ if dist > LOOKAHEAD_M => {
                return AdvisoryOutput {
                    phase: AdvisoryPhase::Inactive,
                    distance: dist,
                    ..idle
                };
            }
            ScriptKind::SpeedLimit if dist > 0.0 => {
                (AdvisoryPhase::Adapting, self.approach_decel(v, dist))
            }
            ScriptKind::SpeedLimit => (AdvisoryPhase::Active, self.hold_decel(v)),
            ScriptKind::Curve if dist > 0.0 => {
                (AdvisoryPhase::Entering, self.approach_decel(v, dist))
            }
            ScriptKind::Curve if dist > -CURVE_LENGTH_M => {
                (AdvisoryPhase::Turning, self.hold_decel(v))
            }
            ScriptKind::Curve => {
                return AdvisoryOutput {
                    phase: AdvisoryPhase::Inactive,
                    ..idle
                };
            }
        };

        AdvisoryOutput {
            active: true,
            phase,
            a_target,
            v_target: self.v_target,
            distance: dist.max(0.0),
            detail: self.detail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longplan_traits::CycleInputs;

    fn ctx_at(inputs: &CycleInputs, v: f32) -> AdvisoryContext<'_> {
        AdvisoryContext {
            enabled: true,
            v_ego: v,
            a_ego: 0.0,
            v_cruise: 30.0,
            inputs,
        }
    }

    fn inputs(v: f32) -> CycleInputs {
        let mut i = CycleInputs::default();
        i.car.v_ego = v;
        i
    }

    #[test]
    fn far_trigger_is_inactive() {
        let mut a = ScriptedAdvisor::speed_limit(1000.0, 20.0, 0.05);
        let i = inputs(25.0);
        let out = a.update(&ctx_at(&i, 25.0));
        assert!(!out.active);
        assert_eq!(out.phase, AdvisoryPhase::Inactive);
    }

    #[test]
    fn approaching_limit_requests_decel() {
        let mut a = ScriptedAdvisor::speed_limit(100.0, 20.0, 0.05);
        let i = inputs(25.0);
        let out = a.update(&ctx_at(&i, 25.0));
        assert!(out.active);
        assert_eq!(out.phase, AdvisoryPhase::Adapting);
        assert!(out.a_target < 0.0 && out.a_target >= MAX_DECEL);
        assert_eq!(out.v_target, 20.0);
    }

    #[test]
    fn curve_ends_after_its_length() {
        let mut a = ScriptedAdvisor::curve(0.0, 15.0, 1.0);
        let i = inputs(20.0);
        assert_eq!(a.update(&ctx_at(&i, 20.0)).phase, AdvisoryPhase::Turning);
        for _ in 0..10 {
            a.update(&ctx_at(&i, 20.0));
        }
        let out = a.update(&ctx_at(&i, 20.0));
        assert!(!out.active);
    }

    #[test]
    fn disabled_advisor_is_idle() {
        let mut a = ScriptedAdvisor::speed_limit(0.0, 5.0, 0.05);
        let i = inputs(25.0);
        let mut ctx = ctx_at(&i, 25.0);
        ctx.enabled = false;
        let out = a.update(&ctx);
        assert!(!out.active);
        assert_eq!(out.phase, AdvisoryPhase::Disabled);
    }
}
