//! The per-cycle output.

use serde::Serialize;

use longplan_traits::{AdvisoryDetail, AdvisoryOutput, AdvisoryPhase, ControlMode, SolverSource};

use crate::arbitration::{AdvisoryReports, CruiseSource};
use crate::grids::CONTROL_N;
use crate::limits::AccelLimits;

/// Published source tag: the solver's own source when it is more specific
/// than `cruise`, otherwise the arbitrated cruise source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    #[default]
    Cruise,
    Lead0,
    Lead1,
    E2e,
    Turn,
    Limit,
    TurnLimit,
}

impl PlanSource {
    pub fn resolve(solver: SolverSource, cruise: CruiseSource) -> Self {
        match solver {
            SolverSource::Lead0 => PlanSource::Lead0,
            SolverSource::Lead1 => PlanSource::Lead1,
            SolverSource::E2e => PlanSource::E2e,
            SolverSource::Cruise => match cruise {
                CruiseSource::Cruise => PlanSource::Cruise,
                CruiseSource::Turn => PlanSource::Turn,
                CruiseSource::Limit => PlanSource::Limit,
                CruiseSource::TurnLimit => PlanSource::TurnLimit,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VisionTurnDiag {
    pub state: AdvisoryPhase,
    pub turn_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeedLimitDiag {
    pub state: AdvisoryPhase,
    pub limit: f32,
    pub offset: f32,
    pub distance: f32,
    pub from_map: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TurnSpeedDiag {
    pub state: AdvisoryPhase,
    pub limit: f32,
    pub distance: f32,
    pub turn_sign: i8,
}

impl From<&AdvisoryOutput> for VisionTurnDiag {
    fn from(o: &AdvisoryOutput) -> Self {
        Self {
            state: o.phase,
            turn_speed: o.v_target,
        }
    }
}

impl From<&AdvisoryOutput> for SpeedLimitDiag {
    fn from(o: &AdvisoryOutput) -> Self {
        let (limit, offset, from_map) = match o.detail {
            AdvisoryDetail::SpeedLimit {
                limit,
                offset,
                from_map,
            } => (limit, offset, from_map),
            _ => (o.v_target, 0.0, false),
        };
        Self {
            state: o.phase,
            limit,
            offset,
            distance: o.distance,
            from_map,
        }
    }
}

impl From<&AdvisoryOutput> for TurnSpeedDiag {
    fn from(o: &AdvisoryOutput) -> Self {
        let turn_sign = match o.detail {
            AdvisoryDetail::Turn { sign } => sign,
            _ => 0,
        };
        Self {
            state: o.phase,
            limit: o.v_target,
            distance: o.distance,
            turn_sign,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AdvisoryDiagnostics {
    pub vision_turn: VisionTurnDiag,
    pub speed_limit: SpeedLimitDiag,
    pub turn_speed: TurnSpeedDiag,
}

impl From<&AdvisoryReports> for AdvisoryDiagnostics {
    fn from(r: &AdvisoryReports) -> Self {
        Self {
            vision_turn: (&r.vision_turn).into(),
            speed_limit: (&r.speed_limit).into(),
            turn_speed: (&r.turn_speed).into(),
        }
    }
}

/// Everything published after one planning cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongitudinalPlan {
    pub speeds: [f32; CONTROL_N],
    pub accels: [f32; CONTROL_N],
    pub jerks: [f32; CONTROL_N],
    /// Raw lead status of this cycle.
    pub has_lead: bool,
    pub source: PlanSource,
    pub fcw: bool,
    /// Solver execution time (s).
    pub solver_execution_time: f32,
    pub mode: ControlMode,
    pub is_blended: bool,
    /// Smoothing state was reseeded this cycle.
    pub reset: bool,
    /// Bounds handed to the solver.
    pub accel_limits: AccelLimits,
    /// Arbitrated cruise target (m/s).
    pub v_cruise: f32,
    pub advisories: AdvisoryDiagnostics,
}
