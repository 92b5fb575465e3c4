//! Minimum-velocity arbitration over the cruise set-speed and the advisory
//! speed controllers.

use std::cmp::Ordering;

use serde::Serialize;

use longplan_traits::{AdvisoryContext, AdvisoryOutput, SpeedAdvisor};

/// Origin of the cruise target. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CruiseSource {
    #[default]
    Cruise,
    /// Vision curve-speed controller.
    Turn,
    /// Posted speed limit.
    Limit,
    /// Map turn-speed limit.
    TurnLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateSpeed {
    pub source: CruiseSource,
    /// `f32::INFINITY` means no accel constraint.
    pub a_target: f32,
    pub v_target: f32,
}

impl CandidateSpeed {
    pub fn cruise(v_cruise: f32) -> Self {
        Self {
            source: CruiseSource::Cruise,
            a_target: f32::INFINITY,
            v_target: v_cruise,
        }
    }

    /// Velocity ascending, then source priority.
    pub fn rank(&self, other: &Self) -> Ordering {
        self.v_target
            .total_cmp(&other.v_target)
            .then(self.source.cmp(&other.source))
    }
}

/// Pick the lowest-velocity candidate. The cruise baseline is required, so
/// the candidate set is never empty. NaN targets are skipped.
pub fn select<I>(cruise: CandidateSpeed, others: I) -> CandidateSpeed
where
    I: IntoIterator<Item = CandidateSpeed>,
{
    others
        .into_iter()
        .filter(|c| {
            let ok = !c.v_target.is_nan();
            if !ok {
                tracing::warn!(source = ?c.source, "advisory candidate has NaN velocity; ignored");
            }
            ok
        })
        .fold(cruise, |best, c| {
            if c.rank(&best) == Ordering::Less { c } else { best }
        })
}

/// Latest output of each advisor, kept for publication.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AdvisoryReports {
    pub vision_turn: AdvisoryOutput,
    pub speed_limit: AdvisoryOutput,
    pub turn_speed: AdvisoryOutput,
}

/// Result of one arbitration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arbitration {
    pub chosen: CandidateSpeed,
    /// Tightest accel target across active candidates (cruise contributes `+inf`).
    pub a_min: f32,
    pub reports: AdvisoryReports,
}

/// Owns the three advisory controllers.
pub struct SpeedArbiter {
    vision_turn: Box<dyn SpeedAdvisor>,
    speed_limit: Box<dyn SpeedAdvisor>,
    turn_speed: Box<dyn SpeedAdvisor>,
}

impl std::fmt::Debug for SpeedArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeedArbiter").finish_non_exhaustive()
    }
}

impl SpeedArbiter {
    pub fn new(
        vision_turn: Box<dyn SpeedAdvisor>,
        speed_limit: Box<dyn SpeedAdvisor>,
        turn_speed: Box<dyn SpeedAdvisor>,
    ) -> Self {
        Self {
            vision_turn,
            speed_limit,
            turn_speed,
        }
    }

    /// Update every advisor once, then select.
    pub fn update(&mut self, ctx: &AdvisoryContext<'_>) -> Arbitration {
        let reports = AdvisoryReports {
            vision_turn: self.vision_turn.update(ctx),
            speed_limit: self.speed_limit.update(ctx),
            turn_speed: self.turn_speed.update(ctx),
        };
        let active = [
            (CruiseSource::Turn, reports.vision_turn),
            (CruiseSource::Limit, reports.speed_limit),
            (CruiseSource::TurnLimit, reports.turn_speed),
        ]
        .into_iter()
        .filter(|(_, out)| out.active)
        .map(|(source, out)| CandidateSpeed {
            source,
            a_target: out.a_target,
            v_target: out.v_target,
        });

        let candidates: Vec<CandidateSpeed> = active.collect();
        let a_min = candidates
            .iter()
            .map(|c| c.a_target)
            .filter(|a| !a.is_nan())
            .fold(f32::INFINITY, f32::min);
        let chosen = select(CandidateSpeed::cruise(ctx.v_cruise), candidates);
        tracing::trace!(source = ?chosen.source, v = chosen.v_target, a_min, "cruise arbitration");

        Arbitration {
            chosen,
            a_min,
            reports,
        }
    }
}
