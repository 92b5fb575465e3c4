//! Control-mode arbitration (ACC vs BLENDED).
//!
//! Two schemes select the mode:
//! - conditional: a debounced, hysteresis-driven state machine over standstill,
//!   set-speed and lead presence ([`ModeState::step`]);
//! - persisted: the experimental toggle from the param store, re-read on a
//!   decimated cadence ([`ModeArbiter::poll_persisted`]).

use longplan_traits::{ControlMode, CycleInputs, EXPERIMENTAL_MODE_KEY, ParamStore};

use crate::config::ModeCfg;

/// Per-cycle inputs of the conditional state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeInputs {
    pub standstill: bool,
    /// Cruise set-speed at or below the conditional threshold.
    pub within_speed_condition: bool,
    /// Lead present and closer than the commitment distance.
    pub lead: bool,
}

impl ModeInputs {
    /// Derive the raw flags from one cycle of observations.
    pub fn from_cycle(inputs: &CycleInputs, cfg: &ModeCfg) -> Self {
        Self {
            standstill: inputs.car.standstill,
            within_speed_condition: inputs.controls.v_cruise_kph
                <= inputs.settings.conditional_speed_kph,
            lead: inputs.lead.status && inputs.lead.d_rel <= cfg.lead_distance_m,
        }
    }
}

/// Memory of the conditional state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    /// Cycles the raw lead flag has been unchanged.
    pub lead_count: u32,
    /// Cycles spent in the current stop-and-go window.
    pub sng_count: u32,
    pub sng_active: bool,
    /// Debounced lead flag.
    pub has_lead: bool,
    pub last_mode: ControlMode,
    pub last_standstill: bool,
    pub last_lead: bool,
}

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub state: ModeState,
    pub mode: ControlMode,
    /// Mode differs from the previous cycle; smoothing state must be reseeded.
    pub reset: bool,
}

impl ModeState {
    /// One cycle of the conditional state machine.
    pub fn step(self, inputs: &ModeInputs, cfg: &ModeCfg) -> ModeTransition {
        let mut next = self;

        if inputs.lead != self.last_lead {
            next.lead_count = 0;
        } else {
            next.lead_count = self.lead_count.saturating_add(1);
            if next.lead_count >= cfg.lead_debounce_cycles {
                next.has_lead = inputs.lead;
            }
        }

        if !inputs.standstill && self.last_standstill {
            next.sng_active = true;
            next.sng_count = 0;
        }
        if next.sng_active {
            if next.sng_count >= cfg.stop_and_go_cycles {
                next.sng_active = false;
            } else {
                next.sng_count += 1;
            }
        }

        let mode = if inputs.standstill {
            next.sng_active = false;
            ControlMode::Blended
        } else if next.sng_active || (inputs.within_speed_condition && !next.has_lead) {
            ControlMode::Blended
        } else {
            ControlMode::Acc
        };

        let reset = mode != self.last_mode;
        next.last_mode = mode;
        next.last_standstill = inputs.standstill;
        next.last_lead = inputs.lead;

        ModeTransition {
            state: next,
            mode,
            reset,
        }
    }
}

/// Owns the mode and whichever scheme currently drives it.
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    cfg: ModeCfg,
    state: ModeState,
    mode: ControlMode,
    read_counter: u64,
}

impl ModeArbiter {
    pub fn new(cfg: ModeCfg) -> Self {
        Self {
            cfg,
            state: ModeState::default(),
            mode: ControlMode::Acc,
            read_counter: 0,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn cfg(&self) -> &ModeCfg {
        &self.cfg
    }

    /// Run the conditional scheme; returns the reset flag.
    pub fn update_conditional(&mut self, inputs: &ModeInputs) -> bool {
        let t = self.state.step(inputs, &self.cfg);
        if t.reset {
            tracing::debug!(from = ?self.state.last_mode, to = ?t.mode, "conditional mode switch");
        }
        self.state = t.state;
        self.mode = t.mode;
        t.reset
    }

    /// Persisted scheme: read the toggle when the decimation counter allows it.
    ///
    /// Never produces a reset. A failing store keeps the last mode.
    pub fn poll_persisted<P: ParamStore + ?Sized>(
        &mut self,
        params: &P,
        long_control: bool,
        read: bool,
    ) {
        let every = u64::from(self.cfg.param_read_every.max(1));
        if read && self.read_counter % every == 0 {
            self.read_persisted(params, long_control);
        }
        self.read_counter = self.read_counter.wrapping_add(1);
    }

    /// Unconditional read of the persisted toggle.
    pub fn read_persisted<P: ParamStore + ?Sized>(&mut self, params: &P, long_control: bool) {
        match params.get_bool(EXPERIMENTAL_MODE_KEY) {
            Ok(flag) => {
                let mode = if flag.unwrap_or(false) && long_control {
                    ControlMode::Blended
                } else {
                    ControlMode::Acc
                };
                if mode != self.mode {
                    tracing::debug!(from = ?self.mode, to = ?mode, "persisted mode switch");
                }
                self.mode = mode;
            }
            Err(e) => {
                tracing::warn!(error = %e, key = EXPERIMENTAL_MODE_KEY, "param read failed; keeping last mode");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving() -> ModeInputs {
        ModeInputs::default()
    }

    #[test]
    fn standstill_forces_blended_and_resets_once() {
        let cfg = ModeCfg::default();
        let s = ModeState::default();
        let stop = ModeInputs {
            standstill: true,
            ..moving()
        };
        let t1 = s.step(&stop, &cfg);
        assert_eq!(t1.mode, ControlMode::Blended);
        assert!(t1.reset);
        let t2 = t1.state.step(&stop, &cfg);
        assert_eq!(t2.mode, ControlMode::Blended);
        assert!(!t2.reset);
    }

    #[test]
    fn lead_flicker_does_not_commit() {
        let cfg = ModeCfg::default();
        let mut s = ModeState::default();
        let lead = ModeInputs {
            lead: true,
            ..moving()
        };
        for i in 0..200 {
            let inp = if i % 2 == 0 { lead } else { moving() };
            s = s.step(&inp, &cfg).state;
            assert!(!s.has_lead);
        }
    }

    #[test]
    fn stable_lead_commits_on_the_cycle_after_the_window() {
        let cfg = ModeCfg::default();
        let mut s = ModeState::default();
        let lead = ModeInputs {
            lead: true,
            ..moving()
        };
        for _ in 0..cfg.lead_debounce_cycles {
            s = s.step(&lead, &cfg).state;
            assert!(!s.has_lead);
        }
        let t = s.step(&lead, &cfg);
        assert!(t.state.has_lead);
        assert_eq!(t.mode, ControlMode::Acc);
    }

    #[test]
    fn stop_and_go_counter_resets_when_rearmed() {
        let cfg = ModeCfg::default();
        let mut s = ModeState::default();
        let stop = ModeInputs {
            standstill: true,
            ..moving()
        };
        s = s.step(&stop, &cfg).state;
        for _ in 0..10 {
            s = s.step(&moving(), &cfg).state;
        }
        assert!(s.sng_active);
        assert_eq!(s.sng_count, 10);
        s = s.step(&stop, &cfg).state;
        assert!(!s.sng_active);
        s = s.step(&moving(), &cfg).state;
        assert_eq!(s.sng_count, 1);
    }
}
