use crate::config::WatchdogCfg;

/// Forward-collision warning derived from the solver's crash counter.
///
/// Level-triggered: the flag is recomputed from scratch every cycle.
#[derive(Debug, Clone, Copy)]
pub struct CollisionWatchdog {
    threshold: u32,
}

impl CollisionWatchdog {
    pub fn new(cfg: WatchdogCfg) -> Self {
        Self {
            threshold: cfg.crash_count_threshold,
        }
    }

    #[inline]
    pub fn evaluate(&self, crash_cnt: u32, standstill: bool) -> bool {
        crash_cnt > self.threshold && !standstill
    }
}
