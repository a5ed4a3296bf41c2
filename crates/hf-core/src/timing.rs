//! Opt-in wall-clock accounting for the kernels of a time step.
//!
//! Off by default. Setting `HF_TIMING` or calling [`enable_timing`] turns it
//! on; [`step_timing::log_summary`] reports the totals.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// True when either switch is on.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("HF_TIMING").is_ok()
}

/// A scoped timer feeding an [`StageTimer`] when dropped.
pub struct StageGuard<'a> {
    sink: &'a StageTimer,
    start: Option<Instant>,
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            self.sink.record(start.elapsed().as_secs_f64());
        }
    }
}

/// Call count and summed duration of one stage, safe to share across threads.
pub struct StageTimer {
    nanos: AtomicU64,
    calls: AtomicU64,
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTimer {
    pub const fn new() -> Self {
        Self {
            nanos: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    /// Start a scoped measurement; a no-op when timing is disabled.
    pub fn scope(&self) -> StageGuard<'_> {
        StageGuard {
            sink: self,
            start: is_enabled().then(Instant::now),
        }
    }

    pub fn record(&self, seconds: f64) {
        let nanos = (seconds * 1e9) as u64;
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_seconds(&self) -> f64 {
        self.nanos.load(Ordering::Relaxed) as f64 / 1e9
    }

    pub fn count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Zero before the first call.
    pub fn average_seconds(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.total_seconds() / n as f64,
        }
    }

    pub fn reset(&self) {
        self.nanos.store(0, Ordering::Relaxed);
        self.calls.store(0, Ordering::Relaxed);
    }
}

/// Per-stage timers of the explicit front step.
pub mod step_timing {
    use super::StageTimer;

    /// Fast marching passes (tentative and ribbon-based)
    pub static FAST_MARCHING: StageTimer = StageTimer::new();
    /// Front reconstruction and classification
    pub static RECONSTRUCTION: StageTimer = StageTimer::new();
    /// Tip widths and leak-off integrals
    pub static TIP_INTEGRALS: StageTimer = StageTimer::new();
    /// Elasticity sub-matrix gathers
    pub static ELASTICITY_GATHER: StageTimer = StageTimer::new();
    /// Width/pressure linear solves
    pub static EHL_SOLVE: StageTimer = StageTimer::new();
    /// Tip inversion on ribbon cells
    pub static TIP_INVERSION: StageTimer = StageTimer::new();

    fn all() -> [(&'static str, &'static StageTimer); 6] {
        [
            ("fast marching", &FAST_MARCHING),
            ("reconstruction", &RECONSTRUCTION),
            ("tip integrals", &TIP_INTEGRALS),
            ("elasticity gather", &ELASTICITY_GATHER),
            ("ehl solve", &EHL_SOLVE),
            ("tip inversion", &TIP_INVERSION),
        ]
    }

    pub fn reset_all() {
        for (_, t) in all() {
            t.reset();
        }
    }

    /// Log the stage breakdown through `tracing`.
    pub fn log_summary() {
        if !super::is_enabled() {
            return;
        }
        for (label, t) in all() {
            let count = t.count();
            if count > 0 {
                tracing::info!(
                    stage = label,
                    calls = count,
                    total_s = t.total_seconds(),
                    avg_ms = t.average_seconds() * 1000.0,
                    "stage timing"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_timer_sums_calls() {
        let t = StageTimer::new();
        t.record(0.5);
        t.record(1.5);
        assert_eq!(t.count(), 2);
        assert!((t.total_seconds() - 2.0).abs() < 1e-6);
        assert!((t.average_seconds() - 1.0).abs() < 1e-6);
        t.reset();
        assert_eq!(t.count(), 0);
        assert_eq!(t.average_seconds(), 0.0);
    }

    #[test]
    fn scope_records_only_when_enabled() {
        let t = StageTimer::new();
        enable_timing();
        {
            let _g = t.scope();
        }
        disable_timing();
        assert!(t.count() >= 1);
    }
}
