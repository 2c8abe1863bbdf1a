//! Synthetic progress for webhook requests.
//!
//! The webhooks report no granular progress, so the bar animates against
//! wall-clock time and is reconciled when the request actually resolves:
//! snap to 100, hold briefly, reset to hidden. The animator owns no timer
//! at all - the consumer samples it on its own tick - which also means a
//! dropped consumer cannot leak one, and tests drive it with synthetic
//! instants.

use std::time::{Duration, Instant};

/// Sample interval used by the consumers. 100ms keeps the bar smooth.
pub const TICK: Duration = Duration::from_millis(100);

/// Time budget for the dashboard variant. A branch stats webhook takes
/// around 25 seconds on a cold ERP query.
const DASHBOARD_BUDGET: Duration = Duration::from_secs(25);

/// How long the snapped-to-100 success state stays on screen.
const DASHBOARD_HOLD: Duration = Duration::from_secs(1);

/// The stepped variant parks here until the request resolves.
const TABLE_CEILING: f64 = 90.0;
const TABLE_STEP: f64 = 1.0;
const TABLE_HOLD: Duration = Duration::from_millis(500);

/// Cap for the timed variant while the request is outstanding; only
/// completion reaches 100.
const TIMED_CAP: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Hidden, value 0.
    Idle,
    /// A request is outstanding; the value creeps up.
    Ticking,
    /// Request resolved; parked at 100 for the hold window.
    Completing,
    /// Hold elapsed; hidden again until the next cycle.
    Done,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// value = elapsed / budget, capped just below 100 while waiting.
    Timed { budget: Duration },
    /// +step per tick up to a ceiling, then jump to 100 on completion.
    Stepped { step: f64, ceiling: f64 },
}

#[derive(Debug)]
pub struct Progress {
    mode: Mode,
    hold: Duration,
    phase: Phase,
    started: Option<Instant>,
    completed: Option<Instant>,
    value: f64,
}

impl Progress {
    pub fn timed(budget: Duration, hold: Duration) -> Self {
        Self {
            mode: Mode::Timed { budget },
            hold,
            phase: Phase::Idle,
            started: None,
            completed: None,
            value: 0.0,
        }
    }

    pub fn stepped(step: f64, ceiling: f64, hold: Duration) -> Self {
        Self {
            mode: Mode::Stepped { step, ceiling },
            hold,
            phase: Phase::Idle,
            started: None,
            completed: None,
            value: 0.0,
        }
    }

    /// The branch dashboard bar: time-based over a 25s budget, 1s hold.
    pub fn dashboard() -> Self {
        Self::timed(DASHBOARD_BUDGET, DASHBOARD_HOLD)
    }

    /// The stock table bar: +1 per tick up to 90, 0.5s hold.
    pub fn table() -> Self {
        Self::stepped(TABLE_STEP, TABLE_CEILING, TABLE_HOLD)
    }

    /// Begin a cycle. Always restarts from zero, whatever came before.
    pub fn start(&mut self, now: Instant) {
        self.phase = Phase::Ticking;
        self.started = Some(now);
        self.completed = None;
        self.value = 0.0;
    }

    /// Sample the current value. Never decreases while ticking; handles
    /// the completion hold and the reset back to hidden.
    pub fn sample(&mut self, now: Instant) -> f64 {
        match self.phase {
            Phase::Idle | Phase::Done => 0.0,
            Phase::Ticking => {
                let Some(started) = self.started else {
                    return self.value;
                };
                let elapsed = now.saturating_duration_since(started);
                let target = match self.mode {
                    Mode::Timed { budget } => {
                        if budget.is_zero() {
                            TIMED_CAP
                        } else {
                            (elapsed.as_secs_f64() / budget.as_secs_f64() * 100.0).min(TIMED_CAP)
                        }
                    }
                    Mode::Stepped { step, ceiling } => {
                        let ticks = (elapsed.as_millis() / TICK.as_millis()) as f64;
                        (ticks * step).min(ceiling)
                    }
                };
                // Ratchet: a sample can only move the bar forward
                if target > self.value {
                    self.value = target;
                }
                self.value
            }
            Phase::Completing => {
                let held = self
                    .completed
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or_default();
                if held >= self.hold {
                    self.phase = Phase::Done;
                    self.value = 0.0;
                    0.0
                } else {
                    100.0
                }
            }
        }
    }

    /// The request resolved: snap to 100 and hold briefly.
    pub fn finish(&mut self, now: Instant) {
        if self.phase == Phase::Ticking {
            self.value = 100.0;
            self.completed = Some(now);
            self.phase = Phase::Completing;
        }
    }

    /// Abort the cycle (failure or unmount): hide immediately so no stale
    /// bar survives into a re-trigger.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.started = None;
        self.completed = None;
        self.value = 0.0;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the bar should be drawn at all.
    pub fn is_visible(&self) -> bool {
        matches!(self.phase, Phase::Ticking | Phase::Completing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_timed_progress_is_monotonic() {
        let mut bar = Progress::dashboard();
        let t0 = Instant::now();
        bar.start(t0);

        let mut last = 0.0;
        for tick in 0u32..300 {
            let value = bar.sample(t0 + TICK * tick);
            assert!(value >= last, "progress went backwards at tick {}", tick);
            last = value;
        }
    }

    #[test]
    fn test_timed_progress_never_reaches_100_while_waiting() {
        let mut bar = Progress::dashboard();
        let t0 = Instant::now();
        bar.start(t0);

        // Way past the 25s budget - the request is hung
        let value = bar.sample(t0 + secs(120));
        assert!(value < 100.0);
        assert_eq!(bar.phase(), Phase::Ticking);
    }

    #[test]
    fn test_timed_progress_tracks_budget() {
        let mut bar = Progress::timed(secs(10), secs(1));
        let t0 = Instant::now();
        bar.start(t0);
        assert_eq!(bar.sample(t0 + secs(5)), 50.0);
    }

    #[test]
    fn test_completion_snaps_holds_and_resets() {
        let mut bar = Progress::dashboard();
        let t0 = Instant::now();
        bar.start(t0);
        bar.sample(t0 + secs(3));

        bar.finish(t0 + secs(4));
        assert_eq!(bar.sample(t0 + secs(4)), 100.0);
        assert!(bar.is_visible());

        // Still holding at 100 half way through the hold window
        assert_eq!(bar.sample(t0 + secs(4) + Duration::from_millis(500)), 100.0);

        // Hold elapsed: hidden, back to zero
        assert_eq!(bar.sample(t0 + secs(6)), 0.0);
        assert_eq!(bar.phase(), Phase::Done);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_stepped_progress_parks_at_ceiling() {
        let mut bar = Progress::table();
        let t0 = Instant::now();
        bar.start(t0);

        assert_eq!(bar.sample(t0 + TICK * 10), 10.0);
        assert_eq!(bar.sample(t0 + TICK * 90), 90.0);
        // Hung request: parked at the ceiling, never 100
        assert_eq!(bar.sample(t0 + secs(60)), 90.0);
        assert_eq!(bar.phase(), Phase::Ticking);

        bar.finish(t0 + secs(61));
        assert_eq!(bar.sample(t0 + secs(61)), 100.0);
    }

    #[test]
    fn test_sample_with_earlier_instant_does_not_decrease() {
        let mut bar = Progress::table();
        let t0 = Instant::now();
        bar.start(t0);
        assert_eq!(bar.sample(t0 + TICK * 50), 50.0);
        // A sample taken "earlier" (timer jitter) keeps the ratchet
        assert_eq!(bar.sample(t0 + TICK * 30), 50.0);
    }

    #[test]
    fn test_new_cycle_restarts_from_zero() {
        let mut bar = Progress::dashboard();
        let t0 = Instant::now();
        bar.start(t0);
        bar.sample(t0 + secs(10));
        assert!(bar.value() > 0.0);

        bar.start(t0 + secs(11));
        assert_eq!(bar.value(), 0.0);
        assert_eq!(bar.phase(), Phase::Ticking);
    }

    #[test]
    fn test_reset_hides_immediately() {
        let mut bar = Progress::dashboard();
        let t0 = Instant::now();
        bar.start(t0);
        bar.sample(t0 + secs(5));

        bar.reset();
        assert_eq!(bar.phase(), Phase::Idle);
        assert_eq!(bar.value(), 0.0);
        assert!(!bar.is_visible());
        assert_eq!(bar.sample(t0 + secs(6)), 0.0);
    }

    #[test]
    fn test_finish_before_start_is_a_noop() {
        let mut bar = Progress::dashboard();
        bar.finish(Instant::now());
        assert_eq!(bar.phase(), Phase::Idle);
        assert_eq!(bar.value(), 0.0);
    }
}
