use crate::config::SessionConfig;
use mentex_core::{BoundaryEvent, BoundaryKind, Schedule, SessionPhase};
use rand::Rng;
use thiserror::Error;

const NS_PER_MS: u64 = 1_000_000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimelineError {
    #[error("monotonic clock went backwards: last {last_ns} ns, now {now_ns} ns")]
    ClockRegression { last_ns: u64, now_ns: u64 },
}

/// What one timeline query reports: the phase that is now current, and the
/// boundary crossed by this query, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickResult {
    pub phase: SessionPhase,
    pub boundary: Option<BoundaryEvent>,
}

/// Drives the session phase machine from externally supplied monotonic
/// timestamps. Pure reducer: no clock of its own, no I/O, no blocking; the
/// enclosing loop calls [`tick`](Self::tick) at whatever cadence it renders.
///
/// Phase start times advance by each phase's nominal duration rather than
/// by the observed tick time, so boundary placement does not absorb tick
/// jitter and the session keeps its nominal total length.
pub struct SessionEngine<R: Rng> {
    schedule: Schedule,
    initial_fixation_ms: u64,
    active_ms: u64,
    inter_trial_range_ms: (u64, u64),
    rng: R,
    phase: SessionPhase,
    phase_start_ns: Option<u64>,
    phase_duration_ns: u64,
    last_now_ns: Option<u64>,
}

impl<R: Rng> SessionEngine<R> {
    /// `rng` feeds only the separator jitter draws; pass a stream separate
    /// from the one that shuffled `schedule`.
    pub fn new(config: &SessionConfig, schedule: Schedule, rng: R) -> Self {
        debug_assert!(!schedule.is_empty());
        Self {
            schedule,
            initial_fixation_ms: config.initial_fixation_ms,
            active_ms: config.active_ms,
            inter_trial_range_ms: config.inter_trial_range_ms,
            rng,
            phase: SessionPhase::InitialFixation,
            phase_start_ns: None,
            phase_duration_ns: config.initial_fixation_ms * NS_PER_MS,
            last_now_ns: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// `(current trial, total trials)` while a trial or separator is
    /// showing, for progress display.
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        match self.phase {
            SessionPhase::ActiveTrial { index, .. } => Some((index + 1, self.schedule.len())),
            SessionPhase::InterTrialFixation { after_index } => {
                Some((after_index + 1, self.schedule.len()))
            }
            _ => None,
        }
    }

    /// Advances the phase machine to `now`. The first call anchors the
    /// session; later calls fire each boundary exactly once, on the first
    /// call whose `now` reaches it. A call that has overshot several
    /// boundaries processes the whole chain and reports only the final
    /// one, so callers must tick often enough (50 ms or better) that a
    /// chain longer than one labeled boundary never occurs in practice.
    pub fn tick(&mut self, now_ns: u64) -> Result<TickResult, TimelineError> {
        if self.phase.is_terminal() {
            return Ok(TickResult {
                phase: self.phase,
                boundary: None,
            });
        }

        if let Some(last_ns) = self.last_now_ns {
            if now_ns < last_ns {
                return Err(TimelineError::ClockRegression {
                    last_ns,
                    now_ns,
                });
            }
        }
        self.last_now_ns = Some(now_ns);

        let mut phase_start = *self.phase_start_ns.get_or_insert(now_ns);
        let mut boundary = None;
        let mut crossed = 0u32;

        while !self.phase.is_terminal() && now_ns - phase_start >= self.phase_duration_ns {
            phase_start += self.phase_duration_ns;
            let kind = self.advance();
            boundary = Some(BoundaryEvent {
                kind,
                timestamp_ns: now_ns,
            });
            crossed += 1;
        }
        self.phase_start_ns = Some(phase_start);

        if crossed > 1 {
            tracing::warn!(
                crossed,
                now_ns,
                "single tick crossed {crossed} labeled boundaries; intermediate markers coalesced"
            );
        }

        Ok(TickResult {
            phase: self.phase,
            boundary,
        })
    }

    /// Ends the session immediately from any state. Not an error; every
    /// later tick reports `Aborted` and nothing else.
    pub fn abort(&mut self) {
        tracing::info!(from = ?self.phase, "session aborted");
        self.phase = SessionPhase::Aborted;
        self.phase_duration_ns = 0;
    }

    /// One phase transition. Every transition out of a non-terminal phase
    /// crosses exactly one labeled boundary: fixations end where a trial
    /// starts, trials end where a fixation (or completion) starts.
    fn advance(&mut self) -> BoundaryKind {
        match self.phase {
            SessionPhase::InitialFixation => self.enter_trial(0),
            SessionPhase::ActiveTrial { index, class } => {
                if index == self.schedule.last_index() {
                    self.phase = SessionPhase::Completed;
                    self.phase_duration_ns = 0;
                    tracing::info!(trials = self.schedule.len(), "session completed");
                } else {
                    self.phase = SessionPhase::InterTrialFixation { after_index: index };
                    self.phase_duration_ns = self.draw_separator_ms() * NS_PER_MS;
                }
                BoundaryKind::end_of(class)
            }
            SessionPhase::InterTrialFixation { after_index } => self.enter_trial(after_index + 1),
            SessionPhase::Completed | SessionPhase::Aborted => {
                unreachable!("terminal phases do not advance")
            }
        }
    }

    fn enter_trial(&mut self, index: usize) -> BoundaryKind {
        let class = self.schedule.class_at(index);
        self.phase = SessionPhase::ActiveTrial { index, class };
        self.phase_duration_ns = self.active_ms * NS_PER_MS;
        BoundaryKind::start_of(class)
    }

    fn draw_separator_ms(&mut self) -> u64 {
        let (lo, hi) = self.inter_trial_range_ms;
        // a degenerate range consumes no draw from the jitter stream
        if lo == hi {
            lo
        } else {
            self.rng.random_range(lo..=hi)
        }
    }
}
