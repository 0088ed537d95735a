//! Interval-driven workout session engine.
//!
//! The engine walks a routine snapshot one tick at a time:
//! - Each step runs its work interval, then its rest interval if it has one
//! - The last interval of the last step completes the session
//! - Paused sessions ignore ticks; the clock driving `tick()` may keep running
//! - The final five seconds of every interval are announced through a `CueSink`
//!
//! The engine owns no timer. Callers drive it with one `tick()` per second and
//! read `snapshot()` after each tick.

use crate::cue::{CueSettings, CueSink};
use crate::{CompletedSession, Error, Phase, Result, Routine, SessionStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Countdown values that get a spoken cue
const CUE_WINDOW: std::ops::RangeInclusive<u32> = 1..=5;

/// Something the caller should react to
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A new interval started (rest of the same step, or work of the next)
    PhaseChanged {
        index: usize,
        phase: Phase,
        seconds: u32,
    },
    /// The routine finished, or was finished early with save; memo not attached
    Completed(CompletedSession),
    /// The session was stopped without saving
    Aborted,
}

/// Observable engine state, read after every tick
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub phase: Phase,
    pub current_index: usize,
    pub total_steps: usize,
    pub seconds_remaining: u32,
    pub elapsed_seconds: u32,
    pub current_step_name: Option<String>,
    pub next_step_name: Option<String>,
}

/// Per-run state; exists only between start and completion/abort
#[derive(Clone, Debug)]
struct ActiveSession {
    routine: Routine,
    current_index: usize,
    phase: Phase,
    seconds_remaining: u32,
    elapsed_seconds: u32,
    started_at: DateTime<Utc>,
}

/// Workout timer state machine
pub struct SessionEngine<C: CueSink> {
    cues: C,
    cue_settings: CueSettings,
    status: SessionStatus,
    active: Option<ActiveSession>,
}

impl<C: CueSink> SessionEngine<C> {
    pub fn new(cues: C, cue_settings: CueSettings) -> Self {
        Self {
            cues,
            cue_settings,
            status: SessionStatus::Idle,
            active: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn cue_sink(&self) -> &C {
        &self.cues
    }

    /// Start a run over a snapshot of `routine`
    ///
    /// Rejects a routine that fails `Routine::validate` and any call while the
    /// engine is not idle. Nothing changes on rejection.
    pub fn start(&mut self, routine: &Routine) -> Result<()> {
        if self.status != SessionStatus::Idle {
            return Err(Error::State(format!(
                "Cannot start a session while {:?}",
                self.status
            )));
        }
        routine.validate()?;
        let first = routine
            .get(0)
            .ok_or_else(|| Error::Validation("Cannot start an empty routine".into()))?;

        self.active = Some(ActiveSession {
            current_index: 0,
            phase: Phase::Work,
            seconds_remaining: first.work_seconds,
            elapsed_seconds: 0,
            started_at: Utc::now(),
            routine: routine.clone(),
        });
        self.status = SessionStatus::Running;

        tracing::info!(
            "Session started: {} steps, {}s total",
            routine.len(),
            routine.total_seconds()
        );
        self.announce();
        Ok(())
    }

    /// Advance the countdown by one second
    ///
    /// Ignored unless running. At most one transition happens per tick.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.status != SessionStatus::Running {
            return None;
        }

        let reached_zero = {
            let session = self.active.as_mut()?;
            session.seconds_remaining = session.seconds_remaining.saturating_sub(1);
            session.elapsed_seconds += 1;
            session.seconds_remaining == 0
        };

        let event = if reached_zero { self.advance() } else { None };

        if self.status == SessionStatus::Running {
            self.announce();
        }
        event
    }

    pub fn pause(&mut self) {
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Paused;
            self.cues.cancel_all();
            tracing::info!("Session paused");
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Running;
            tracing::info!("Session resumed");
        }
    }

    /// Flip between running and paused
    pub fn toggle_pause(&mut self) {
        match self.status {
            SessionStatus::Running => self.pause(),
            SessionStatus::Paused => self.resume(),
            _ => {}
        }
    }

    /// End the run now
    ///
    /// `completed = true` finishes early and still produces the summary;
    /// otherwise the run is aborted. No-op unless running or paused.
    pub fn stop(&mut self, completed: bool) -> Option<SessionEvent> {
        if !matches!(
            self.status,
            SessionStatus::Running | SessionStatus::Paused
        ) {
            return None;
        }

        self.cues.cancel_all();
        if completed {
            return self.finish();
        }

        if let Some(session) = self.active.take() {
            tracing::info!(
                "Session aborted at step {} after {}s",
                session.current_index + 1,
                session.elapsed_seconds
            );
        }
        self.status = SessionStatus::Aborted;
        Some(SessionEvent::Aborted)
    }

    /// Return a finished engine to idle so it can run again
    pub fn reset(&mut self) {
        if matches!(
            self.status,
            SessionStatus::Completed | SessionStatus::Aborted
        ) {
            self.status = SessionStatus::Idle;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.active {
            Some(session) => SessionSnapshot {
                status: self.status,
                phase: session.phase,
                current_index: session.current_index,
                total_steps: session.routine.len(),
                seconds_remaining: session.seconds_remaining,
                elapsed_seconds: session.elapsed_seconds,
                current_step_name: session
                    .routine
                    .get(session.current_index)
                    .map(|s| s.name.clone()),
                next_step_name: session
                    .routine
                    .get(session.current_index + 1)
                    .map(|s| s.name.clone()),
            },
            None => SessionSnapshot {
                status: self.status,
                phase: Phase::Work,
                current_index: 0,
                total_steps: 0,
                seconds_remaining: 0,
                elapsed_seconds: 0,
                current_step_name: None,
                next_step_name: None,
            },
        }
    }

    /// Apply the transition for an interval that just ran out
    fn advance(&mut self) -> Option<SessionEvent> {
        let session = self.active.as_mut()?;
        let rest_seconds = session
            .routine
            .get(session.current_index)
            .map(|s| s.rest_seconds)
            .unwrap_or(0);

        if session.phase == Phase::Work && rest_seconds > 0 {
            session.phase = Phase::Rest;
            session.seconds_remaining = rest_seconds;
            tracing::debug!("Step {} rest ({}s)", session.current_index + 1, rest_seconds);
            return Some(SessionEvent::PhaseChanged {
                index: session.current_index,
                phase: Phase::Rest,
                seconds: rest_seconds,
            });
        }

        let next_index = session.current_index + 1;
        let next_work = session.routine.get(next_index).map(|s| s.work_seconds);
        match next_work {
            Some(work_seconds) => {
                session.current_index = next_index;
                session.phase = Phase::Work;
                session.seconds_remaining = work_seconds;
                tracing::debug!("Step {} work ({}s)", next_index + 1, work_seconds);
                Some(SessionEvent::PhaseChanged {
                    index: next_index,
                    phase: Phase::Work,
                    seconds: work_seconds,
                })
            }
            None => {
                self.cues.cancel_all();
                self.finish()
            }
        }
    }

    /// Close the run and build its summary
    fn finish(&mut self) -> Option<SessionEvent> {
        let session = self.active.take()?;
        self.status = SessionStatus::Completed;

        let summary = CompletedSession::from_routine(session.routine, Utc::now());
        tracing::info!(
            "Session completed: {} steps, {}s planned, {}s timed, started {}",
            summary.routine.len(),
            summary.total_seconds,
            session.elapsed_seconds,
            session.started_at.to_rfc3339()
        );
        Some(SessionEvent::Completed(summary))
    }

    /// Speak the countdown if it is inside the cue window
    fn announce(&mut self) {
        let Some(seconds) = self.active.as_ref().map(|s| s.seconds_remaining) else {
            return;
        };
        if !CUE_WINDOW.contains(&seconds) {
            return;
        }

        let text = seconds.to_string();
        if let Err(e) = self.cues.speak(
            &text,
            &self.cue_settings.locale,
            self.cue_settings.rate,
        ) {
            tracing::warn!("Countdown cue failed: {}", e);
        }
    }
}
