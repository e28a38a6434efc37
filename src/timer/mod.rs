//! Sun exposure timer
//!
//! A state machine that accumulates exposure time against a UV-derived burn
//! threshold and runs an independent sunscreen-reapplication countdown.
//!
//! Elapsed time is reconstructed from timestamps on every observation rather
//! than counted tick by tick, so the host process may be suspended between
//! calls without losing exposure.
//!
//! ```text
//! NotStarted ──start──▶ Running ◀──resume/start── Paused
//!                        │  ▲  └──────pause──────▶
//!          apply_sunscreen  resume/start
//!                        ▼  │
//!                  SunscreenApplied
//! Running | Paused | SunscreenApplied ──(burn threshold)──▶ Exceeded
//! any ──reset──▶ NotStarted
//! ```

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::config::TimerConfig;
use crate::error::UvError;
use crate::types::UvRiskAssessment;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Primary phase of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    NotStarted,
    Running,
    Paused,
    SunscreenApplied,
    Exceeded,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::NotStarted => "not_started",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::SunscreenApplied => "sunscreen_applied",
            TimerPhase::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-initiated operation on the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerAction {
    Start,
    Pause,
    ApplySunscreen,
    Resume,
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimerAction::Start => "start",
            TimerAction::Pause => "pause",
            TimerAction::ApplySunscreen => "apply sunscreen",
            TimerAction::Resume => "resume",
        })
    }
}

/// An operation that is not allowed from the current phase.
///
/// The timer is left untouched when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: cannot {action} while {from}")]
pub struct TransitionError {
    pub from: TimerPhase,
    pub action: TimerAction,
}

/// Outcome of an accepted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TimerPhase,
    pub to: TimerPhase,
}

impl Transition {
    /// True when the operation was accepted but changed nothing (e.g. start while running)
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// One-shot signals raised while observing the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerEvent {
    /// Exposure crossed the burn threshold
    Exceeded,
    /// The sunscreen reapplication deadline passed
    ReapplyDue,
    /// Local midnight passed and the daily total was reset
    DayRolledOver,
}

/// Observable and persistable timer state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: TimerPhase,
    /// Start of the currently accruing segment, if exposure is accruing
    pub session_start: Option<DateTime<Utc>>,
    /// Session exposure as of the last observation
    pub elapsed_seconds: i64,
    /// Daily exposure across sessions as of the last observation
    pub total_exposure_seconds_today: i64,
    pub last_sunscreen_application: Option<DateTime<Utc>>,
    pub sunscreen_reapply_deadline: Option<DateTime<Utc>>,
    pub current_adjusted_uv: u32,
    /// Minutes to burn at the current UV; `None` when there is no UV
    pub time_to_burn_minutes: Option<f64>,
    /// Local date the daily total belongs to
    pub exposure_day: NaiveDate,
    /// Session exposure banked before `session_start`
    banked_seconds: i64,
    /// Daily exposure banked before `session_start`
    banked_today_seconds: i64,
    exceeded_signalled: bool,
    reapply_signalled: bool,
    /// Midnight passed since the last tick
    #[serde(default)]
    day_rolled_pending: bool,
}

impl TimerState {
    fn new(exposure_day: NaiveDate) -> Self {
        Self {
            phase: TimerPhase::NotStarted,
            session_start: None,
            elapsed_seconds: 0,
            total_exposure_seconds_today: 0,
            last_sunscreen_application: None,
            sunscreen_reapply_deadline: None,
            current_adjusted_uv: 0,
            time_to_burn_minutes: None,
            exposure_day,
            banked_seconds: 0,
            banked_today_seconds: 0,
            exceeded_signalled: false,
            reapply_signalled: false,
            day_rolled_pending: false,
        }
    }

    /// Whether the burn clock is currently accruing
    pub fn is_accruing(&self) -> bool {
        self.session_start.is_some()
    }
}

/// Minutes of unprotected exposure to burn at an adjusted UV index.
///
/// Infinite when there is no UV.
pub fn time_to_burn_minutes(adjusted_uv: u32) -> f64 {
    time_to_burn_minutes_with(crate::config::DEFAULT_BURN_REFERENCE_MINUTES, adjusted_uv)
}

/// [`time_to_burn_minutes`] with a custom reference (minutes at UV 1).
pub fn time_to_burn_minutes_with(reference_minutes: f64, adjusted_uv: u32) -> f64 {
    if adjusted_uv == 0 {
        f64::INFINITY
    } else {
        reference_minutes / adjusted_uv as f64
    }
}

fn whole_seconds(delta: Duration) -> i64 {
    delta.num_seconds().max(0)
}

/// Exposure timer state machine.
///
/// Single owner: every operation takes `&mut self`. Share it behind a lock
/// if several contexts need to drive it.
pub struct ExposureTimer<C: Clock = SystemClock> {
    clock: C,
    config: TimerConfig,
    offset: FixedOffset,
    state: TimerState,
}

impl ExposureTimer<SystemClock> {
    /// Timer on the system clock with default settings
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock, TimerConfig::default())
    }
}

impl<C: Clock> ExposureTimer<C> {
    pub fn new(clock: C, config: TimerConfig) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_seconds).unwrap_or_else(|| Utc.fix());
        let today = clock.now().with_timezone(&offset).date_naive();
        Self {
            clock,
            config,
            offset,
            state: TimerState::new(today),
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase
    }

    /// State as of the last observation
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Observe the clock and return the refreshed state
    pub fn snapshot(&mut self) -> TimerState {
        let now = self.clock.now();
        self.roll_over(now);
        self.refresh(now);
        self.state.clone()
    }

    /// Begin or continue accruing exposure.
    pub fn start(&mut self) -> Result<Transition, TransitionError> {
        let now = self.clock.now();
        self.roll_over(now);
        let from = self.state.phase;
        match from {
            TimerPhase::Running => Ok(Transition { from, to: from }),
            TimerPhase::NotStarted | TimerPhase::Paused | TimerPhase::SunscreenApplied => {
                if self.state.session_start.is_none() {
                    self.state.session_start = Some(now);
                }
                Ok(self.enter(from, TimerPhase::Running, now))
            }
            TimerPhase::Exceeded => Err(self.reject(TimerAction::Start)),
        }
    }

    /// Freeze the exposure accumulator.
    pub fn pause(&mut self) -> Result<Transition, TransitionError> {
        let now = self.clock.now();
        self.roll_over(now);
        let from = self.state.phase;
        match from {
            TimerPhase::Running => {
                self.bank(now);
                Ok(self.enter(from, TimerPhase::Paused, now))
            }
            _ => Err(self.reject(TimerAction::Pause)),
        }
    }

    /// Record a sunscreen application and start the reapplication countdown.
    ///
    /// Does not change the UV index or the burn clock: exposure keeps
    /// accruing if it was accruing.
    pub fn apply_sunscreen(&mut self) -> Result<Transition, TransitionError> {
        let now = self.clock.now();
        self.roll_over(now);
        let from = self.state.phase;
        match from {
            TimerPhase::Running | TimerPhase::Paused => {
                self.state.last_sunscreen_application = Some(now);
                self.state.sunscreen_reapply_deadline =
                    Some(now + Duration::seconds(self.config.reapply_interval_seconds));
                self.state.reapply_signalled = false;
                Ok(self.enter(from, TimerPhase::SunscreenApplied, now))
            }
            _ => Err(self.reject(TimerAction::ApplySunscreen)),
        }
    }

    /// Return to `Running` after a pause or a sunscreen application.
    pub fn resume(&mut self) -> Result<Transition, TransitionError> {
        let now = self.clock.now();
        self.roll_over(now);
        let from = self.state.phase;
        match from {
            TimerPhase::SunscreenApplied | TimerPhase::Paused => {
                if self.state.session_start.is_none() {
                    self.state.session_start = Some(now);
                }
                Ok(self.enter(from, TimerPhase::Running, now))
            }
            _ => Err(self.reject(TimerAction::Resume)),
        }
    }

    /// Observe the clock: refresh elapsed time and raise due signals.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        let now = self.clock.now();
        self.roll_over(now);
        self.refresh(now);

        let mut events = Vec::new();
        if std::mem::take(&mut self.state.day_rolled_pending) {
            events.push(TimerEvent::DayRolledOver);
        }

        let can_exceed = matches!(
            self.state.phase,
            TimerPhase::Running | TimerPhase::Paused | TimerPhase::SunscreenApplied
        );
        if can_exceed {
            if let Some(threshold) = self.burn_threshold_seconds() {
                if self.state.elapsed_seconds as f64 >= threshold {
                    let from = self.state.phase;
                    self.enter(from, TimerPhase::Exceeded, now);
                }
            }
        }
        if self.state.phase == TimerPhase::Exceeded && !self.state.exceeded_signalled {
            self.state.exceeded_signalled = true;
            tracing::warn!(
                elapsed_seconds = self.state.elapsed_seconds,
                adjusted_uv = self.state.current_adjusted_uv,
                "burn threshold exceeded"
            );
            events.push(TimerEvent::Exceeded);
        }

        if let Some(deadline) = self.state.sunscreen_reapply_deadline {
            if now >= deadline && !self.state.reapply_signalled {
                self.state.reapply_signalled = true;
                tracing::info!(%deadline, "sunscreen reapplication due");
                events.push(TimerEvent::ReapplyDue);
            }
        }

        events
    }

    /// Return to `NotStarted` from any phase.
    ///
    /// Clears the session and the reapplication countdown; the daily total
    /// keeps whatever was accrued.
    pub fn reset(&mut self) -> Transition {
        let now = self.clock.now();
        self.roll_over(now);
        self.bank(now);
        let from = self.state.phase;

        self.state.banked_seconds = 0;
        self.state.elapsed_seconds = 0;
        self.state.exceeded_signalled = false;
        self.cancel_reapply_reminder();

        self.enter(from, TimerPhase::NotStarted, now)
    }

    /// Cancel the reapplication countdown. Returns whether one was pending.
    pub fn cancel_reapply_reminder(&mut self) -> bool {
        let pending =
            self.state.sunscreen_reapply_deadline.is_some() && !self.state.reapply_signalled;
        self.state.sunscreen_reapply_deadline = None;
        self.state.reapply_signalled = false;
        pending
    }

    /// Update the UV index the burn threshold is derived from.
    pub fn set_adjusted_uv(&mut self, adjusted_uv: u32) {
        let minutes = time_to_burn_minutes_with(self.config.burn_reference_minutes, adjusted_uv);
        self.state.current_adjusted_uv = adjusted_uv;
        self.state.time_to_burn_minutes = minutes.is_finite().then_some(minutes);
        tracing::debug!(
            adjusted_uv,
            time_to_burn_minutes = ?self.state.time_to_burn_minutes,
            "timer uv updated"
        );
    }

    /// Update the UV index from an assessment.
    pub fn apply_assessment(&mut self, assessment: &UvRiskAssessment) {
        self.set_adjusted_uv(assessment.adjusted_uv_index);
    }

    /// Seconds of exposure left before the burn threshold, if UV is present
    pub fn remaining_burn_seconds(&mut self) -> Option<i64> {
        let now = self.clock.now();
        self.refresh(now);
        let threshold = self.burn_threshold_seconds()?;
        Some((threshold.ceil() as i64 - self.state.elapsed_seconds).max(0))
    }

    /// Seconds until sunscreen should be reapplied, if a countdown is active
    pub fn reapply_remaining_seconds(&self) -> Option<i64> {
        let deadline = self.state.sunscreen_reapply_deadline?;
        Some(whole_seconds(deadline - self.clock.now()))
    }

    /// Serialize the state for persistence
    pub fn save_state(&self) -> Result<String, UvError> {
        serde_json::to_string(&self.state).map_err(|e| UvError::EncodingError(e.to_string()))
    }

    /// Restore persisted state, applying a midnight reset if the day changed.
    pub fn load_state(&mut self, json: &str) -> Result<(), UvError> {
        self.state =
            serde_json::from_str(json).map_err(|e| UvError::ParseError(e.to_string()))?;
        let now = self.clock.now();
        self.roll_over(now);
        self.refresh(now);
        Ok(())
    }

    fn burn_threshold_seconds(&self) -> Option<f64> {
        self.state
            .time_to_burn_minutes
            .filter(|m| m.is_finite())
            .map(|m| m * 60.0)
    }

    fn enter(&mut self, from: TimerPhase, to: TimerPhase, now: DateTime<Utc>) -> Transition {
        self.state.phase = to;
        self.refresh(now);
        if from != to {
            tracing::info!(
                %from,
                %to,
                elapsed_seconds = self.state.elapsed_seconds,
                "timer transition"
            );
        }
        Transition { from, to }
    }

    fn reject(&self, action: TimerAction) -> TransitionError {
        let error = TransitionError {
            from: self.state.phase,
            action,
        };
        tracing::warn!(%error, "rejected timer operation");
        error
    }

    /// Recompute derived totals from timestamps
    fn refresh(&mut self, now: DateTime<Utc>) {
        let running = self
            .state
            .session_start
            .map(|start| whole_seconds(now - start))
            .unwrap_or(0);
        self.state.elapsed_seconds = self.state.banked_seconds + running;
        self.state.total_exposure_seconds_today = self.state.banked_today_seconds + running;
    }

    /// Close the accruing segment into the banked totals
    fn bank(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.state.session_start.take() {
            let delta = whole_seconds(now - start);
            self.state.banked_seconds += delta;
            self.state.banked_today_seconds += delta;
        }
        self.refresh(now);
    }

    /// Reset the daily total when local midnight has passed.
    ///
    /// The `DayRolledOver` signal stays pending until the next `tick`.
    fn roll_over(&mut self, now: DateTime<Utc>) {
        let today = now.with_timezone(&self.offset).date_naive();
        if today <= self.state.exposure_day {
            return;
        }

        let local_midnight = today.and_time(NaiveTime::MIN);
        let midnight = Utc.from_utc_datetime(&local_midnight)
            - Duration::seconds(self.offset.local_minus_utc() as i64);

        // Split an accruing segment so only post-midnight exposure counts today.
        if let Some(start) = self.state.session_start {
            if start < midnight {
                self.state.banked_seconds += whole_seconds(midnight - start);
                self.state.session_start = Some(midnight);
            }
        }
        self.state.banked_today_seconds = 0;
        self.state.exposure_day = today;
        self.state.day_rolled_pending = true;
        self.refresh(now);

        tracing::info!(%today, "daily exposure total reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    fn make_timer(uv: u32) -> (ExposureTimer<ManualClock>, ManualClock) {
        let clock = ManualClock::new(start_time());
        let mut timer = ExposureTimer::new(clock.clone(), TimerConfig::default());
        timer.set_adjusted_uv(uv);
        (timer, clock)
    }

    #[test]
    fn test_time_to_burn_minutes() {
        assert!(time_to_burn_minutes(0).is_infinite());
        assert_eq!(time_to_burn_minutes(1), 100.0);
        assert_eq!(time_to_burn_minutes(10), 10.0);
        assert!((time_to_burn_minutes(11) - 9.09).abs() < 0.01);
    }

    #[test]
    fn test_start_pause_resume_accumulates() {
        let (mut timer, clock) = make_timer(5);

        timer.start().unwrap();
        clock.advance_seconds(300);
        timer.pause().unwrap();
        assert_eq!(timer.state().elapsed_seconds, 300);

        // Time spent paused does not count.
        clock.advance_seconds(1000);
        timer.tick();
        assert_eq!(timer.state().elapsed_seconds, 300);

        timer.resume().unwrap();
        clock.advance_seconds(120);
        timer.pause().unwrap();
        assert_eq!(timer.state().elapsed_seconds, 420);
        assert_eq!(timer.state().total_exposure_seconds_today, 420);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let (mut timer, clock) = make_timer(5);
        timer.start().unwrap();
        clock.advance_seconds(60);

        let transition = timer.start().unwrap();

        assert!(transition.is_noop());
        assert_eq!(timer.state().session_start, Some(start_time()));
    }

    #[test]
    fn test_burn_threshold() {
        let (mut timer, clock) = make_timer(10);
        timer.start().unwrap();

        clock.advance_seconds(599);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.phase(), TimerPhase::Running);

        clock.advance_seconds(2);
        assert_eq!(timer.tick(), vec![TimerEvent::Exceeded]);
        assert_eq!(timer.phase(), TimerPhase::Exceeded);

        // One-shot: a later tick stays quiet.
        clock.advance_seconds(60);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.state().elapsed_seconds, 661);
    }

    #[test]
    fn test_zero_uv_never_exceeds() {
        let (mut timer, clock) = make_timer(0);
        timer.start().unwrap();
        clock.advance_seconds(10 * 3600);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.phase(), TimerPhase::Running);
        assert_eq!(timer.remaining_burn_seconds(), None);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let (mut timer, _clock) = make_timer(5);

        let err = timer.pause().unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: TimerPhase::NotStarted,
                action: TimerAction::Pause
            }
        );
        assert!(timer.resume().is_err());
        assert!(timer.apply_sunscreen().is_err());
        assert_eq!(timer.phase(), TimerPhase::NotStarted);
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot pause while not_started"
        );
    }

    #[test]
    fn test_sunscreen_does_not_stop_exposure() {
        let (mut timer, clock) = make_timer(4);
        timer.start().unwrap();
        clock.advance_seconds(600);

        timer.apply_sunscreen().unwrap();
        assert_eq!(timer.phase(), TimerPhase::SunscreenApplied);
        assert_eq!(
            timer.state().sunscreen_reapply_deadline,
            Some(start_time() + Duration::seconds(600 + 7200))
        );

        clock.advance_seconds(300);
        timer.tick();
        assert_eq!(timer.state().elapsed_seconds, 900);
        assert_eq!(timer.state().current_adjusted_uv, 4);

        timer.resume().unwrap();
        clock.advance_seconds(100);
        timer.tick();
        assert_eq!(timer.state().elapsed_seconds, 1000);
    }

    #[test]
    fn test_reapply_reminder_fires_once() {
        let (mut timer, clock) = make_timer(0);
        timer.start().unwrap();
        timer.apply_sunscreen().unwrap();
        timer.resume().unwrap();

        clock.advance_seconds(7199);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.reapply_remaining_seconds(), Some(1));

        clock.advance_seconds(1);
        assert_eq!(timer.tick(), vec![TimerEvent::ReapplyDue]);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.phase(), TimerPhase::Running);
    }

    #[test]
    fn test_cancel_reapply_reminder() {
        let (mut timer, clock) = make_timer(0);
        timer.start().unwrap();
        timer.apply_sunscreen().unwrap();

        assert!(timer.cancel_reapply_reminder());
        assert_eq!(timer.reapply_remaining_seconds(), None);

        clock.advance_seconds(8000);
        assert!(!timer.tick().contains(&TimerEvent::ReapplyDue));
        assert_eq!(timer.phase(), TimerPhase::SunscreenApplied);
    }

    #[test]
    fn test_reset_keeps_daily_total() {
        let (mut timer, clock) = make_timer(10);
        timer.start().unwrap();
        clock.advance_seconds(700);
        timer.tick();
        assert_eq!(timer.phase(), TimerPhase::Exceeded);

        let transition = timer.reset();

        assert_eq!(transition.from, TimerPhase::Exceeded);
        assert_eq!(timer.phase(), TimerPhase::NotStarted);
        assert_eq!(timer.state().elapsed_seconds, 0);
        assert_eq!(timer.state().total_exposure_seconds_today, 700);
        assert!(timer.state().session_start.is_none());

        // A fresh session can exceed (and signal) again.
        timer.start().unwrap();
        clock.advance_seconds(601);
        assert_eq!(timer.tick(), vec![TimerEvent::Exceeded]);
        assert_eq!(timer.state().total_exposure_seconds_today, 1301);
    }

    #[test]
    fn test_exceeded_rejects_start() {
        let (mut timer, clock) = make_timer(10);
        timer.start().unwrap();
        clock.advance_seconds(601);
        timer.tick();

        assert!(timer.start().is_err());
        assert!(timer.pause().is_err());
        assert_eq!(
            timer.resume().unwrap_err(),
            TransitionError {
                from: TimerPhase::Exceeded,
                action: TimerAction::Resume
            }
        );
        assert!(timer.apply_sunscreen().is_err());
        assert_eq!(timer.phase(), TimerPhase::Exceeded);
        assert_eq!(timer.state().sunscreen_reapply_deadline, None);
    }

    #[test]
    fn test_sunscreen_applied_can_exceed() {
        let (mut timer, clock) = make_timer(10);
        timer.start().unwrap();
        clock.advance_seconds(300);
        timer.apply_sunscreen().unwrap();

        clock.advance_seconds(299);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.phase(), TimerPhase::SunscreenApplied);

        clock.advance_seconds(2);
        assert_eq!(timer.tick(), vec![TimerEvent::Exceeded]);
        assert_eq!(timer.phase(), TimerPhase::Exceeded);
        assert_eq!(timer.state().elapsed_seconds, 601);
    }

    #[test]
    fn test_paused_exceeds_when_uv_rises() {
        let (mut timer, clock) = make_timer(1);
        timer.start().unwrap();
        clock.advance_seconds(700);
        timer.pause().unwrap();
        assert!(timer.tick().is_empty());

        timer.set_adjusted_uv(10);
        clock.advance_seconds(60);

        assert_eq!(timer.tick(), vec![TimerEvent::Exceeded]);
        assert_eq!(timer.phase(), TimerPhase::Exceeded);
        assert_eq!(timer.state().elapsed_seconds, 700);
    }

    #[test]
    fn test_midnight_resets_daily_total_and_splits_session() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 23, 50, 0).unwrap());
        let mut timer = ExposureTimer::new(clock.clone(), TimerConfig::default());
        timer.set_adjusted_uv(1);
        timer.start().unwrap();

        clock.advance_seconds(20 * 60);
        let events = timer.tick();

        assert_eq!(events, vec![TimerEvent::DayRolledOver]);
        assert_eq!(timer.state().elapsed_seconds, 1200);
        assert_eq!(timer.state().total_exposure_seconds_today, 600);
        assert_eq!(
            timer.state().exposure_day,
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap()
        );
    }

    #[test]
    fn test_rollover_during_pause_is_reported_on_next_tick() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 23, 50, 0).unwrap());
        let mut timer = ExposureTimer::new(clock.clone(), TimerConfig::default());
        timer.set_adjusted_uv(1);
        timer.start().unwrap();

        clock.advance_seconds(20 * 60);
        timer.pause().unwrap();
        assert_eq!(timer.state().total_exposure_seconds_today, 600);

        assert_eq!(timer.tick(), vec![TimerEvent::DayRolledOver]);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.state().elapsed_seconds, 1200);
    }

    #[test]
    fn test_midnight_uses_local_offset() {
        // 22:30 UTC is already 00:30 the next day at UTC+2.
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 21, 0, 0).unwrap());
        let config = TimerConfig {
            utc_offset_seconds: 2 * 3600,
            ..TimerConfig::default()
        };
        let mut timer = ExposureTimer::new(clock.clone(), config);
        timer.start().unwrap();
        clock.advance_seconds(90 * 60);

        assert_eq!(timer.tick(), vec![TimerEvent::DayRolledOver]);
        assert_eq!(timer.state().total_exposure_seconds_today, 30 * 60);
    }

    #[test]
    fn test_state_persistence_roundtrip() {
        let (mut timer, clock) = make_timer(6);
        timer.start().unwrap();
        clock.advance_seconds(240);
        timer.pause().unwrap();
        let saved = timer.save_state().unwrap();

        let mut restored = ExposureTimer::new(clock.clone(), TimerConfig::default());
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.phase(), TimerPhase::Paused);
        assert_eq!(restored.state().elapsed_seconds, 240);
        assert_eq!(restored.state().current_adjusted_uv, 6);

        restored.resume().unwrap();
        clock.advance_seconds(60);
        restored.pause().unwrap();
        assert_eq!(restored.state().total_exposure_seconds_today, 300);
    }

    #[test]
    fn test_restore_on_next_day_resets_total() {
        let (mut timer, clock) = make_timer(3);
        timer.start().unwrap();
        clock.advance_seconds(600);
        timer.pause().unwrap();
        let saved = timer.save_state().unwrap();

        clock.advance(Duration::days(1));
        let mut restored = ExposureTimer::new(clock.clone(), TimerConfig::default());
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.state().total_exposure_seconds_today, 0);
        assert_eq!(restored.state().elapsed_seconds, 600);
        assert_eq!(restored.tick(), vec![TimerEvent::DayRolledOver]);
    }

    #[test]
    fn test_invalid_saved_state() {
        let (mut timer, _clock) = make_timer(3);
        assert!(timer.load_state("{ not json").is_err());
        assert_eq!(timer.phase(), TimerPhase::NotStarted);
    }
}
