use chrono::{DateTime, Duration, Local};
use std::sync::{Arc, Mutex};

use crate::error::FocusError;

/// Source of wall-clock time for the timer
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Production clock reading the local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-driven clock for tests and headless runs. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now = *now + by;
        }
    }

    pub fn set(&self, to: DateTime<Local>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Ended,
}

/// One tracked interval: idle, running since `started_at`, or ended with both
/// timestamps frozen.
#[derive(Debug)]
pub struct SessionTimer<C: Clock = SystemClock> {
    clock: C,
    status: TimerStatus,
    started_at: Option<DateTime<Local>>,
    ended_at: Option<DateTime<Local>>,
}

impl SessionTimer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SessionTimer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionTimer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            status: TimerStatus::Idle,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Local>> {
        self.ended_at
    }

    pub fn start(&mut self) -> Result<DateTime<Local>, FocusError> {
        if self.status != TimerStatus::Idle {
            return Err(FocusError::InvalidTransition {
                action: "start",
                status: self.status,
            });
        }

        let now = self.clock.now();
        self.started_at = Some(now);
        self.ended_at = None;
        self.status = TimerStatus::Running;
        Ok(now)
    }

    pub fn stop(&mut self) -> Result<DateTime<Local>, FocusError> {
        let started_at = match (self.status, self.started_at) {
            (TimerStatus::Running, Some(started_at)) => started_at,
            _ => {
                return Err(FocusError::InvalidTransition {
                    action: "stop",
                    status: self.status,
                })
            }
        };

        // a clock stepping backwards must not produce an end before the start
        let now = self.clock.now().max(started_at);
        self.ended_at = Some(now);
        self.status = TimerStatus::Ended;
        Ok(now)
    }

    /// Live `now - start` while running, frozen `end - start` once ended.
    pub fn elapsed(&self) -> Result<Duration, FocusError> {
        match (self.status, self.started_at, self.ended_at) {
            (TimerStatus::Running, Some(start), _) => {
                Ok((self.clock.now() - start).max(Duration::zero()))
            }
            (TimerStatus::Ended, Some(start), Some(end)) => Ok(end - start),
            _ => Err(FocusError::InvalidState),
        }
    }

    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.started_at = None;
        self.ended_at = None;
    }
}
