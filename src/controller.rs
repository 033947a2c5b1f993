use chrono::Duration;
use log::{info, warn};

use crate::error::FocusError;
use crate::record::{SessionRecord, SessionSummary};
use crate::sink::{Ack, RecordSink};
use crate::timer::{Clock, SessionTimer, SystemClock, TimerStatus};

/// Description and location typed in after a session ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub description: String,
    pub location: String,
}

/// Drives one user's sessions: idle → running → ended → (saved) → idle.
///
/// A failed save leaves the ended session and its annotation untouched so the
/// same session can be submitted again.
pub struct SessionController<C: Clock = SystemClock> {
    timer: SessionTimer<C>,
    sink: Box<dyn RecordSink>,
    owner_name: Option<String>,
    annotation: Annotation,
    require_description: bool,
}

impl SessionController<SystemClock> {
    pub fn new(sink: Box<dyn RecordSink>) -> Self {
        Self::with_clock(sink, SystemClock)
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_clock(sink: Box<dyn RecordSink>, clock: C) -> Self {
        Self {
            timer: SessionTimer::with_clock(clock),
            sink,
            owner_name: None,
            annotation: Annotation::default(),
            require_description: true,
        }
    }

    /// When false an empty description is submitted as-is.
    pub fn require_description(mut self, required: bool) -> Self {
        self.require_description = required;
        self
    }

    pub fn requires_description(&self) -> bool {
        self.require_description
    }

    pub fn status(&self) -> TimerStatus {
        self.timer.status()
    }

    pub fn elapsed(&self) -> Result<Duration, FocusError> {
        self.timer.elapsed()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    pub fn pending_annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn view_url(&self) -> Option<String> {
        self.sink.view_url()
    }

    /// Start/end/duration of the ended session, if there is one.
    pub fn summary(&self) -> Option<SessionSummary> {
        match (self.timer.status(), self.timer.started_at(), self.timer.ended_at()) {
            (TimerStatus::Ended, Some(start), Some(end)) => Some(SessionSummary::new(start, end)),
            _ => None,
        }
    }

    pub fn begin_session(&mut self, owner_name: &str) -> Result<(), FocusError> {
        let owner_name = owner_name.trim();
        if owner_name.is_empty() {
            return Err(FocusError::Validation { field: "name" });
        }

        let started_at = self.timer.start()?;
        self.owner_name = Some(owner_name.to_string());
        self.annotation = Annotation::default();
        info!("session started for {owner_name} at {started_at}");
        Ok(())
    }

    pub fn end_session(&mut self) -> Result<SessionSummary, FocusError> {
        let ended_at = self.timer.stop()?;
        let started_at = self.timer.started_at().ok_or(FocusError::InvalidState)?;
        let summary = SessionSummary::new(started_at, ended_at);
        info!("session ended after {}", summary.duration_formatted);
        Ok(summary)
    }

    pub fn complete_session(
        &mut self,
        description: &str,
        location: &str,
    ) -> Result<Ack, FocusError> {
        let status = self.timer.status();
        let (started_at, ended_at) =
            match (status, self.timer.started_at(), self.timer.ended_at()) {
                (TimerStatus::Ended, Some(start), Some(end)) => (start, end),
                _ => {
                    return Err(FocusError::InvalidTransition {
                        action: "complete",
                        status,
                    })
                }
            };

        // keep what was typed even if the save below fails
        self.annotation = Annotation {
            description: description.to_string(),
            location: location.to_string(),
        };

        if self.require_description && description.trim().is_empty() {
            return Err(FocusError::Validation {
                field: "description",
            });
        }

        let owner_name = self.owner_name.as_deref().unwrap_or_default();
        let record = SessionRecord::new(owner_name, &started_at, &ended_at, description, location);

        match self.sink.submit(&record) {
            Ok(ack) => {
                info!(
                    "session saved to {} ({}): {}",
                    ack.sink, ack.detail, record.duration_formatted
                );
                self.timer.reset();
                self.annotation = Annotation::default();
                Ok(ack)
            }
            Err(err) => {
                warn!("saving session to {} failed: {err}", self.sink.name());
                Err(err.into())
            }
        }
    }

    /// Drop the current session without saving it.
    pub fn discard_session(&mut self) {
        if self.timer.status() != TimerStatus::Idle {
            info!("session discarded while {}", self.timer.status());
        }
        self.timer.reset();
        self.annotation = Annotation::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SinkError, SinkErrorKind};
    use crate::timer::ManualClock;
    use assert_matches::assert_matches;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Fails the first `failures` submissions, then succeeds
    struct FlakySink {
        failures: Rc<Cell<u32>>,
        accepted: Rc<Cell<u32>>,
    }

    impl RecordSink for FlakySink {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn submit(&self, _record: &SessionRecord) -> Result<Ack, SinkError> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(SinkError::new(SinkErrorKind::Network, "connection reset"));
            }
            self.accepted.set(self.accepted.get() + 1);
            Ok(Ack {
                sink: "flaky",
                detail: "ok".into(),
            })
        }
    }

    fn controller(
        failures: u32,
    ) -> (SessionController<ManualClock>, ManualClock, Rc<Cell<u32>>) {
        let clock = ManualClock::default();
        let accepted = Rc::new(Cell::new(0));
        let sink = FlakySink {
            failures: Rc::new(Cell::new(failures)),
            accepted: accepted.clone(),
        };
        (
            SessionController::with_clock(Box::new(sink), clock.clone()),
            clock,
            accepted,
        )
    }

    #[test]
    fn test_begin_requires_name() {
        let (mut ctl, _, _) = controller(0);
        assert_matches!(
            ctl.begin_session(""),
            Err(FocusError::Validation { field: "name" })
        );
        assert_matches!(ctl.begin_session("   "), Err(FocusError::Validation { .. }));
        assert_eq!(ctl.status(), TimerStatus::Idle);

        ctl.begin_session("Alice").unwrap();
        assert_eq!(ctl.status(), TimerStatus::Running);
        assert_eq!(ctl.owner_name(), Some("Alice"));
    }

    #[test]
    fn test_begin_twice_is_invalid_transition() {
        let (mut ctl, _, _) = controller(0);
        ctl.begin_session("Alice").unwrap();
        assert_matches!(
            ctl.begin_session("Alice"),
            Err(FocusError::InvalidTransition { action: "start", .. })
        );
        assert_eq!(ctl.status(), TimerStatus::Running);
    }

    #[test]
    fn test_end_requires_running() {
        let (mut ctl, _, _) = controller(0);
        assert_matches!(ctl.end_session(), Err(FocusError::InvalidTransition { .. }));
    }

    #[test]
    fn test_end_returns_summary() {
        let (mut ctl, clock, _) = controller(0);
        ctl.begin_session("Alice").unwrap();
        clock.advance(Duration::seconds(3661));
        let summary = ctl.end_session().unwrap();

        assert_eq!(summary.duration_formatted, "01:01:01");
        assert_eq!(ctl.status(), TimerStatus::Ended);
        assert_eq!(ctl.summary(), Some(summary));
    }

    #[test]
    fn test_complete_requires_ended() {
        let (mut ctl, _, accepted) = controller(0);
        assert_matches!(
            ctl.complete_session("x", "y"),
            Err(FocusError::InvalidTransition {
                action: "complete",
                status: TimerStatus::Idle
            })
        );
        ctl.begin_session("Alice").unwrap();
        assert_matches!(
            ctl.complete_session("x", "y"),
            Err(FocusError::InvalidTransition {
                status: TimerStatus::Running,
                ..
            })
        );
        assert_eq!(accepted.get(), 0);
    }

    #[test]
    fn test_empty_description_blocked_by_default() {
        let (mut ctl, _, accepted) = controller(0);
        ctl.begin_session("Alice").unwrap();
        ctl.end_session().unwrap();

        assert_matches!(
            ctl.complete_session("  ", "Home"),
            Err(FocusError::Validation {
                field: "description"
            })
        );
        assert_eq!(ctl.status(), TimerStatus::Ended);
        assert_eq!(ctl.pending_annotation().location, "Home");
        assert_eq!(accepted.get(), 0);
    }

    #[test]
    fn test_empty_description_allowed_when_not_required() {
        let (ctl, _, accepted) = controller(0);
        let mut ctl = ctl.require_description(false);
        ctl.begin_session("Alice").unwrap();
        ctl.end_session().unwrap();

        ctl.complete_session("", "").unwrap();
        assert_eq!(ctl.status(), TimerStatus::Idle);
        assert_eq!(accepted.get(), 1);
    }

    #[test]
    fn test_failed_submit_preserves_session_and_retry_succeeds() {
        let (mut ctl, clock, accepted) = controller(1);
        ctl.begin_session("Alice").unwrap();
        clock.advance(Duration::seconds(300));
        let summary = ctl.end_session().unwrap();

        let err = ctl.complete_session("Review", "Cafe").unwrap_err();
        assert_matches!(err, FocusError::Sink(SinkError { kind: SinkErrorKind::Network, .. }));
        assert_eq!(ctl.status(), TimerStatus::Ended);
        assert_eq!(ctl.summary(), Some(summary));
        assert_eq!(
            ctl.pending_annotation(),
            &Annotation {
                description: "Review".into(),
                location: "Cafe".into()
            }
        );

        let ack = ctl.complete_session("Review", "Cafe").unwrap();
        assert_eq!(ack.sink, "flaky");
        assert_eq!(ctl.status(), TimerStatus::Idle);
        assert_eq!(ctl.pending_annotation(), &Annotation::default());
        assert_eq!(accepted.get(), 1);
    }

    #[test]
    fn test_owner_name_survives_completion() {
        let (mut ctl, _, _) = controller(0);
        ctl.begin_session(" Alice ").unwrap();
        ctl.end_session().unwrap();
        ctl.complete_session("Work", "Home").unwrap();
        assert_eq!(ctl.owner_name(), Some("Alice"));
    }

    #[test]
    fn test_discard_from_any_state() {
        let (mut ctl, _, accepted) = controller(0);
        ctl.discard_session();
        assert_eq!(ctl.status(), TimerStatus::Idle);

        ctl.begin_session("Alice").unwrap();
        ctl.discard_session();
        assert_eq!(ctl.status(), TimerStatus::Idle);

        ctl.begin_session("Alice").unwrap();
        ctl.end_session().unwrap();
        let _ = ctl.complete_session("", "Office");
        ctl.discard_session();
        assert_eq!(ctl.status(), TimerStatus::Idle);
        assert_eq!(ctl.pending_annotation(), &Annotation::default());
        assert_eq!(accepted.get(), 0);
    }

    #[test]
    fn test_elapsed_through_controller() {
        let (mut ctl, clock, _) = controller(0);
        assert_matches!(ctl.elapsed(), Err(FocusError::InvalidState));
        ctl.begin_session("Alice").unwrap();
        clock.advance(Duration::seconds(12));
        assert_eq!(ctl.elapsed().unwrap(), Duration::seconds(12));
    }
}
