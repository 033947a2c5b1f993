use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::timer::TimerStatus;

/// Default refresh cadence for the live elapsed display
pub const TICK_RATE: Duration = Duration::from_millis(250);

/// Raw input as it arrives from the terminal, or a tick when nothing did
#[derive(Clone, Debug)]
pub enum FocusEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// What the loop should do next
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Key(KeyEvent),
    /// Paint the screen again without touching session state.
    Repaint,
    /// Nothing on screen changed.
    Idle,
}

/// Events delivered over a channel. The terminal reader and tests feed the
/// same receiver, so the loop cannot tell them apart.
pub struct EventChannel {
    rx: Receiver<FocusEvent>,
}

impl EventChannel {
    pub fn new(rx: Receiver<FocusEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a thread that forwards key presses and resizes from crossterm.
    pub fn terminal() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // windows reports releases too; only presses drive the app
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(FocusEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(FocusEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self::new(rx)
    }
}

/// Advances the loop one event at a time, turning timeouts into ticks.
pub struct Runner {
    events: EventChannel,
    tick: Duration,
}

impl Runner {
    pub fn new(events: EventChannel, tick: Duration) -> Self {
        Self { events, tick }
    }

    /// Reads the real terminal at the default tick rate.
    pub fn terminal() -> Self {
        Self::new(EventChannel::terminal(), TICK_RATE)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Blocks up to one tick and returns the next event, or `Tick` on timeout.
    /// A closed channel also ticks, so the loop keeps painting the clock.
    pub fn step(&self) -> FocusEvent {
        match self.events.rx.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                FocusEvent::Tick
            }
        }
    }

    /// Like [`Runner::step`], but decides whether the screen needs painting.
    /// Ticks only matter while a session is running and its clock moves.
    pub fn next_frame(&self, status: TimerStatus) -> Frame {
        match self.step() {
            FocusEvent::Key(key) => Frame::Key(key),
            FocusEvent::Resize => Frame::Repaint,
            FocusEvent::Tick if status == TimerStatus::Running => Frame::Repaint,
            FocusEvent::Tick => Frame::Idle,
        }
    }
}
