use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::SessionController;
use crate::timer::{Clock, SystemClock, TimerStatus};

/// Which text input receives typed characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Description,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    fn new(kind: BannerKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    /// Redraw with the "saving" banner, then call [`App::submit`].
    Submit,
    OpenView(String),
    Quit,
}

/// Terminal front-end state wrapped around a [`SessionController`]
pub struct App<C: Clock = SystemClock> {
    pub controller: SessionController<C>,
    pub name_input: String,
    pub description_input: String,
    pub location_input: String,
    pub focus: Field,
    pub banner: Option<Banner>,
}

impl<C: Clock> App<C> {
    pub fn new(controller: SessionController<C>, owner_name: Option<String>) -> Self {
        Self {
            controller,
            name_input: owner_name.unwrap_or_default(),
            description_input: String::new(),
            location_input: String::new(),
            focus: Field::Name,
            banner: None,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.controller.status()
    }

    pub fn can_start(&self) -> bool {
        self.status() == TimerStatus::Idle
    }

    pub fn can_end(&self) -> bool {
        self.status() == TimerStatus::Running
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return AppAction::Quit,
            KeyCode::Char('c') if ctrl => return AppAction::Quit,
            KeyCode::Char('o') if ctrl => {
                return match self.controller.view_url() {
                    Some(url) => AppAction::OpenView(url),
                    None => {
                        self.banner = Some(Banner::new(
                            BannerKind::Info,
                            format!("the {} sink has nothing to view", self.controller.sink_name()),
                        ));
                        AppAction::Continue
                    }
                };
            }
            KeyCode::Char('d') if ctrl => {
                self.discard();
                return AppAction::Continue;
            }
            KeyCode::Char(_) if ctrl => return AppAction::Continue,
            _ => {}
        }

        match self.status() {
            TimerStatus::Idle => self.on_idle_key(key.code),
            TimerStatus::Running => self.on_running_key(key.code),
            TimerStatus::Ended => self.on_ended_key(key.code),
        }
    }

    fn on_idle_key(&mut self, code: KeyCode) -> AppAction {
        match code {
            KeyCode::Char(c) => self.name_input.push(c),
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Enter => self.start(),
            _ => {}
        }
        AppAction::Continue
    }

    fn on_running_key(&mut self, code: KeyCode) -> AppAction {
        if code == KeyCode::Enter {
            self.end();
        }
        AppAction::Continue
    }

    fn on_ended_key(&mut self, code: KeyCode) -> AppAction {
        match code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Field::Description => Field::Location,
                    _ => Field::Description,
                };
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.focused_input() {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.focused_input() {
                    input.pop();
                }
            }
            KeyCode::Enter => {
                self.banner = Some(Banner::new(
                    BannerKind::Info,
                    format!("saving to {}…", self.controller.sink_name()),
                ));
                return AppAction::Submit;
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Description => Some(&mut self.description_input),
            Field::Location => Some(&mut self.location_input),
            Field::Name => None,
        }
    }

    pub fn start(&mut self) {
        self.banner = Some(match self.controller.begin_session(&self.name_input) {
            Ok(()) => {
                self.name_input = self.controller.owner_name().unwrap_or_default().to_string();
                Banner::new(BannerKind::Success, "session started")
            }
            Err(e) => Banner::new(BannerKind::Error, e.to_string()),
        });
    }

    pub fn end(&mut self) {
        self.banner = Some(match self.controller.end_session() {
            Ok(summary) => {
                let pending = self.controller.pending_annotation();
                self.description_input = pending.description.clone();
                self.location_input = pending.location.clone();
                self.focus = Field::Description;
                Banner::new(
                    BannerKind::Success,
                    format!("session ended, duration {}", summary.duration_formatted),
                )
            }
            Err(e) => Banner::new(BannerKind::Error, e.to_string()),
        });
    }

    /// Hand the ended session to the sink. Blocks until the sink answers.
    pub fn submit(&mut self) {
        let undescribed = self.description_input.trim().is_empty();
        self.banner = Some(
            match self
                .controller
                .complete_session(&self.description_input, &self.location_input)
            {
                Ok(ack) => {
                    self.description_input.clear();
                    self.location_input.clear();
                    self.focus = Field::Name;
                    if undescribed {
                        Banner::new(
                            BannerKind::Warning,
                            format!("saved to {} without a description", ack.sink),
                        )
                    } else {
                        Banner::new(
                            BannerKind::Success,
                            format!("saved to {} ({})", ack.sink, ack.detail),
                        )
                    }
                }
                Err(e) => Banner::new(
                    BannerKind::Error,
                    format!("{e}; press enter to try again"),
                ),
            },
        );
    }

    pub fn discard(&mut self) {
        if self.status() == TimerStatus::Idle {
            return;
        }
        self.controller.discard_session();
        self.description_input.clear();
        self.location_input.clear();
        self.focus = Field::Name;
        self.banner = Some(Banner::new(BannerKind::Info, "session discarded"));
    }

    /// Key hints for the current state
    pub fn hints(&self) -> &'static str {
        match self.status() {
            TimerStatus::Idle => "(enter) start · (ctrl+o) view records · (esc) quit",
            TimerStatus::Running => "(enter) end · (ctrl+d) discard · (esc) quit",
            TimerStatus::Ended => "(tab) switch field · (enter) save · (ctrl+d) discard · (esc) quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::record::SessionRecord;
    use crate::sink::{Ack, RecordSink};
    use crate::timer::ManualClock;
    use chrono::Duration;

    struct OkSink;

    impl RecordSink for OkSink {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn submit(&self, _record: &SessionRecord) -> Result<Ack, SinkError> {
            Ok(Ack {
                sink: "stub",
                detail: "HTTP 200".into(),
            })
        }
    }

    fn app(require_description: bool) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        let controller = SessionController::with_clock(Box::new(OkSink), clock.clone())
            .require_description(require_description);
        (App::new(controller, None), clock)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App<ManualClock>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_prefilled_name() {
        let controller = SessionController::with_clock(Box::new(OkSink), ManualClock::default());
        let app = App::new(controller, Some("Dana".into()));
        assert_eq!(app.name_input, "Dana");
        assert_eq!(app.focus, Field::Name);
    }

    #[test]
    fn test_start_without_name_shows_error() {
        let (mut app, _) = app(true);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), AppAction::Continue);
        assert_eq!(app.status(), TimerStatus::Idle);
        assert_eq!(app.banner.as_ref().unwrap().kind, BannerKind::Error);
    }

    #[test]
    fn test_button_enablement_follows_state() {
        let (mut app, _) = app(true);
        assert!(app.can_start() && !app.can_end());

        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.can_start() && app.can_end());

        app.handle_key(key(KeyCode::Enter));
        assert!(!app.can_start() && !app.can_end());
    }

    #[test]
    fn test_typing_while_running_does_not_touch_name() {
        let (mut app, _) = app(true);
        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "xyz");
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.name_input, "Eve");
    }

    #[test]
    fn test_ended_form_editing() {
        let (mut app, clock) = app(true);
        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        clock.advance(Duration::seconds(65));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.focus, Field::Description);
        assert_eq!(app.banner.as_ref().unwrap().text, "session ended, duration 00:01:05");

        type_str(&mut app, "Notes!");
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "Lab");
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, Field::Description);

        assert_eq!(app.description_input, "Notes");
        assert_eq!(app.location_input, "Lab");
    }

    #[test]
    fn test_enter_on_ended_requests_submit() {
        let (mut app, _) = app(true);
        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "Docs");

        assert_eq!(app.handle_key(key(KeyCode::Enter)), AppAction::Submit);
        assert_eq!(app.banner.as_ref().unwrap().kind, BannerKind::Info);

        app.submit();
        assert_eq!(app.status(), TimerStatus::Idle);
        assert_eq!(app.banner.as_ref().unwrap().text, "saved to stub (HTTP 200)");
        assert!(app.description_input.is_empty());
        assert_eq!(app.name_input, "Eve");
    }

    #[test]
    fn test_submit_without_description_blocked_when_required() {
        let (mut app, _) = app(true);
        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "Home");
        app.submit();

        assert_eq!(app.status(), TimerStatus::Ended);
        let banner = app.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert!(banner.text.starts_with("description must not be empty"));
        assert_eq!(app.location_input, "Home");
    }

    #[test]
    fn test_submit_without_description_warns_when_optional() {
        let (mut app, _) = app(false);
        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        app.submit();

        assert_eq!(app.status(), TimerStatus::Idle);
        assert_eq!(app.banner.as_ref().unwrap().kind, BannerKind::Warning);
    }

    #[test]
    fn test_ctrl_keys() {
        let (mut app, _) = app(true);
        type_str(&mut app, "Eve");
        app.handle_key(ctrl('x'));
        assert_eq!(app.name_input, "Eve");

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(ctrl('d'));
        assert_eq!(app.status(), TimerStatus::Idle);
        assert_eq!(app.banner.as_ref().unwrap().text, "session discarded");

        assert_eq!(app.handle_key(ctrl('c')), AppAction::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), AppAction::Quit);
    }

    #[test]
    fn test_ctrl_o_without_view_url() {
        let (mut app, _) = app(true);
        assert_eq!(app.handle_key(ctrl('o')), AppAction::Continue);
        assert_eq!(app.banner.as_ref().unwrap().kind, BannerKind::Info);
    }

    #[test]
    fn test_hints_change_with_state() {
        let (mut app, _) = app(true);
        assert!(app.hints().contains("start"));
        type_str(&mut app, "Eve");
        app.handle_key(key(KeyCode::Enter));
        assert!(app.hints().contains("end"));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.hints().contains("save"));
    }
}
