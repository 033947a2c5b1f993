use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use focus::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, SinkKind},
    controller::SessionController,
    logging,
    runtime::{Frame, Runner},
    sink,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use webbrowser::Browser;

/// track work sessions and save them to a google form or sheet
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Start a session, end it, say what you did and where, and the record is posted to a Google Form or appended to a Google Sheet."
)]
pub struct Cli {
    /// your name, pre-filled in the name field
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// where finished sessions are saved
    #[clap(short = 's', long, value_enum)]
    sink: Option<SinkKind>,

    /// path to the JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// spreadsheet share URL (sheet sink)
    #[clap(long)]
    spreadsheet_url: Option<String>,

    /// worksheet to append rows to (sheet sink)
    #[clap(long)]
    worksheet: Option<String>,

    /// google form id (form sink)
    #[clap(long)]
    form_id: Option<String>,

    /// request timeout in seconds for saving a session
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// save sessions even when no description was entered
    #[clap(long)]
    allow_empty_description: bool,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Command-line flags win over the config file
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(name) = &self.name {
            cfg.owner_name = Some(name.clone());
        }
        if let Some(sink) = self.sink {
            cfg.sink = sink;
        }
        if let Some(url) = &self.spreadsheet_url {
            cfg.sheet.spreadsheet_url = url.clone();
        }
        if let Some(worksheet) = &self.worksheet {
            cfg.sheet.worksheet = worksheet.clone();
        }
        if let Some(form_id) = &self.form_id {
            cfg.form.form_id = form_id.clone();
        }
        if let Some(secs) = self.timeout_secs {
            cfg.timeout_secs = secs;
        }
        if self.allow_empty_description {
            cfg.require_description = false;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        logging::init_or_warn(&log_path);
    }

    let store = cli.config_store();
    let mut config = store.load();
    cli.apply_to(&mut config);
    if cli.save_config {
        store.save(&config)?;
        log::info!("config written to {}", store.path().display());
    }

    let sink = match sink::from_config(&config) {
        Ok(sink) => sink,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };
    let controller =
        SessionController::new(sink).require_description(config.require_description);
    let mut app = App::new(controller, config.owner_name.clone());

    log::info!("focus starting with the {} sink", config.sink);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::terminal();

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let key = match runner.next_frame(app.status()) {
            Frame::Idle => continue,
            Frame::Repaint => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                continue;
            }
            Frame::Key(key) => key,
        };

        match app.handle_key(key) {
            AppAction::Quit => break,
            AppAction::Continue => {}
            AppAction::Submit => {
                // show the saving banner while the sink blocks
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                app.submit();
            }
            AppAction::OpenView(url) => {
                if Browser::is_available() {
                    if let Err(e) = webbrowser::open(&url) {
                        log::warn!("could not open {url}: {e}");
                    }
                }
            }
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    if app.status() != focus::timer::TimerStatus::Idle {
        log::warn!("exiting with an unsaved {} session", app.status());
    }

    Ok(())
}
