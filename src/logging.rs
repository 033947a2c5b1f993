//! File-backed logger. The terminal is owned by the TUI, so nothing is ever
//! written to stderr while it runs.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Environment variable holding an env_logger filter, e.g. `focus=debug`.
pub const LOG_ENV: &str = "FOCUS_LOG";

pub fn init(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // a second init (tests, restarts) keeps the first logger
    let _ = Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init();
    Ok(())
}

/// Like [`init`], but a log file that cannot be opened only costs the log.
/// Must run before the terminal enters raw mode, while stderr is still visible.
pub fn init_or_warn(path: &Path) -> bool {
    match init(path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("focus: logging disabled, cannot open {}: {e}", path.display());
            false
        }
    }
}
