// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires the terminal to these modules.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod record;
pub mod runtime;
pub mod sink;
pub mod timer;
pub mod ui;

pub use controller::SessionController;
pub use error::{FocusError, SinkError, SinkErrorKind};
pub use record::SessionRecord;
pub use sink::RecordSink;
