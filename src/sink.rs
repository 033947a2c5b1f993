//! Destinations for finished sessions.
//!
//! A sink receives a borrowed [`SessionRecord`] and makes exactly one attempt
//! to persist it. Retrying is left to whoever calls [`RecordSink::submit`].

pub mod form;
pub mod sheet;

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::{Config, SinkKind};
use crate::error::SinkError;
use crate::record::SessionRecord;

pub use form::FormPoster;
pub use sheet::{EnvToken, FileToken, SheetAppender, StaticToken, TokenSource};

/// Acknowledgement of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub sink: &'static str,
    pub detail: String,
}

pub trait RecordSink {
    /// Short backend name used in logs and banners.
    fn name(&self) -> &'static str;

    /// Persist one record. A single attempt, no retry.
    fn submit(&self, record: &SessionRecord) -> Result<Ack, SinkError>;

    /// Where a human can look at what has been written, if anywhere.
    fn view_url(&self) -> Option<String> {
        None
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, SinkError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("focus/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Build the sink selected in `config`. Chosen once; never swapped at runtime.
pub fn from_config(config: &Config) -> Result<Box<dyn RecordSink>, SinkError> {
    let timeout = config.timeout();
    match config.sink {
        SinkKind::Form => Ok(Box::new(FormPoster::new(&config.form, timeout)?)),
        SinkKind::Sheet => {
            let tokens: Box<dyn TokenSource> = match &config.sheet.token_file {
                Some(path) => Box::new(FileToken::new(path)),
                None => Box::new(EnvToken::new(&config.sheet.token_env)),
            };
            Ok(Box::new(SheetAppender::new(&config.sheet, tokens, timeout)?))
        }
    }
}
