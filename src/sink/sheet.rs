use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{http_client, Ack, RecordSink};
use crate::config::SheetConfig;
use crate::error::{SinkError, SinkErrorKind};
use crate::record::SessionRecord;

const SINK_NAME: &str = "sheet";
const MAX_ERROR_BODY: usize = 200;

/// Supplies the OAuth bearer token for the Sheets API. Where it comes from is
/// outside this crate's concern.
pub trait TokenSource {
    fn access_token(&self) -> Result<SecretString, SinkError>;
}

/// Token read from an environment variable at submit time
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenSource for EnvToken {
    fn access_token(&self) -> Result<SecretString, SinkError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => {
                Ok(SecretString::from(token.trim().to_string()))
            }
            _ => Err(SinkError::new(
                SinkErrorKind::Auth,
                format!("environment variable {} is not set", self.var),
            )),
        }
    }
}

/// Token read from a file at submit time, so an external refresher can rotate it
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TokenSource for FileToken {
    fn access_token(&self) -> Result<SecretString, SinkError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            SinkError::new(
                SinkErrorKind::Auth,
                format!("cannot read token file {}: {e}", self.path.display()),
            )
        })?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(SinkError::new(
                SinkErrorKind::Auth,
                format!("token file {} is empty", self.path.display()),
            ));
        }
        Ok(SecretString::from(token.to_string()))
    }
}

pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<SecretString, SinkError> {
        Ok(self.0.clone())
    }
}

/// Pull the spreadsheet id out of a `/spreadsheets/d/{id}/...` URL.
pub fn spreadsheet_id_from_url(spreadsheet_url: &str) -> Result<String, SinkError> {
    let invalid = || {
        SinkError::new(
            SinkErrorKind::Config,
            format!("{spreadsheet_url:?} is not a spreadsheet URL"),
        )
    };

    let url = Url::parse(spreadsheet_url).map_err(|_| invalid())?;
    let mut segments = url.path_segments().ok_or_else(invalid)?;
    while let Some(segment) = segments.next() {
        if segment == "spreadsheets" {
            return match (segments.next(), segments.next()) {
                (Some("d"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
                _ => Err(invalid()),
            };
        }
    }
    Err(invalid())
}

/// Worksheet name as an A1 range covering the whole sheet.
fn a1_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendBody<'a> {
    major_dimension: &'static str,
    values: [[&'a str; 4]; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: Option<String>,
}

/// Appends `[start, end, duration, description]` to a named worksheet.
/// Owner name and location are not part of the row.
pub struct SheetAppender {
    client: Client,
    api_base: Url,
    spreadsheet_url: String,
    spreadsheet_id: String,
    worksheet: String,
    tokens: Box<dyn TokenSource>,
}

impl SheetAppender {
    pub fn new(
        config: &SheetConfig,
        tokens: Box<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let spreadsheet_id = spreadsheet_id_from_url(&config.spreadsheet_url)?;
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            SinkError::new(
                SinkErrorKind::Config,
                format!("invalid sheets API base {:?}: {e}", config.api_base),
            )
        })?;
        if api_base.cannot_be_a_base() {
            return Err(SinkError::new(
                SinkErrorKind::Config,
                format!("{} cannot be used as an API base", config.api_base),
            ));
        }
        if config.worksheet.trim().is_empty() {
            return Err(SinkError::new(
                SinkErrorKind::Config,
                "worksheet name is not configured",
            ));
        }

        Ok(Self {
            client: http_client(timeout)?,
            api_base,
            spreadsheet_url: config.spreadsheet_url.clone(),
            spreadsheet_id,
            worksheet: config.worksheet.clone(),
            tokens,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn endpoint(&self, tail: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
                .extend(tail);
        }
        url
    }

    fn find_worksheet(&self, token: &SecretString) -> Result<(), SinkError> {
        let response = self
            .client
            .get(self.endpoint(&[]))
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(token.expose_secret())
            .send()?;
        let meta: SpreadsheetMeta = check_status(response, "spreadsheet lookup")?.json()?;

        if meta
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == self.worksheet)
        {
            return Ok(());
        }

        let available = meta
            .sheets
            .iter()
            .map(|sheet| sheet.properties.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(SinkError::new(
            SinkErrorKind::Lookup,
            format!(
                "worksheet {:?} not found in spreadsheet {} (available: {available})",
                self.worksheet, self.spreadsheet_id
            ),
        ))
    }

    fn append_row(&self, token: &SecretString, record: &SessionRecord) -> Result<Ack, SinkError> {
        let range = format!("{}:append", a1_range(&self.worksheet));
        let body = AppendBody {
            major_dimension: "ROWS",
            values: [record.sheet_row()],
        };

        let response = self
            .client
            .post(self.endpoint(&["values", range.as_str()]))
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()?;
        let response = check_status(response, "row append")?;

        // the row is in; an unreadable body only costs us the detail text
        let appended: AppendResponse = response.json().unwrap_or_default();
        let detail = appended
            .updates
            .and_then(|updates| updates.updated_range)
            .unwrap_or_else(|| format!("row appended to {}", self.worksheet));

        Ok(Ack {
            sink: SINK_NAME,
            detail,
        })
    }
}

impl RecordSink for SheetAppender {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    fn submit(&self, record: &SessionRecord) -> Result<Ack, SinkError> {
        debug!(
            "appending session row to {} / {}",
            self.spreadsheet_id, self.worksheet
        );
        let token = self.tokens.access_token()?;
        self.find_worksheet(&token)?;
        self.append_row(&token, record)
    }

    fn view_url(&self) -> Option<String> {
        Some(self.spreadsheet_url.clone())
    }
}

fn check_status(response: Response, what: &str) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SinkErrorKind::Auth,
        StatusCode::NOT_FOUND => SinkErrorKind::Lookup,
        _ => SinkErrorKind::Status,
    };
    let body = response.text().unwrap_or_default();
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    warn!("{what} failed with {status}");

    Err(SinkError::new(
        kind,
        format!("{what} failed with HTTP {}: {}", status.as_u16(), snippet.trim()),
    ))
}
