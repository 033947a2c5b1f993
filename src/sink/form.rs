use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;

use super::{http_client, Ack, RecordSink};
use crate::config::{FormConfig, FormFields};
use crate::error::{SinkError, SinkErrorKind};
use crate::record::SessionRecord;

const SINK_NAME: &str = "form";

/// Posts each record as a form response. Any 2xx counts as saved; the
/// response body is never inspected, so a form that silently drops the
/// submission still looks like success.
#[derive(Debug)]
pub struct FormPoster {
    client: Client,
    submit_url: String,
    view_url: String,
    fields: FormFields,
}

impl FormPoster {
    pub fn new(config: &FormConfig, timeout: Duration) -> Result<Self, SinkError> {
        let form_id = config.form_id.trim();
        if form_id.is_empty() {
            return Err(SinkError::new(
                SinkErrorKind::Config,
                "form id is not configured",
            ));
        }

        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client: http_client(timeout)?,
            submit_url: format!("{base}/forms/d/e/{form_id}/formResponse"),
            view_url: format!("{base}/forms/d/e/{form_id}/viewform"),
            fields: config.fields.clone(),
        })
    }

    pub fn submit_url(&self) -> &str {
        &self.submit_url
    }

    /// Field-id → value pairs in the order the form lists them.
    pub fn form_payload<'a>(&'a self, record: &'a SessionRecord) -> Vec<(&'a str, &'a str)> {
        vec![
            (self.fields.name.as_str(), record.owner_name.as_str()),
            (self.fields.start_time.as_str(), record.start_time.as_str()),
            (self.fields.end_time.as_str(), record.end_time.as_str()),
            (self.fields.duration.as_str(), record.duration_formatted.as_str()),
            (
                self.fields.task_description.as_str(),
                record.description.as_str(),
            ),
            (self.fields.location.as_str(), record.location.as_str()),
        ]
    }
}

impl RecordSink for FormPoster {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    fn submit(&self, record: &SessionRecord) -> Result<Ack, SinkError> {
        debug!("posting session record to {}", self.submit_url);

        let response = self
            .client
            .post(&self.submit_url)
            .form(&self.form_payload(record))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            warn!("form endpoint rejected submission with {status}");
            return Err(SinkError::new(
                SinkErrorKind::Status,
                format!("form endpoint answered HTTP {}", status.as_u16()),
            ));
        }

        Ok(Ack {
            sink: SINK_NAME,
            detail: format!("HTTP {}", status.as_u16()),
        })
    }

    fn view_url(&self) -> Option<String> {
        Some(self.view_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord {
            owner_name: "Alice".into(),
            start_time: "2024-01-15 09:00:00".into(),
            end_time: "2024-01-15 10:30:00".into(),
            duration_formatted: "01:30:00".into(),
            description: "Planning".into(),
            location: "Office".into(),
        }
    }

    fn poster(config: &FormConfig) -> FormPoster {
        FormPoster::new(config, Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_urls_from_form_id() {
        let config = FormConfig {
            base_url: "http://forms.test/".into(),
            form_id: "abc".into(),
            ..FormConfig::default()
        };
        let poster = poster(&config);
        assert_eq!(poster.submit_url(), "http://forms.test/forms/d/e/abc/formResponse");
        assert_eq!(
            poster.view_url().as_deref(),
            Some("http://forms.test/forms/d/e/abc/viewform")
        );
    }

    #[test]
    fn test_payload_maps_all_six_fields() {
        let poster = poster(&FormConfig::default());
        let record = record();
        let payload = poster.form_payload(&record);

        assert_eq!(
            payload,
            vec![
                ("entry.116257796", "Alice"),
                ("entry.844414881", "2024-01-15 09:00:00"),
                ("entry.834530983", "2024-01-15 10:30:00"),
                ("entry.365539651", "01:30:00"),
                ("entry.1897147484", "Planning"),
                ("entry.1523129993", "Office"),
            ]
        );
    }

    #[test]
    fn test_empty_form_id_is_config_error() {
        let config = FormConfig {
            form_id: "  ".into(),
            ..FormConfig::default()
        };
        let err = FormPoster::new(&config, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind, SinkErrorKind::Config);
    }

    #[test]
    fn test_unreachable_endpoint_is_network_error() {
        let config = FormConfig {
            // port 9 (discard) on loopback is closed on any sane test host
            base_url: "http://127.0.0.1:9".into(),
            ..FormConfig::default()
        };
        let err = poster(&config).submit(&record()).unwrap_err();
        assert_eq!(err.kind, SinkErrorKind::Network);
    }
}
