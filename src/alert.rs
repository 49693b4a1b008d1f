//! Turning webhook bodies into direct-message text
//!
//! Two body formats are understood:
//! - `grafana`: the Grafana/Alertmanager webhook JSON payload; the message is
//!   `title + "\n" + message`
//! - `raw`: the body itself is the message

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Extracts the message text from a request body
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, body: &[u8]) -> Result<String, ExtractError>;
}

/// Body format accepted by the webhook endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ContentFormat {
    /// Grafana alert-notification JSON
    #[default]
    Grafana,
    /// Plain text body
    Raw,
}

impl ContentFormat {
    pub fn extractor(&self) -> &'static dyn ContentExtractor {
        match self {
            ContentFormat::Grafana => &GrafanaExtractor,
            ContentFormat::Raw => &RawExtractor,
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentFormat::Grafana => write!(f, "grafana"),
            ContentFormat::Raw => write!(f, "raw"),
        }
    }
}

pub struct RawExtractor;

impl ContentExtractor for RawExtractor {
    fn extract(&self, body: &[u8]) -> Result<String, ExtractError> {
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

pub struct GrafanaExtractor;

impl ContentExtractor for GrafanaExtractor {
    fn extract(&self, body: &[u8]) -> Result<String, ExtractError> {
        let payload: AlertPayload = serde_json::from_slice(body)?;
        Ok(payload.content())
    }
}

/// Grafana webhook notification. Only the text fields feed the message; the
/// rest is accepted so unknown senders do not have to strip it.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertPayload {
    pub receiver: String,
    pub status: String,
    pub org_id: i64,
    pub alerts: Vec<Alert>,
    pub group_labels: AlertLabels,
    pub common_labels: AlertLabels,
    pub common_annotations: Annotations,
    #[serde(rename = "externalURL")]
    pub external_url: String,
    pub version: String,
    pub group_key: String,
    pub truncated_alerts: i64,
    pub title: String,
    pub state: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Alert {
    pub status: String,
    pub labels: AlertLabels,
    pub annotations: Annotations,
    pub starts_at: String,
    pub ends_at: String,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
    #[serde(rename = "silenceURL")]
    pub silence_url: String,
    #[serde(rename = "dashboardURL")]
    pub dashboard_url: String,
    #[serde(rename = "panelURL")]
    pub panel_url: String,
    pub values: serde_json::Value,
    pub value_string: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertLabels {
    pub alertname: String,
    pub instance: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub summary: String,
}

impl AlertPayload {
    /// Message text: title and message separated by a newline. Payloads
    /// without a `message` (plain Alertmanager) fall back to the summaries.
    pub fn content(&self) -> String {
        let body = if self.message.is_empty() {
            self.summary()
        } else {
            self.message.clone()
        };
        format!("{}\n{}", self.title, body)
    }

    fn summary(&self) -> String {
        if !self.common_annotations.summary.is_empty() {
            return self.common_annotations.summary.clone();
        }
        self.alerts
            .iter()
            .map(|a| a.annotations.summary.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grafana_title_and_message() {
        let body = br#"{"title":"Disk full","message":"root partition at 98%"}"#;
        let content = ContentFormat::Grafana.extractor().extract(body).unwrap();
        assert_eq!(content, "Disk full\nroot partition at 98%");
    }

    #[test]
    fn test_grafana_full_payload() {
        let body = br#"{
            "receiver": "nostr",
            "status": "firing",
            "orgId": 1,
            "alerts": [{
                "status": "firing",
                "labels": {"alertname": "HighLoad", "instance": "web-1"},
                "annotations": {"summary": "load above 10"},
                "startsAt": "2024-01-01T00:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z",
                "generatorURL": "http://grafana/alerting",
                "fingerprint": "abc",
                "values": {"A": 12.5},
                "valueString": "[ var='A' value=12.5 ]"
            }],
            "groupLabels": {"alertname": "HighLoad"},
            "commonLabels": {"alertname": "HighLoad", "instance": "web-1"},
            "commonAnnotations": {},
            "externalURL": "http://grafana/",
            "version": "1",
            "groupKey": "{}:{alertname=\"HighLoad\"}",
            "truncatedAlerts": 0,
            "title": "[FIRING:1] HighLoad",
            "state": "alerting",
            "message": "**Firing**\nValue: A=12.5"
        }"#;

        let payload: AlertPayload = serde_json::from_slice(body).unwrap();
        assert_eq!(payload.alerts.len(), 1);
        assert_eq!(payload.alerts[0].labels.instance, "web-1");
        assert_eq!(payload.external_url, "http://grafana/");
        assert_eq!(payload.content(), "[FIRING:1] HighLoad\n**Firing**\nValue: A=12.5");
    }

    #[test]
    fn test_grafana_missing_fields_yield_separator_only() {
        let content = GrafanaExtractor.extract(b"{}").unwrap();
        assert_eq!(content, "\n");
    }

    #[test]
    fn test_summary_fallback() {
        let body = br#"{
            "title": "Alerts",
            "alerts": [
                {"annotations": {"summary": "disk full"}},
                {"annotations": {}},
                {"annotations": {"summary": "cpu hot"}}
            ]
        }"#;
        let content = GrafanaExtractor.extract(body).unwrap();
        assert_eq!(content, "Alerts\ndisk full\ncpu hot");

        let body = br#"{"title": "Alerts", "commonAnnotations": {"summary": "everything is on fire"}}"#;
        let content = GrafanaExtractor.extract(body).unwrap();
        assert_eq!(content, "Alerts\neverything is on fire");
    }

    #[test]
    fn test_grafana_invalid_json() {
        assert!(GrafanaExtractor.extract(b"not json").is_err());
        assert!(GrafanaExtractor.extract(b"").is_err());
    }

    #[test]
    fn test_raw_body() {
        let content = ContentFormat::Raw.extractor().extract(b"backup failed").unwrap();
        assert_eq!(content, "backup failed");

        // Not JSON, not a problem
        let content = RawExtractor.extract(b"{broken").unwrap();
        assert_eq!(content, "{broken");
    }

    #[test]
    fn test_format_display() {
        assert_eq!(ContentFormat::Grafana.to_string(), "grafana");
        assert_eq!(ContentFormat::Raw.to_string(), "raw");
    }
}
