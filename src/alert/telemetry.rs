use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::{Config, PayloadFormat};
use crate::constants::{CLEARED_TEXT_MESSAGE, RAISED_TEXT_MESSAGE};
use crate::detection::{AlertEvent, AlertKind};
use crate::transport::PublishError;

/// Where and how alert events are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRoute {
    pub topic: String,
    pub client_id: String,
    pub format: PayloadFormat,
    pub publish_cleared: bool,
}

impl TelemetryRoute {
    pub fn from_config(config: &Config) -> Self {
        Self {
            topic: config.mqtt.topic.clone(),
            client_id: config.mqtt.client_id.clone(),
            format: config.telemetry.format,
            publish_cleared: config.telemetry.publish_cleared,
        }
    }

    pub fn should_publish(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::Raised => true,
            AlertKind::Cleared => self.publish_cleared,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMessage<'a> {
    pub event_id: Uuid,
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
    pub client_id: &'a str,
    pub message: &'static str,
}

impl<'a> TelemetryMessage<'a> {
    pub fn new(event: &AlertEvent, client_id: &'a str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind: event.kind,
            timestamp: event.timestamp,
            client_id,
            message: text_for(event.kind),
        }
    }

    pub fn encode(&self, format: PayloadFormat) -> Result<Vec<u8>, PublishError> {
        match format {
            PayloadFormat::Json => Ok(serde_json::to_vec(self)?),
            PayloadFormat::Text => Ok(self.message.as_bytes().to_vec()),
        }
    }
}

fn text_for(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Raised => RAISED_TEXT_MESSAGE,
        AlertKind::Cleared => CLEARED_TEXT_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raised() -> AlertEvent {
        AlertEvent {
            kind: AlertKind::Raised,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn json_payload_carries_kind_and_timestamp() {
        let event = raised();
        let bytes = TelemetryMessage::new(&event, "cab-7")
            .encode(PayloadFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["kind"], "raised");
        assert_eq!(value["clientId"], "cab-7");
        assert_eq!(value["message"], RAISED_TEXT_MESSAGE);
        let ts: DateTime<Utc> = serde_json::from_value(value["timestamp"].clone()).unwrap();
        assert_eq!(ts, event.timestamp);
        assert!(value["eventId"].as_str().is_some());
    }

    #[test]
    fn text_payload_is_plain_message() {
        let bytes = TelemetryMessage::new(&raised(), "cab-7")
            .encode(PayloadFormat::Text)
            .unwrap();
        assert_eq!(bytes, RAISED_TEXT_MESSAGE.as_bytes());
    }

    #[test]
    fn cleared_publication_follows_policy() {
        let mut route = TelemetryRoute::from_config(&Config::default());
        assert!(route.should_publish(AlertKind::Raised));
        assert!(route.should_publish(AlertKind::Cleared));

        route.publish_cleared = false;
        assert!(route.should_publish(AlertKind::Raised));
        assert!(!route.should_publish(AlertKind::Cleared));
    }
}
