//! Telemetry transport seam.
//!
//! The detection core only relies on [`TelemetryPublisher::publish`]: hand a
//! payload to the transport and return without waiting for delivery.

pub mod mqtt;

use std::sync::Arc;

use thiserror::Error;

pub use mqtt::MqttPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("telemetry transport is closed")]
    Closed,
    #[error("publish rejected by transport: {0}")]
    Rejected(String),
    #[error("failed to encode telemetry payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fire-and-forget publisher. Implementations must not block on delivery.
pub trait TelemetryPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

impl<P: TelemetryPublisher + ?Sized> TelemetryPublisher for Arc<P> {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }
}
