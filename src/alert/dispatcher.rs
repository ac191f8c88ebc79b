//! 告警分发
//!
//! 声音与遥测是两条相互独立的通道：任一通道失败只记录警告，
//! 不影响另一通道，也不向帧处理循环传播。两条通道都不阻塞等待。

use serde::Serialize;

use crate::alert::sound::LocalAlert;
use crate::alert::telemetry::{TelemetryMessage, TelemetryRoute};
use crate::detection::{AlertEvent, AlertKind};
use crate::transport::{PublishError, TelemetryPublisher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOutcome {
    Done,
    Skipped,
    Failed,
}

/// Result of one dispatch, per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sound: ChannelOutcome,
    pub telemetry: ChannelOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub published: u64,
    pub publish_failures: u64,
    pub audio_failures: u64,
}

pub struct AlertDispatcher<A, P> {
    sound: A,
    publisher: P,
    route: TelemetryRoute,
    stats: DispatchStats,
}

impl<A, P> AlertDispatcher<A, P>
where
    A: LocalAlert,
    P: TelemetryPublisher,
{
    pub fn new(sound: A, publisher: P, route: TelemetryRoute) -> Self {
        Self {
            sound,
            publisher,
            route,
            stats: DispatchStats::default(),
        }
    }

    /// Handle one event. Never fails; channel errors are logged and counted.
    pub fn dispatch(&mut self, event: &AlertEvent) -> DispatchOutcome {
        let sound = self.drive_sound(event.kind);
        let telemetry = self.publish(event);
        DispatchOutcome { sound, telemetry }
    }

    /// Silence the local alert on loop exit. Never publishes.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.sound.stop() {
            self.stats.audio_failures += 1;
            tracing::warn!(error = %e, channel = "sound", "Failed to stop alert sound on shutdown");
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn route(&self) -> &TelemetryRoute {
        &self.route
    }

    fn drive_sound(&mut self, kind: AlertKind) -> ChannelOutcome {
        let result = match kind {
            AlertKind::Raised => self.sound.start(),
            AlertKind::Cleared => self.sound.stop(),
        };
        match result {
            Ok(()) => ChannelOutcome::Done,
            Err(e) => {
                self.stats.audio_failures += 1;
                tracing::warn!(
                    error = %e,
                    channel = "sound",
                    kind = kind.as_str(),
                    "Local alert failed, telemetry unaffected"
                );
                ChannelOutcome::Failed
            }
        }
    }

    fn publish(&mut self, event: &AlertEvent) -> ChannelOutcome {
        if !self.route.should_publish(event.kind) {
            return ChannelOutcome::Skipped;
        }

        let result = TelemetryMessage::new(event, &self.route.client_id)
            .encode(self.route.format)
            .and_then(|payload| self.publisher.publish(&self.route.topic, payload));

        match result {
            Ok(()) => {
                self.stats.published += 1;
                tracing::debug!(topic = %self.route.topic, kind = event.kind.as_str(), "Telemetry handed to transport");
                ChannelOutcome::Done
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                log_publish_failure(&e, event.kind);
                ChannelOutcome::Failed
            }
        }
    }
}

fn log_publish_failure(error: &PublishError, kind: AlertKind) {
    tracing::warn!(
        error = %error,
        channel = "telemetry",
        kind = kind.as_str(),
        "Telemetry publish dropped, local alert unaffected"
    );
}
