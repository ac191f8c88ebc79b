//! Frame-synchronous processing loop.
//!
//! One iteration per frame: acquire → EAR → state machine → dispatch. The
//! loop owns the state machine; it is consumed by [`DrowsinessMonitor::run`]
//! so no debounce state survives shutdown.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::alert::{AlertDispatcher, LocalAlert};
use crate::config::DetectionConfig;
use crate::detection::{AlertEvent, AlertKind, DrowsinessState, DrowsinessStateMachine};
use crate::source::{Detection, Frame, LandmarkSource, SourceError};
use crate::transport::TelemetryPublisher;
use crate::vision::eye_aspect_ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfStream,
    Shutdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSummary {
    pub frames: u64,
    pub no_face_frames: u64,
    pub timed_out_frames: u64,
    pub alerts_raised: u64,
    pub alerts_cleared: u64,
    pub publish_failures: u64,
    pub audio_failures: u64,
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("frame acquisition failed: {0}")]
    Source(#[from] SourceError),
}

pub struct DrowsinessMonitor<A, P> {
    machine: DrowsinessStateMachine,
    dispatcher: AlertDispatcher<A, P>,
    frame_timeout: Duration,
    summary: MonitorSummary,
}

impl<A, P> DrowsinessMonitor<A, P>
where
    A: LocalAlert,
    P: TelemetryPublisher,
{
    pub fn new(
        detection: DetectionConfig,
        dispatcher: AlertDispatcher<A, P>,
        frame_timeout: Duration,
    ) -> Self {
        Self {
            machine: DrowsinessStateMachine::new(detection),
            dispatcher,
            frame_timeout,
            summary: MonitorSummary::default(),
        }
    }

    /// Process one detector result synchronously.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<AlertEvent> {
        let sample = match &frame.detection {
            Detection::Face(eyes) => Some(eye_aspect_ratio(eyes)),
            Detection::NoFace => None,
        };
        self.tick(sample, frame.timestamp)
    }

    pub fn state(&self) -> DrowsinessState {
        self.machine.state()
    }

    /// Drive the loop until the stream ends, a stop signal arrives, or frame
    /// acquisition fails. Audio is stopped on every exit path.
    pub async fn run<S>(
        mut self,
        source: &mut S,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<MonitorSummary, MonitorError>
    where
        S: LandmarkSource,
    {
        tracing::info!(
            threshold = self.machine.config().ear_threshold,
            consec_frames = self.machine.config().consec_frames,
            frame_timeout_ms = self.frame_timeout.as_millis() as u64,
            "Drowsiness monitor started"
        );

        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break StopReason::Shutdown,
                next = tokio::time::timeout(self.frame_timeout, source.next_frame()) => next,
            };

            match next {
                Ok(Ok(Some(frame))) => {
                    self.process_frame(&frame);
                }
                Ok(Ok(None)) => break StopReason::EndOfStream,
                Ok(Err(e)) => {
                    self.dispatcher.shutdown();
                    tracing::error!(error = %e, frames = self.summary.frames, "Frame acquisition failed");
                    return Err(e.into());
                }
                Err(_) => {
                    // 超时帧按无人脸处理，保持检测节奏
                    self.summary.timed_out_frames += 1;
                    tracing::warn!(
                        timeout_ms = self.frame_timeout.as_millis() as u64,
                        "Frame acquisition timed out, treating as no face"
                    );
                    self.tick(None, Utc::now());
                }
            }
        };

        self.dispatcher.shutdown();
        let summary = self.finish(reason);
        tracing::info!(?reason, frames = summary.frames, raised = summary.alerts_raised, "Drowsiness monitor stopped");
        Ok(summary)
    }

    fn tick(&mut self, sample: Option<f64>, at: DateTime<Utc>) -> Option<AlertEvent> {
        self.summary.frames += 1;
        if sample.is_none() {
            self.summary.no_face_frames += 1;
        }

        let event = self.machine.update(sample, at)?;
        match event.kind {
            AlertKind::Raised => self.summary.alerts_raised += 1,
            AlertKind::Cleared => self.summary.alerts_cleared += 1,
        }
        self.dispatcher.dispatch(&event);
        Some(event)
    }

    fn finish(self, reason: StopReason) -> MonitorSummary {
        let stats = self.dispatcher.stats();
        MonitorSummary {
            publish_failures: stats.publish_failures,
            audio_failures: stats.audio_failures,
            stop_reason: Some(reason),
            ..self.summary
        }
    }
}
