use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use drowsiness_monitor::alert::{AudioError, LocalAlert};
use drowsiness_monitor::source::{Frame, LandmarkSource, SourceError};
use drowsiness_monitor::transport::{PublishError, TelemetryPublisher};

#[derive(Debug, Default)]
pub struct SoundLog {
    pub playing: bool,
    /// Number of times playback actually began.
    pub launches: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
}

/// In-memory local alert; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSound {
    log: Arc<Mutex<SoundLog>>,
    fail: bool,
}

impl RecordingSound {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn playing(&self) -> bool {
        self.log.lock().unwrap().playing
    }

    pub fn launches(&self) -> usize {
        self.log.lock().unwrap().launches
    }

    pub fn stop_calls(&self) -> usize {
        self.log.lock().unwrap().stop_calls
    }
}

impl LocalAlert for RecordingSound {
    fn start(&mut self) -> Result<(), AudioError> {
        let mut log = self.log.lock().unwrap();
        log.start_calls += 1;
        if self.fail {
            return Err(AudioError::MissingSound("fake.wav".to_string()));
        }
        if !log.playing {
            log.playing = true;
            log.launches += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        let mut log = self.log.lock().unwrap();
        log.stop_calls += 1;
        log.playing = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.playing()
    }
}

/// Publisher that records payloads, or refuses them all.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.messages()
            .iter()
            .map(|(_, payload)| {
                let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
                value["kind"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

impl TelemetryPublisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Rejected("broker unreachable".to_string()));
        }
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

pub enum Step {
    Frame(Frame),
    /// Never resolves; exercises the frame timeout.
    Stall,
    Fail,
}

/// Landmark source replaying a fixed script, then ending the stream.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    pub fn frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self::new(frames.into_iter().map(Step::Frame))
    }
}

impl LandmarkSource for ScriptedSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match self.steps.pop_front() {
            Some(Step::Frame(frame)) => Ok(Some(frame)),
            Some(Step::Stall) => std::future::pending().await,
            Some(Step::Fail) => Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "camera disconnected",
            ))),
            None => Ok(None),
        }
    }
}
