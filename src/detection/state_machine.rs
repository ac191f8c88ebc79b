//! 疲劳告警状态机
//!
//! 两状态：Awake（清醒，初始）→ Alerting（告警中）。
//! 每帧输入一个 EAR 样本（无人脸时为 `None`）：
//! - EAR >= 阈值或无人脸：计数清零；若处于 Alerting 则回到 Awake 并发出 Cleared
//! - EAR < 阈值：计数加一；Awake 状态下计数恰好达到 N 时进入 Alerting 并发出 Raised
//!
//! 无人脸帧清零计数而非冻结计数：检测不到脸不能被解释为瞌睡，
//! 短暂的检测丢失因此不会累积成误报。
//!
//! 事件是边沿触发的，Alerting 期间持续闭眼不会重复发出 Raised。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Raised,
    Cleared,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raised => "raised",
            Self::Cleared => "cleared",
        }
    }
}

/// One state transition, produced exactly once per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPhase {
    #[default]
    Awake,
    Alerting,
}

/// Debounce state. Only [`step`] produces new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrowsinessState {
    phase: AlertPhase,
    consecutive_low_frames: u32,
}

impl DrowsinessState {
    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    pub fn consecutive_low_frames(&self) -> u32 {
        self.consecutive_low_frames
    }

    pub fn is_alerting(&self) -> bool {
        self.phase == AlertPhase::Alerting
    }
}

/// Advance the debounce state by one frame.
///
/// `sample` is the frame's EAR, or `None` when no face was found. A NaN
/// sample fails the `< threshold` test and is therefore treated like an
/// open-eye frame.
pub fn step(
    config: &DetectionConfig,
    state: DrowsinessState,
    sample: Option<f64>,
    at: DateTime<Utc>,
) -> (DrowsinessState, Option<AlertEvent>) {
    let low = matches!(sample, Some(ear) if ear < config.ear_threshold);

    if !low {
        let event = state.is_alerting().then_some(AlertEvent {
            kind: AlertKind::Cleared,
            timestamp: at,
        });
        return (DrowsinessState::default(), event);
    }

    let consecutive_low_frames = state.consecutive_low_frames.saturating_add(1);
    match state.phase {
        AlertPhase::Awake if consecutive_low_frames == config.consec_frames => (
            DrowsinessState {
                phase: AlertPhase::Alerting,
                consecutive_low_frames,
            },
            Some(AlertEvent {
                kind: AlertKind::Raised,
                timestamp: at,
            }),
        ),
        phase => (
            DrowsinessState {
                phase,
                consecutive_low_frames,
            },
            None,
        ),
    }
}

/// Owns the debounce state and feeds it one sample per frame tick.
#[derive(Debug, Clone)]
pub struct DrowsinessStateMachine {
    config: DetectionConfig,
    state: DrowsinessState,
}

impl DrowsinessStateMachine {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            state: DrowsinessState::default(),
        }
    }

    pub fn update(&mut self, sample: Option<f64>, at: DateTime<Utc>) -> Option<AlertEvent> {
        let (next, event) = step(&self.config, self.state, sample, at);
        if let Some(event) = &event {
            tracing::info!(
                kind = event.kind.as_str(),
                consecutive_low_frames = next.consecutive_low_frames,
                ear = ?sample,
                "Drowsiness state transition"
            );
        }
        self.state = next;
        event
    }

    pub fn state(&self) -> DrowsinessState {
        self.state
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }
}
