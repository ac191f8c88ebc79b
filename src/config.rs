use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

#[derive(Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub landmark_source: String,
    pub frame_timeout_ms: u64,
    pub detection: DetectionConfig,
    pub mqtt: MqttConfig,
    pub telemetry: TelemetryConfig,
    pub sound: SoundConfig,
}

/// Debounce parameters consumed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionConfig {
    pub ear_threshold: f64,
    pub consec_frames: u32,
}

#[derive(Clone)]
pub struct MqttConfig {
    pub broker_address: String,
    pub broker_port: u16,
    pub topic: String,
    pub client_id: String,
    pub qos: u8,
    pub keep_alive_secs: u64,
    pub queue_capacity: usize,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub format: PayloadFormat,
    pub publish_cleared: bool,
}

#[derive(Debug, Clone)]
pub struct SoundConfig {
    pub player: String,
    pub sound_path: String,
    pub looped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Json,
    Text,
}

impl FromStr for PayloadFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "plain" => Ok(Self::Text),
            other => Err(ConfigError::Invalid {
                key: "TELEMETRY_FORMAT",
                reason: format!("unknown payload format '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ear_threshold: DEFAULT_EAR_THRESHOLD,
            consec_frames: DEFAULT_EAR_CONSEC_FRAMES,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_address: DEFAULT_MQTT_BROKER_ADDRESS.to_string(),
            broker_port: DEFAULT_MQTT_BROKER_PORT,
            topic: DEFAULT_MQTT_TOPIC.to_string(),
            client_id: DEFAULT_MQTT_CLIENT_ID.to_string(),
            qos: 0,
            keep_alive_secs: DEFAULT_MQTT_KEEP_ALIVE_SECS,
            queue_capacity: DEFAULT_MQTT_QUEUE_CAPACITY,
            reconnect_delay_ms: DEFAULT_MQTT_RECONNECT_DELAY_MS,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: PayloadFormat::Json,
            publish_cleared: true,
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            player: DEFAULT_ALERT_PLAYER.to_string(),
            sound_path: DEFAULT_ALERT_SOUND_PATH.to_string(),
            looped: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
            landmark_source: STDIN_SOURCE.to_string(),
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT_MS,
            detection: DetectionConfig::default(),
            mqtt: MqttConfig::default(),
            telemetry: TelemetryConfig::default(),
            sound: SoundConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("landmark_source", &self.landmark_source)
            .field("frame_timeout_ms", &self.frame_timeout_ms)
            .field("detection", &self.detection)
            .field("mqtt", &self.mqtt)
            .field("telemetry", &self.telemetry)
            .field("sound", &self.sound)
            .finish()
    }
}

impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field(
                "broker",
                &format_args!("{}:{}", self.broker_address, self.broker_port),
            )
            .field("topic", &self.topic)
            .field("client_id", &self.client_id)
            .field("qos", &self.qos)
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("queue_capacity", &self.queue_capacity)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            landmark_source: env_or("LANDMARK_SOURCE", STDIN_SOURCE),
            frame_timeout_ms: env_or_parse("FRAME_TIMEOUT_MS", DEFAULT_FRAME_TIMEOUT_MS),
            detection: DetectionConfig {
                ear_threshold: env_or_parse("EAR_THRESHOLD", DEFAULT_EAR_THRESHOLD),
                consec_frames: env_or_parse("EAR_CONSEC_FRAMES", DEFAULT_EAR_CONSEC_FRAMES),
            },
            mqtt: MqttConfig {
                broker_address: env_or("MQTT_BROKER_ADDRESS", DEFAULT_MQTT_BROKER_ADDRESS),
                broker_port: env_or_parse("MQTT_BROKER_PORT", DEFAULT_MQTT_BROKER_PORT),
                topic: env_or("MQTT_TOPIC", DEFAULT_MQTT_TOPIC),
                client_id: env_or("MQTT_CLIENT_ID", DEFAULT_MQTT_CLIENT_ID),
                qos: env_or_parse("MQTT_QOS", 0_u8),
                keep_alive_secs: env_or_parse(
                    "MQTT_KEEP_ALIVE_SECS",
                    DEFAULT_MQTT_KEEP_ALIVE_SECS,
                ),
                queue_capacity: env_or_parse("MQTT_QUEUE_CAPACITY", DEFAULT_MQTT_QUEUE_CAPACITY),
                reconnect_delay_ms: env_or_parse(
                    "MQTT_RECONNECT_DELAY_MS",
                    DEFAULT_MQTT_RECONNECT_DELAY_MS,
                ),
            },
            telemetry: TelemetryConfig {
                format: env_or_parse("TELEMETRY_FORMAT", PayloadFormat::Json),
                publish_cleared: env_or_bool("TELEMETRY_PUBLISH_CLEARED", true),
            },
            sound: SoundConfig {
                player: env_or("ALERT_PLAYER", DEFAULT_ALERT_PLAYER),
                sound_path: env_or("ALERT_SOUND_PATH", DEFAULT_ALERT_SOUND_PATH),
                looped: env_or_bool("ALERT_LOOP", true),
            },
        }
    }

    /// Reject values the detection core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.detection.ear_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "EAR_THRESHOLD",
                reason: format!("must be a positive finite number, got {threshold}"),
            });
        }
        if self.detection.consec_frames == 0 {
            return Err(ConfigError::Invalid {
                key: "EAR_CONSEC_FRAMES",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.frame_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "FRAME_TIMEOUT_MS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.mqtt.broker_address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "MQTT_BROKER_ADDRESS",
                reason: "must not be empty".to_string(),
            });
        }
        if self.mqtt.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "MQTT_CLIENT_ID",
                reason: "must not be empty".to_string(),
            });
        }
        // 发布主题不允许包含通配符
        let topic = &self.mqtt.topic;
        if topic.is_empty() || topic.contains(['+', '#']) {
            return Err(ConfigError::Invalid {
                key: "MQTT_TOPIC",
                reason: format!("'{topic}' is not a valid publish topic"),
            });
        }
        if self.mqtt.qos > 2 {
            return Err(ConfigError::Invalid {
                key: "MQTT_QOS",
                reason: format!("must be 0, 1 or 2, got {}", self.mqtt.qos),
            });
        }
        if self.mqtt.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "MQTT_QUEUE_CAPACITY",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
