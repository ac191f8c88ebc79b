/// 低于此 EAR 值视为闭眼
pub const DEFAULT_EAR_THRESHOLD: f64 = 0.25;

/// 连续闭眼帧数达到此值时触发告警
pub const DEFAULT_EAR_CONSEC_FRAMES: u32 = 20;

/// 单帧获取超时（毫秒）
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 1_000;

/// `-` 表示从标准输入读取关键点流
pub const STDIN_SOURCE: &str = "-";

pub const DEFAULT_MQTT_BROKER_ADDRESS: &str = "broker.hivemq.com";
pub const DEFAULT_MQTT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_MQTT_TOPIC: &str = "driver/drowsiness";
pub const DEFAULT_MQTT_CLIENT_ID: &str = "DrowsinessDetectorClient";
pub const DEFAULT_MQTT_KEEP_ALIVE_SECS: u64 = 30;
pub const DEFAULT_MQTT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_MQTT_RECONNECT_DELAY_MS: u64 = 2_000;

pub const DEFAULT_ALERT_SOUND_PATH: &str = "resources/alert.wav";
pub const DEFAULT_ALERT_PLAYER: &str = "aplay";

/// Number of keypoints in the iBUG 68-point face layout.
pub const FACE_LANDMARK_COUNT: usize = 68;

/// Subject's right eye in the 68-point layout, ordered p1..p6.
pub const RIGHT_EYE_INDICES: [usize; 6] = [36, 37, 38, 39, 40, 41];

/// Subject's left eye in the 68-point layout, ordered p1..p6.
pub const LEFT_EYE_INDICES: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// 水平距离低于此值视为退化几何
pub const MIN_EYE_WIDTH: f64 = 1e-6;

pub const RAISED_TEXT_MESSAGE: &str = "Drowsiness detected!";
pub const CLEARED_TEXT_MESSAGE: &str = "Driver alert restored";
