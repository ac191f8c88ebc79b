//! MQTT 遥测发布
//!
//! `MqttPublisher` 只向客户端请求队列投递消息（`try_publish`），从不等待
//! broker 确认。后台任务负责驱动事件循环、记录连接状态，并在收到
//! shutdown 信号后将发布端标记为关闭。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::MqttConfig;
use crate::transport::{PublishError, TelemetryPublisher};

/// rumqttc rejects keep-alive intervals below five seconds.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MqttPublisher {
    /// Create the client and spawn the task that drives its event loop.
    ///
    /// The connection is established lazily by the event loop; publishing
    /// before the broker answers queues the message in the client.
    pub fn connect(
        config: &MqttConfig,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_address.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(
            config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
        ));
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, config.queue_capacity.max(1));
        let connected = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));

        tracing::info!(
            broker = %config.broker_address,
            port = config.broker_port,
            client_id = %config.client_id,
            "Starting MQTT transport"
        );

        let handle = tokio::spawn(drive_event_loop(
            eventloop,
            connected.clone(),
            closed.clone(),
            Duration::from_millis(config.reconnect_delay_ms),
            shutdown_rx,
        ));

        (
            Self {
                client,
                qos: qos_from_level(config.qos),
                connected,
                closed,
            },
            handle,
        )
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl TelemetryPublisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        // 传输层已关闭时不再投递
        if self.is_closed() {
            return Err(PublishError::Closed);
        }
        self.client
            .try_publish(topic, self.qos, false, payload)
            .map_err(|e| PublishError::Rejected(e.to_string()))
    }
}

pub fn qos_from_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

async fn drive_event_loop(
    mut eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    reconnect_delay: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    connected.store(true, Ordering::Release);
                    tracing::info!(code = ?ack.code, "MQTT connected");
                }
                Ok(Event::Incoming(Packet::PubAck(ack))) => {
                    tracing::debug!(pkid = ack.pkid, "MQTT publish acknowledged");
                }
                Ok(_) => {}
                Err(e) => {
                    if connected.swap(false, Ordering::AcqRel) {
                        tracing::warn!(error = %e, "MQTT connection lost");
                    } else {
                        tracing::warn!(error = %e, "MQTT connection attempt failed");
                    }
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(reconnect_delay) => {}
                    }
                }
            },
        }
    }

    closed.store(true, Ordering::Release);
    connected.store(false, Ordering::Release);
    tracing::info!("MQTT transport stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_broker() -> MqttConfig {
        MqttConfig {
            broker_address: "127.0.0.1".to_string(),
            broker_port: 1,
            reconnect_delay_ms: 50,
            ..MqttConfig::default()
        }
    }

    #[test]
    fn qos_levels_map_to_rumqttc() {
        assert_eq!(qos_from_level(0), QoS::AtMostOnce);
        assert_eq!(qos_from_level(1), QoS::AtLeastOnce);
        assert_eq!(qos_from_level(2), QoS::ExactlyOnce);
    }

    #[tokio::test]
    async fn publish_queues_without_waiting_for_broker() {
        let (tx, _) = broadcast::channel(2);
        let (publisher, handle) = MqttPublisher::connect(&unreachable_broker(), tx.subscribe());

        assert!(!publisher.is_connected());
        publisher
            .publish("driver/drowsiness", b"hello".to_vec())
            .expect("queued");

        let _ = tx.send(());
        handle.await.expect("event loop task");
    }

    #[tokio::test]
    async fn publish_after_shutdown_is_refused() {
        let (tx, _) = broadcast::channel(2);
        let (publisher, handle) = MqttPublisher::connect(&unreachable_broker(), tx.subscribe());

        let _ = tx.send(());
        handle.await.expect("event loop task");

        assert!(publisher.is_closed());
        let result = publisher.publish("driver/drowsiness", b"late".to_vec());
        assert!(matches!(result, Err(PublishError::Closed)));
    }
}
