use std::process::ExitCode;

use drowsiness_monitor::alert::{AlertDispatcher, CommandAlertSound, TelemetryRoute};
use drowsiness_monitor::config::Config;
use drowsiness_monitor::logging::{init_tracing, LogConfig};
use drowsiness_monitor::monitor::DrowsinessMonitor;
use drowsiness_monitor::source::JsonLinesSource;
use drowsiness_monitor::transport::MqttPublisher;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&LogConfig::from(&config)) {
        eprintln!("drowsiness-monitor: {e}");
        return ExitCode::FAILURE;
    }
    tracing::info!(?config, "Starting drowsiness-monitor");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    let mut source = match JsonLinesSource::open(&config.landmark_source).await {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open landmark source");
            return ExitCode::FAILURE;
        }
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let (publisher, transport_handle) = MqttPublisher::connect(&config.mqtt, shutdown_tx.subscribe());
    let dispatcher = AlertDispatcher::new(
        CommandAlertSound::new(config.sound.clone()),
        publisher,
        TelemetryRoute::from_config(&config),
    );
    let monitor = DrowsinessMonitor::new(config.detection, dispatcher, config.frame_timeout());

    let monitor_rx = shutdown_tx.subscribe();
    tokio::spawn(shutdown_signal(shutdown_tx.clone()));

    let result = monitor.run(&mut source, monitor_rx).await;

    // 循环结束后再关闭传输层，循环退出时不做最终发布
    let _ = shutdown_tx.send(());
    if let Err(e) = transport_handle.await {
        tracing::error!(error = %e, "MQTT transport task panicked");
    }

    match result {
        Ok(summary) => {
            tracing::info!(?summary, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Drowsiness monitor failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
