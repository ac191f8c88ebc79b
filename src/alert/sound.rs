//! Local audible alert.
//!
//! [`CommandAlertSound`] plays the alert through an external player program
//! (`aplay`, `paplay`, `afplay`, ...). A supervisor task replays the sound
//! until `stop()` when looping is enabled.

use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SoundConfig;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("alert sound file not found: {0}")]
    MissingSound(String),
    #[error("failed to spawn audio player '{player}': {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },
    #[error("audio playback requires a tokio runtime")]
    NoRuntime,
}

/// Start/stop switch for the local alert. Both calls are idempotent.
pub trait LocalAlert {
    fn start(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    fn is_active(&self) -> bool;
}

struct Playback {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct CommandAlertSound {
    config: SoundConfig,
    playback: Option<Playback>,
}

impl CommandAlertSound {
    pub fn new(config: SoundConfig) -> Self {
        Self {
            config,
            playback: None,
        }
    }
}

impl LocalAlert for CommandAlertSound {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.is_active() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| AudioError::NoRuntime)?;
        if !Path::new(&self.config.sound_path).is_file() {
            return Err(AudioError::MissingSound(self.config.sound_path.clone()));
        }

        // 首个播放进程同步启动，便于立即暴露播放器缺失等错误
        let child = spawn_player(&self.config)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(supervise(child, self.config.clone(), stop_rx));

        tracing::debug!(player = %self.config.player, "Alert sound started");
        self.playback = Some(Playback { stop_tx, handle });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(playback) = self.playback.take() {
            // 监督任务可能已自行结束，发送失败无需处理
            let _ = playback.stop_tx.send(true);
            tracing::debug!("Alert sound stopped");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

impl Drop for CommandAlertSound {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn spawn_player(config: &SoundConfig) -> Result<Child, AudioError> {
    Command::new(&config.player)
        .arg(&config.sound_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AudioError::Spawn {
            player: config.player.clone(),
            source,
        })
}

async fn supervise(mut child: Child, config: SoundConfig, mut stop_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            // 发送端被丢弃同样视为停止
            _ = stop_rx.changed() => {
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "Audio player already exited");
                }
                return;
            }
            status = child.wait() => match status {
                Ok(status) if status.success() && config.looped => match spawn_player(&config) {
                    Ok(next) => child = next,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to restart alert sound");
                        return;
                    }
                },
                Ok(status) => {
                    if !status.success() {
                        tracing::warn!(code = ?status.code(), player = %config.player, "Audio player exited with failure");
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to wait for audio player");
                    return;
                }
            },
        }
    }
}
