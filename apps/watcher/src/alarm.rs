//! Local audible alert: terminal bell plus a sound file played by whatever
//! command-line player the host has.

use crate::config::AlarmConfig;
use pagewatch::{Alarm, PlaybackError};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Tried in order, the first one found on PATH wins
const PLAYERS: &[&str] = &["paplay", "aplay", "afplay", "mpg123", "play"];

pub struct LocalAlarm {
    bell: bool,
    sound_path: Option<PathBuf>,
    players: Vec<String>,
}

impl LocalAlarm {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            bell: config.bell,
            sound_path: config.sound_path.clone(),
            players: PLAYERS.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn with_players(mut self, players: Vec<String>) -> Self {
        self.players = players;
        self
    }

    fn ring_bell(&self) {
        if !self.bell {
            return;
        }
        // BEL, not audible on every terminal
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

#[async_trait::async_trait]
impl Alarm for LocalAlarm {
    async fn ring(&self) -> Result<(), PlaybackError> {
        self.ring_bell();

        let Some(ref path) = self.sound_path else {
            return Ok(());
        };

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(PlaybackError::MissingAsset(path.display().to_string()));
        }

        for player in &self.players {
            let spawned = Command::new(player)
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            let mut child = match spawned {
                Ok(child) => child,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(PlaybackError::Player {
                        player: player.clone(),
                        message: e.to_string(),
                    });
                }
            };

            debug!(player = %player, "Playing alert sound");

            // Playback runs on; a pass never waits for the sound to finish
            let player = player.clone();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) if status.success() => {}
                    Ok(status) => warn!(player = %player, %status, "Alert sound player failed"),
                    Err(e) => warn!(player = %player, error = %e, "Alert sound player failed"),
                }
            });
            return Ok(());
        }

        Err(PlaybackError::NoPlayer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(sound_path: Option<PathBuf>) -> LocalAlarm {
        LocalAlarm::new(&AlarmConfig {
            bell: false,
            sound_path,
        })
    }

    #[tokio::test]
    async fn silent_without_sound_file() {
        assert!(alarm(None).ring().await.is_ok());
    }

    #[tokio::test]
    async fn missing_asset_is_reported() {
        let err = alarm(Some(PathBuf::from("/nowhere/goose-urgent.wav")))
            .ring()
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::MissingAsset(_)));
    }

    #[tokio::test]
    async fn no_player_on_host_is_reported() {
        let sound = tempfile::NamedTempFile::new().unwrap();
        let err = alarm(Some(sound.path().to_path_buf()))
            .with_players(vec!["pagewatch-no-such-player".to_string()])
            .ring()
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NoPlayer));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn first_available_player_is_used() {
        let sound = tempfile::NamedTempFile::new().unwrap();
        let result = alarm(Some(sound.path().to_path_buf()))
            .with_players(vec![
                "pagewatch-no-such-player".to_string(),
                "true".to_string(),
            ])
            .ring()
            .await;
        assert!(result.is_ok());
    }
}
