//! Playback Controller - 单个产物的播放控制
//!
//! 持有播放器和产物。控制器被丢弃时先停止播放器，再删除产物文件。

use std::path::Path;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::application::ports::{AudioPlayer, AudioPlayerFactory};
use crate::domain::playback::{AudioArtifact, PlaybackError, PlaybackRate};

pub struct PlaybackController {
    // 字段顺序决定析构顺序：播放器先于产物释放
    player: Box<dyn AudioPlayer>,
    artifact: AudioArtifact,
}

impl PlaybackController {
    /// 为产物打开播放器
    ///
    /// 打开失败时产物随之丢弃并删除。
    pub async fn load(
        factory: &dyn AudioPlayerFactory,
        artifact: AudioArtifact,
    ) -> Result<(Self, oneshot::Receiver<()>), PlaybackError> {
        let opened = factory
            .open(&artifact)
            .await
            .map_err(|e| PlaybackError::PlayerConstructionFailure(e.to_string()))?;

        tracing::debug!(
            path = %artifact.path().display(),
            duration_ms = opened.player.duration().as_millis() as u64,
            "Player loaded"
        );

        Ok((
            Self {
                player: opened.player,
                artifact,
            },
            opened.ended,
        ))
    }

    pub fn play(&mut self) {
        self.player.play();
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    /// 定位，超出时长的位置夹到结尾
    pub fn seek(&mut self, position: Duration) {
        let clamped = position.min(self.player.duration());
        self.player.seek(clamped);
    }

    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.player.set_rate(rate.value());
    }

    pub fn elapsed(&self) -> Duration {
        self.player.elapsed()
    }

    pub fn duration(&self) -> Duration {
        self.player.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    pub fn artifact_path(&self) -> &Path {
        self.artifact.path()
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.player.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{OpenedPlayer, PlayerError};
    use crate::domain::playback::{SampleEncoding, SampleFormat};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        stopped: bool,
        seek: Option<Duration>,
        rate: Option<f32>,
    }

    struct RecordingPlayer {
        calls: Arc<Mutex<Calls>>,
    }

    impl AudioPlayer for RecordingPlayer {
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {
            self.calls.lock().unwrap().stopped = true;
        }
        fn seek(&mut self, position: Duration) {
            self.calls.lock().unwrap().seek = Some(position);
        }
        fn set_rate(&mut self, rate: f32) {
            self.calls.lock().unwrap().rate = Some(rate);
        }
        fn elapsed(&self) -> Duration {
            Duration::ZERO
        }
        fn duration(&self) -> Duration {
            Duration::from_secs(10)
        }
        fn is_playing(&self) -> bool {
            false
        }
    }

    struct Factory {
        calls: Arc<Mutex<Calls>>,
        fail: bool,
    }

    #[async_trait]
    impl AudioPlayerFactory for Factory {
        async fn open(&self, _artifact: &AudioArtifact) -> Result<OpenedPlayer, PlayerError> {
            if self.fail {
                return Err(PlayerError::Unreadable("corrupt".to_string()));
            }
            let (_tx, ended) = oneshot::channel();
            Ok(OpenedPlayer {
                player: Box::new(RecordingPlayer {
                    calls: self.calls.clone(),
                }),
                ended,
            })
        }
    }

    fn artifact(dir: &Path) -> AudioArtifact {
        let path = dir.join("a.wav");
        std::fs::write(&path, b"data").unwrap();
        AudioArtifact::new(
            path,
            SampleFormat {
                sample_rate: 22050,
                channels: 1,
                encoding: SampleEncoding::Int16,
            },
            0,
        )
    }

    #[tokio::test]
    async fn test_drop_stops_player_and_deletes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(Mutex::new(Calls::default()));
        let factory = Factory {
            calls: calls.clone(),
            fail: false,
        };

        let (mut controller, _ended) = PlaybackController::load(&factory, artifact(dir.path()))
            .await
            .unwrap();
        let path = controller.artifact_path().to_path_buf();

        controller.seek(Duration::from_secs(60));
        controller.set_rate(PlaybackRate::new(1.5));
        assert!(path.exists());

        drop(controller);
        let calls = calls.lock().unwrap();
        assert!(calls.stopped);
        assert_eq!(calls.seek, Some(Duration::from_secs(10)));
        assert_eq!(calls.rate, Some(1.5));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_open_failure_deletes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Factory {
            calls: Arc::new(Mutex::new(Calls::default())),
            fail: true,
        };
        let artifact = artifact(dir.path());
        let path = artifact.path().to_path_buf();

        let result = PlaybackController::load(&factory, artifact).await;
        assert!(matches!(
            result,
            Err(PlaybackError::PlayerConstructionFailure(_))
        ));
        assert!(!path.exists());
    }
}
