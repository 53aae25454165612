//! Headless Player - 无声卡的时钟播放器
//!
//! 打开时用 symphonia 探测 WAV 产物得到时长，之后按墙钟和播放速率推进进度，
//! 到达结尾时发出自然结束信号。用于演示程序和测试。

use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;

use crate::application::ports::{AudioPlayer, AudioPlayerFactory, OpenedPlayer, PlayerError};
use crate::domain::playback::AudioArtifact;

/// 探测音频文件时长
pub fn probe_duration(path: &Path) -> Result<Duration, PlayerError> {
    let file = File::open(path)
        .map_err(|e| PlayerError::Unreadable(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlayerError::Unreadable(format!("Probe failed: {}", e)))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| PlayerError::Unreadable("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| PlayerError::Unreadable("Unknown sample rate".to_string()))?;
    let frames = track
        .codec_params
        .n_frames
        .ok_or_else(|| PlayerError::Unreadable("Unknown frame count".to_string()))?;

    Ok(Duration::from_secs_f64(frames as f64 / sample_rate as f64))
}

/// 播放时钟
#[derive(Debug)]
struct Clock {
    /// 上次暂停或定位时的媒体位置
    base: Duration,
    /// 正在播放时，开始计时的时刻
    resumed_at: Option<Instant>,
    rate: f32,
    duration: Duration,
    stopped: bool,
}

impl Clock {
    fn elapsed(&self) -> Duration {
        let mut elapsed = self.base;
        if let Some(resumed_at) = self.resumed_at {
            elapsed += resumed_at.elapsed().mul_f32(self.rate);
        }
        elapsed.min(self.duration)
    }

    /// 播放中距离结尾的墙钟时间
    fn remaining_wall(&self) -> Option<Duration> {
        self.resumed_at?;
        let remaining = self.duration.saturating_sub(self.elapsed());
        Some(remaining.div_f32(self.rate))
    }

    fn freeze(&mut self) {
        self.base = self.elapsed();
        self.resumed_at = None;
    }
}

struct Shared {
    clock: Mutex<Clock>,
    changed: Notify,
}

impl Shared {
    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Clock)) {
        f(&mut self.clock());
        self.changed.notify_one();
    }
}

/// 时钟驱动：播放到结尾时发出结束信号，停止后退出且不发信号
async fn drive(shared: Arc<Shared>, ended: oneshot::Sender<()>) {
    loop {
        let (stopped, remaining) = {
            let clock = shared.clock();
            (clock.stopped, clock.remaining_wall())
        };
        if stopped {
            return;
        }

        match remaining {
            Some(wait) if wait.is_zero() => {
                shared.update(Clock::freeze);
                let _ = ended.send(());
                return;
            }
            Some(wait) => {
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = shared.changed.notified() => {}
                }
            }
            None => shared.changed.notified().await,
        }
    }
}

pub struct HeadlessPlayer {
    shared: Arc<Shared>,
}

impl HeadlessPlayer {
    /// 创建播放器并启动时钟驱动任务
    pub fn spawn(duration: Duration) -> (Self, oneshot::Receiver<()>) {
        let shared = Arc::new(Shared {
            clock: Mutex::new(Clock {
                base: Duration::ZERO,
                resumed_at: None,
                rate: 1.0,
                duration,
                stopped: false,
            }),
            changed: Notify::new(),
        });
        let (tx, rx) = oneshot::channel();
        tokio::spawn(drive(shared.clone(), tx));
        (Self { shared }, rx)
    }
}

impl AudioPlayer for HeadlessPlayer {
    fn play(&mut self) {
        self.shared.update(|clock| {
            if clock.resumed_at.is_none() && !clock.stopped {
                clock.resumed_at = Some(Instant::now());
            }
        });
    }

    fn pause(&mut self) {
        self.shared.update(Clock::freeze);
    }

    fn stop(&mut self) {
        self.shared.update(|clock| {
            clock.freeze();
            clock.stopped = true;
        });
    }

    fn seek(&mut self, position: Duration) {
        self.shared.update(|clock| {
            let playing = clock.resumed_at.is_some();
            clock.base = position.min(clock.duration);
            clock.resumed_at = playing.then(Instant::now);
        });
    }

    fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() || rate <= 0.0 {
            return;
        }
        self.shared.update(|clock| {
            let playing = clock.resumed_at.is_some();
            clock.freeze();
            clock.rate = rate;
            clock.resumed_at = playing.then(Instant::now);
        });
    }

    fn elapsed(&self) -> Duration {
        self.shared.clock().elapsed()
    }

    fn duration(&self) -> Duration {
        self.shared.clock().duration
    }

    fn is_playing(&self) -> bool {
        self.shared.clock().resumed_at.is_some()
    }
}

impl Drop for HeadlessPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 无声卡播放器工厂
#[derive(Debug, Default, Clone)]
pub struct HeadlessPlayerFactory;

impl HeadlessPlayerFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioPlayerFactory for HeadlessPlayerFactory {
    async fn open(&self, artifact: &AudioArtifact) -> Result<OpenedPlayer, PlayerError> {
        let path = artifact.path().to_path_buf();
        let duration = tokio::task::spawn_blocking(move || probe_duration(&path))
            .await
            .map_err(|e| PlayerError::Backend(e.to_string()))??;

        let (player, ended) = HeadlessPlayer::spawn(duration);
        Ok(OpenedPlayer {
            player: Box::new(player),
            ended,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_plays_to_end_and_signals() {
        let (mut player, ended) = HeadlessPlayer::spawn(Duration::from_secs(2));
        player.play();
        assert!(player.is_playing());

        ended.await.unwrap();
        assert_eq!(player.elapsed(), Duration::from_secs(2));
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_shortens_playback() {
        let (mut player, ended) = HeadlessPlayer::spawn(Duration::from_secs(4));
        player.set_rate(2.0);
        player.play();

        let started = Instant::now();
        ended.await.unwrap();
        assert!(started.elapsed() <= Duration::from_millis(2010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_seek() {
        let (mut player, _ended) = HeadlessPlayer::spawn(Duration::from_secs(10));
        player.play();
        tokio::time::sleep(Duration::from_secs(3)).await;
        player.pause();
        let paused_at = player.elapsed();
        assert!(paused_at >= Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(player.elapsed(), paused_at);

        player.seek(Duration::from_secs(60));
        assert_eq!(player.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_never_signals_end() {
        let (mut player, ended) = HeadlessPlayer::spawn(Duration::from_secs(1));
        player.play();
        player.stop();
        assert!(ended.await.is_err());
    }

    #[tokio::test]
    async fn test_probe_duration_of_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..12000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(probe_duration(&path).unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"not audio at all").unwrap();
        assert!(matches!(
            probe_duration(&path),
            Err(PlayerError::Unreadable(_))
        ));
    }
}
