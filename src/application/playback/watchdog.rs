//! Stall Watchdog - 合成停滞检测
//!
//! 合成期间按固定间隔检查最近一次写入进度，超过阈值没有新缓冲就报告停滞。
//! 每次检查前先看取消令牌，令牌取消后绝不会再报告。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 看门狗参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogSettings {
    /// 没有进度的最长时间
    pub timeout: Duration,
    /// 检查间隔
    pub poll_interval: Duration,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// 合成进度，写入方每写一个缓冲调用一次 `mark`
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    last_progress: Arc<watch::Sender<Instant>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Instant::now());
        Self {
            last_progress: Arc::new(tx),
        }
    }

    pub fn mark(&self) {
        self.last_progress.send_replace(Instant::now());
    }

    pub fn last_progress_at(&self) -> Instant {
        *self.last_progress.borrow()
    }

    pub fn silent_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_progress_at())
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StallWatchdog {
    settings: WatchdogSettings,
    progress: ProgressTracker,
    cancel: CancellationToken,
}

impl StallWatchdog {
    pub fn new(
        settings: WatchdogSettings,
        progress: ProgressTracker,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            progress,
            cancel,
        }
    }

    /// 运行到取消或发现停滞为止
    ///
    /// 返回 Some(静默时长) 表示停滞；最多返回一次。
    pub async fn run(self) -> Option<Duration> {
        let period = self.settings.poll_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = ticker.tick() => {}
            }

            if self.cancel.is_cancelled() {
                return None;
            }

            let silent = self.progress.silent_for();
            if silent > self.settings.timeout {
                tracing::warn!(
                    silent_ms = silent.as_millis() as u64,
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "Synthesis stalled"
                );
                return Some(silent);
            }
        }
    }
}
