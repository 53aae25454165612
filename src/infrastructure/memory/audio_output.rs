//! In-Memory Audio Output - 进程内独占的音频输出通道

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::application::ports::{AudioOutputPort, OutputError};

/// 独占音频输出
///
/// 记录激活和释放次数，可以模拟通道被其他程序占用。
pub struct ExclusiveAudioOutput {
    active: AtomicBool,
    available: AtomicBool,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
}

impl ExclusiveAudioOutput {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            available: AtomicBool::new(true),
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 设为 false 后激活会失败
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivation_count(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl Default for ExclusiveAudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutputPort for ExclusiveAudioOutput {
    fn activate(&self) -> Result<(), OutputError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(OutputError::Unavailable(
                "output claimed by another client".to_string(),
            ));
        }
        if !self.active.swap(true, Ordering::SeqCst) {
            self.activations.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("Audio output activated");
        }
        Ok(())
    }

    fn deactivate(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("Audio output deactivated");
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
