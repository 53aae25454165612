//! Audio Output Port - 系统音频输出通道
//!
//! 进程内只有一个输出通道，由当前活动会话占用。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),
}

pub trait AudioOutputPort: Send + Sync {
    /// 占用输出通道，已占用时再次调用是幂等的
    fn activate(&self) -> Result<(), OutputError>;

    /// 释放输出通道
    fn deactivate(&self);

    fn is_active(&self) -> bool;
}
