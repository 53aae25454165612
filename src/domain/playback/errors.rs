//! Playback Context - Errors

use std::time::Duration;
use thiserror::Error;

/// 播放会话错误
///
/// 所有内部失败都归入这几类，UI 只看到状态变成 Failed 加上可读的消息。
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlaybackError {
    #[error("没有可朗读的文本")]
    EmptyInput,

    #[error("不支持的音频缓冲: {0}")]
    UnsupportedBuffer(String),

    #[error("写入音频文件失败: {0}")]
    WriteFailure(String),

    #[error("语音合成停滞 {0:?} 没有输出")]
    StallTimeout(Duration),

    #[error("无法激活音频输出: {0}")]
    ResourceActivationFailure(String),

    #[error("无法创建播放器: {0}")]
    PlayerConstructionFailure(String),

    #[error("播放器意外停止: {0}")]
    PlayerFailure(String),

    #[error("语音合成引擎错误: {0}")]
    EngineFailure(String),

    #[error("播放控制器已关闭")]
    ControllerClosed,
}

impl PlaybackError {
    /// 稳定的错误码，用于事件和日志
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::UnsupportedBuffer(_) => "unsupported_buffer",
            Self::WriteFailure(_) => "write_failure",
            Self::StallTimeout(_) => "stall_timeout",
            Self::ResourceActivationFailure(_) => "resource_activation_failure",
            Self::PlayerConstructionFailure(_) => "player_construction_failure",
            Self::PlayerFailure(_) => "player_failure",
            Self::EngineFailure(_) => "engine_failure",
            Self::ControllerClosed => "controller_closed",
        }
    }

    pub fn is_stall(&self) -> bool {
        matches!(self, Self::StallTimeout(_))
    }
}
