//! Speech Synthesizer Port - 语音合成引擎抽象
//!
//! 合成结果以有类型的缓冲通道交付，长度为零的缓冲表示合成完成。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::playback::AudioBuffer;
use crate::domain::voice::VoiceDescriptor;

/// 合成引擎错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Voice not available: {0}")]
    VoiceUnavailable(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 规范化后的文本
    pub text: String,
    /// 目标语言标签，如 zh-CN
    pub locale: String,
    /// 选中的音色；None 时由引擎按 locale 自选
    pub voice: Option<VoiceDescriptor>,
}

/// Speech Synthesizer Port
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 已安装的音色
    async fn available_voices(&self) -> Vec<VoiceDescriptor>;

    /// 开始合成，返回缓冲接收端
    ///
    /// 接收端被丢弃即视为取消，实现应尽快停止产出。
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<mpsc::Receiver<AudioBuffer>, SynthesisError>;
}
