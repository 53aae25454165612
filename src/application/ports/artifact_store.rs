//! Artifact Store Port - 临时音频产物存储抽象

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::playback::{AudioArtifact, AudioBuffer, SampleFormat, SessionId};

/// 产物存储错误
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create artifact: {0}")]
    Create(String),

    #[error("Failed to write artifact: {0}")]
    Write(String),

    #[error("Format mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        expected: SampleFormat,
        actual: SampleFormat,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 正在写入的产物
///
/// 未调用 `finish` 就被丢弃时，实现负责删除半成品文件。
pub trait ArtifactWriter: Send {
    /// 打开文件时使用的采样格式
    fn format(&self) -> SampleFormat;

    /// 追加一个缓冲，格式必须与 `format()` 一致
    fn append(&mut self, buffer: &AudioBuffer) -> Result<(), ArtifactError>;

    /// 已写入的帧数
    fn frames_written(&self) -> u64;

    /// 写完并交出产物所有权
    fn finish(self: Box<Self>) -> Result<AudioArtifact, ArtifactError>;
}

/// Artifact Store Port
#[async_trait]
pub trait ArtifactStorePort: Send + Sync {
    /// 会话产物的路径，每个会话唯一
    fn artifact_path(&self, session_id: SessionId) -> PathBuf;

    /// 按第一个缓冲的格式创建产物文件
    async fn create(
        &self,
        session_id: SessionId,
        format: SampleFormat,
    ) -> Result<Box<dyn ArtifactWriter>, ArtifactError>;
}
