//! Synthesis Coordinator - 合成缓冲的单消费者循环
//!
//! 选定音色后向引擎请求合成，逐个接收缓冲：第一个非空缓冲决定文件格式并创建
//! 产物，之后的缓冲追加写入，长度为零的缓冲表示合成完成。取消令牌在每次等待时
//! 优先检查，取消后丢弃半成品文件。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::watchdog::ProgressTracker;
use crate::application::ports::{
    ArtifactError, ArtifactStorePort, ArtifactWriter, SpeechSynthesizerPort, SynthesisRequest,
};
use crate::domain::playback::{AudioArtifact, PlaybackError, SessionId};
use crate::domain::voice::{LanguageHint, VoiceSelector};

/// 一次合成任务
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub session_id: SessionId,
    /// 用于检测文字、选择音色的原文
    pub source_text: String,
    /// 送给引擎的规范化文本
    pub normalized_text: String,
    pub language_hint: LanguageHint,
}

#[derive(Debug)]
pub enum SynthesisOutcome {
    Completed(AudioArtifact),
    Cancelled,
}

pub struct SynthesisCoordinator {
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    artifacts: Arc<dyn ArtifactStorePort>,
    voices: VoiceSelector,
    progress: ProgressTracker,
    cancel: CancellationToken,
}

fn write_failure(e: ArtifactError) -> PlaybackError {
    PlaybackError::WriteFailure(e.to_string())
}

impl SynthesisCoordinator {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        artifacts: Arc<dyn ArtifactStorePort>,
        voices: VoiceSelector,
        progress: ProgressTracker,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            synthesizer,
            artifacts,
            voices,
            progress,
            cancel,
        }
    }

    pub async fn run(self, job: SynthesisJob) -> Result<SynthesisOutcome, PlaybackError> {
        let session_id = job.session_id;

        let available = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(SynthesisOutcome::Cancelled),
            voices = self.synthesizer.available_voices() => voices,
        };
        let choice = self
            .voices
            .choose(&job.language_hint, &job.source_text, &available);

        tracing::info!(
            session_id = %session_id,
            locale = %choice.locale,
            voice = choice.voice.as_ref().map(|v| v.id.as_str()).unwrap_or("<engine default>"),
            text_len = job.normalized_text.chars().count(),
            "Synthesis started"
        );

        let request = SynthesisRequest {
            text: job.normalized_text,
            locale: choice.locale,
            voice: choice.voice,
        };

        let mut buffers = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(SynthesisOutcome::Cancelled),
            result = self.synthesizer.synthesize(request) => {
                result.map_err(|e| PlaybackError::EngineFailure(e.to_string()))?
            }
        };

        let mut writer: Option<Box<dyn ArtifactWriter>> = None;
        let mut buffer_count: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!(session_id = %session_id, buffer_count, "Synthesis cancelled");
                    return Ok(SynthesisOutcome::Cancelled);
                }
                next = buffers.recv() => next,
            };

            // 通道关闭与空缓冲一样视为完成
            let buffer = match next {
                Some(buffer) if !buffer.is_empty() => buffer,
                _ => break,
            };

            let format = buffer.format()?;

            match writer.as_mut() {
                Some(w) => {
                    if w.format() != format {
                        return Err(PlaybackError::UnsupportedBuffer(format!(
                            "format changed mid-stream: {} -> {}",
                            w.format(),
                            format
                        )));
                    }
                    w.append(&buffer).map_err(write_failure)?;
                }
                None => {
                    let created = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Ok(SynthesisOutcome::Cancelled),
                        created = self.artifacts.create(session_id, format) => created,
                    };
                    let mut w = created.map_err(write_failure)?;
                    tracing::debug!(session_id = %session_id, format = %format, "Artifact opened");
                    w.append(&buffer).map_err(write_failure)?;
                    writer = Some(w);
                }
            }

            self.progress.mark();
            buffer_count += 1;
        }

        let writer = writer.ok_or_else(|| {
            PlaybackError::EngineFailure("合成结束但没有产生任何音频".to_string())
        })?;
        let artifact = writer.finish().map_err(write_failure)?;

        tracing::info!(
            session_id = %session_id,
            buffer_count,
            duration_ms = artifact.duration().as_millis() as u64,
            "Synthesis completed"
        );

        Ok(SynthesisOutcome::Completed(artifact))
    }
}
