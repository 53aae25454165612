//! WAV Artifact Store - 临时 WAV 产物存储
//!
//! 每个会话一个文件，格式取自第一个缓冲。写入未完成的文件在 writer 丢弃时删除。

use async_trait::async_trait;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ArtifactError, ArtifactStorePort, ArtifactWriter};
use crate::domain::playback::{
    AudioArtifact, AudioBuffer, SampleEncoding, SampleFormat, Samples, SessionId,
};

/// WAV 产物存储
pub struct WavArtifactStore {
    /// 存储目录
    base_dir: PathBuf,
}

impl WavArtifactStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn wav_spec(format: SampleFormat) -> hound::WavSpec {
    match format.encoding {
        SampleEncoding::Int16 => hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        },
        SampleEncoding::Float32 => hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        },
    }
}

#[async_trait]
impl ArtifactStorePort for WavArtifactStore {
    fn artifact_path(&self, session_id: SessionId) -> PathBuf {
        self.base_dir.join(format!("tingwen-{}.wav", session_id))
    }

    async fn create(
        &self,
        session_id: SessionId,
        format: SampleFormat,
    ) -> Result<Box<dyn ArtifactWriter>, ArtifactError> {
        fs::create_dir_all(&self.base_dir).await?;

        let path = self.artifact_path(session_id);
        let writer = hound::WavWriter::create(&path, wav_spec(format))
            .map_err(|e| ArtifactError::Create(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            session_id = %session_id,
            path = %path.display(),
            format = %format,
            "WAV artifact created"
        );

        Ok(Box::new(WavArtifactWriter {
            writer: Some(writer),
            path,
            format,
            frames: 0,
            finished: false,
        }))
    }
}

struct WavArtifactWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    format: SampleFormat,
    frames: u64,
    finished: bool,
}

impl ArtifactWriter for WavArtifactWriter {
    fn format(&self) -> SampleFormat {
        self.format
    }

    fn append(&mut self, buffer: &AudioBuffer) -> Result<(), ArtifactError> {
        let actual = buffer
            .format()
            .map_err(|e| ArtifactError::Write(e.to_string()))?;
        if actual != self.format {
            return Err(ArtifactError::FormatMismatch {
                expected: self.format,
                actual,
            });
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ArtifactError::Write("writer already closed".to_string()))?;

        let written = match &buffer.samples {
            Samples::Int16(samples) => samples.iter().try_for_each(|s| writer.write_sample(*s)),
            Samples::Float32(samples) => samples.iter().try_for_each(|s| writer.write_sample(*s)),
            Samples::Encoded { codec, .. } => {
                return Err(ArtifactError::Write(format!("cannot write {} data", codec)))
            }
        };
        written.map_err(|e| ArtifactError::Write(e.to_string()))?;

        self.frames += buffer.frames();
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }

    fn finish(mut self: Box<Self>) -> Result<AudioArtifact, ArtifactError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ArtifactError::Write("writer already closed".to_string()))?;
        writer
            .finalize()
            .map_err(|e| ArtifactError::Write(e.to_string()))?;

        self.finished = true;
        Ok(AudioArtifact::new(
            self.path.clone(),
            self.format,
            self.frames,
        ))
    }
}

impl Drop for WavArtifactWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // 先关闭文件句柄再删除
        drop(self.writer.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Partial artifact removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partial artifact"
            ),
        }
    }
}
