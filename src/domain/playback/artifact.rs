//! Playback Context - 音频产物
//!
//! 一次会话合成出的临时音频文件。由会话独占，值被丢弃时文件随之删除，
//! 无论会话是正常结束、被取代还是失败。

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::audio::SampleFormat;

#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    format: SampleFormat,
    frames: u64,
}

impl AudioArtifact {
    pub fn new(path: PathBuf, format: SampleFormat, frames: u64) -> Self {
        Self {
            path,
            format,
            frames,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.frames)
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Audio artifact deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to delete audio artifact"
            ),
        }
    }
}
