//! Playback Context - 合成音频缓冲与采样格式

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::PlaybackError;

/// 采样编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    Int16,
    Float32,
}

impl SampleEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Float32 => 32,
        }
    }
}

/// 采样格式，由第一个非空缓冲决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

impl SampleFormat {
    /// 指定帧数对应的时长
    pub fn duration_of(&self, frames: u64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz/{}ch/{:?}",
            self.sample_rate, self.channels, self.encoding
        )
    }
}

/// 缓冲里的样本
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Int16(Vec<i16>),
    Float32(Vec<f32>),
    /// 引擎给出的非 PCM 数据，无法写入
    Encoded { codec: String, bytes: Vec<u8> },
}

/// 语音引擎输出的一段音频
///
/// 长度为零的缓冲表示合成结束，不是错误。
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Samples,
}

impl AudioBuffer {
    pub fn int16(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Samples::Int16(samples),
        }
    }

    pub fn float32(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Samples::Float32(samples),
        }
    }

    /// 合成结束标记
    pub fn end_of_stream() -> Self {
        Self::int16(0, 0, Vec::new())
    }

    /// 样本个数（所有声道合计）
    pub fn len(&self) -> usize {
        match &self.samples {
            Samples::Int16(s) => s.len(),
            Samples::Float32(s) => s.len(),
            Samples::Encoded { bytes, .. } => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 帧数
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.len() / self.channels as usize) as u64
    }

    /// 识别采样格式；不能写成 PCM 的缓冲返回 UnsupportedBuffer
    pub fn format(&self) -> Result<SampleFormat, PlaybackError> {
        let encoding = match &self.samples {
            Samples::Int16(_) => SampleEncoding::Int16,
            Samples::Float32(_) => SampleEncoding::Float32,
            Samples::Encoded { codec, .. } => {
                return Err(PlaybackError::UnsupportedBuffer(format!(
                    "non-PCM codec {}",
                    codec
                )))
            }
        };

        if self.sample_rate == 0 || self.channels == 0 {
            return Err(PlaybackError::UnsupportedBuffer(format!(
                "invalid layout: {}Hz, {} channels",
                self.sample_rate, self.channels
            )));
        }

        if self.len() % self.channels as usize != 0 {
            return Err(PlaybackError::UnsupportedBuffer(format!(
                "{} samples do not divide into {} channels",
                self.len(),
                self.channels
            )));
        }

        Ok(SampleFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_stream_is_empty() {
        assert!(AudioBuffer::end_of_stream().is_empty());
        assert!(!AudioBuffer::int16(22050, 1, vec![0; 10]).is_empty());
    }

    #[test]
    fn test_format_detected() {
        let buffer = AudioBuffer::float32(24000, 2, vec![0.0; 8]);
        let format = buffer.format().unwrap();
        assert_eq!(format.sample_rate, 24000);
        assert_eq!(format.channels, 2);
        assert_eq!(format.encoding, SampleEncoding::Float32);
        assert_eq!(buffer.frames(), 4);
    }

    #[test]
    fn test_unrecognized_buffers() {
        let encoded = AudioBuffer {
            sample_rate: 48000,
            channels: 1,
            samples: Samples::Encoded {
                codec: "opus".to_string(),
                bytes: vec![1, 2, 3],
            },
        };
        assert!(matches!(
            encoded.format(),
            Err(PlaybackError::UnsupportedBuffer(_))
        ));

        let zero_rate = AudioBuffer::int16(0, 1, vec![1, 2]);
        assert!(zero_rate.format().is_err());

        let ragged = AudioBuffer::int16(22050, 2, vec![1, 2, 3]);
        assert!(ragged.format().is_err());
    }

    #[test]
    fn test_duration_of() {
        let format = SampleFormat {
            sample_rate: 1000,
            channels: 1,
            encoding: SampleEncoding::Int16,
        };
        assert_eq!(format.duration_of(1500), Duration::from_millis(1500));
    }
}
