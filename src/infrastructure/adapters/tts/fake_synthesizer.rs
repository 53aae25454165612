//! Fake Speech Synthesizer - 用于演示和测试的合成引擎
//!
//! 不调用真实引擎，按配置分块生成正弦波 PCM，最后发送结束标记

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::ports::{SpeechSynthesizerPort, SynthesisError, SynthesisRequest};
use crate::domain::playback::AudioBuffer;
use crate::domain::voice::{VoiceDescriptor, VoiceQuality};

/// Fake Synthesizer 配置
#[derive(Debug, Clone)]
pub struct FakeSynthesizerConfig {
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u16,
    /// 每个缓冲的帧数
    pub chunk_frames: usize,
    /// 缓冲个数；None 时按文本长度估算
    pub chunk_count: Option<usize>,
    /// 相邻缓冲之间的间隔，模拟推理耗时
    pub chunk_delay: Duration,
    /// 正弦波频率
    pub tone_hz: f32,
    /// 发出这么多个缓冲后不再输出也不结束，模拟引擎卡住
    pub stall_after: Option<usize>,
    /// 对外宣称已安装的音色
    pub voices: Vec<VoiceDescriptor>,
}

impl Default for FakeSynthesizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            channels: 1,
            chunk_frames: 2205,
            chunk_count: None,
            chunk_delay: Duration::from_millis(20),
            tone_hz: 440.0,
            stall_after: None,
            voices: vec![
                VoiceDescriptor::new(
                    "fake.zh-CN.premium",
                    "Tingting",
                    "zh-CN",
                    VoiceQuality::Premium,
                ),
                VoiceDescriptor::new("fake.zh-CN.default", "Lili", "zh-CN", VoiceQuality::Default),
                VoiceDescriptor::new("fake.en-US.enhanced", "Alex", "en-US", VoiceQuality::Enhanced),
            ],
        }
    }
}

/// Fake Speech Synthesizer
pub struct FakeSpeechSynthesizer {
    config: FakeSynthesizerConfig,
}

impl FakeSpeechSynthesizer {
    pub fn new(config: FakeSynthesizerConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            chunk_frames = config.chunk_frames,
            "FakeSpeechSynthesizer initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSynthesizerConfig::default())
    }

    fn chunk_count(&self, text: &str) -> usize {
        self.config
            .chunk_count
            .unwrap_or_else(|| text.chars().count().div_ceil(4))
            .max(1)
    }

    fn tone_chunk(&self, index: usize) -> AudioBuffer {
        let channels = self.config.channels.max(1) as usize;
        let rate = self.config.sample_rate.max(1) as f32;
        let start = index * self.config.chunk_frames;
        let mut samples = Vec::with_capacity(self.config.chunk_frames * channels);
        for frame in start..start + self.config.chunk_frames {
            let t = frame as f32 / rate;
            let value = (t * self.config.tone_hz * std::f32::consts::TAU).sin() * 0.2;
            let sample = (value * i16::MAX as f32) as i16;
            samples.extend(std::iter::repeat(sample).take(channels));
        }
        AudioBuffer::int16(self.config.sample_rate, self.config.channels, samples)
    }
}

#[async_trait]
impl SpeechSynthesizerPort for FakeSpeechSynthesizer {
    async fn available_voices(&self) -> Vec<VoiceDescriptor> {
        self.config.voices.clone()
    }

    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<mpsc::Receiver<AudioBuffer>, SynthesisError> {
        if let Some(voice) = request.voice.as_ref() {
            if !self.config.voices.iter().any(|v| v.id == voice.id) {
                return Err(SynthesisError::VoiceUnavailable(voice.id.clone()));
            }
        }

        let chunks: Vec<AudioBuffer> = (0..self.chunk_count(&request.text))
            .map(|i| self.tone_chunk(i))
            .collect();
        let delay = self.config.chunk_delay;
        let stall_after = self.config.stall_after;

        tracing::debug!(
            locale = %request.locale,
            voice = request.voice.as_ref().map(|v| v.id.as_str()).unwrap_or("-"),
            chunks = chunks.len(),
            "FakeSpeechSynthesizer: generating tone"
        );

        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            for (index, chunk) in chunks.into_iter().enumerate() {
                if stall_after.is_some_and(|n| index >= n) {
                    break;
                }
                tokio::time::sleep(delay).await;
                if tx.send(chunk).await.is_err() {
                    return;
                }
            }
            if stall_after.is_some() {
                // 不再输出也不结束，直到消费方放弃
                tx.closed().await;
                return;
            }
            let _ = tx.send(AudioBuffer::end_of_stream()).await;
        });

        Ok(rx)
    }
}
