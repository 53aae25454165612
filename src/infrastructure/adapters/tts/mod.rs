//! TTS Adapter - 语音合成引擎实现

mod fake_synthesizer;

pub use fake_synthesizer::{FakeSpeechSynthesizer, FakeSynthesizerConfig};
