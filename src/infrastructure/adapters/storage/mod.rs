//! Storage Adapter - 临时音频产物存储

mod wav_artifact_store;

pub use wav_artifact_store::WavArtifactStore;
