//! Persistence Layer - 持久化实现
//!
//! 用户播放偏好的 JSON 文件存储

pub mod json;

pub use json::JsonSettingsStore;
