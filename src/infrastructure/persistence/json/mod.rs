//! JSON 文件持久化

mod settings_store;

pub use settings_store::JsonSettingsStore;
