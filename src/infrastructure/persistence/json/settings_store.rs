//! JSON Settings Store - 播放偏好的 JSON 文件存储

use std::path::{Path, PathBuf};

use crate::application::ports::{PlaybackPreferences, SettingsError, SettingsStorePort};

/// JSON 文件偏好存储
pub struct JsonSettingsStore {
    path: PathBuf,
    /// 文件不存在时返回的偏好
    defaults: PlaybackPreferences,
}

impl JsonSettingsStore {
    pub fn new(path: impl AsRef<Path>, defaults: PlaybackPreferences) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStorePort for JsonSettingsStore {
    fn load(&self) -> Result<PlaybackPreferences, SettingsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No saved preferences, using defaults");
                return Ok(self.defaults);
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            SettingsError::Serialization(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, preferences: &PlaybackPreferences) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(preferences)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        // 先写临时文件再改名，避免写一半留下损坏的文件
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            auto_advance = preferences.auto_advance_enabled,
            rate = preferences.playback_rate,
            "Preferences saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = PlaybackPreferences {
            auto_advance_enabled: true,
            playback_rate: 1.25,
        };
        let store = JsonSettingsStore::new(dir.path().join("prefs.json"), defaults);
        assert_eq!(store.load().unwrap(), defaults);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(
            dir.path().join("nested").join("prefs.json"),
            PlaybackPreferences::default(),
        );
        let prefs = PlaybackPreferences {
            auto_advance_enabled: true,
            playback_rate: 1.5,
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonSettingsStore::new(&path, PlaybackPreferences::default());
        assert!(matches!(
            store.load(),
            Err(SettingsError::Serialization(_))
        ));
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"auto_advance_enabled": true}"#).unwrap();
        let store = JsonSettingsStore::new(&path, PlaybackPreferences::default());
        let prefs = store.load().unwrap();
        assert!(prefs.auto_advance_enabled);
        assert_eq!(prefs.playback_rate, 1.0);
    }
}
