//! In-Memory Settings Store

use std::sync::{Arc, Mutex, PoisonError};

use crate::application::ports::{PlaybackPreferences, SettingsError, SettingsStorePort};

/// 内存偏好存储
pub struct InMemorySettingsStore {
    preferences: Mutex<PlaybackPreferences>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::with_preferences(PlaybackPreferences::default())
    }

    pub fn with_preferences(preferences: PlaybackPreferences) -> Self {
        Self {
            preferences: Mutex::new(preferences),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStorePort for InMemorySettingsStore {
    fn load(&self) -> Result<PlaybackPreferences, SettingsError> {
        Ok(*self
            .preferences
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, preferences: &PlaybackPreferences) -> Result<(), SettingsError> {
        *self
            .preferences
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = *preferences;
        Ok(())
    }
}
