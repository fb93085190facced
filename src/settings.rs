//! Player preferences
//!
//! Persisted as plain strings (not JSON) so the stored values stay compatible
//! with what the game has always written.

use serde::{Deserialize, Serialize};

use crate::store::KeyValueStore;

/// Player preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Sound effects on/off
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Storage key for the sound flag
    const SOUND_KEY: &'static str = "flappySoundOn";

    /// Load preferences; anything missing or unparseable falls back to default
    pub fn load(store: &impl KeyValueStore) -> Self {
        let sound_enabled = match store.get(Self::SOUND_KEY) {
            Some(v) => v == "true",
            None => Self::default().sound_enabled,
        };
        Self { sound_enabled }
    }

    /// Persist preferences; storage failure is tolerated
    pub fn save(&self, store: &mut impl KeyValueStore) {
        let value = if self.sound_enabled { "true" } else { "false" };
        if !store.set(Self::SOUND_KEY, value) {
            log::warn!("Could not persist sound preference");
        }
    }

    /// Flip the sound flag and persist the new value
    pub fn toggle_sound(&mut self, store: &mut impl KeyValueStore) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.save(store);
        self.sound_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_sound_on() {
        let store = MemoryStore::new();
        assert!(Settings::load(&store).sound_enabled);
    }

    #[test]
    fn test_toggle_persists() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::load(&store);

        assert!(!settings.toggle_sound(&mut store));
        assert_eq!(store.get("flappySoundOn").as_deref(), Some("false"));
        assert!(!Settings::load(&store).sound_enabled);

        assert!(settings.toggle_sound(&mut store));
        assert!(Settings::load(&store).sound_enabled);
    }

    #[test]
    fn test_garbage_value_reads_as_off() {
        let mut store = MemoryStore::new();
        store.set("flappySoundOn", "maybe");
        assert!(!Settings::load(&store).sound_enabled);
    }
}
