//! Best-score persistence
//!
//! A single monotonically non-decreasing integer, stored as a plain decimal
//! string under the key the game has always used.

use crate::store::KeyValueStore;

/// Persisted best score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestScore(pub u32);

impl BestScore {
    /// Storage key
    const STORAGE_KEY: &'static str = "bestScore";

    /// Load the best score; missing or malformed reads as zero
    pub fn load(store: &impl KeyValueStore) -> Self {
        let value = store
            .get(Self::STORAGE_KEY)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        Self(value)
    }

    /// Persist the current value; storage failure is tolerated
    pub fn save(&self, store: &mut impl KeyValueStore) {
        if !store.set(Self::STORAGE_KEY, &self.0.to_string()) {
            log::warn!("Could not persist best score");
        }
    }

    /// Raise the best score if `score` beats it, persisting on change.
    /// Returns true when a new best was recorded.
    pub fn update(&mut self, score: u32, store: &mut impl KeyValueStore) -> bool {
        if score <= self.0 {
            return false;
        }
        self.0 = score;
        self.save(store);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_missing_reads_as_zero() {
        let store = MemoryStore::new();
        assert_eq!(BestScore::load(&store), BestScore(0));
    }

    #[test]
    fn test_update_is_monotonic() {
        let mut store = MemoryStore::new();
        let mut best = BestScore::load(&store);

        assert!(best.update(3, &mut store));
        assert!(!best.update(2, &mut store));
        assert!(!best.update(3, &mut store));
        assert!(best.update(7, &mut store));

        assert_eq!(store.get("bestScore").as_deref(), Some("7"));
        assert_eq!(BestScore::load(&store), BestScore(7));
    }

    #[test]
    fn test_malformed_value_reads_as_zero() {
        let mut store = MemoryStore::new();
        store.set("bestScore", "not-a-number");
        assert_eq!(BestScore::load(&store), BestScore(0));
    }
}
