//! Face sprite persistence
//!
//! The confirmed crop export is stored as a PNG data URI next to a
//! last-active timestamp. The sprite expires after thirty minutes without
//! interaction; the timestamp is refreshed on every qualifying input so an
//! active play session never loses its face mid-run.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use thiserror::Error;

use crate::consts::FACE_TTL_MS;
use crate::store::KeyValueStore;

/// Storage key for the encoded sprite
pub const FACE_KEY: &str = "flappyFacePngV2";
/// Storage key for the TTL anchor, in ms since the epoch
pub const LAST_ACTIVE_KEY: &str = "flappyFaceLastActive";

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("image codec: {0}")]
    Image(#[from] image::ImageError),
    #[error("stored sprite is not a png data uri")]
    InvalidDataUri,
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Persist a freshly exported sprite and stamp it active. Storage failure
/// is tolerated: the in-memory bitmap keeps the session going.
pub fn save(store: &mut impl KeyValueStore, image: &RgbaImage, now_ms: f64) -> Result<(), FaceError> {
    let uri = encode_data_uri(image)?;
    let stamped = store.set(FACE_KEY, &uri) && store.set(LAST_ACTIVE_KEY, &timestamp(now_ms));
    if !stamped {
        log::warn!("Could not persist face sprite");
    }
    Ok(())
}

/// Load the stored sprite. An expired entry is purged and reported absent;
/// bytes that no longer decode are reported absent but left in place.
pub fn load(store: &mut impl KeyValueStore, now_ms: f64) -> Option<RgbaImage> {
    let uri = store.get(FACE_KEY)?;
    if is_expired(store, now_ms) {
        clear(store);
        return None;
    }
    match decode_data_uri(&uri) {
        Ok(image) => Some(image),
        Err(err) => {
            log::warn!("Could not decode saved face: {err}");
            None
        }
    }
}

/// Refresh the last-active timestamp. Called on every qualifying player
/// interaction, not just on save.
pub fn touch(store: &mut impl KeyValueStore, now_ms: f64) {
    store.set(LAST_ACTIVE_KEY, &timestamp(now_ms));
}

/// Remove the sprite and its timestamp.
pub fn clear(store: &mut impl KeyValueStore) {
    store.remove(FACE_KEY);
    store.remove(LAST_ACTIVE_KEY);
}

/// A missing or unreadable timestamp counts as expired.
pub fn is_expired(store: &impl KeyValueStore, now_ms: f64) -> bool {
    let Some(ts) = store.get(LAST_ACTIVE_KEY).and_then(|s| s.parse::<f64>().ok()) else {
        return true;
    };
    if ts <= 0.0 {
        return true;
    }
    now_ms - ts > FACE_TTL_MS
}

/// Periodic expiry check, run on a timer independent of the frame loop.
/// Returns true when an expired sprite was just purged, so the caller can
/// drop its in-memory bitmap too.
pub fn sweep(store: &mut impl KeyValueStore, now_ms: f64) -> bool {
    if store.get(FACE_KEY).is_some() && is_expired(store, now_ms) {
        clear(store);
        return true;
    }
    false
}

/// Encode to the data-URI form the store holds.
pub fn encode_data_uri(image: &RgbaImage) -> Result<String, FaceError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(&png)))
}

pub fn decode_data_uri(uri: &str) -> Result<RgbaImage, FaceError> {
    let b64 = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or(FaceError::InvalidDataUri)?;
    let bytes = STANDARD.decode(b64)?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

fn timestamp(now_ms: f64) -> String {
    format!("{}", now_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use image::Rgba;

    const MINUTE_MS: f64 = 60.0 * 1000.0;

    fn sprite() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, y| {
            Rgba([(x * 30) as u8, (y * 30) as u8, 128, 255])
        })
    }

    /// Refuses every write, like storage disabled in the browser
    struct WriteDeniedStore;

    impl KeyValueStore for WriteDeniedStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> bool {
            false
        }

        fn remove(&mut self, _key: &str) {}
    }

    #[test]
    fn test_save_then_load_round_trips_pixels() {
        let mut store = MemoryStore::new();
        let original = sprite();
        save(&mut store, &original, 1000.0).unwrap();

        let loaded = load(&mut store, 2000.0).expect("sprite should be present");
        assert_eq!(loaded.as_raw(), original.as_raw());
    }

    #[test]
    fn test_fresh_sprite_survives_ten_minutes() {
        let mut store = MemoryStore::new();
        save(&mut store, &sprite(), 0.0).unwrap();
        assert!(load(&mut store, 10.0 * MINUTE_MS).is_some());
    }

    #[test]
    fn test_stale_sprite_is_absent_and_purged() {
        let mut store = MemoryStore::new();
        save(&mut store, &sprite(), 0.0).unwrap();

        assert!(load(&mut store, 31.0 * MINUTE_MS).is_none());
        assert!(store.get(FACE_KEY).is_none(), "expired entry purged");
        assert!(store.get(LAST_ACTIVE_KEY).is_none());
    }

    #[test]
    fn test_touch_extends_the_window() {
        let mut store = MemoryStore::new();
        save(&mut store, &sprite(), 0.0).unwrap();

        // 29 minutes in, the player is still interacting
        touch(&mut store, 29.0 * MINUTE_MS);
        assert!(load(&mut store, 45.0 * MINUTE_MS).is_some());
        assert!(load(&mut store, 60.0 * MINUTE_MS).is_none());
    }

    #[test]
    fn test_missing_timestamp_counts_as_expired() {
        let mut store = MemoryStore::new();
        save(&mut store, &sprite(), 0.0).unwrap();
        store.remove(LAST_ACTIVE_KEY);
        assert!(is_expired(&store, 1.0));
        assert!(load(&mut store, 1.0).is_none());
    }

    #[test]
    fn test_sweep_purges_only_expired() {
        let mut store = MemoryStore::new();
        save(&mut store, &sprite(), 0.0).unwrap();

        assert!(!sweep(&mut store, 5.0 * MINUTE_MS));
        assert!(store.get(FACE_KEY).is_some());

        assert!(sweep(&mut store, 31.0 * MINUTE_MS));
        assert!(store.get(FACE_KEY).is_none());
        assert!(!sweep(&mut store, 32.0 * MINUTE_MS), "second sweep is a no-op");
    }

    #[test]
    fn test_undecodable_bytes_report_absent_without_purge() {
        let mut store = MemoryStore::new();
        store.set(FACE_KEY, "data:image/png;base64,bm90IGEgcG5n");
        store.set(LAST_ACTIVE_KEY, "1000");

        assert!(load(&mut store, 2000.0).is_none());
        assert!(store.get(FACE_KEY).is_some(), "entry left for a later retry");
    }

    #[test]
    fn test_denied_writes_degrade_silently() {
        let mut store = WriteDeniedStore;
        assert!(save(&mut store, &sprite(), 0.0).is_ok());
        assert!(load(&mut store, 1.0).is_none());
        touch(&mut store, 2.0);
        assert!(!sweep(&mut store, 3.0), "nothing stored, nothing to purge");
    }

    #[test]
    fn test_clear_removes_both_entries() {
        let mut store = MemoryStore::new();
        save(&mut store, &sprite(), 0.0).unwrap();
        clear(&mut store);
        assert!(store.is_empty());
    }
}
