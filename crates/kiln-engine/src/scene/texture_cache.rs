use std::collections::HashMap;

use crate::resource::{GraphicsResource, Texture};

/// Loaded textures keyed by source path.
///
/// Each key is loaded at most once. Failed loads are remembered as well, so
/// a broken file shared by many materials is reported once.
#[derive(Default)]
pub struct TextureCache {
    entries: HashMap<String, Option<Texture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `key` resolved to a texture, running `load` only the
    /// first time the key is seen.
    pub fn get_or_load(&mut self, key: &str, load: impl FnOnce() -> Option<Texture>) -> bool {
        if let Some(entry) = self.entries.get(key) {
            return entry.is_some();
        }

        let texture = load();
        let loaded = texture.is_some();
        self.entries.insert(key.to_string(), texture);
        loaded
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    pub fn bind_group(&self, key: &str) -> Option<&wgpu::BindGroup> {
        self.get(key).and_then(Texture::bind_group)
    }

    /// Number of distinct keys seen, loaded or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.values().filter(|t| t.is_some()).count()
    }

    /// Releases every texture and forgets all keys.
    pub fn release(&mut self) {
        for texture in self.entries.values_mut().flatten() {
            texture.release();
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MipChain;

    fn tex(label: &str) -> Texture {
        Texture::from_rgba8(label, 1, 1, vec![255; 4], MipChain::Single)
    }

    #[test]
    fn shared_key_is_loaded_once() {
        let mut cache = TextureCache::new();
        let mut loads = 0;

        for _ in 0..3 {
            assert!(cache.get_or_load("textures/brick.png", || {
                loads += 1;
                Some(tex("brick"))
            }));
        }

        assert_eq!(loads, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("textures/brick.png").is_some());
    }

    #[test]
    fn failures_are_cached() {
        let mut cache = TextureCache::new();
        let mut loads = 0;

        for _ in 0..2 {
            assert!(!cache.get_or_load("missing.png", || {
                loads += 1;
                None
            }));
        }

        assert_eq!(loads, 1);
        assert!(cache.contains("missing.png"));
        assert_eq!(cache.loaded_count(), 0);
    }

    #[test]
    fn release_forgets_everything() {
        let mut cache = TextureCache::new();
        cache.get_or_load("a", || Some(tex("a")));
        cache.get_or_load("b", || None);
        cache.release();
        assert!(cache.is_empty());
    }
}
