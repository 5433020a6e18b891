//! Decoded image cache shared by the asset loader and the compositor
//!
//! Keyed by [`ImageSource::cache_key`], so an image decoded once while
//! resolving its dimensions is reused when the canvas is flattened.

use image::RgbaImage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::decode_rgba;
use crate::errors::AssetError;
use crate::layer::ImageSource;

#[derive(Debug, Default)]
pub struct ImageCache {
    images: RwLock<HashMap<String, Arc<RgbaImage>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<RgbaImage>> {
        self.images.read().get(key).cloned()
    }

    pub fn insert(&self, key: String, image: Arc<RgbaImage>) {
        self.images.write().insert(key, image);
    }

    /// Return the cached image for `source`, decoding it synchronously on a miss
    pub fn get_or_decode(&self, source: &ImageSource) -> Result<Arc<RgbaImage>, AssetError> {
        let key = source.cache_key();
        if let Some(image) = self.get(&key) {
            return Ok(image);
        }

        let bytes = super::read_source_blocking(source)?;
        let image = Arc::new(decode_rgba(&bytes)?);
        self.insert(key, image.clone());
        Ok(image)
    }

    pub fn clear(&self) {
        let mut images = self.images.write();
        tracing::debug!("Clearing {} cached images", images.len());
        images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }
}
