//! Asset loader - resolves image references to natural dimensions
//!
//! Decoding runs on the blocking pool and is bounded by a timeout, so an
//! image that never decodes fails instead of stalling layer creation.

mod cache;
mod palette;

pub use cache::ImageCache;
pub use palette::{
    Palette, PaletteEntry, PaletteItem, PaletteOutcome, PalettePlaceholder, PlacementGesture,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::AssetError;
use crate::geometry::Size;
use crate::layer::ImageSource;

/// Default longest-edge cap for freshly placed layers
pub const DEFAULT_DISPLAY_CAP: f64 = 100.0;

/// Width and height of the decoded image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

impl NaturalSize {
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Initial display size: natural size, or scaled so the longer edge equals `cap`
pub fn display_size(natural: NaturalSize, cap: f64) -> Size {
    let width = f64::from(natural.width);
    let height = f64::from(natural.height);
    if width <= cap && height <= cap {
        return Size::new(width, height);
    }

    let ratio = cap / width.max(height);
    Size::new(width * ratio, height * ratio)
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let payload = if let Some(stripped) = url.strip_prefix("data:image/png;base64,") {
        stripped
    } else if url.starts_with("data:") {
        let (header, payload) = url
            .split_once(',')
            .ok_or_else(|| AssetError::InvalidDataUrl("missing payload".into()))?;
        if !header.ends_with(";base64") {
            return Err(AssetError::InvalidDataUrl(format!(
                "unsupported encoding in '{}'",
                header
            )));
        }
        payload
    } else {
        return Err(AssetError::InvalidDataUrl("missing data: prefix".into()));
    };

    Ok(BASE64.decode(payload)?)
}

pub(crate) fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(AssetError::ZeroSized);
    }
    Ok(image)
}

pub(crate) fn read_source_blocking(source: &ImageSource) -> Result<Arc<[u8]>, AssetError> {
    Ok(match source {
        ImageSource::Path(path) => std::fs::read(path)?.into(),
        ImageSource::DataUrl(url) => decode_data_url(url)?.into(),
        ImageSource::Bytes(bytes) => bytes.clone(),
    })
}

async fn read_source(source: &ImageSource) -> Result<Arc<[u8]>, AssetError> {
    Ok(match source {
        ImageSource::Path(path) => tokio::fs::read(path).await?.into(),
        ImageSource::DataUrl(url) => decode_data_url(url)?.into(),
        ImageSource::Bytes(bytes) => bytes.clone(),
    })
}

#[derive(Debug, Clone)]
pub struct AssetLoader {
    cache: Arc<ImageCache>,
    timeout: Duration,
}

impl AssetLoader {
    pub fn new(cache: Arc<ImageCache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// Decode `source` and report its natural dimensions.
    ///
    /// The decoded pixels are kept in the shared cache for composition.
    pub async fn resolve(&self, source: &ImageSource) -> Result<NaturalSize, AssetError> {
        self.resolve_from(source, read_source(source)).await
    }

    /// Decode the bytes produced by `read`, bounded by the loader timeout
    pub(crate) async fn resolve_from<R>(
        &self,
        source: &ImageSource,
        read: R,
    ) -> Result<NaturalSize, AssetError>
    where
        R: Future<Output = Result<Arc<[u8]>, AssetError>>,
    {
        let key = source.cache_key();
        if let Some(image) = self.cache.get(&key) {
            return Ok(NaturalSize::of(&image));
        }

        let load = async {
            let bytes = read.await?;
            let image = tokio::task::spawn_blocking(move || decode_rgba(&bytes)).await??;
            let natural = NaturalSize::of(&image);
            self.cache.insert(key, Arc::new(image));
            Ok::<_, AssetError>(natural)
        };

        match tokio::time::timeout(self.timeout, load).await {
            Ok(Ok(natural)) => {
                tracing::debug!(
                    "Resolved {} to {}x{}",
                    source.describe(),
                    natural.width,
                    natural.height
                );
                Ok(natural)
            }
            Ok(Err(err)) => {
                tracing::warn!("Failed to resolve {}: {}", source.describe(), err);
                Err(err)
            }
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                tracing::warn!("Timed out resolving {} after {} ms", source.describe(), ms);
                Err(AssetError::Timeout(ms))
            }
        }
    }
}
