//! Layer data model - placed image elements and their authoritative store

pub mod clock;
mod store;

pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use store::LayerStore;

use crate::geometry::{Position, Size};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Unique layer identifier, allocated by the store in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer_{}", self.0)
    }
}

/// Reference to the image a layer shows
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Image file on disk
    Path(PathBuf),
    /// `data:` URL with a base64 payload
    DataUrl(String),
    /// Encoded image bytes already in memory
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Stable key used by the decoded-image cache
    pub fn cache_key(&self) -> String {
        match self {
            ImageSource::Path(path) => format!("path:{}", path.display()),
            ImageSource::DataUrl(url) => {
                format!("sha256:{}", hex::encode(Sha256::digest(url.as_bytes())))
            }
            ImageSource::Bytes(bytes) => format!("sha256:{}", hex::encode(Sha256::digest(bytes))),
        }
    }

    /// Short human readable description for logs and the command surface
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or("data:");
                format!("{},<{} bytes>", header, url.len())
            }
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageSource").field(&self.describe()).finish()
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

/// Whether a layer's position has been confirmed by a user drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlacementStatus {
    /// Still at its creation-time placement
    Unconfirmed,
    /// Moved by at least one drag frame
    Confirmed,
}

/// A placed, movable, resizable image element.
///
/// Fields are read-only outside the store; every write goes through
/// [`LayerStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    content: ImageSource,
    position: Position,
    size: Size,
    last_modified: Timestamp,
    placement: PlacementStatus,
}

impl Layer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn content(&self) -> &ImageSource {
        &self.content
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    pub fn placement(&self) -> PlacementStatus {
        self.placement
    }

    pub fn is_new(&self) -> bool {
        self.placement == PlacementStatus::Unconfirmed
    }
}
