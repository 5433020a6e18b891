//! Board configuration
//!
//! Loaded from a camelCase JSON file; every field has a default so a partial
//! file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::{PaletteItem, DEFAULT_DISPLAY_CAP};
use crate::errors::ConfigError;
use crate::geometry::{Rect, RestrictPolicy, Restriction, Size, SizeLimits};

pub const DEFAULT_EXPORT_FILENAME: &str = "my-image.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    /// Fixed canvas container size; also the drag restriction boundary
    pub canvas: Size,
    pub min_size: Size,
    /// `None` disables the maximum clamp
    pub max_size: Option<Size>,
    /// Longest-edge cap for freshly placed layers
    pub display_cap: f64,
    pub restrict_policy: RestrictPolicy,
    pub asset_timeout_ms: u64,
    pub export_filename: String,
    /// RGBA fill behind all layers
    pub background: [u8; 4],
    pub sacrifice_duration_ms: u64,
    pub palette: Vec<PaletteItem>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            canvas: Size::new(500.0, 500.0),
            min_size: Size::new(50.0, 50.0),
            max_size: Some(Size::new(500.0, 500.0)),
            display_cap: DEFAULT_DISPLAY_CAP,
            restrict_policy: RestrictPolicy::EndOnly,
            asset_timeout_ms: 5000,
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            background: [255, 255, 255, 255],
            sacrifice_duration_ms: 5000,
            palette: Vec::new(),
        }
    }
}

impl BoardConfig {
    /// `<config dir>/collage/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("collage").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: BoardConfig = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::info!("Loaded board config from {:?}", path);
        Ok(config)
    }

    /// Load `path` if it exists; fall back to defaults on a missing or bad file
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load board config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width <= 0.0 || self.canvas.height <= 0.0 {
            return Err(ConfigError::Invalid("canvas must have a positive size".into()));
        }
        if self.min_size.width < 0.0 || self.min_size.height < 0.0 {
            return Err(ConfigError::Invalid("minSize cannot be negative".into()));
        }
        if let Some(max) = self.max_size {
            if max.width < self.min_size.width || max.height < self.min_size.height {
                return Err(ConfigError::Invalid("maxSize is smaller than minSize".into()));
            }
        }
        if self.display_cap <= 0.0 {
            return Err(ConfigError::Invalid("displayCap must be positive".into()));
        }
        if self.asset_timeout_ms == 0 {
            return Err(ConfigError::Invalid("assetTimeoutMs must be positive".into()));
        }
        if self.export_filename.trim().is_empty() {
            return Err(ConfigError::Invalid("exportFilename is empty".into()));
        }
        Ok(())
    }

    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits {
            min: self.min_size,
            max: self.max_size,
        }
    }

    pub fn restriction(&self) -> Restriction {
        Restriction {
            bounds: Rect::from_size(self.canvas),
            policy: self.restrict_policy,
        }
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }

    pub fn sacrifice_duration(&self) -> Duration {
        Duration::from_millis(self.sacrifice_duration_ms)
    }
}
