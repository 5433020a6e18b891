//! Palette - the fixed set of images offered for placement

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::geometry::Position;
use crate::layer::{ImageSource, Layer};

/// Palette entry as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteItem {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PaletteEntry {
    pub name: String,
    pub source: ImageSource,
}

/// How a palette entry was brought onto the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementGesture {
    /// Click on the palette: place at the canvas origin
    Click,
    /// Drag-and-drop: place at the drop point (canvas-local)
    Drop(Position),
}

impl PlacementGesture {
    pub fn position(self) -> Position {
        match self {
            PlacementGesture::Click => Position::ORIGIN,
            PlacementGesture::Drop(position) => position,
        }
    }
}

/// Stand-in shown in the palette strip when an entry fails to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalettePlaceholder {
    pub index: usize,
    pub name: String,
    pub message: String,
}

/// Result of bringing a palette entry onto the canvas
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteOutcome {
    Placed(Layer),
    /// The image could not be resolved; no layer was created
    Placeholder(PalettePlaceholder),
}

impl PaletteOutcome {
    pub fn layer(&self) -> Option<&Layer> {
        match self {
            PaletteOutcome::Placed(layer) => Some(layer),
            PaletteOutcome::Placeholder(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    pub fn from_items(items: &[PaletteItem]) -> Self {
        Self::new(
            items
                .iter()
                .map(|item| PaletteEntry {
                    name: item.name.clone(),
                    source: ImageSource::Path(item.path.clone()),
                })
                .collect(),
        )
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
