//! Commands - JSON interface between a UI shell and the board

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::assets::{PaletteOutcome, PalettePlaceholder, PlacementGesture};
use crate::board::Board;
use crate::compositor::{ExportOutcome, SacrificePhase};
use crate::geometry::Position;
use crate::interaction::{PointerEvent, Propagation};
use crate::layer::{ImageSource, Layer, LayerId};

/// Image reference as sent by the shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentRef {
    Path(PathBuf),
    DataUrl(String),
}

impl From<ContentRef> for ImageSource {
    fn from(content: ContentRef) -> Self {
        match content {
            ContentRef::Path(path) => ImageSource::Path(path),
            ContentRef::DataUrl(url) => ImageSource::DataUrl(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// Place an arbitrary image; omitted position means the canvas origin
    Place {
        content: ContentRef,
        #[serde(default)]
        position: Option<Position>,
    },
    /// Place a palette entry by click (no drop point) or drag-and-drop
    PlaceFromPalette {
        index: usize,
        #[serde(default)]
        drop: Option<Position>,
    },
    Pointer {
        event: PointerEvent,
    },
    RenderOrder,
    Export,
    /// Capture as a `data:` URL without saving
    Capture,
    Sacrifice,
}

/// Layer snapshot sent to the shell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    pub id: LayerId,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub last_modified: u64,
    pub is_new: bool,
    pub selected: bool,
}

impl LayerInfo {
    fn from_layer(layer: &Layer, selected: Option<LayerId>) -> Self {
        Self {
            id: layer.id(),
            content: layer.content().describe(),
            x: layer.position().x,
            y: layer.position().y,
            width: layer.size().width,
            height: layer.size().height,
            last_modified: layer.last_modified().0,
            is_new: layer.is_new(),
            selected: selected == Some(layer.id()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandResponse {
    Layer { layer: LayerInfo },
    /// A palette entry failed to load and is shown as a placeholder
    Placeholder { placeholder: PalettePlaceholder },
    Pointer { propagation: Propagation },
    Layers { layers: Vec<LayerInfo> },
    Export { outcome: ExportOutcome },
    Image { data_url: String },
    Sacrifice { data_url: String, phase: SacrificePhase },
}

fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}

/// Run one shell command against the board
pub async fn execute(board: &mut Board, command: Command) -> Result<CommandResponse, String> {
    match command {
        Command::Place { content, position } => {
            let layer = board
                .place(content.into(), position.unwrap_or(Position::ORIGIN))
                .await?;
            Ok(CommandResponse::Layer {
                layer: LayerInfo::from_layer(&layer, board.selected()),
            })
        }
        Command::PlaceFromPalette { index, drop } => {
            let gesture = drop.map_or(PlacementGesture::Click, PlacementGesture::Drop);
            match board.place_from_palette(index, gesture).await? {
                PaletteOutcome::Placed(layer) => Ok(CommandResponse::Layer {
                    layer: LayerInfo::from_layer(&layer, board.selected()),
                }),
                PaletteOutcome::Placeholder(placeholder) => {
                    Ok(CommandResponse::Placeholder { placeholder })
                }
            }
        }
        Command::Pointer { event } => Ok(CommandResponse::Pointer {
            propagation: board.handle(event),
        }),
        Command::RenderOrder => {
            let selected = board.selected();
            let layers = board
                .render_order()
                .iter()
                .map(|layer| LayerInfo::from_layer(layer, selected))
                .collect();
            Ok(CommandResponse::Layers { layers })
        }
        Command::Export => Ok(CommandResponse::Export {
            outcome: board.export().await,
        }),
        Command::Capture => {
            let bytes = board.capture().await?;
            Ok(CommandResponse::Image {
                data_url: png_data_url(&bytes),
            })
        }
        Command::Sacrifice => {
            let bytes = board.sacrifice().await?;
            Ok(CommandResponse::Sacrifice {
                data_url: png_data_url(&bytes),
                phase: board.sacrifice_phase(),
            })
        }
    }
}
