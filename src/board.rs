//! Board - one canvas session
//!
//! Wires the asset loader, layer store, interaction controller and compositor
//! together. State is passed explicitly; nothing here is global.

use std::future::Future;
use std::sync::Arc;

use crate::assets::{
    display_size, AssetLoader, ImageCache, NaturalSize, Palette, PaletteOutcome,
    PalettePlaceholder, PlacementGesture,
};
use crate::compositor::{
    self, ExportOutcome, ExportSink, FileExportSink, Rasterizer, SacrificeAnimation, SacrificePhase,
    Scene, SoftwareRasterizer,
};
use crate::config::BoardConfig;
use crate::errors::{AssetError, BoardError, CompositeError};
use crate::geometry::Position;
use crate::interaction::{
    HeadlessTargets, InteractionController, PointerEvent, Propagation, RenderTargets,
};
use crate::layer::{Clock, ImageSource, Layer, LayerId, LayerStore, MonotonicClock};

/// A resolved image waiting to become a layer
#[derive(Debug, Clone)]
pub struct PendingPlacement {
    pub source: ImageSource,
    pub position: Position,
    pub natural: NaturalSize,
}

pub struct Board {
    config: BoardConfig,
    store: LayerStore,
    controller: InteractionController,
    loader: AssetLoader,
    palette: Palette,
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn ExportSink>,
    targets: Box<dyn RenderTargets>,
    sacrifice: SacrificeAnimation,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("controller", &self.controller)
            .field("palette", &self.palette.len())
            .finish()
    }
}

impl Board {
    /// Headless session exporting to the downloads folder
    pub fn new(config: BoardConfig) -> Result<Self, BoardError> {
        Self::with_clock(config, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: BoardConfig, clock: Box<dyn Clock>) -> Result<Self, BoardError> {
        config.validate()?;

        let cache = Arc::new(ImageCache::new());
        let board = Self {
            store: LayerStore::with_clock(config.size_limits(), clock),
            controller: InteractionController::new(config.restriction()),
            loader: AssetLoader::new(cache.clone(), config.asset_timeout()),
            palette: Palette::from_items(&config.palette),
            rasterizer: Arc::new(SoftwareRasterizer::new(cache)),
            sink: Arc::new(FileExportSink::downloads()),
            targets: Box::new(HeadlessTargets),
            sacrifice: SacrificeAnimation::new(config.sacrifice_duration()),
            config,
        };

        tracing::info!(
            "Board ready: canvas {}x{}, {} palette entries",
            board.config.canvas.width,
            board.config.canvas.height,
            board.palette.len()
        );
        Ok(board)
    }

    pub fn with_sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_targets(mut self, targets: Box<dyn RenderTargets>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        self.loader.cache()
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.controller.selected()
    }

    /// Resolve `source` without borrowing the board.
    ///
    /// Gestures may be handled while this is in flight; the result is applied
    /// by [`Board::commit_placement`] regardless of what happened meanwhile.
    pub fn resolve_placement(
        &self,
        source: ImageSource,
        position: Position,
    ) -> impl Future<Output = Result<PendingPlacement, AssetError>> + 'static {
        let loader = self.loader.clone();
        async move {
            let natural = loader.resolve(&source).await?;
            Ok(PendingPlacement {
                source,
                position,
                natural,
            })
        }
    }

    /// Create the layer for a resolved image; it becomes the selection
    pub fn commit_placement(&mut self, pending: PendingPlacement) -> Layer {
        let size = display_size(pending.natural, self.config.display_cap);
        let layer = self.store.create_layer(pending.source, pending.position, size);
        self.controller.bind(layer.id(), self.targets.as_ref());
        self.controller.select(layer.id());
        layer
    }

    /// Resolve and place an image in one step
    pub async fn place(
        &mut self,
        source: ImageSource,
        position: Position,
    ) -> Result<Layer, BoardError> {
        let pending = self.resolve_placement(source, position).await?;
        Ok(self.commit_placement(pending))
    }

    /// Place a palette entry; an image that fails to resolve yields a placeholder
    pub async fn place_from_palette(
        &mut self,
        index: usize,
        gesture: PlacementGesture,
    ) -> Result<PaletteOutcome, BoardError> {
        let entry = self
            .palette
            .get(index)
            .ok_or(BoardError::UnknownPaletteEntry(index))?;
        let name = entry.name.clone();
        let source = entry.source.clone();

        match self.resolve_placement(source, gesture.position()).await {
            Ok(pending) => Ok(PaletteOutcome::Placed(self.commit_placement(pending))),
            Err(err) => {
                tracing::warn!("Palette entry {} ({}) unavailable: {}", index, name, err);
                Ok(PaletteOutcome::Placeholder(PalettePlaceholder {
                    index,
                    name,
                    message: err.to_string(),
                }))
            }
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> Propagation {
        self.controller.handle(&mut self.store, event)
    }

    /// Back-to-front layer snapshots.
    ///
    /// Also retries gesture bindings for layers whose targets were missing.
    pub fn render_order(&mut self) -> Vec<Layer> {
        self.controller.sync_bindings(&self.store, self.targets.as_ref());
        self.store.render_order().into_iter().cloned().collect()
    }

    pub fn scene(&self) -> Scene {
        Scene::new(
            self.config.canvas,
            self.config.background,
            self.store.render_order(),
        )
    }

    /// Flatten the current arrangement into PNG bytes
    pub async fn capture(&self) -> Result<Vec<u8>, CompositeError> {
        compositor::capture(self.rasterizer.clone(), self.scene()).await
    }

    /// Capture and hand the PNG to the export sink under the configured filename
    pub async fn export(&self) -> ExportOutcome {
        let bytes = match self.capture().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Capture failed: {}", e);
                return ExportOutcome::failed(e);
            }
        };

        let sink = self.sink.clone();
        let filename = self.config.export_filename.clone();
        let size = bytes.len();
        let saved = tokio::task::spawn_blocking(move || sink.save(&bytes, &filename))
            .await
            .map_err(CompositeError::from)
            .and_then(|result| result);

        match saved {
            Ok(path) => ExportOutcome::Saved {
                path: path.display().to_string(),
                bytes: size,
            },
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                ExportOutcome::failed(e)
            }
        }
    }

    /// Capture the canvas, then run the presentational sacrifice animation
    pub async fn sacrifice(&self) -> Result<Vec<u8>, CompositeError> {
        let bytes = self.capture().await?;
        self.sacrifice.run().await;
        Ok(bytes)
    }

    pub fn sacrifice_phase(&self) -> SacrificePhase {
        self.sacrifice.phase()
    }

    pub fn subscribe_sacrifice(&self) -> tokio::sync::watch::Receiver<SacrificePhase> {
        self.sacrifice.subscribe()
    }
}
