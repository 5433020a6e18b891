//! Compositor - flattens the layer arrangement into one raster image
//!
//! The scene is snapshotted from the store in render order, rasterized on
//! the blocking pool, and PNG-encoded for export.

mod export;
mod sacrifice;

pub use export::{ExportOutcome, ExportSink, FileExportSink, MemoryExportSink};
pub use sacrifice::{SacrificeAnimation, SacrificePhase};

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use std::sync::Arc;

use crate::assets::ImageCache;
use crate::errors::CompositeError;
use crate::geometry::{Position, Size};
use crate::layer::{ImageSource, Layer, LayerId};

/// One layer as it appears in the captured container
#[derive(Debug, Clone)]
pub struct SceneLayer {
    pub id: LayerId,
    pub content: ImageSource,
    pub position: Position,
    pub size: Size,
}

impl From<&Layer> for SceneLayer {
    fn from(layer: &Layer) -> Self {
        Self {
            id: layer.id(),
            content: layer.content().clone(),
            position: layer.position(),
            size: layer.size(),
        }
    }
}

/// Snapshot of the canvas container: fixed size, clipping, layers back-to-front
#[derive(Debug, Clone)]
pub struct Scene {
    pub canvas: Size,
    pub background: [u8; 4],
    pub layers: Vec<SceneLayer>,
}

impl Scene {
    pub fn new<'a>(
        canvas: Size,
        background: [u8; 4],
        ordered: impl IntoIterator<Item = &'a Layer>,
    ) -> Self {
        Self {
            canvas,
            background,
            layers: ordered.into_iter().map(SceneLayer::from).collect(),
        }
    }
}

/// Turns a scene into pixels whose content matches its visual composition
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, scene: &Scene) -> Result<RgbaImage, CompositeError>;
}

/// Largest scaled layer, in pixels, that is resized whole before clipping
const MAX_SCALED_PIXELS: f64 = 4096.0 * 4096.0;

fn pixel_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.round().max(1.0)
    } else {
        1.0
    }
}

/// Layer pixels ready to be blended at a canvas offset
struct Placed {
    x: i64,
    y: i64,
    pixels: RgbaImage,
}

/// Canvas-space pixel rect of one layer, before clipping
#[derive(Debug, Clone, Copy)]
struct Extent {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Extent {
    fn of(layer: &SceneLayer) -> Self {
        let round = |v: f64| if v.is_finite() { v.round() } else { 0.0 };
        Self {
            left: round(layer.position.x),
            top: round(layer.position.y),
            width: pixel_extent(layer.size.width),
            height: pixel_extent(layer.size.height),
        }
    }

    /// Intersection with a `width` x `height` canvas as `(x0, y0, x1, y1)`
    fn visible(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.left.max(0.0);
        let y0 = self.top.max(0.0);
        let x1 = (self.left + self.width).min(width as f64);
        let y1 = (self.top + self.height).min(height as f64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// CPU rasterizer over the decoded-image cache
#[derive(Debug, Clone)]
pub struct SoftwareRasterizer {
    cache: Arc<ImageCache>,
    filter: FilterType,
}

impl SoftwareRasterizer {
    pub fn new(cache: Arc<ImageCache>) -> Self {
        Self {
            cache,
            filter: FilterType::Triangle,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Decode and scale `layer`, keeping only what lands on the canvas
    fn prepare(
        &self,
        layer: &SceneLayer,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<Option<Placed>, CompositeError> {
        let source = self.cache.get_or_decode(&layer.content)?;
        let extent = Extent::of(layer);
        let Some((x0, y0, x1, y1)) = extent.visible(canvas_width, canvas_height) else {
            return Ok(None);
        };
        let (source_width, source_height) = source.dimensions();
        if source_width == 0 || source_height == 0 {
            return Ok(None);
        }

        if extent.width * extent.height <= MAX_SCALED_PIXELS {
            let (width, height) = (extent.width as u32, extent.height as u32);
            let pixels = if source.dimensions() == (width, height) {
                (*source).clone()
            } else {
                imageops::resize(source.as_ref(), width, height, self.filter)
            };
            return Ok(Some(Placed {
                x: extent.left as i64,
                y: extent.top as i64,
                pixels,
            }));
        }

        // Too large to scale whole: sample the visible window straight from the source
        let scale_x = source_width as f64 / extent.width;
        let scale_y = source_height as f64 / extent.height;
        let pixels = RgbaImage::from_fn(x1 - x0, y1 - y0, |px, py| {
            let dx = x0 as f64 - extent.left + px as f64 + 0.5;
            let dy = y0 as f64 - extent.top + py as f64 + 0.5;
            let sx = ((dx * scale_x) as u32).min(source_width - 1);
            let sy = ((dy * scale_y) as u32).min(source_height - 1);
            *source.get_pixel(sx, sy)
        });
        Ok(Some(Placed {
            x: x0 as i64,
            y: y0 as i64,
            pixels,
        }))
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn rasterize(&self, scene: &Scene) -> Result<RgbaImage, CompositeError> {
        let width = scene.canvas.width.round();
        let height = scene.canvas.height.round();
        if width < 1.0 || height < 1.0 {
            return Err(CompositeError::EmptyCanvas);
        }
        let (width, height) = (width as u32, height as u32);

        // Decode and scale in parallel; blending must follow render order
        let prepared = scene
            .layers
            .par_iter()
            .map(|layer| self.prepare(layer, width, height))
            .collect::<Result<Vec<_>, _>>()?;

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(scene.background));
        for placed in prepared.iter().flatten() {
            // overlay clips to the canvas, matching the container's overflow: hidden
            imageops::overlay(&mut canvas, &placed.pixels, placed.x, placed.y);
        }

        tracing::debug!(
            "Rasterized {} layers into {}x{}",
            scene.layers.len(),
            canvas.width(),
            canvas.height()
        );
        Ok(canvas)
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Rasterize and PNG-encode `scene` without blocking the caller's executor
pub async fn capture(
    rasterizer: Arc<dyn Rasterizer>,
    scene: Scene,
) -> Result<Vec<u8>, CompositeError> {
    let layer_count = scene.layers.len();
    let bytes = tokio::task::spawn_blocking(move || {
        let image = rasterizer.rasterize(&scene)?;
        encode_png(&image)
    })
    .await??;

    tracing::info!("Captured {} layers into {} PNG bytes", layer_count, bytes.len());
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::solid_png;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn scene_layer(id: u64, png: Vec<u8>, position: Position, size: Size) -> SceneLayer {
        SceneLayer {
            id: LayerId(id),
            content: ImageSource::from_bytes(png),
            position,
            size,
        }
    }

    fn rasterizer() -> SoftwareRasterizer {
        SoftwareRasterizer::new(Arc::new(ImageCache::new())).with_filter(FilterType::Nearest)
    }

    #[test]
    fn test_later_layers_render_on_top() {
        let scene = Scene {
            canvas: Size::new(20.0, 20.0),
            background: WHITE,
            layers: vec![
                scene_layer(
                    1,
                    solid_png(10, 10, [255, 0, 0, 255]),
                    Position::ORIGIN,
                    Size::new(10.0, 10.0),
                ),
                scene_layer(
                    2,
                    solid_png(10, 10, [0, 0, 255, 255]),
                    Position::new(5.0, 5.0),
                    Size::new(10.0, 10.0),
                ),
            ],
        };

        let image = rasterizer().rasterize(&scene).unwrap();
        assert_eq!(image.dimensions(), (20, 20));
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(7, 7).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(18, 18).0, WHITE);
    }

    #[test]
    fn test_layers_are_scaled_and_clipped() {
        let scene = Scene {
            canvas: Size::new(20.0, 20.0),
            background: WHITE,
            layers: vec![scene_layer(
                1,
                solid_png(4, 4, [0, 255, 0, 255]),
                Position::new(-4.0, 12.0),
                Size::new(12.0, 12.0),
            )],
        };

        let image = rasterizer().rasterize(&scene).unwrap();
        assert_eq!(image.get_pixel(0, 12).0, [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(7, 19).0, [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(8, 12).0, WHITE);
        assert_eq!(image.get_pixel(0, 11).0, WHITE);
    }

    #[test]
    fn test_empty_canvas_is_rejected() {
        let scene = Scene {
            canvas: Size::new(0.0, 20.0),
            background: WHITE,
            layers: Vec::new(),
        };
        assert!(matches!(rasterizer().rasterize(&scene), Err(CompositeError::EmptyCanvas)));
    }

    #[test]
    fn test_undecodable_layer_fails_the_capture() {
        let scene = Scene {
            canvas: Size::new(20.0, 20.0),
            background: WHITE,
            layers: vec![scene_layer(1, vec![9, 9, 9], Position::ORIGIN, Size::new(5.0, 5.0))],
        };
        assert!(matches!(rasterizer().rasterize(&scene), Err(CompositeError::Asset(_))));
    }

    #[test]
    fn test_huge_layer_rasterizes_only_visible_window() {
        let scene = Scene {
            canvas: Size::new(20.0, 20.0),
            background: WHITE,
            layers: vec![scene_layer(
                1,
                solid_png(10, 10, [0, 255, 0, 255]),
                Position::ORIGIN,
                Size::new(1e10, 1e10),
            )],
        };

        let image = rasterizer().rasterize(&scene).unwrap();
        assert_eq!(image.dimensions(), (20, 20));
        assert!(image.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn test_huge_layer_window_maps_to_source_pixels() {
        // Left half red, right half blue; the seam lands on canvas x = 10
        let halves = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let scene = Scene {
            canvas: Size::new(20.0, 20.0),
            background: WHITE,
            layers: vec![scene_layer(
                1,
                encode_png(&halves).unwrap(),
                Position::new(-99_990.0, -1000.0),
                Size::new(200_000.0, 200_000.0),
            )],
        };

        let image = rasterizer().rasterize(&scene).unwrap();
        assert_eq!(image.get_pixel(9, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(10, 0).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(19, 19).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_offscreen_layer_is_skipped() {
        let scene = Scene {
            canvas: Size::new(20.0, 20.0),
            background: WHITE,
            layers: vec![scene_layer(
                1,
                solid_png(4, 4, [0, 0, 0, 255]),
                Position::new(30.0, 0.0),
                Size::new(4.0, 4.0),
            )],
        };

        let image = rasterizer().rasterize(&scene).unwrap();
        assert!(image.pixels().all(|p| p.0 == WHITE));
    }

    #[tokio::test]
    async fn test_capture_produces_png() {
        let scene = Scene {
            canvas: Size::new(30.0, 10.0),
            background: WHITE,
            layers: vec![scene_layer(
                1,
                solid_png(3, 3, [1, 2, 3, 255]),
                Position::ORIGIN,
                Size::new(3.0, 3.0),
            )],
        };

        let bytes = capture(Arc::new(rasterizer()), scene).await.unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (30, 10));
        assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
