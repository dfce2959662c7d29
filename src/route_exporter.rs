use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use geo_types::{coord, Coord, Rect};
use itertools::Itertools;
use thiserror::Error;
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

use crate::config::{ExportConfig, MapType};
use crate::gps_processor::PositionFix;
use crate::utils;

// in map units, keeps an unpadded single point from collapsing the region
const MIN_REGION_EXTENT: f64 = 1.0;

/// Maps a geographic coordinate (`x` = longitude, `y` = latitude) to a pixel
/// of the snapshot.
pub type Projection = Box<dyn Fn(Coord<f64>) -> (f32, f32) + Send + Sync>;

pub type SnapshotFuture = Pin<Box<dyn Future<Output = anyhow::Result<MapSnapshot>> + Send>>;

/// What we ask the map renderer for. `region` is in Web-Mercator map units
/// (see `utils::lng_lat_to_map_point`).
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotRequest {
    pub region: Rect<f64>,
    pub width: u32,
    pub height: u32,
    pub show_buildings: bool,
    pub map_type: MapType,
}

pub struct MapSnapshot {
    pub background: Pixmap,
    pub projection: Projection,
}

/// The map renderer that provides the background of an export. It may be slow
/// (network or disk) and there is no timeout on it.
pub trait MapSnapshotter: Send + Sync {
    fn snapshot(&self, request: SnapshotRequest) -> SnapshotFuture;
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("map snapshot failed: {0:#}")]
    Snapshot(anyhow::Error),
    #[error("failed to rasterize route: {0}")]
    Raster(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

pub struct ExportImage {
    pixmap: Pixmap,
    polyline: Vec<(f32, f32)>,
}

impl ExportImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// The route as drawn, in pixels.
    pub fn polyline(&self) -> &[(f32, f32)] {
        &self.polyline
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        self.pixmap
            .encode_png()
            .map_err(|e| ExportError::Encode(e.to_string()))
    }
}

pub struct RouteExporter {
    config: ExportConfig,
    snapshotter: Arc<dyn MapSnapshotter>,
}

impl RouteExporter {
    pub fn new(snapshotter: Arc<dyn MapSnapshotter>) -> Self {
        Self::with_config(ExportConfig::default(), snapshotter)
    }

    pub fn with_config(config: ExportConfig, snapshotter: Arc<dyn MapSnapshotter>) -> Self {
        RouteExporter {
            config,
            snapshotter,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// The padded region around `route`, widened to the aspect ratio of the
    /// output so the map is not stretched. `None` for an empty route.
    // TODO: This doesn't work when the route crosses the antimeridian, the
    // region ends up spanning the whole world.
    pub fn snapshot_request(&self, route: &[PositionFix]) -> Option<SnapshotRequest> {
        let (first, rest) = route.split_first()?;
        let start = utils::lng_lat_to_map_point(first.longitude, first.latitude);
        let (min_x, min_y, max_x, max_y) = rest.iter().fold(
            (start.0, start.1, start.0, start.1),
            |(min_x, min_y, max_x, max_y), fix| {
                let (x, y) = utils::lng_lat_to_map_point(fix.longitude, fix.latitude);
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        );

        let padding = self.config.padding_map_units;
        let mut width = f64::max(max_x - min_x + 2.0 * padding, MIN_REGION_EXTENT);
        let mut height = f64::max(max_y - min_y + 2.0 * padding, MIN_REGION_EXTENT);
        let aspect = self.config.width as f64 / self.config.height as f64;
        if width < height * aspect {
            width = height * aspect;
        } else {
            height = width / aspect;
        }
        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;

        Some(SnapshotRequest {
            region: Rect::new(
                coord! { x: center_x - width / 2.0, y: center_y - height / 2.0 },
                coord! { x: center_x + width / 2.0, y: center_y + height / 2.0 },
            ),
            width: self.config.width,
            height: self.config.height,
            show_buildings: self.config.show_buildings,
            map_type: self.config.map_type,
        })
    }

    /// Renders `route` over a map snapshot. An empty route is not an error, it
    /// just produces nothing.
    pub async fn export(&self, route: &[PositionFix]) -> Result<Option<ExportImage>, ExportError> {
        let request = match self.snapshot_request(route) {
            None => {
                debug!("route is empty, nothing to export");
                return Ok(None);
            }
            Some(request) => request,
        };

        info!(
            "exporting route with {} points at {}x{}",
            route.len(),
            request.width,
            request.height
        );
        let snapshot = self.snapshotter.snapshot(request).await.map_err(|e| {
            warn!("map snapshot failed: {:#}", e);
            ExportError::Snapshot(e)
        })?;

        let image = self.compose(snapshot, route)?;
        Ok(Some(image))
    }

    pub fn export_blocking(
        &self,
        route: &[PositionFix],
    ) -> Result<Option<ExportImage>, ExportError> {
        pollster::block_on(self.export(route))
    }

    fn compose(
        &self,
        snapshot: MapSnapshot,
        route: &[PositionFix],
    ) -> Result<ExportImage, ExportError> {
        let (width, height) = (self.config.width, self.config.height);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| ExportError::Raster(format!("invalid image size {width}x{height}")))?;

        let MapSnapshot {
            background,
            projection,
        } = snapshot;
        // the projection is in the background's pixel space
        let scale_x = width as f32 / background.width() as f32;
        let scale_y = height as f32 / background.height() as f32;
        if background.width() != width || background.height() != height {
            warn!(
                "map snapshot is {}x{}, expected {}x{}",
                background.width(),
                background.height(),
                width,
                height
            );
        }
        pixmap.draw_pixmap(
            0,
            0,
            background.as_ref(),
            &PixmapPaint::default(),
            Transform::from_scale(scale_x, scale_y),
            None,
        );

        let polyline = route
            .iter()
            .map(|fix| {
                let (x, y) = projection(coord! { x: fix.longitude, y: fix.latitude });
                (x * scale_x, y * scale_y)
            })
            .collect_vec();

        let [r, g, b, a] = self.config.accent_color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        match polyline.as_slice() {
            [] => {}
            [(x, y), ..] if polyline.iter().all_equal() => {
                // a zero-length stroke draws nothing, draw the cap instead
                let dot = PathBuilder::from_circle(*x, *y, self.config.stroke_width / 2.0)
                    .ok_or_else(|| ExportError::Raster(format!("invalid point ({x}, {y})")))?;
                pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
            [(x0, y0), rest @ ..] => {
                let mut pb = PathBuilder::new();
                pb.move_to(*x0, *y0);
                for (x, y) in rest {
                    pb.line_to(*x, *y);
                }
                let path = pb
                    .finish()
                    .ok_or_else(|| ExportError::Raster("invalid route geometry".to_string()))?;
                let stroke = Stroke {
                    width: self.config.stroke_width,
                    line_cap: LineCap::Round,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        Ok(ExportImage { pixmap, polyline })
    }
}

/// Linear projection from `region` (map units) onto a `width` x `height`
/// image.
pub fn region_projection(region: Rect<f64>, width: u32, height: u32) -> Projection {
    let origin = region.min();
    let scale_x = width as f64 / region.width();
    let scale_y = height as f64 / region.height();
    Box::new(move |coord| {
        let (x, y) = utils::lng_lat_to_map_point(coord.x, coord.y);
        (
            ((x - origin.x) * scale_x) as f32,
            ((y - origin.y) * scale_y) as f32,
        )
    })
}

/// A map renderer that needs no map: a solid background with the plain
/// Mercator projection. Deterministic, so it also serves tests and previews.
pub struct PlainSnapshotter {
    background: Color,
}

impl PlainSnapshotter {
    pub fn new() -> Self {
        Self::with_background(Color::from_rgba8(245, 240, 229, 255))
    }

    pub fn with_background(background: Color) -> Self {
        PlainSnapshotter { background }
    }
}

impl MapSnapshotter for PlainSnapshotter {
    fn snapshot(&self, request: SnapshotRequest) -> SnapshotFuture {
        let background = self.background;
        Box::pin(async move {
            let mut pixmap = Pixmap::new(request.width, request.height).ok_or_else(|| {
                anyhow!("invalid snapshot size {}x{}", request.width, request.height)
            })?;
            pixmap.fill(background);
            Ok(MapSnapshot {
                background: pixmap,
                projection: region_projection(request.region, request.width, request.height),
            })
        })
    }
}
