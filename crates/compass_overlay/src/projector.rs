use std::f64::consts::PI;

use compass_core::latlng::LatLng;

use crate::canvas::{Bounds, MapCanvas, ScreenPoint, Viewport};

pub const TILE_SIZE: f64 = 256.0;

// Web mercator is undefined at the poles, clamp like the tile servers do
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Converts between geographic and canvas pixel coordinates for one viewport
/// snapshot. Must be refreshed on every viewport change.
#[derive(Debug, Clone, Default)]
pub struct ViewportProjector {
    viewport: Option<Viewport>,
}

impl ViewportProjector {
    pub fn new(viewport: Option<Viewport>) -> Self {
        Self { viewport }
    }

    pub fn from_canvas<C: MapCanvas + ?Sized>(canvas: &C) -> Self {
        Self::new(canvas.viewport())
    }

    pub fn update(&mut self, viewport: Option<Viewport>) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.viewport.is_some()
    }

    fn world_size(zoom: f64) -> f64 {
        TILE_SIZE * 2f64.powf(zoom)
    }

    fn project(latlng: &LatLng, zoom: f64) -> (f64, f64) {
        let size = Self::world_size(zoom);
        let lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

        let x = (latlng.lng + 180.0) / 360.0 * size;
        let y = (0.5 - ((PI / 4.0) + lat / 2.0).tan().ln() / (2.0 * PI)) * size;
        (x, y)
    }

    fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
        let size = Self::world_size(zoom);
        let lng = x / size * 360.0 - 180.0;
        let n = PI - 2.0 * PI * y / size;
        let lat = n.sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }

    /// `None` when the viewport is not known yet.
    pub fn to_screen(&self, latlng: &LatLng) -> Option<ScreenPoint> {
        let viewport = self.viewport.as_ref()?;

        let (cx, cy) = Self::project(&viewport.center, viewport.zoom);
        let (px, py) = Self::project(latlng, viewport.zoom);

        Some(ScreenPoint::new(
            px - cx + viewport.width / 2.0,
            py - cy + viewport.height / 2.0,
        ))
    }

    pub fn to_geo(&self, screen: &ScreenPoint) -> Option<LatLng> {
        let viewport = self.viewport.as_ref()?;

        let (cx, cy) = Self::project(&viewport.center, viewport.zoom);
        let x = screen.x - viewport.width / 2.0 + cx;
        let y = screen.y - viewport.height / 2.0 + cy;

        Some(Self::unproject(x, y, viewport.zoom))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let viewport = self.viewport.as_ref()?;

        let north_west = self.to_geo(&ScreenPoint::new(0.0, 0.0))?;
        let south_east = self.to_geo(&ScreenPoint::new(viewport.width, viewport.height))?;

        Some(Bounds {
            south_west: LatLng::new(south_east.lat, north_west.lng),
            north_east: LatLng::new(north_west.lat, south_east.lng),
        })
    }
}
