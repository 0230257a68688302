//! Geographic and pixel-frame projection into the fixed output canvas.
//!
//! Two distinct mappings, and they must stay distinct: geometry expressed in
//! geographic (lon, lat) goes through [`geo_to_canvas`] (offset, scale and a
//! Y flip, since latitude grows northward but pixel rows grow downward),
//! while geometry already expressed in the source's native pixel frame goes
//! through [`pixel_to_canvas`] (plain ratio scaling, no offset, no flip).
//! Conflating the two misaligns cell boundaries against raster overlays.
//!
//! Arithmetic is f64 even though source coordinates arrive as f32: at a
//! canvas 8192 units wide, f32 rounding alone costs about 1e-3 of a pixel,
//! too coarse for stable round-trips.

use serde::Deserialize;

/// Output canvas width in pixels.
pub const MAP_WIDTH: u32 = 8192;
/// Output canvas height in pixels.
pub const MAP_HEIGHT: u32 = 4096;

/// Geographic bounding box of the source map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Western longitude offset.
    pub lon_west: f32,
    /// Southern latitude offset.
    pub lat_south: f32,
    /// Total longitude span.
    pub lon_span: f32,
    /// Total latitude span.
    pub lat_span: f32,
}

impl Bounds {
    fn x_ratio(&self) -> f64 {
        MAP_WIDTH as f64 / self.lon_span as f64
    }

    fn y_ratio(&self) -> f64 {
        MAP_HEIGHT as f64 / self.lat_span as f64
    }
}

/// Dimensions of the source's native pixel frame (`info.width` × `info.height`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PixelFrame {
    pub width: u32,
    pub height: u32,
}

/// Project a geographic (lon, lat) point onto the canvas.
pub fn geo_to_canvas(bounds: &Bounds, lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon - bounds.lon_west as f64) * bounds.x_ratio();
    let y = MAP_HEIGHT as f64 - (lat - bounds.lat_south as f64) * bounds.y_ratio();
    (x, y)
}

/// Invert [`geo_to_canvas`]. Used to verify the transform round-trips.
pub fn canvas_to_geo(bounds: &Bounds, x: f64, y: f64) -> (f64, f64) {
    let lon = x / bounds.x_ratio() + bounds.lon_west as f64;
    let lat = (MAP_HEIGHT as f64 - y) / bounds.y_ratio() + bounds.lat_south as f64;
    (lon, lat)
}

/// Scale a point from the source pixel frame onto the canvas.
///
/// No offset and no Y flip: both frames put the origin at the top-left.
pub fn pixel_to_canvas(frame: &PixelFrame, x: f64, y: f64) -> (f64, f64) {
    (
        x * (MAP_WIDTH as f64 / frame.width as f64),
        y * (MAP_HEIGHT as f64 / frame.height as f64),
    )
}
