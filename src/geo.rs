// SPDX-License-Identifier: MPL-2.0
//! Geographic and pixel coordinate types, and the geo-to-pixel projection.
//!
//! The projection is a plain equirectangular mapping centered on a reference
//! point: longitude is scaled over a 360° domain, latitude over 180°, with no
//! aspect-ratio or Mercator correction. This asymmetry is a deliberate
//! approximation inherited from the tool's original behavior; "fixing" it
//! would shift every pixel output and break compatibility with previously
//! annotated images.

/// A geographic coordinate in signed decimal degrees.
///
/// Latitude is in `[-90, 90]`, longitude in `[-180, 180]`. Values are
/// immutable once created; they come either from EXIF extraction (the
/// reference point) or from the caller (marker points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A pixel position derived from a projection.
///
/// Signed and unclamped: a point far outside the image's geographic footprint
/// legitimately projects outside the canvas, and the renderer clips silently.
/// Only meaningful relative to the canvas dimensions it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

/// Projects a geographic point onto pixel coordinates, with `reference`
/// mapping to the canvas center.
///
/// ```text
/// x = (point.lon - reference.lon) * (width  / 360) + width  / 2
/// y = (reference.lat - point.lat) * (height / 180) + height / 2
/// ```
///
/// The float result is truncated toward zero (`as` cast semantics), matching
/// the original tool's integer conversion. Tests rely on this exact rounding.
pub fn project(point: GeoPoint, reference: GeoPoint, width: u32, height: u32) -> PixelPoint {
    let width = f64::from(width);
    let height = f64::from(height);

    let x = (point.lon - reference.lon) * (width / 360.0) + width / 2.0;
    let y = (reference.lat - point.lat) * (height / 180.0) + height / 2.0;

    PixelPoint {
        x: x as i64,
        y: y as i64,
    }
}
