// SPDX-License-Identifier: MPL-2.0
//! GPS coordinate extraction from EXIF metadata.
//!
//! The extractor locates the GPS IFD in an image's EXIF block, converts the
//! degrees/minutes/seconds rationals to signed decimal degrees and applies
//! the hemisphere reference tags. A missing or malformed GPS block is a
//! recoverable absence (`None`), never a crash; only failing to open the
//! file at all is an error.

use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads the GPS reference point embedded in an image file.
///
/// Returns `Ok(None)` when the file carries no EXIF container or no usable
/// GPS block. Returns `Err` only when the file itself cannot be opened.
pub fn extract_geo<P: AsRef<Path>>(path: P) -> Result<Option<GeoPoint>> {
    let file = File::open(path.as_ref()).map_err(|e| Error::Io(e.to_string()))?;
    let mut reader = BufReader::new(file);

    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(geo_from_exif(&exif)),
        // No EXIF segment, or one too damaged to parse. Not an error at
        // this layer; the caller decides whether the run can proceed.
        Err(_) => Ok(None),
    }
}

/// Extracts the GPS coordinate pair from parsed EXIF data.
///
/// Both coordinates must be complete (value plus hemisphere reference tag)
/// for a point to be produced.
pub fn geo_from_exif(exif: &exif::Exif) -> Option<GeoPoint> {
    let lat = coordinate(exif, exif::Tag::GPSLatitude)?;
    let lat_ref = ref_tag(exif, exif::Tag::GPSLatitudeRef)?;
    let lon = coordinate(exif, exif::Tag::GPSLongitude)?;
    let lon_ref = ref_tag(exif, exif::Tag::GPSLongitudeRef)?;

    Some(GeoPoint {
        lat: signed(lat, lat_ref, b"S"),
        lon: signed(lon, lon_ref, b"W"),
    })
}

fn coordinate(exif: &exif::Exif, tag: exif::Tag) -> Option<f64> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    dms_to_decimal(&field.value)
}

/// Converts EXIF degrees/minutes/seconds rationals to decimal degrees:
/// `d + m/60 + s/3600`, true division throughout.
fn dms_to_decimal(value: &exif::Value) -> Option<f64> {
    match value {
        exif::Value::Rational(rationals) if rationals.len() >= 3 => {
            let degrees = ratio(&rationals[0])?;
            let minutes = ratio(&rationals[1])?;
            let seconds = ratio(&rationals[2])?;
            Some(degrees + minutes / 60.0 + seconds / 3600.0)
        }
        _ => None,
    }
}

/// A zero denominator makes the whole coordinate unusable; it must surface
/// as absence, not as an infinity leaking into the projection.
fn ratio(r: &exif::Rational) -> Option<f64> {
    if r.denom == 0 {
        None
    } else {
        Some(f64::from(r.num) / f64::from(r.denom))
    }
}

/// The hemisphere tag is compared as the raw stored byte string, exactly as
/// written by the camera. No case normalization: only a literal `S` or `W`
/// negates the coordinate.
fn signed(value: f64, stored_ref: &[u8], negative_ref: &[u8]) -> f64 {
    if stored_ref == negative_ref {
        -value
    } else {
        value
    }
}

/// Returns the raw ASCII bytes of a reference tag, as stored.
fn ref_tag(exif: &exif::Exif, tag: exif::Tag) -> Option<&[u8]> {
    match &exif.get_field(tag, exif::In::PRIMARY)?.value {
        exif::Value::Ascii(values) => values.first().map(|v| v.as_slice()),
        _ => None,
    }
}
