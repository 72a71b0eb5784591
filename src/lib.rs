// SPDX-License-Identifier: MPL-2.0
//! `geomark` annotates a photograph with geographic markers derived from its
//! own GPS EXIF metadata.
//!
//! The pipeline extracts the image's embedded GPS coordinate as a reference
//! point, projects marker coordinates onto pixel positions with a simple
//! equirectangular mapping, draws a marker glyph per point and a legend box,
//! and writes the result with the original EXIF block carried over. A
//! slippy-map tile prefetcher ships alongside as a batch utility.

pub mod config;
pub mod error;
pub mod geo;
pub mod gps;
pub mod overlay;
pub mod render;
pub mod tiles;
