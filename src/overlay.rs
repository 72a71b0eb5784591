// SPDX-License-Identifier: MPL-2.0
//! The overlay orchestrator: owns the canvas for the duration of one run and
//! drives extraction, projection, rendering and persistence in sequence.

use crate::error::{Error, Result};
use crate::geo::{self, GeoPoint};
use crate::gps;
use crate::render;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use little_exif::metadata::Metadata;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 95;

/// One overlay run over one image.
///
/// The decoded canvas is owned exclusively for the run's lifetime, mutated
/// in place by the renderer, and encoded and written exactly once.
pub struct MarkerOverlay {
    source: PathBuf,
    canvas: RgbaImage,
    markers: Vec<GeoPoint>,
}

impl MarkerOverlay {
    /// Decodes the input image. Failure here is fatal for the run and
    /// nothing is written.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canvas = image::open(path)
            .map_err(|e| Error::Image(format!("failed to load '{}': {e}", path.display())))?
            .to_rgba8();

        Ok(Self {
            source: path.to_path_buf(),
            canvas,
            markers: Vec::new(),
        })
    }

    /// Queues a marker. Insertion order is draw order.
    pub fn add_marker(&mut self, point: GeoPoint) {
        self.markers.push(point);
    }

    /// Re-reads the source image's EXIF for its GPS reference point.
    /// `Ok(None)` when the image carries none.
    pub fn reference(&self) -> Result<Option<GeoPoint>> {
        gps::extract_geo(&self.source)
    }

    /// Runs the pipeline: extract the reference point, project and draw each
    /// queued marker in insertion order, draw the legend once, then persist.
    ///
    /// Aborts with [`Error::NoGpsData`] before any drawing or writing when
    /// the source image has no GPS reference.
    pub fn run<P: AsRef<Path>>(mut self, output: P) -> Result<()> {
        let output = output.as_ref();
        let reference = self.reference()?.ok_or(Error::NoGpsData)?;
        debug!(
            "reference point: {:.6}, {:.6} from '{}'",
            reference.lat,
            reference.lon,
            self.source.display()
        );

        let (width, height) = (self.canvas.width(), self.canvas.height());
        for marker in &self.markers {
            let pixel = geo::project(*marker, reference, width, height);
            render::draw_marker(
                &mut self.canvas,
                pixel.x,
                pixel.y,
                render::MARKER_COLOR,
                render::MARKER_SIZE,
            );
        }

        // The legend goes last so it layers on top of any marker under it.
        let font = render::load_legend_font();
        render::draw_legend(&mut self.canvas, render::LEGEND_CAPTION, font.as_ref());

        self.persist(output)?;
        info!("processed image saved to '{}'", output.display());
        Ok(())
    }

    fn persist(self, output: &Path) -> Result<()> {
        let extension = output
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        let jpeg_output = matches!(extension.as_str(), "jpg" | "jpeg");
        if jpeg_output {
            let file = File::create(output).map_err(|e| Error::Io(e.to_string()))?;
            let mut writer = BufWriter::new(file);
            let rgb = DynamicImage::ImageRgba8(self.canvas).into_rgb8();
            JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY).encode_image(&rgb)?;
        } else {
            self.canvas.save(output)?;
        }

        copy_metadata(&self.source, output, jpeg_output)
    }
}

/// Carries the source image's EXIF block over to the output file, so the
/// annotation does not strip the original metadata. A source without EXIF is
/// not an error; the output is simply left without one.
///
/// For JPEG outputs the source's raw EXIF payload is spliced in as an APP1
/// segment, byte for byte, so camera-authored blocks (tag order, unknown
/// tags, maker notes) survive untouched. Other formats fall back to a
/// re-serializing transplant.
fn copy_metadata(source: &Path, output: &Path, jpeg_output: bool) -> Result<()> {
    if jpeg_output {
        return match read_raw_exif(source)? {
            Some(raw) => splice_exif_segment(output, &raw),
            None => {
                debug!("no EXIF to carry over from '{}'", source.display());
                Ok(())
            }
        };
    }

    match Metadata::new_from_path(source) {
        Ok(metadata) => metadata.write_to_file(output).map_err(|e| {
            Error::Metadata(format!(
                "failed to copy EXIF to '{}': {e:?}",
                output.display()
            ))
        }),
        Err(e) => {
            debug!("no EXIF to carry over from '{}': {e:?}", source.display());
            Ok(())
        }
    }
}

/// Reads the source's raw EXIF (TIFF) payload without re-serializing it.
fn read_raw_exif(source: &Path) -> Result<Option<Vec<u8>>> {
    let file = File::open(source).map_err(|e| Error::Io(e.to_string()))?;
    let mut reader = std::io::BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(parsed) => Ok(Some(parsed.buf().to_vec())),
        Err(_) => Ok(None),
    }
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: [u8; 2] = [0xFF, 0xE1];
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Inserts the raw EXIF payload into an encoded JPEG as an APP1 segment
/// directly after the SOI marker, leaving the payload bytes verbatim.
fn splice_exif_segment(output: &Path, raw: &[u8]) -> Result<()> {
    // Segment length field covers itself, the Exif header and the payload.
    let length = raw.len() + EXIF_HEADER.len() + 2;
    if length > usize::from(u16::MAX) {
        return Err(Error::Metadata(format!(
            "EXIF block too large for an APP1 segment ({} bytes)",
            raw.len()
        )));
    }

    let encoded = std::fs::read(output).map_err(|e| Error::Io(e.to_string()))?;
    if encoded.len() < 2 || encoded[..2] != SOI {
        return Err(Error::Metadata(format!(
            "'{}' is not a JPEG, cannot splice EXIF",
            output.display()
        )));
    }

    let mut spliced = Vec::with_capacity(encoded.len() + length + 2);
    spliced.extend_from_slice(&SOI);
    spliced.extend_from_slice(&APP1);
    spliced.extend_from_slice(&(length as u16).to_be_bytes());
    spliced.extend_from_slice(EXIF_HEADER);
    spliced.extend_from_slice(raw);
    spliced.extend_from_slice(&encoded[2..]);

    std::fs::write(output, spliced).map_err(|e| Error::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, image::Rgb([120, 130, 140]))
            .save(path)
            .expect("write jpeg");
    }

    #[test]
    fn open_fails_on_missing_file() {
        let result = MarkerOverlay::open("/nonexistent/photo.jpg");
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn open_fails_on_corrupt_file() {
        use std::io::Write;
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.jpg");
        let mut file = File::create(&path).expect("create");
        file.write_all(b"definitely not a jpeg").expect("write");

        assert!(matches!(MarkerOverlay::open(&path), Err(Error::Image(_))));
    }

    #[test]
    fn run_without_gps_aborts_before_writing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("plain.jpg");
        let output = dir.path().join("out.jpg");
        write_jpeg(&input, 64, 48);

        let overlay = MarkerOverlay::open(&input).expect("open");
        let result = overlay.run(&output);
        assert!(matches!(result, Err(Error::NoGpsData)));
        assert!(!output.exists());
    }

    #[test]
    fn markers_are_kept_in_insertion_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("plain.jpg");
        write_jpeg(&input, 64, 48);

        let mut overlay = MarkerOverlay::open(&input).expect("open");
        overlay.add_marker(GeoPoint::new(1.0, 2.0));
        overlay.add_marker(GeoPoint::new(3.0, 4.0));
        assert_eq!(
            overlay.markers,
            vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)]
        );
    }
}
