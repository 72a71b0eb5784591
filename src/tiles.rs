// SPDX-License-Identifier: MPL-2.0
//! Slippy-map tile prefetcher.
//!
//! Walks a bounding box over a zoom range, converts each zoom/lat/lon
//! combination to the standard slippy-map tile index and fetches one raster
//! tile per index, writing it under `output_dir/zoom/x/y.png`. Re-runs are
//! idempotent: existing files are skipped. Individual fetch failures and
//! non-success responses are logged and skipped, never fatal.

use crate::config::TileConfig;
use crate::error::{Error, Result};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome counts of one prefetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Converts a geographic coordinate to its slippy-map tile index at `zoom`.
///
/// `n = 2^zoom`; x comes from the linear longitude fraction, y from the
/// Mercator (logarithmic) latitude formula. Fractions truncate to the
/// containing tile.
pub fn tile_index(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = 2.0_f64.powi(i32::from(zoom));
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n;

    (x as u32, y as u32)
}

fn tile_url(template: &str, zoom: u8, x: u32, y: u32) -> String {
    template
        .replace("{z}", &zoom.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

fn tile_path(config: &TileConfig, zoom: u8, x: u32, y: u32) -> PathBuf {
    config
        .output_dir
        .join(zoom.to_string())
        .join(x.to_string())
        .join(format!("{y}.png"))
}

/// Fetches every tile covering the configured bounding box across the
/// configured zoom range.
pub fn fetch_all(config: &TileConfig) -> Result<FetchSummary> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("geomark/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| Error::Http(e.to_string()))?;

    let mut summary = FetchSummary::default();

    for zoom in config.zoom_min..=config.zoom_max {
        // Tile y grows southward, so the north-west corner gives the start
        // indices and the south-east corner the end indices.
        let (x_start, y_start) = tile_index(config.lat_max, config.lon_min, zoom);
        let (x_end, y_end) = tile_index(config.lat_min, config.lon_max, zoom);

        let total = u64::from(x_end.saturating_sub(x_start) + 1)
            * u64::from(y_end.saturating_sub(y_start) + 1);
        info!("zoom {zoom}: up to {total} tiles");

        for x in x_start..=x_end {
            for y in y_start..=y_end {
                let target = tile_path(config, zoom, x, y);
                if target.exists() {
                    summary.skipped += 1;
                    continue;
                }

                // Write failures are per-tile failures too, like fetch
                // failures; one bad tile never kills the run.
                let url = tile_url(&config.tile_url_template, zoom, x, y);
                match fetch_tile(&client, &url).and_then(|bytes| store_tile(&target, &bytes)) {
                    Ok(()) => summary.downloaded += 1,
                    Err(e) => {
                        warn!("skipping {url}: {e}");
                        summary.failed += 1;
                    }
                }

                if config.request_delay_ms > 0 {
                    thread::sleep(Duration::from_millis(config.request_delay_ms));
                }
            }
        }
    }

    info!(
        "prefetch complete: {} downloaded, {} skipped, {} failed",
        summary.downloaded, summary.skipped, summary.failed
    );
    Ok(summary)
}

fn store_tile(target: &std::path::Path, bytes: &[u8]) -> std::result::Result<(), String> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    fs::write(target, bytes).map_err(|e| e.to_string())
}

fn fetch_tile(client: &reqwest::blocking::Client, url: &str) -> std::result::Result<Vec<u8>, String> {
    let response = client.get(url).send().map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("status {}", response.status()));
    }
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| e.to_string())
}
